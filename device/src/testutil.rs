//! Test doubles for running the driver and actors on a host.
//!
//! [`FakeHts221`] is an in-memory HTS221 register file behind the async I2C trait. It honours
//! auto-increment addressing, records every transfer, simulates one-shot conversions with the
//! status bits and the DRDY line, and can be told to fail accesses to chosen registers.

use crate::drivers::sensors::hts221::calibration::RawCalibration;
use crate::drivers::sensors::hts221::register::who_am_i::DEVICE_ID;
use crate::drivers::sensors::hts221::register::{
    Register, AUTO_INCREMENT, DRDY_EN, DRDY_H_L, H_DA, ONE_SHOT, PD, T_DA,
};
use crate::drivers::sensors::hts221::ADDR;
use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin, StatefulOutputPin};
use embedded_hal::i2c::{Error, ErrorKind, NoAcknowledgeSource};
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

const REGISTER_FILE_LEN: usize = 0x40;

/// Calibration loaded by [`FakeHts221::new`].
///
/// Temperature: -170 → 26.5 °C, 460 → 86.5 °C. Humidity: -4000 → 20 %, 9000 → 70 %.
pub const CALIBRATION: RawCalibration = RawCalibration {
    h0_rh_x2: 40,
    h1_rh_x2: 140,
    t0_degc_x8: 212,
    t1_degc_x8: 692,
    h0_t0_out: -4000,
    h1_t0_out: 9000,
    t0_out: -170,
    t1_out: 460,
};

/// One completed bus access, as seen by the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transaction {
    Read {
        register: u8,
        len: usize,
        auto_increment: bool,
    },
    Write {
        register: u8,
        value: u8,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TestBusError {
    /// Nothing answered at the addressed slave.
    NoAcknowledge,
    /// An access to a register marked with [`FakeHts221::fail_register`].
    Injected(u8),
}

impl Error for TestBusError {
    fn kind(&self) -> ErrorKind {
        match self {
            TestBusError::NoAcknowledge => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            TestBusError::Injected(_) => ErrorKind::Bus,
        }
    }
}

/// When a one-shot conversion completes after the trigger bit is written.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// Within the triggering write.
    Immediate,
    /// On [`FakeHts221::finish_conversion`].
    Manual,
}

struct Device {
    address: u8,
    registers: [u8; REGISTER_FILE_LEN],
    pointer: u8,
    auto_increment: bool,
    transactions: Vec<Transaction>,
    samples: VecDeque<(i16, i16)>,
    conversion: Conversion,
    pending: bool,
    one_shots: usize,
    humidity_read: bool,
    temperature_read: bool,
    failing: Vec<u8>,
    data_ready: Option<TestPin>,
}

impl Device {
    fn new(calibration: &RawCalibration) -> Self {
        let mut registers = [0; REGISTER_FILE_LEN];
        registers[Register::WhoAmI.addr() as usize] = DEVICE_ID;
        // Reset value of AV_CONF.
        registers[Register::AvConf.addr() as usize] = 0x1B;
        let start = Register::Calibration.addr() as usize;
        let block = calibration.to_bytes();
        registers[start..start + block.len()].copy_from_slice(&block);
        Self {
            address: ADDR,
            registers,
            pointer: 0,
            auto_increment: false,
            transactions: Vec::new(),
            samples: VecDeque::new(),
            conversion: Conversion::Immediate,
            pending: false,
            one_shots: 0,
            humidity_read: false,
            temperature_read: false,
            failing: Vec::new(),
            data_ready: None,
        }
    }

    fn register(&self, register: Register) -> u8 {
        self.registers[register.addr() as usize]
    }

    fn target(&self, index: usize) -> u8 {
        if self.auto_increment {
            self.pointer.wrapping_add(index as u8)
        } else {
            self.pointer
        }
    }

    fn check(&self, register: u8) -> Result<(), TestBusError> {
        if self.failing.contains(&register) {
            Err(TestBusError::Injected(register))
        } else {
            Ok(())
        }
    }

    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), TestBusError> {
        if address != self.address {
            return Err(TestBusError::NoAcknowledge);
        }
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => self.write(bytes)?,
                Operation::Read(buf) => self.read(buf)?,
            }
        }
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TestBusError> {
        let Some((sub, values)) = bytes.split_first() else {
            return Ok(());
        };
        self.pointer = sub & !AUTO_INCREMENT;
        self.auto_increment = sub & AUTO_INCREMENT != 0;
        for index in 0..values.len() {
            self.check(self.target(index))?;
        }
        for (index, value) in values.iter().enumerate() {
            let register = self.target(index);
            self.transactions.push(Transaction::Write {
                register,
                value: *value,
            });
            self.store(register, *value);
        }
        self.update_data_ready();
        Ok(())
    }

    fn store(&mut self, register: u8, value: u8) {
        let writable = [
            Register::AvConf,
            Register::CtrlReg1,
            Register::CtrlReg2,
            Register::CtrlReg3,
        ];
        if !writable.iter().any(|r| r.addr() == register) {
            return;
        }
        self.registers[register as usize] = value;
        if register == Register::CtrlReg2.addr() && ONE_SHOT.is_set(value) {
            self.one_shots += 1;
            if !PD.is_set(self.register(Register::CtrlReg1)) {
                let ctrl2 = ONE_SHOT.with(value, false);
                self.registers[register as usize] = ctrl2;
            } else {
                match self.conversion {
                    Conversion::Immediate => self.complete_conversion(),
                    Conversion::Manual => self.pending = true,
                }
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), TestBusError> {
        for index in 0..buf.len() {
            self.check(self.target(index))?;
        }
        for (index, byte) in buf.iter_mut().enumerate() {
            let register = self.target(index);
            *byte = self
                .registers
                .get(register as usize)
                .copied()
                .unwrap_or_default();
            match register {
                0x28 | 0x29 => self.humidity_read = true,
                0x2A | 0x2B => self.temperature_read = true,
                _ => {}
            }
        }
        self.transactions.push(Transaction::Read {
            register: self.pointer,
            len: buf.len(),
            auto_increment: self.auto_increment,
        });
        if self.humidity_read && self.temperature_read {
            self.humidity_read = false;
            self.temperature_read = false;
            let status = Register::Status.addr() as usize;
            self.registers[status] = 0;
            self.update_data_ready();
        }
        Ok(())
    }

    fn complete_conversion(&mut self) {
        if let Some(sample) = self.samples.pop_front() {
            self.set_output(sample);
        }
        let ctrl2 = Register::CtrlReg2.addr() as usize;
        self.registers[ctrl2] = ONE_SHOT.with(self.registers[ctrl2], false);
        let status = Register::Status.addr() as usize;
        self.registers[status] = H_DA.with(T_DA.with(0, true), true);
        self.pending = false;
        self.humidity_read = false;
        self.temperature_read = false;
        self.update_data_ready();
    }

    fn set_output(&mut self, (humidity, temperature): (i16, i16)) {
        let start = Register::HumidityOutL.addr() as usize;
        self.registers[start..start + 2].copy_from_slice(&humidity.to_le_bytes());
        self.registers[start + 2..start + 4].copy_from_slice(&temperature.to_le_bytes());
    }

    fn update_data_ready(&mut self) {
        let ctrl3 = self.register(Register::CtrlReg3);
        let asserted = DRDY_EN.is_set(ctrl3) && self.register(Register::Status) != 0;
        let active_high = !DRDY_H_L.is_set(ctrl3);
        if let Some(pin) = &self.data_ready {
            pin.set_level(asserted == active_high);
        }
    }
}

/// An HTS221 on a fake bus. Clones share the same device.
#[derive(Clone)]
pub struct FakeHts221 {
    device: Arc<Mutex<Device>>,
}

impl Default for FakeHts221 {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHts221 {
    pub fn new() -> Self {
        Self::with_calibration(&CALIBRATION)
    }

    pub fn with_calibration(calibration: &RawCalibration) -> Self {
        Self {
            device: Arc::new(Mutex::new(Device::new(calibration))),
        }
    }

    /// Drive `pin` as the DRDY output.
    pub fn with_data_ready(self, pin: TestPin) -> Self {
        {
            let mut device = self.lock();
            device.data_ready.replace(pin);
            device.update_data_ready();
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, Device> {
        self.device
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_conversion(&self, conversion: Conversion) {
        self.lock().conversion = conversion;
    }

    /// Queue the raw `(humidity, temperature)` codes produced by the next conversion.
    /// Without a queued sample a conversion leaves the previous output in place.
    pub fn push_sample(&self, humidity: i16, temperature: i16) {
        self.lock().samples.push_back((humidity, temperature));
    }

    /// Complete the pending one-shot conversion. Returns false when none is pending.
    pub fn finish_conversion(&self) -> bool {
        let mut device = self.lock();
        if device.pending {
            device.complete_conversion();
            true
        } else {
            false
        }
    }

    /// Complete a conversion whether or not one was triggered, as if left over from an
    /// earlier session.
    pub fn complete_conversion(&self) {
        self.lock().complete_conversion();
    }

    pub fn conversion_pending(&self) -> bool {
        self.lock().pending
    }

    pub fn one_shots(&self) -> usize {
        self.lock().one_shots
    }

    pub fn register(&self, register: Register) -> u8 {
        self.lock().register(register)
    }

    /// Store `value` as is, bypassing the bus and the read-only checks.
    pub fn set_register(&self, register: Register, value: u8) {
        let mut device = self.lock();
        device.registers[register.addr() as usize] = value;
        device.update_data_ready();
    }

    /// Drain the transaction log.
    pub fn take_transactions(&self) -> Vec<Transaction> {
        core::mem::take(&mut self.lock().transactions)
    }

    /// Fail every later access touching `register`.
    pub fn fail_register(&self, register: Register) {
        self.lock().failing.push(register.addr());
    }

    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }
}

impl ErrorType for FakeHts221 {
    type Error = TestBusError;
}

impl I2c for FakeHts221 {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.lock().transaction(address, operations)
    }
}

struct PinState {
    level: AtomicBool,
    rising: AtomicUsize,
    falling: AtomicUsize,
    changed: Signal<CriticalSectionRawMutex, ()>,
}

/// An input pin driven from the test. Clones observe the same line.
#[derive(Clone)]
pub struct TestPin {
    inner: Arc<PinState>,
}

impl TestPin {
    pub fn new(initial: bool) -> Self {
        Self {
            inner: Arc::new(PinState {
                level: AtomicBool::new(initial),
                rising: AtomicUsize::new(0),
                falling: AtomicUsize::new(0),
                changed: Signal::new(),
            }),
        }
    }

    pub fn set_high(&self) {
        self.set_level(true)
    }

    pub fn set_low(&self) {
        self.set_level(false)
    }

    pub fn set_level(&self, level: bool) {
        if self.inner.level.swap(level, Ordering::SeqCst) != level {
            let edges = if level {
                &self.inner.rising
            } else {
                &self.inner.falling
            };
            edges.fetch_add(1, Ordering::SeqCst);
            self.inner.changed.signal(());
        }
    }

    pub fn level(&self) -> bool {
        self.inner.level.load(Ordering::SeqCst)
    }

    pub fn rising_edges(&self) -> usize {
        self.inner.rising.load(Ordering::SeqCst)
    }

    async fn wait_until<F: Fn(&PinState) -> bool>(&self, done: F) {
        while !done(&self.inner) {
            self.inner.changed.wait().await;
        }
    }

    async fn wait_edge(&self, edges: fn(&PinState) -> &AtomicUsize) {
        let start = edges(&self.inner).load(Ordering::SeqCst);
        self.wait_until(|state| edges(state).load(Ordering::SeqCst) != start)
            .await
    }
}

impl PinErrorType for TestPin {
    type Error = Infallible;
}

impl InputPin for TestPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

impl Wait for TestPin {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        self.wait_until(|state| state.level.load(Ordering::SeqCst))
            .await;
        Ok(())
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        self.wait_until(|state| !state.level.load(Ordering::SeqCst))
            .await;
        Ok(())
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        self.wait_edge(|state| &state.rising).await;
        Ok(())
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        self.wait_edge(|state| &state.falling).await;
        Ok(())
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        let start = self.rising_edges() + self.inner.falling.load(Ordering::SeqCst);
        self.wait_until(|state| {
            state.rising.load(Ordering::SeqCst) + state.falling.load(Ordering::SeqCst) != start
        })
        .await;
        Ok(())
    }
}

struct LedState {
    level: AtomicBool,
    changes: AtomicUsize,
}

/// An output pin recording its level. Clones observe the same pin.
#[derive(Clone)]
pub struct TestLed {
    inner: Arc<LedState>,
}

impl Default for TestLed {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLed {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LedState {
                level: AtomicBool::new(false),
                changes: AtomicUsize::new(0),
            }),
        }
    }

    pub fn is_high(&self) -> bool {
        self.inner.level.load(Ordering::SeqCst)
    }

    /// Number of level changes so far.
    pub fn changes(&self) -> usize {
        self.inner.changes.load(Ordering::SeqCst)
    }

    fn set_level(&self, level: bool) {
        if self.inner.level.swap(level, Ordering::SeqCst) != level {
            self.inner.changes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl PinErrorType for TestLed {
    type Error = Infallible;
}

impl OutputPin for TestLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_level(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_level(true);
        Ok(())
    }
}

impl StatefulOutputPin for TestLed {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(TestLed::is_high(self))
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!TestLed::is_high(self))
    }
}
