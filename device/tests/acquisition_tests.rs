#[cfg(feature = "std")]
mod tests {
    use embassy_futures::join::{join, join4};
    use embassy_futures::select::{select, Either};
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::channel::Channel;
    use embassy_sync::signal::Signal;
    use embassy_time::{Duration, Timer};
    use futures::executor::block_on;
    use hts221_device::actors::button::ButtonTrigger;
    use hts221_device::actors::led::{Blinker, BlinkerConfig};
    use hts221_device::actors::sensors::hts221::*;
    use hts221_device::domain::Reading;
    use hts221_device::drivers::button::Button;
    use hts221_device::drivers::{ActiveHigh, ActiveLow};
    use hts221_device::drivers::led::Led;
    use hts221_device::drivers::sensors::hts221::calibration::{InvalidCalibration, RawCalibration};
    use hts221_device::drivers::sensors::hts221::register::ctrl3::ActiveState;
    use hts221_device::drivers::sensors::hts221::register::Register;
    use hts221_device::drivers::sensors::hts221::{Config, Hts221, Hts221Error};
    use hts221_device::kernel::event::{EventFlags, Events};
    use hts221_device::testutil::*;

    const EPSILON: f32 = 1e-3;

    type TestEvents = EventFlags<CriticalSectionRawMutex>;
    type TestAcquisition<'a> = Acquisition<'a, CriticalSectionRawMutex, FakeHts221>;
    type TestReady<'a> = DataReadyLine<'a, TestPin, CriticalSectionRawMutex>;
    type Outcome = Result<Reading, AcquisitionError<TestBusError>>;

    fn config() -> AcquisitionConfig {
        AcquisitionConfig {
            timeout: Duration::from_millis(50),
            startup_delay: Duration::from_ticks(0),
        }
    }

    fn setup<'a>(
        bus: &FakeHts221,
        drdy: &TestPin,
        events: &'a TestEvents,
    ) -> (TestAcquisition<'a>, TestReady<'a>) {
        let acquisition = Acquisition::new(
            Hts221::new(),
            bus.clone(),
            events,
            Config::default(),
            config(),
        );
        let ready = DataReadyLine::new(drdy.clone(), ActiveState::High, events);
        (acquisition, ready)
    }

    async fn pause() {
        Timer::after(Duration::from_millis(5)).await;
    }

    /// Run one cycle, requesting the reading once the task waits for it.
    async fn cycle(acquisition: &mut TestAcquisition<'_>, ready: &mut TestReady<'_>) -> Outcome {
        let trigger = acquisition.trigger();
        let requested = async {
            pause().await;
            trigger.request();
        };
        match select(ready.run(), join(acquisition.next(), requested)).await {
            Either::First(_) => panic!("data ready line stopped"),
            Either::Second((outcome, _)) => outcome,
        }
    }

    fn assert_reading(outcome: Outcome, temperature: f32, humidity: f32) {
        let reading = outcome.unwrap();
        assert!((temperature - reading.temperature.raw_value()).abs() < EPSILON);
        assert!((humidity - reading.relative_humidity).abs() < EPSILON);
    }

    #[test]
    fn test_full_cycle() {
        block_on(async {
            let drdy = TestPin::new(false);
            let bus = FakeHts221::new().with_data_ready(drdy.clone());
            let events = TestEvents::new();
            let (mut acquisition, mut ready) = setup(&bus, &drdy, &events);

            acquisition.initialize().await.unwrap();
            assert_eq!(State::Idle, acquisition.state());
            bus.push_sample(-4000, -170);
            bus.take_transactions();

            let outcome = cycle(&mut acquisition, &mut ready).await;
            assert_reading(outcome, 26.5, 20.0);
            assert_eq!(State::Idle, acquisition.state());
            assert!(!acquisition.sensor().session().conversion_pending);
            assert!(!drdy.level());
        });
    }

    #[test]
    fn test_no_reads_between_trigger_and_data_ready() {
        block_on(async {
            let drdy = TestPin::new(false);
            let bus = FakeHts221::new().with_data_ready(drdy.clone());
            let events = TestEvents::new();
            let (mut acquisition, mut ready) = setup(&bus, &drdy, &events);
            acquisition.initialize().await.unwrap();
            bus.take_transactions();

            cycle(&mut acquisition, &mut ready).await.unwrap();
            assert_eq!(
                vec![
                    Transaction::Write {
                        register: 0x21,
                        value: 0x01
                    },
                    Transaction::Read {
                        register: 0x28,
                        len: 4,
                        auto_increment: true
                    },
                ],
                bus.take_transactions()
            );
        });
    }

    #[test]
    fn test_accepted_trigger_requests_blink() {
        block_on(async {
            let drdy = TestPin::new(false);
            let bus = FakeHts221::new().with_data_ready(drdy.clone());
            let events = TestEvents::new();
            let (mut acquisition, mut ready) = setup(&bus, &drdy, &events);
            acquisition.initialize().await.unwrap();

            assert!(!events.peek().contains(Events::LED_BLINK));
            cycle(&mut acquisition, &mut ready).await.unwrap();
            assert!(events.peek().contains(Events::LED_BLINK));
        });
    }

    #[test]
    fn test_timeout_then_recovery() {
        block_on(async {
            let drdy = TestPin::new(false);
            let bus = FakeHts221::new().with_data_ready(drdy.clone());
            let events = TestEvents::new();
            let (mut acquisition, mut ready) = setup(&bus, &drdy, &events);
            acquisition.initialize().await.unwrap();
            bus.set_conversion(Conversion::Manual);
            bus.take_transactions();

            let outcome = cycle(&mut acquisition, &mut ready).await;
            assert!(matches!(outcome, Err(AcquisitionError::Timeout)));
            assert_eq!(State::Idle, acquisition.state());
            assert!(acquisition.sensor().session().conversion_pending);
            assert_eq!(
                vec![Transaction::Write {
                    register: 0x21,
                    value: 0x01
                }],
                bus.take_transactions()
            );

            bus.set_conversion(Conversion::Immediate);
            bus.push_sample(9000, 460);
            let outcome = cycle(&mut acquisition, &mut ready).await;
            assert_reading(outcome, 86.5, 70.0);
            assert_eq!(2, bus.one_shots());
        });
    }

    #[test]
    fn test_late_conversion_after_timeout_recovers() {
        block_on(async {
            let drdy = TestPin::new(false);
            let bus = FakeHts221::new().with_data_ready(drdy.clone());
            let events = TestEvents::new();
            let (mut acquisition, mut ready) = setup(&bus, &drdy, &events);
            acquisition.initialize().await.unwrap();
            bus.set_conversion(Conversion::Manual);

            let outcome = cycle(&mut acquisition, &mut ready).await;
            assert!(matches!(outcome, Err(AcquisitionError::Timeout)));

            // The timed-out conversion completes with nobody listening.
            assert!(bus.finish_conversion());
            assert!(drdy.level());

            bus.set_conversion(Conversion::Immediate);
            bus.push_sample(9000, 460);
            let outcome = cycle(&mut acquisition, &mut ready).await;
            assert_reading(outcome, 86.5, 70.0);
            assert!(!drdy.level());

            bus.push_sample(-4000, -170);
            let outcome = cycle(&mut acquisition, &mut ready).await;
            assert_reading(outcome, 26.5, 20.0);
            assert_eq!(3, bus.one_shots());
        });
    }

    #[test]
    fn test_trigger_while_pending_is_ignored() {
        block_on(async {
            let drdy = TestPin::new(false);
            let bus = FakeHts221::new().with_data_ready(drdy.clone());
            let events = TestEvents::new();
            let (mut acquisition, mut ready) = setup(&bus, &drdy, &events);
            acquisition.initialize().await.unwrap();
            bus.set_conversion(Conversion::Manual);

            let trigger = acquisition.trigger();
            let scenario = async {
                pause().await;
                trigger.request();
                pause().await;
                assert!(bus.conversion_pending());
                trigger.request();
                pause().await;
                assert!(bus.finish_conversion());
            };
            let outcome = match select(ready.run(), join(acquisition.next(), scenario)).await {
                Either::First(_) => panic!("data ready line stopped"),
                Either::Second((outcome, _)) => outcome,
            };
            assert!(outcome.is_ok());
            assert_eq!(1, bus.one_shots());

            // The trigger raised mid-conversion does not start another cycle.
            let idle = select(acquisition.next(), Timer::after(Duration::from_millis(30))).await;
            assert!(matches!(idle, Either::Second(_)));
            assert_eq!(1, bus.one_shots());
        });
    }

    #[test]
    fn test_rapid_triggers_coalesce() {
        block_on(async {
            let drdy = TestPin::new(false);
            let bus = FakeHts221::new().with_data_ready(drdy.clone());
            let events = TestEvents::new();
            let (mut acquisition, mut ready) = setup(&bus, &drdy, &events);
            acquisition.initialize().await.unwrap();

            let trigger = acquisition.trigger();
            let requested = async {
                pause().await;
                trigger.request();
                trigger.request();
                trigger.request();
            };
            match select(ready.run(), join(acquisition.next(), requested)).await {
                Either::First(_) => panic!("data ready line stopped"),
                Either::Second((outcome, _)) => assert!(outcome.is_ok()),
            }
            assert_eq!(1, bus.one_shots());
        });
    }

    #[test]
    fn test_trigger_write_failure_aborts() {
        block_on(async {
            let drdy = TestPin::new(false);
            let bus = FakeHts221::new().with_data_ready(drdy.clone());
            let events = TestEvents::new();
            let (mut acquisition, mut ready) = setup(&bus, &drdy, &events);
            acquisition.initialize().await.unwrap();
            bus.fail_register(Register::CtrlReg2);
            bus.take_transactions();

            let outcome = cycle(&mut acquisition, &mut ready).await;
            assert!(matches!(
                outcome,
                Err(AcquisitionError::Sensor(Hts221Error::I2c(
                    TestBusError::Injected(0x21)
                )))
            ));
            assert_eq!(State::Idle, acquisition.state());
            assert!(bus.take_transactions().is_empty());
            assert_eq!(0, bus.one_shots());

            bus.clear_failures();
            assert!(cycle(&mut acquisition, &mut ready).await.is_ok());
        });
    }

    #[test]
    fn test_output_read_failure_aborts() {
        block_on(async {
            let drdy = TestPin::new(false);
            let bus = FakeHts221::new().with_data_ready(drdy.clone());
            let events = TestEvents::new();
            let (mut acquisition, mut ready) = setup(&bus, &drdy, &events);
            acquisition.initialize().await.unwrap();
            bus.fail_register(Register::HumidityOutL);

            let outcome = cycle(&mut acquisition, &mut ready).await;
            assert!(matches!(
                outcome,
                Err(AcquisitionError::Sensor(Hts221Error::I2c(
                    TestBusError::Injected(0x28)
                )))
            ));
            assert_eq!(State::Idle, acquisition.state());
        });
    }

    #[test]
    fn test_initialize_releases_stale_data_ready() {
        block_on(async {
            let drdy = TestPin::new(false);
            let bus = FakeHts221::new().with_data_ready(drdy.clone());
            bus.set_register(Register::CtrlReg3, 0x04);
            bus.complete_conversion();
            assert!(drdy.level());

            let events = TestEvents::new();
            let (mut acquisition, mut ready) = setup(&bus, &drdy, &events);
            acquisition.initialize().await.unwrap();
            assert!(!drdy.level());
            assert!(!events.peek().contains(Events::DATA_READY));

            bus.push_sample(-4000, -170);
            let outcome = cycle(&mut acquisition, &mut ready).await;
            assert_reading(outcome, 26.5, 20.0);
        });
    }

    #[test]
    fn test_uncalibrated_session_refuses_without_bus_traffic() {
        block_on(async {
            let drdy = TestPin::new(false);
            let flat = flat_humidity();
            let bus = FakeHts221::with_calibration(&flat).with_data_ready(drdy.clone());
            let events = TestEvents::new();
            let (mut acquisition, mut ready) = setup(&bus, &drdy, &events);

            let result = acquisition.initialize().await;
            assert!(matches!(
                result,
                Err(AcquisitionError::Sensor(Hts221Error::InvalidCalibration(
                    InvalidCalibration::Humidity
                )))
            ));
            bus.take_transactions();

            let outcome = cycle(&mut acquisition, &mut ready).await;
            assert!(matches!(
                outcome,
                Err(AcquisitionError::Sensor(Hts221Error::NotCalibrated))
            ));
            assert!(bus.take_transactions().is_empty());
            assert_eq!(0, bus.one_shots());
            assert!(!events.peek().contains(Events::LED_BLINK));
        });
    }

    #[test]
    fn test_run_notifies_signal() {
        block_on(async {
            let drdy = TestPin::new(false);
            let bus = FakeHts221::new().with_data_ready(drdy.clone());
            let events = TestEvents::new();
            let (mut acquisition, mut ready) = setup(&bus, &drdy, &events);
            acquisition.initialize().await.unwrap();
            bus.push_sample(-4000, -170);

            let readings = Signal::<CriticalSectionRawMutex, Outcome>::new();
            let trigger = acquisition.trigger();
            let scenario = async {
                pause().await;
                trigger.request();
                readings.wait().await
            };
            let outcome = match select(join(ready.run(), acquisition.run(&readings)), scenario).await
            {
                Either::First(_) => panic!("acquisition stopped"),
                Either::Second(outcome) => outcome,
            };
            assert_reading(outcome, 26.5, 20.0);
        });
    }

    #[test]
    fn test_button_to_reading_pipeline() {
        block_on(async {
            let drdy = TestPin::new(false);
            let bus = FakeHts221::new().with_data_ready(drdy.clone());
            let events = TestEvents::new();
            let (mut acquisition, mut ready) = setup(&bus, &drdy, &events);
            acquisition.initialize().await.unwrap();
            bus.push_sample(9000, 460);

            let button_pin = TestPin::new(true);
            let mut button = ButtonTrigger::new(
                Button::<_, ActiveLow>::new(button_pin.clone()),
                acquisition.trigger(),
            );
            let led = TestLed::new();
            let mut blinker = Blinker::new(
                Led::<_, ActiveHigh>::new(led.clone()),
                &events,
                BlinkerConfig {
                    duration: Duration::from_millis(10),
                },
            );
            let readings = Channel::<CriticalSectionRawMutex, Outcome, 2>::new();

            let tasks = join4(
                button.run(),
                ready.run(),
                blinker.run(),
                acquisition.run(&readings),
            );
            let scenario = async {
                pause().await;
                button_pin.set_low();
                let outcome = readings.receive().await;
                Timer::after(Duration::from_millis(40)).await;
                outcome
            };
            let outcome = match select(tasks, scenario).await {
                Either::First(_) => panic!("pipeline stopped"),
                Either::Second(outcome) => outcome,
            };

            assert_reading(outcome, 86.5, 70.0);
            assert_eq!(2, led.changes());
            assert!(!led.is_high());
            assert_eq!(1, bus.one_shots());
        });
    }

    fn flat_humidity() -> RawCalibration {
        RawCalibration {
            h1_t0_out: CALIBRATION.h0_t0_out,
            ..CALIBRATION
        }
    }
}
