//! Coalescing event flags shared between interrupt handlers and tasks.
//!
//! An [`EventFlags`] group is a bitmask. Posting sets bits and wakes every waiter; waiting
//! suspends until any bit of a mask is set. Bits are levels, not counts: posting the same event
//! twice before anyone observes it leaves a single pending event.

use core::cell::RefCell;
use core::future::poll_fn;
use core::ops::{BitOr, BitOrAssign};
use core::task::Poll;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::MultiWakerRegistration;

/// Number of tasks that may be suspended on the same group at once.
const MAX_WAITERS: usize = 4;

/// A set of event bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Events(u32);

impl Events {
    pub const NONE: Events = Events(0);
    /// A reading was requested by the user.
    pub const TRIGGER: Events = Events(1 << 0);
    /// The sensor signalled that a conversion completed.
    pub const DATA_READY: Events = Events(1 << 1);
    /// The visual indicator should blink once.
    pub const LED_BLINK: Events = Events(1 << 2);

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Events) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersection(self, other: Events) -> Events {
        Events(self.0 & other.0)
    }

    pub const fn difference(self, other: Events) -> Events {
        Events(self.0 & !other.0)
    }
}

impl BitOr for Events {
    type Output = Events;

    fn bitor(self, rhs: Self) -> Self::Output {
        Events(self.0 | rhs.0)
    }
}

impl BitOrAssign for Events {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

struct State {
    events: Events,
    waiters: MultiWakerRegistration<MAX_WAITERS>,
}

/// A bitmask event group.
///
/// `post` never blocks and may be called from interrupt context, provided the raw mutex `M`
/// is interrupt-safe (e.g. `CriticalSectionRawMutex`).
pub struct EventFlags<M: RawMutex> {
    state: Mutex<M, RefCell<State>>,
}

impl<M: RawMutex> EventFlags<M> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(State {
                events: Events::NONE,
                waiters: MultiWakerRegistration::new(),
            })),
        }
    }

    /// Set `events` and wake all waiters.
    pub fn post(&self, events: Events) {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            state.events |= events;
            state.waiters.wake();
        })
    }

    /// Mask off `events`.
    pub fn clear(&self, events: Events) {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            state.events = state.events.difference(events);
        })
    }

    /// Currently pending events.
    pub fn peek(&self) -> Events {
        self.state.lock(|state| state.borrow().events)
    }

    /// Suspend until any event in `mask` is pending and return the pending subset of `mask`.
    ///
    /// The returned events stay pending; callers clear them explicitly.
    pub async fn wait_any(&self, mask: Events) -> Events {
        poll_fn(|cx| {
            self.state.lock(|state| {
                let mut state = state.borrow_mut();
                let pending = state.events.intersection(mask);
                if pending.is_empty() {
                    state.waiters.register(cx.waker());
                    Poll::Pending
                } else {
                    Poll::Ready(pending)
                }
            })
        })
        .await
    }
}

impl<M: RawMutex> Default for EventFlags<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::select::{select, Either};
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_time::{Duration, Timer};
    use futures::executor::block_on;

    type Flags = EventFlags<CriticalSectionRawMutex>;

    #[test]
    fn posts_coalesce() {
        let flags = Flags::new();
        flags.post(Events::TRIGGER);
        flags.post(Events::TRIGGER);
        assert_eq!(Events::TRIGGER, flags.peek());

        flags.clear(Events::TRIGGER);
        assert!(flags.peek().is_empty());
    }

    #[test]
    fn clear_only_masks_requested_bits() {
        let flags = Flags::new();
        flags.post(Events::TRIGGER | Events::LED_BLINK);
        flags.clear(Events::TRIGGER | Events::DATA_READY);
        assert_eq!(Events::LED_BLINK, flags.peek());
    }

    #[test]
    fn wait_returns_pending_subset_without_consuming() {
        let flags = Flags::new();
        flags.post(Events::DATA_READY | Events::LED_BLINK);

        let woken = block_on(flags.wait_any(Events::TRIGGER | Events::DATA_READY));
        assert_eq!(Events::DATA_READY, woken);
        assert!(flags.peek().contains(Events::DATA_READY | Events::LED_BLINK));
    }

    #[test]
    fn wait_suspends_until_posted() {
        let flags = Flags::new();
        block_on(async {
            let poster = async {
                Timer::after(Duration::from_millis(20)).await;
                flags.post(Events::LED_BLINK);
                flags.post(Events::TRIGGER);
                Timer::after(Duration::from_secs(5)).await;
            };
            match select(flags.wait_any(Events::TRIGGER), poster).await {
                Either::First(events) => assert_eq!(Events::TRIGGER, events),
                Either::Second(_) => panic!("waiter was never woken"),
            }
        });
    }

    #[test]
    fn unrelated_events_do_not_wake() {
        let flags = Flags::new();
        block_on(async {
            flags.post(Events::LED_BLINK);
            let timeout = Timer::after(Duration::from_millis(30));
            match select(flags.wait_any(Events::DATA_READY), timeout).await {
                Either::First(_) => panic!("woken by an unrelated event"),
                Either::Second(_) => {}
            }
        });
    }
}
