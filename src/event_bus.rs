//! Synchronous publish/subscribe dispatch keyed by [`EventName`].
//!
//! Every event has two channels: a zero-argument one and a single-integer one.
//! Callbacks run in registration order on the publishing thread. Publishing
//! iterates over a snapshot of the subscriber list, so a callback may publish,
//! subscribe or unsubscribe freely; such changes take effect from the next
//! publish onwards.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info, trace};

#[repr(usize)]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum EventName {
    StartFade,
    FadeDone,
}

impl EventName {
    pub const COUNT: usize = 2;
    pub const ALL: [EventName; Self::COUNT] = [EventName::StartFade, EventName::FadeDone];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventName::StartFade => f.write_str("StartFade"),
            EventName::FadeDone => f.write_str("FadeDone"),
        }
    }
}

/// Which shape of callback a registration belongs to.
#[repr(usize)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Channel {
    Unit,
    Int,
}

impl Channel {
    const COUNT: usize = 2;
}

/// Value delivered to a callback.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Payload {
    Unit,
    Int(i32),
}

impl Payload {
    pub fn channel(self) -> Channel {
        match self {
            Payload::Unit => Channel::Unit,
            Payload::Int(_) => Channel::Int,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct SubscriptionId(u64);

type Callback = Rc<dyn Fn(Payload)>;

struct Subscriber {
    id: SubscriptionId,
    callback: Callback,
}

pub struct EventBus {
    registry: RefCell<[[Vec<Subscriber>; Channel::COUNT]; EventName::COUNT]>,
    next_id: Cell<u64>,
    log_missing: Cell<bool>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(Default::default()),
            next_id: Cell::new(0),
            log_missing: Cell::new(true),
        }
    }

    /// Enables or disables the diagnostic logged when an event has no listeners.
    pub fn set_log_missing(&self, enabled: bool) {
        self.log_missing.set(enabled);
    }

    /// Registers a zero-argument callback.
    ///
    /// There is no duplicate protection: every call must be paired with
    /// exactly one [`EventBus::unsubscribe`].
    pub fn subscribe(&self, name: EventName, callback: impl Fn() + 'static) -> SubscriptionId {
        self.register(name, Channel::Unit, Rc::new(move |_: Payload| callback()))
    }

    /// Registers a single-integer callback.
    pub fn subscribe_int(&self, name: EventName, callback: impl Fn(i32) + 'static) -> SubscriptionId {
        self.register(
            name,
            Channel::Int,
            Rc::new(move |payload: Payload| {
                if let Payload::Int(value) = payload {
                    callback(value)
                }
            }),
        )
    }

    fn register(&self, name: EventName, channel: Channel, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.registry.borrow_mut()[name.index()][channel as usize].push(Subscriber { id, callback });
        trace!(event = %name, ?channel, ?id, "subscribed");
        id
    }

    /// Removes the registration `id` from `name`. Returns false if it was not present.
    pub fn unsubscribe(&self, name: EventName, id: SubscriptionId) -> bool {
        let mut registry = self.registry.borrow_mut();
        for subscribers in registry[name.index()].iter_mut() {
            if let Some(pos) = subscribers.iter().position(|s| s.id == id) {
                subscribers.remove(pos);
                trace!(event = %name, ?id, "unsubscribed");
                return true;
            }
        }
        false
    }

    pub fn publish(&self, name: EventName) -> usize {
        self.dispatch(name, Payload::Unit, self.log_missing.get())
    }

    pub fn publish_int(&self, name: EventName, value: i32) -> usize {
        self.dispatch(name, Payload::Int(value), self.log_missing.get())
    }

    /// Like [`EventBus::publish`] but never logs a missing subscriber.
    pub fn publish_quiet(&self, name: EventName) -> usize {
        self.dispatch(name, Payload::Unit, false)
    }

    pub fn publish_int_quiet(&self, name: EventName, value: i32) -> usize {
        self.dispatch(name, Payload::Int(value), false)
    }

    fn dispatch(&self, name: EventName, payload: Payload, log_missing: bool) -> usize {
        // Borrow is released before any callback runs.
        let snapshot: Vec<Callback> = self.registry.borrow()[name.index()][payload.channel() as usize]
            .iter()
            .map(|s| Rc::clone(&s.callback))
            .collect();

        if snapshot.is_empty() {
            if log_missing {
                info!(
                    event = %name,
                    ?payload,
                    "attempted to trigger event but nothing is listening for it"
                );
            }
            return 0;
        }

        for callback in snapshot.iter() {
            callback(payload);
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self, name: EventName, channel: Channel) -> usize {
        self.registry.borrow()[name.index()][channel as usize].len()
    }

    /// Drops every registration on both channels of every event.
    pub fn clear(&self) {
        let mut registry = self.registry.borrow_mut();
        for name in EventName::ALL {
            for subscribers in registry[name.index()].iter_mut() {
                subscribers.clear();
            }
        }
        debug!("event bus cleared");
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        let mut map = f.debug_map();
        for name in EventName::ALL {
            let [unit, int] = &registry[name.index()];
            map.entry(&name, &(unit.len(), int.len()));
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<i32>>>, impl Fn(i32) + Clone + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |v: i32| sink.borrow_mut().push(v))
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(EventName::StartFade), 0);
        assert_eq!(bus.publish_int(EventName::FadeDone, 1), 0);
    }

    #[test]
    fn callbacks_run_in_registration_order() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..3 {
            let log = Rc::clone(&log);
            bus.subscribe_int(EventName::FadeDone, move |v| log.borrow_mut().push(v * 10 + tag));
        }
        assert_eq!(bus.publish_int(EventName::FadeDone, 1), 3);
        assert_eq!(*log.borrow(), vec![10, 11, 12]);
    }

    #[test]
    fn channels_are_independent() {
        let bus = EventBus::new();
        let (log, record) = recorder();
        bus.subscribe_int(EventName::StartFade, record);
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        bus.subscribe(EventName::StartFade, move || counter.set(counter.get() + 1));

        bus.publish(EventName::StartFade);
        assert_eq!(hits.get(), 1);
        assert!(log.borrow().is_empty());

        bus.publish_int(EventName::StartFade, -1);
        assert_eq!(hits.get(), 1);
        assert_eq!(*log.borrow(), vec![-1]);
    }

    #[test]
    fn unsubscribe_removes_only_the_matching_registration() {
        let bus = EventBus::new();
        let (log, record) = recorder();
        let first = bus.subscribe_int(EventName::FadeDone, record.clone());
        bus.subscribe_int(EventName::FadeDone, record);

        assert!(bus.unsubscribe(EventName::FadeDone, first));
        assert!(!bus.unsubscribe(EventName::FadeDone, first));
        assert!(!bus.unsubscribe(EventName::StartFade, first));

        bus.publish_int(EventName::FadeDone, 7);
        assert_eq!(*log.borrow(), vec![7]);
    }

    #[test]
    fn callback_may_unsubscribe_itself_during_publish() {
        let bus = Rc::new(EventBus::new());
        let hits = Rc::new(Cell::new(0));
        let slot: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));

        let id = {
            let bus_ref = Rc::downgrade(&bus);
            let hits = Rc::clone(&hits);
            let slot = Rc::clone(&slot);
            bus.subscribe(EventName::StartFade, move || {
                hits.set(hits.get() + 1);
                if let (Some(bus), Some(id)) = (bus_ref.upgrade(), slot.get()) {
                    bus.unsubscribe(EventName::StartFade, id);
                }
            })
        };
        slot.set(Some(id));

        assert_eq!(bus.publish(EventName::StartFade), 1);
        assert_eq!(bus.publish(EventName::StartFade), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn nested_publish_reaches_other_event() {
        let bus = Rc::new(EventBus::new());
        let (log, record) = recorder();
        bus.subscribe_int(EventName::FadeDone, record);
        let weak = Rc::downgrade(&bus);
        bus.subscribe_int(EventName::StartFade, move |v| {
            if let Some(bus) = weak.upgrade() {
                bus.publish_int(EventName::FadeDone, v * 2);
            }
        });

        bus.publish_int(EventName::StartFade, 3);
        assert_eq!(*log.borrow(), vec![6]);
    }

    #[test]
    fn subscription_added_during_publish_misses_current_dispatch() {
        let bus = Rc::new(EventBus::new());
        let (log, record) = recorder();
        let weak = Rc::downgrade(&bus);
        bus.subscribe_int(EventName::FadeDone, move |_| {
            if let Some(bus) = weak.upgrade() {
                bus.subscribe_int(EventName::FadeDone, record.clone());
            }
        });

        assert_eq!(bus.publish_int(EventName::FadeDone, 1), 1);
        assert!(log.borrow().is_empty());
        assert_eq!(bus.publish_int(EventName::FadeDone, 2), 2);
        assert_eq!(*log.borrow(), vec![2]);
    }

    /// Collects everything a `fmt` subscriber writes.
    #[derive(Clone, Default)]
    struct SharedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for SharedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedLog {
        fn take(&self) -> String {
            String::from_utf8(std::mem::take(&mut *self.0.lock().unwrap())).unwrap()
        }
    }

    const MISSING: &str = "nothing is listening";

    #[test]
    fn missing_listener_message_can_be_switched_off() {
        let log = SharedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let bus = EventBus::new();

            bus.publish_int(EventName::FadeDone, -1);
            let out = log.take();
            assert!(out.contains(MISSING), "expected diagnostic, got {out:?}");
            assert!(out.contains("FadeDone"));

            bus.publish_quiet(EventName::StartFade);
            bus.publish_int_quiet(EventName::StartFade, 1);
            assert!(!log.take().contains(MISSING));

            bus.set_log_missing(false);
            bus.publish(EventName::StartFade);
            bus.publish_int(EventName::FadeDone, 1);
            assert!(!log.take().contains(MISSING));

            bus.set_log_missing(true);
            bus.publish(EventName::StartFade);
            assert!(log.take().contains(MISSING));
        });
    }

    #[test]
    fn clear_drops_everything() {
        let bus = EventBus::new();
        bus.subscribe(EventName::StartFade, || {});
        bus.subscribe_int(EventName::StartFade, |_| {});
        bus.subscribe_int(EventName::FadeDone, |_| {});
        bus.clear();
        for name in EventName::ALL {
            assert_eq!(bus.subscriber_count(name, Channel::Unit), 0);
            assert_eq!(bus.subscriber_count(name, Channel::Int), 0);
        }
    }
}
