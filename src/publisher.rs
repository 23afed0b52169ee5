//! In-process publish/subscribe.
//!
//! An [`EventManager`] maps each [`EventType`] to an ordered list of
//! subscribers. Publishing calls every subscriber of the event's type on the
//! calling thread, in subscription order.
//!
//! Register subscribers before handing the manager to a server. After that it
//! is shared read-only, so there is no locking on the publish path.

use std::collections::HashMap;
use std::fmt;

use crate::{
    Event, EventType,
    error::{BoxError, SubscriberError},
};

type Subscriber = Box<dyn Fn(&Event) -> Result<(), BoxError> + Send + Sync>;

/// What a subscriber callback may return.
///
/// Plain callbacks return `()`. Fallible ones return `Result<(), E>`; an `Err`
/// stops the fan-out and is reported by [`EventManager::publish`].
pub trait SubscriberOutput {
    fn into_result(self) -> Result<(), BoxError>;
}

impl SubscriberOutput for () {
    #[inline]
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E> SubscriberOutput for Result<(), E>
where
    E: Into<BoxError>,
{
    #[inline]
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// Subscription registry and publisher.
///
/// # Example
/// ```rust
/// use whatsapp_webhook_rs::{Event, EventManager, EventType};
/// use whatsapp_webhook_rs::event::ReadyEvent;
///
/// let mut events = EventManager::new();
/// events.subscribe(EventType::Ready, |_: &Event| println!("listening"));
/// events.subscribe(EventType::Ready, |_: &Event| -> Result<(), std::io::Error> {
///     Ok(())
/// });
///
/// events.publish(&Event::Ready(ReadyEvent::now())).unwrap();
/// ```
#[derive(Default)]
pub struct EventManager {
    subscribers: HashMap<EventType, Vec<Subscriber>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `callback` to the subscribers of `event_type`.
    ///
    /// Subscribing the same callback twice calls it twice.
    pub fn subscribe<F, R>(&mut self, event_type: EventType, callback: F) -> &mut Self
    where
        F: Fn(&Event) -> R + Send + Sync + 'static,
        R: SubscriberOutput,
    {
        self.subscribers
            .entry(event_type)
            .or_default()
            .push(Box::new(move |event| callback(event).into_result()));
        self
    }

    /// Delivers `event` to every subscriber of its type, in subscription order.
    ///
    /// No subscribers is a no-op. The first subscriber error stops delivery;
    /// later subscribers are not called.
    pub fn publish(&self, event: &Event) -> Result<(), SubscriberError> {
        let event_type = event.event_type();

        let Some(subscribers) = self.subscribers.get(&event_type) else {
            return Ok(());
        };

        for subscriber in subscribers {
            subscriber(event).map_err(|source| SubscriberError { event_type, source })?;
        }

        Ok(())
    }

    /// Number of subscribers for `event_type`.
    pub fn subscriber_count(&self, event_type: EventType) -> usize {
        self.subscribers.get(&event_type).map_or(0, Vec::len)
    }

    /// Whether anything is subscribed at all.
    pub fn is_empty(&self) -> bool {
        self.subscribers.values().all(Vec::is_empty)
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (event_type, subscribers) in &self.subscribers {
            map.entry(&event_type.as_str(), &subscribers.len());
        }
        map.finish()
    }
}
