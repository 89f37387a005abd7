use std::sync::Arc;

use crate::sequence::FractalRef;

/// Emitted once per detection, after the node was appended.
#[derive(Debug, Clone, Copy)]
pub struct FractalEvent<'a> {
    /// Index handed to `process`; at least `fractal.index()`.
    pub originating_index: usize,
    pub fractal: FractalRef<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Subscriber = Arc<dyn Fn(&FractalEvent<'_>) + Send + Sync>;

pub fn subscriber<F>(listener: F) -> Subscriber
where
    F: Fn(&FractalEvent<'_>) + Send + Sync + 'static,
{
    Arc::new(listener)
}

/// Listener registry. Dispatch follows registration order.
///
/// `notify` borrows the registry for the whole dispatch, so a listener can
/// neither unsubscribe nor touch the sequence while it runs.
#[derive(Default)]
pub struct Observable {
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl Observable {
    pub fn subscribe(&mut self, subscriber: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(x, _)| *x != id);
        self.subscribers.len() != before
    }

    pub fn notify(&self, event: &FractalEvent<'_>) {
        for (_, subscriber) in &self.subscribers {
            subscriber(event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::constant::Side;
    use crate::sequence::FractalSequence;

    #[test]
    fn notify_follows_registration_order_and_skips_removed() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut observable = Observable::default();

        let mut ids = Vec::new();
        for tag in ["a", "b", "c"] {
            let calls = Arc::clone(&calls);
            ids.push(observable.subscribe(subscriber(move |event| {
                calls
                    .lock()
                    .expect("calls mutex poisoned")
                    .push((tag, event.originating_index));
            })));
        }
        assert!(observable.unsubscribe(ids[1]));
        assert!(!observable.unsubscribe(ids[1]));
        assert_eq!(observable.len(), 2);

        let mut seq = FractalSequence::new();
        let id = seq.append(4, 1.0, Side::Low);
        let fractal = seq.get(id).expect("attached");
        observable.notify(&FractalEvent {
            originating_index: 6,
            fractal,
        });

        let calls = calls.lock().expect("calls mutex poisoned").clone();
        assert_eq!(calls, vec![("a", 6), ("c", 6)]);
    }

    #[test]
    fn subscription_ids_are_not_reused() {
        let mut observable = Observable::default();
        let first = observable.subscribe(subscriber(|_| {}));
        observable.unsubscribe(first);
        let second = observable.subscribe(subscriber(|_| {}));
        assert_ne!(first, second);
        assert!(!observable.is_empty());
    }
}
