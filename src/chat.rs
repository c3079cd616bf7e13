use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::models::{Id, MessageWithSender};

/// Buffered messages per channel before slow subscribers start lagging.
const CHANNEL_CAPACITY: usize = 64;

/// Fan-out hub for the live chat feed: one broadcast channel per walk
/// request, created on first subscribe and dropped once the last
/// subscriber disconnects. History stays in the repository; this only
/// carries new inserts.
#[derive(Default)]
pub struct ChatBroker {
    channels: DashMap<Id, broadcast::Sender<MessageWithSender>>,
}

impl ChatBroker {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    pub fn subscribe(&self, request_id: Id) -> broadcast::Receiver<MessageWithSender> {
        self.channels
            .entry(request_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Deliver a freshly appended message to live subscribers. A send
    /// with nobody listening is not an error; it just lets us garbage
    /// collect the channel.
    pub fn publish(&self, message: &MessageWithSender) {
        let request_id = message.message.request_id;
        let dead = match self.channels.get(&request_id) {
            Some(tx) => tx.send(message.clone()).is_err(),
            None => return,
        };
        if dead {
            self.channels
                .remove_if(&request_id, |_, tx| tx.receiver_count() == 0);
        }
    }

    pub fn subscriber_count(&self, request_id: Id) -> usize {
        self.channels
            .get(&request_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}
