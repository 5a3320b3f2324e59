use super::types::LoaderEvent;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::trace;

/// Event subscriber handle
pub struct EventSubscriber {
    receiver: broadcast::Receiver<LoaderEvent>,
    kinds: Option<Vec<&'static str>>,
}

impl EventSubscriber {
    fn new(receiver: broadcast::Receiver<LoaderEvent>, kinds: Option<Vec<&'static str>>) -> Self {
        Self { receiver, kinds }
    }

    fn wants(&self, event: &LoaderEvent) -> bool {
        match self.kinds {
            Some(ref kinds) => kinds.contains(&event.kind.as_str()),
            None => true,
        }
    }

    /// Receive the next event matching the filter
    pub async fn recv(&mut self) -> Result<LoaderEvent> {
        loop {
            let event = self.receiver.recv().await?;
            if self.wants(&event) {
                return Ok(event);
            }
        }
    }

    /// Try to receive without blocking
    pub fn try_recv(&mut self) -> Result<Option<LoaderEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.wants(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Broadcasts loader progress to any number of listeners
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<LoaderEvent>,
    stats: Arc<RwLock<EventBusStats>>,
    event_history: Arc<RwLock<Vec<LoaderEvent>>>,
    max_history_size: usize,
}

#[derive(Debug, Default, Clone)]
pub struct EventBusStats {
    pub total_events: u64,
    pub events_by_kind: HashMap<&'static str, u64>,
    pub subscriber_count: usize,
    pub dropped_events: u64,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);

        Self {
            sender,
            stats: Arc::new(RwLock::new(EventBusStats::default())),
            event_history: Arc::new(RwLock::new(Vec::new())),
            max_history_size: 500,
        }
    }

    pub async fn publish(&self, event: LoaderEvent) {
        trace!("Publishing loader event: {}", event.kind.as_str());

        {
            let mut stats = self.stats.write().await;
            stats.total_events += 1;
            *stats.events_by_kind.entry(event.kind.as_str()).or_insert(0) += 1;
        }

        {
            let mut history = self.event_history.write().await;
            history.push(event.clone());
            if history.len() > self.max_history_size {
                let excess = history.len() - self.max_history_size;
                history.drain(0..excess);
            }
        }

        if self.sender.send(event).is_err() {
            // No subscribers is normal
            self.stats.write().await.dropped_events += 1;
        }
    }

    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber::new(self.sender.subscribe(), None)
    }

    /// Subscribe to specific event kinds, e.g. `"image.appended"`
    pub fn subscribe_to(&self, kinds: Vec<&'static str>) -> EventSubscriber {
        EventSubscriber::new(self.sender.subscribe(), Some(kinds))
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub async fn get_stats(&self) -> EventBusStats {
        let mut stats = self.stats.read().await.clone();
        stats.subscriber_count = self.subscriber_count();
        stats
    }

    /// Recent events, oldest first
    pub async fn get_history(&self) -> Vec<LoaderEvent> {
        self.event_history.read().await.clone()
    }

    pub async fn clear_history(&self) {
        self.event_history.write().await.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::constants::EVENT_BUS_CAPACITY)
    }
}
