use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::audio::AudioChunk;

use super::messages::AudioChunkEvent;

/// Unique handle for one subscribed observer.
pub type ObserverId = Uuid;

/// Messages buffered per observer before the slow-consumer policy kicks in.
const OBSERVER_QUEUE_DEPTH: usize = 256;

struct Observer {
    sender: mpsc::Sender<String>,
    /// When set, only chunks from this participant are delivered.
    participant_filter: Option<String>,
}

/// Fan-out hub pushing each inbound chunk to all current observers.
///
/// Delivery is attempted independently per observer: a disconnected observer
/// is removed from the set (logged, never raised to the publisher), a full
/// queue drops that one message so ingestion and the remaining observers are
/// never slowed down.
#[derive(Clone, Default)]
pub struct BroadcastHub {
    observers: Arc<RwLock<HashMap<ObserverId, Observer>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer, optionally filtered to a single participant.
    /// Returns the observer's id and the receiving end of its event queue.
    pub async fn subscribe(
        &self,
        participant_filter: Option<String>,
    ) -> (ObserverId, mpsc::Receiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(OBSERVER_QUEUE_DEPTH);

        self.observers.write().await.insert(
            id,
            Observer {
                sender: tx,
                participant_filter,
            },
        );

        info!(observer = %id, "observer subscribed");
        (id, rx)
    }

    /// Narrow an existing observer to a single participant's chunks.
    pub async fn set_filter(&self, id: ObserverId, participant: Option<String>) {
        if let Some(observer) = self.observers.write().await.get_mut(&id) {
            observer.participant_filter = participant;
        }
    }

    /// Remove an observer. Idempotent: unsubscribing an unknown id is a no-op.
    pub async fn unsubscribe(&self, id: ObserverId) {
        if self.observers.write().await.remove(&id).is_some() {
            info!(observer = %id, "observer unsubscribed");
        }
    }

    pub async fn observer_count(&self) -> usize {
        self.observers.read().await.len()
    }

    /// Push one chunk to every matching observer.
    pub async fn publish(&self, chunk: &AudioChunk) {
        let event = AudioChunkEvent::from_chunk(chunk);
        let payload = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize audio chunk event: {}", e);
                return;
            }
        };

        let mut disconnected = Vec::new();
        {
            let observers = self.observers.read().await;
            for (id, observer) in observers.iter() {
                if let Some(filter) = &observer.participant_filter {
                    if filter != &chunk.participant_id {
                        continue;
                    }
                }

                match observer.sender.try_send(payload.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(
                            observer = %id,
                            participant = %chunk.participant_id,
                            "dropping audio chunk event for slow observer"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        disconnected.push(*id);
                    }
                }
            }
        }

        if !disconnected.is_empty() {
            let mut observers = self.observers.write().await;
            for id in disconnected {
                if observers.remove(&id).is_some() {
                    warn!(observer = %id, "removed disconnected observer during publish");
                }
            }
        }
    }
}
