//! Simulated SMS delivery.
//!
//! Every created message is handed to a background worker which waits one
//! page duration per 160 characters and then settles the message on a random
//! terminal status.
//!
//! # Ownership
//!
//! ```text
//! DeliveryHandle (cloned into app state)
//!     │  unbounded mpsc
//!     ▼
//! worker task ──► JoinSet of in-flight timers ──► MessageStore::finalize_status
//!     ▲
//! CancellationToken (graceful shutdown)
//! ```
//!
//! Cancelling aborts in-flight timers and their messages stay `pending`.
//! Dropping every handle lets the worker drain in-flight jobs and exit.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sms_manager_core::{MessageId, MessageStatus};

use crate::db::MessageStore;
use crate::models::Message;

/// A message waiting for its simulated delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryJob {
    pub message_id: MessageId,
    pub pages: u32,
}

impl From<&Message> for DeliveryJob {
    fn from(message: &Message) -> Self {
        Self {
            message_id: message.id,
            pages: message.body.pages(),
        }
    }
}

impl DeliveryJob {
    /// One `page` per 160 characters of body.
    #[must_use]
    pub const fn delay(&self, page: Duration) -> Duration {
        page.saturating_mul(self.pages)
    }
}

/// Enqueue side of the delivery worker.
#[derive(Clone, Debug)]
pub struct DeliveryHandle {
    tx: mpsc::UnboundedSender<DeliveryJob>,
}

impl DeliveryHandle {
    /// Queue `message` for delivery. Never blocks.
    pub fn schedule(&self, message: &Message) {
        let job = DeliveryJob::from(message);
        if self.tx.send(job).is_err() {
            warn!(
                message_id = %job.message_id,
                "delivery worker has stopped, message stays pending"
            );
        }
    }
}

/// Background worker that finalises message statuses.
pub struct DeliverySimulator {
    messages: Arc<dyn MessageStore>,
    page: Duration,
    rng: StdRng,
    jobs: mpsc::UnboundedReceiver<DeliveryJob>,
    cancel: CancellationToken,
}

impl DeliverySimulator {
    /// Start the worker.
    ///
    /// Returns the enqueue handle and the worker's join handle.
    #[must_use]
    pub fn spawn(
        messages: Arc<dyn MessageStore>,
        page: Duration,
        cancel: CancellationToken,
    ) -> (DeliveryHandle, JoinHandle<()>) {
        Self::spawn_with_rng(messages, page, cancel, StdRng::from_os_rng())
    }

    /// Start the worker with a caller-supplied random source.
    #[must_use]
    pub fn spawn_with_rng(
        messages: Arc<dyn MessageStore>,
        page: Duration,
        cancel: CancellationToken,
        rng: StdRng,
    ) -> (DeliveryHandle, JoinHandle<()>) {
        let (tx, jobs) = mpsc::unbounded_channel();
        let worker = Self {
            messages,
            page,
            rng,
            jobs,
            cancel,
        };
        (DeliveryHandle { tx }, tokio::spawn(worker.run()))
    }

    async fn run(mut self) {
        let mut in_flight = JoinSet::new();
        info!(page = ?self.page, "delivery worker started");

        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    let aborted = in_flight.len();
                    in_flight.shutdown().await;
                    info!(aborted, "delivery worker cancelled");
                    return;
                }

                job = self.jobs.recv() => {
                    let Some(job) = job else { break };
                    self.start(&mut in_flight, job);
                }

                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_join_failure(result);
                }
            }
        }

        // Every handle dropped: finish what is already scheduled.
        debug!(remaining = in_flight.len(), "delivery queue closed, draining");
        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    in_flight.shutdown().await;
                    break;
                }

                result = in_flight.join_next() => match result {
                    Some(result) => log_join_failure(result),
                    None => break,
                },
            }
        }
        info!("delivery worker stopped");
    }

    fn start(&mut self, in_flight: &mut JoinSet<()>, job: DeliveryJob) {
        let status = MessageStatus::TERMINAL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(MessageStatus::Delivered);
        let delay = job.delay(self.page);
        let messages = Arc::clone(&self.messages);

        debug!(message_id = %job.message_id, ?delay, %status, "delivery scheduled");

        in_flight.spawn(async move {
            tokio::time::sleep(delay).await;
            match messages.finalize_status(job.message_id, status).await {
                Ok(true) => debug!(message_id = %job.message_id, %status, "message delivered"),
                Ok(false) => debug!(
                    message_id = %job.message_id,
                    "message no longer pending, status left unchanged"
                ),
                Err(e) => warn!(
                    message_id = %job.message_id,
                    error = %e,
                    "failed to persist delivery status"
                ),
            }
        });
    }
}

fn log_join_failure(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result
        && e.is_panic()
    {
        warn!(error = %e, "delivery task panicked");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sms_manager_core::{MessageBody, PersonName, PhoneNumber};

    use super::*;
    use crate::db::{ContactStore, MemoryStore};
    use crate::models::{NewContact, NewMessage};

    async fn pending_message(store: &MemoryStore, text: &str) -> Message {
        let mut ids = Vec::new();
        for (name, number) in [("Alice", "08011111111"), ("Bob", "08022222222")] {
            let (contact, _) = store
                .find_or_create(NewContact {
                    firstname: PersonName::parse(name).unwrap(),
                    lastname: None,
                    number: PhoneNumber::parse(number).unwrap(),
                })
                .await
                .unwrap();
            ids.push(contact.id);
        }
        MessageStore::create(
            store,
            NewMessage {
                sender_id: ids[0],
                receiver_id: ids[1],
                body: MessageBody::parse(text).unwrap(),
            },
        )
        .await
        .unwrap()
    }

    async fn status_of(store: &MemoryStore, id: MessageId) -> MessageStatus {
        store.find(id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_job_delay_is_per_page() {
        let store = MemoryStore::new();
        let page = Duration::from_millis(1000);

        for (length, expected_secs) in [(1, 1), (160, 1), (161, 2), (918, 6)] {
            let message = pending_message(&store, &"a".repeat(length)).await;
            let job = DeliveryJob::from(&message);
            assert_eq!(job.delay(page), Duration::from_secs(expected_secs), "{length} chars");
        }
    }

    #[tokio::test]
    async fn test_scheduled_message_reaches_terminal_status() {
        let store = MemoryStore::new();
        let message = pending_message(&store, "hello").await;
        let cancel = CancellationToken::new();
        let (handle, worker) = DeliverySimulator::spawn_with_rng(
            Arc::new(store.clone()),
            Duration::from_millis(1),
            cancel.clone(),
            StdRng::seed_from_u64(7),
        );

        handle.schedule(&message);
        drop(handle);
        tokio::time::timeout(Duration::from_secs(5), worker)
            .await
            .unwrap()
            .unwrap();

        assert!(status_of(&store, message.id).await.is_terminal());
    }

    #[tokio::test]
    async fn test_cancel_leaves_in_flight_messages_pending() {
        let store = MemoryStore::new();
        let message = pending_message(&store, "slow one").await;
        let cancel = CancellationToken::new();
        let (handle, worker) = DeliverySimulator::spawn(
            Arc::new(store.clone()),
            Duration::from_secs(3600),
            cancel.clone(),
        );

        handle.schedule(&message);
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), worker)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(status_of(&store, message.id).await, MessageStatus::Pending);
    }

    #[tokio::test]
    async fn test_finalised_status_is_not_overwritten() {
        let store = MemoryStore::new();
        let message = pending_message(&store, "already settled").await;
        store
            .finalize_status(message.id, MessageStatus::Invalid)
            .await
            .unwrap();

        let (handle, worker) = DeliverySimulator::spawn(
            Arc::new(store.clone()),
            Duration::from_millis(1),
            CancellationToken::new(),
        );
        handle.schedule(&message);
        drop(handle);
        tokio::time::timeout(Duration::from_secs(5), worker)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(status_of(&store, message.id).await, MessageStatus::Invalid);
    }

    #[tokio::test]
    async fn test_schedule_after_worker_stopped_does_not_panic() {
        let store = MemoryStore::new();
        let message = pending_message(&store, "late").await;
        let cancel = CancellationToken::new();
        let (handle, worker) =
            DeliverySimulator::spawn(Arc::new(store.clone()), Duration::from_millis(1), cancel.clone());

        cancel.cancel();
        worker.await.unwrap();
        handle.schedule(&message);

        assert_eq!(status_of(&store, message.id).await, MessageStatus::Pending);
    }
}
