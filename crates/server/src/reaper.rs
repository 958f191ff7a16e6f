//! Inactivity reaper
//!
//! Periodically evicts participants whose last heartbeat is older than the
//! staleness threshold, announcing each departure before deleting them.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::Result;
use crate::models::{Message, LEAVE_TEXT};
use crate::store::ChatStore;

/// What one sweep cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Names a departure event was emitted for
    pub evicted: Vec<String>,
    /// Rows removed by the bulk delete
    pub removed: u64,
}

#[derive(Clone)]
pub struct Reaper {
    store: Arc<dyn ChatStore>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
}

impl Reaper {
    pub fn new(store: Arc<dyn ChatStore>, clock: Arc<dyn Clock>, stale_after: Duration) -> Self {
        Self {
            store,
            clock,
            stale_after,
        }
    }

    /// Run one sweep cycle.
    ///
    /// If emitting a departure event fails, the remaining events and the
    /// bulk delete are skipped; those participants are retried next cycle.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let stale_ms = i64::try_from(self.stale_after.as_millis()).unwrap_or(i64::MAX);
        let cutoff = self.clock.now_ms().saturating_sub(stale_ms);

        let stale = self.store.stale_participants(cutoff).await?;
        if stale.is_empty() {
            debug!("[Reaper] nothing to sweep");
            return Ok(SweepReport::default());
        }

        let mut report = SweepReport::default();
        for participant in stale {
            let left = Message::status(
                Uuid::new_v4().to_string(),
                &participant.name,
                LEAVE_TEXT,
                self.clock.time_label(),
            );
            self.store.insert_message(&left).await?;
            info!("[Reaper] {} left the room", participant.name);
            report.evicted.push(participant.name);
        }

        report.removed = self.store.delete_stale_participants(cutoff).await?;
        Ok(report)
    }

    /// Sweep every `interval` until `shutdown` flips to `true` or its sender drops.
    pub fn spawn(self, interval: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;

            info!(
                "[Reaper] sweeping every {:?} (stale after {:?})",
                interval, self.stale_after
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.sweep().await {
                            Ok(report) if report.removed > 0 => {
                                info!("[Reaper] removed {} inactive participants", report.removed);
                            }
                            Ok(_) => {}
                            Err(e) => error!("[Reaper] sweep failed: {}", e),
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("[Reaper] stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ChatError;
    use crate::models::{MessageType, Participant, PUBLIC_RECIPIENT};
    use crate::presence::PresenceTracker;
    use crate::store::{DeleteOutcome, MemoryStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Memory store whose message inserts start failing after `budget` calls,
    /// and which can land a heartbeat right before the bulk delete runs.
    struct ScriptedStore {
        inner: MemoryStore,
        budget: AtomicUsize,
        touch_before_delete: Option<(String, i64)>,
    }

    impl ScriptedStore {
        fn new(budget: usize) -> Self {
            Self {
                inner: MemoryStore::new(),
                budget: AtomicUsize::new(budget),
                touch_before_delete: None,
            }
        }
    }

    #[async_trait]
    impl ChatStore for ScriptedStore {
        async fn insert_participant(&self, p: &Participant) -> Result<()> {
            self.inner.insert_participant(p).await
        }
        async fn touch_participant(&self, name: &str, at: i64) -> Result<bool> {
            self.inner.touch_participant(name, at).await
        }
        async fn participant_exists(&self, name: &str) -> Result<bool> {
            self.inner.participant_exists(name).await
        }
        async fn list_participants(&self) -> Result<Vec<Participant>> {
            self.inner.list_participants().await
        }
        async fn stale_participants(&self, cutoff: i64) -> Result<Vec<Participant>> {
            self.inner.stale_participants(cutoff).await
        }
        async fn delete_stale_participants(&self, cutoff: i64) -> Result<u64> {
            if let Some((name, at)) = &self.touch_before_delete {
                self.inner.touch_participant(name, *at).await?;
            }
            self.inner.delete_stale_participants(cutoff).await
        }
        async fn insert_message(&self, m: &Message) -> Result<()> {
            let left = self.budget.load(Ordering::SeqCst);
            if left == 0 {
                return Err(ChatError::Store("disk full".into()));
            }
            self.budget.store(left - 1, Ordering::SeqCst);
            self.inner.insert_message(m).await
        }
        async fn list_messages(&self) -> Result<Vec<Message>> {
            self.inner.list_messages().await
        }
        async fn delete_message_if_owned(&self, id: &str, owner: &str) -> Result<DeleteOutcome> {
            self.inner.delete_message_if_owned(id, owner).await
        }
        async fn close(&self) {}
    }

    fn setup() -> (Reaper, PresenceTracker, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(100_000));
        let reaper = Reaper::new(store.clone(), clock.clone(), Duration::from_secs(10));
        let presence = PresenceTracker::new(store.clone(), clock.clone());
        (reaper, presence, store, clock)
    }

    fn departures(messages: &[Message]) -> Vec<&str> {
        messages
            .iter()
            .filter(|m| m.text == LEAVE_TEXT)
            .map(|m| m.from.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_stale_participant_is_evicted_once() {
        let (reaper, presence, store, clock) = setup();
        presence.register("Ana").await.unwrap();
        clock.advance_ms(10_001);

        let report = reaper.sweep().await.unwrap();
        assert_eq!(report.evicted, vec!["Ana".to_string()]);
        assert_eq!(report.removed, 1);
        assert!(presence.list().await.unwrap().is_empty());

        let messages = store.list_messages().await.unwrap();
        let last = messages.last().unwrap();
        assert_eq!(last.from, "Ana");
        assert_eq!(last.to, PUBLIC_RECIPIENT);
        assert_eq!(last.message_type, MessageType::Status);

        // A second sweep finds nobody left to announce.
        assert_eq!(reaper.sweep().await.unwrap(), SweepReport::default());
        assert_eq!(departures(&store.list_messages().await.unwrap()), vec!["Ana"]);
    }

    #[tokio::test]
    async fn test_participant_at_threshold_survives() {
        let (reaper, presence, _, clock) = setup();
        presence.register("Ana").await.unwrap();
        clock.advance_ms(10_000);

        assert!(reaper.sweep().await.unwrap().evicted.is_empty());
        assert_eq!(presence.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_heartbeat_keeps_participant() {
        let (reaper, presence, store, clock) = setup();
        presence.register("Ana").await.unwrap();
        presence.register("Bob").await.unwrap();
        clock.advance_ms(8_000);
        presence.heartbeat("Bob").await.unwrap();
        clock.advance_ms(8_000);

        let report = reaper.sweep().await.unwrap();
        assert_eq!(report.evicted, vec!["Ana".to_string()]);
        let names: Vec<_> = presence
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Bob".to_string()]);
        assert_eq!(departures(&store.list_messages().await.unwrap()), vec!["Ana"]);
    }

    #[tokio::test]
    async fn test_emission_failure_skips_delete() {
        let store = Arc::new(ScriptedStore::new(0));
        let clock = Arc::new(ManualClock::new(0));
        store.insert_participant(&Participant::new("Ana", 0)).await.unwrap();
        store.insert_participant(&Participant::new("Bob", 0)).await.unwrap();
        clock.set_ms(60_000);

        let reaper = Reaper::new(store.clone(), clock.clone(), Duration::from_secs(10));
        let err = reaper.sweep().await.unwrap_err();
        assert!(matches!(err, ChatError::Store(_)));
        assert_eq!(store.list_participants().await.unwrap().len(), 2);

        // Next cycle retries once the store recovers.
        store.budget.store(10, Ordering::SeqCst);
        let report = reaper.sweep().await.unwrap();
        assert_eq!(report.removed, 2);
        assert_eq!(store.list_messages().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_heartbeat_during_sweep_keeps_participant() {
        let clock = Arc::new(ManualClock::new(0));
        let mut scripted = ScriptedStore::new(usize::MAX);
        // Ana heartbeats after the stale snapshot was taken, before the delete.
        scripted.touch_before_delete = Some(("Ana".to_string(), 20_000));
        let store = Arc::new(scripted);
        store.insert_participant(&Participant::new("Ana", 0)).await.unwrap();
        clock.set_ms(20_000);

        let reaper = Reaper::new(store.clone(), clock, Duration::from_secs(10));
        let report = reaper.sweep().await.unwrap();

        assert_eq!(report.evicted, vec!["Ana".to_string()]);
        assert_eq!(report.removed, 0);
        assert_eq!(
            store.list_participants().await.unwrap(),
            vec![Participant::new("Ana", 20_000)]
        );
        assert_eq!(departures(&store.list_messages().await.unwrap()), vec!["Ana"]);
    }

    #[tokio::test]
    async fn test_spawned_reaper_sweeps_and_stops() {
        let (reaper, presence, _, clock) = setup();
        presence.register("Ana").await.unwrap();
        clock.advance_ms(20_000);

        let (tx, rx) = watch::channel(false);
        let handle = reaper.spawn(Duration::from_millis(10), rx);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(presence.list().await.unwrap().is_empty());

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
