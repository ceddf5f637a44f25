//! Periodic player-count refresh.

use crate::catalogue::TournamentId;
use crate::registration::RegistrationEngine;
use crate::store::Store;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::RwLock, task::JoinHandle, time::MissedTickBehavior};

/// Default refresh interval
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Background task refreshing every catalogue tournament's player count.
///
/// The first refresh runs immediately. Stopping (or dropping) the refresher
/// cancels the task; no further store calls are scheduled after that.
pub struct PlayerCountRefresher {
    counts: Arc<RwLock<HashMap<TournamentId, u64>>>,
    task: JoinHandle<()>,
}

impl PlayerCountRefresher {
    /// Start refreshing. Must be called within a Tokio runtime.
    pub fn spawn<S>(engine: RegistrationEngine<S>, interval: Duration) -> Self
    where
        S: Store + 'static,
    {
        let counts = Arc::new(RwLock::new(HashMap::new()));
        let shared = Arc::clone(&counts);
        let ids = engine.catalogue().ids();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let fresh = engine.player_counts(&ids).await;
                log::debug!("Refreshed player counts for {} tournaments", fresh.len());
                *shared.write().await = fresh;
            }
        });

        Self { counts, task }
    }

    /// Latest known counts
    pub async fn snapshot(&self) -> HashMap<TournamentId, u64> {
        self.counts.read().await.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel the refresh task
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for PlayerCountRefresher {
    fn drop(&mut self) {
        self.task.abort();
    }
}
