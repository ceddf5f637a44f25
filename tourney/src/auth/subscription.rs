//! Live profile subscription backed by polling.

use super::models::UserProfile;
use crate::store::{Store, paths};
use futures_util::Stream;
use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::MissedTickBehavior,
};

const CHANNEL_CAPACITY: usize = 16;

/// Cancellable stream of profile snapshots.
///
/// A snapshot is delivered whenever the stored profile differs from the last
/// one delivered; the first one arrives as soon as the profile exists. The
/// poller stops on [`cancel`](Self::cancel) or when the subscription is
/// dropped.
pub struct ProfileSubscription {
    uid: String,
    rx: mpsc::Receiver<UserProfile>,
    task: JoinHandle<()>,
}

impl ProfileSubscription {
    /// Start polling `users/{uid}`. Must be called within a Tokio runtime.
    pub(crate) fn spawn<S>(store: Arc<S>, uid: String, interval: Duration) -> Self
    where
        S: Store + 'static,
    {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let path = paths::user(&uid);
        let watched = uid.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<UserProfile> = None;

            loop {
                ticker.tick().await;
                let profile = match store.read(&path).await {
                    Ok(Some(value)) => UserProfile::from_value(&watched, value),
                    Ok(None) => None,
                    Err(e) => {
                        log::warn!("Profile poll for {} failed: {}", watched, e);
                        None
                    }
                };

                let Some(profile) = profile else { continue };
                if last.as_ref() == Some(&profile) {
                    continue;
                }
                if tx.send(profile.clone()).await.is_err() {
                    break;
                }
                last = Some(profile);
            }
            log::debug!("Profile subscription for {} ended", watched);
        });

        Self { uid, rx, task }
    }

    /// Uid being watched
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Wait for the next changed snapshot
    pub async fn next(&mut self) -> Option<UserProfile> {
        self.rx.recv().await
    }

    /// Take a snapshot that has already arrived, without waiting
    pub fn try_next(&mut self) -> Option<UserProfile> {
        self.rx.try_recv().ok()
    }

    /// Whether the poller is still running
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop polling
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for ProfileSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Stream for ProfileSubscription {
    type Item = UserProfile;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
