//! Poll loop with an owned start/stop lifecycle.
//!
//! One task owns the marker set, the feed and the surface, so no
//! reconciliation ever runs concurrently with another: a tick body
//! completes (fetch → reconcile → apply) before the next tick is
//! awaited. Ticks the loop was too slow for are delayed, not bursted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use glt_feed::VehicleFeed;
use glt_reconcile::{reconcile, MarkerSet};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::surface::MapSurface;

pub struct Poller;

impl Poller {
    /// Start polling `feed` every `interval`, applying each cycle's diff
    /// to `surface`. The first cycle runs immediately.
    ///
    /// A fetch failure skips the cycle entirely: the marker set is left
    /// untouched and the surface is not called, so a transient network
    /// error never flickers markers off the map.
    pub fn spawn(
        feed: Arc<dyn VehicleFeed>,
        mut surface: Box<dyn MapSurface>,
        mut markers: MarkerSet,
        interval: Duration,
    ) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        // Either an explicit shutdown or the handle was
                        // dropped; stop scheduling further ticks.
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        run_cycle(feed.as_ref(), surface.as_mut(), &mut markers).await;
                    }
                }
            }

            info!(tracked = markers.len(), "poller stopped");
            markers
        });

        PollerHandle { shutdown_tx, task }
    }
}

async fn run_cycle(feed: &dyn VehicleFeed, surface: &mut dyn MapSurface, markers: &mut MarkerSet) {
    match feed.fetch_vehicle_statuses().await {
        Ok(statuses) => {
            let diff = reconcile(markers, &statuses);
            surface.apply(&diff);
            info!(
                adds = diff.adds.len(),
                updates = diff.updates.len(),
                removes = diff.removes.len(),
                tracked = markers.len(),
                "reconcile cycle complete"
            );
        }
        Err(err) => {
            warn!(feed = feed.name(), error = %err, "fetch failed; markers unchanged this cycle");
        }
    }
}

/// Owned handle to a running poller. Dropping it also stops the loop,
/// but [`PollerHandle::shutdown`] is the orderly path: it waits for an
/// in-flight cycle to finish and returns the final marker set.
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<MarkerSet>,
}

impl PollerHandle {
    pub async fn shutdown(self) -> anyhow::Result<MarkerSet> {
        // Ignore send errors: the task may have already exited.
        let _ = self.shutdown_tx.send(true);
        self.task.await.context("poller task panicked")
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
