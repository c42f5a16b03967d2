//! Historical-sync poller — drives the `Processing` step.
//!
//! Polls the provider's historical-update status at a fixed sub-second
//! interval until it reports completion, advances the step exactly once,
//! and tears itself down as soon as the step has left `Processing` (so a
//! stale tick can never advance a later phase).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::onboarding::sequencer::{PollOutcome, Sequencer};

/// Spawn a background task polling the historical-sync status.
///
/// Returns a `JoinHandle` and a shutdown flag. Set the flag to stop
/// polling early; the task also stops on its own once the step advances
/// or leaves `Processing` through another path.
pub fn spawn_historical_poller(
    sequencer: Arc<Sequencer>,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let interval = sequencer.poll_interval();
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        info!(
            address = %sequencer.address().short(),
            interval_ms = interval.as_millis() as u64,
            "Historical-sync poller started"
        );

        let mut tick = tokio::time::interval(interval);

        loop {
            tick.tick().await;

            if shutdown.load(Ordering::Relaxed) {
                debug!("Historical-sync poller shut down");
                return;
            }

            match sequencer.poll_historical_once().await {
                Ok(PollOutcome::Pending) => {}
                Ok(PollOutcome::Advanced) => {
                    info!("Historical sync complete; advanced to fetching_plaid");
                    return;
                }
                Ok(PollOutcome::Stopped) => {
                    debug!("Step left processing; poller stopping");
                    return;
                }
                // Per-tick failures are non-fatal; retry on the next tick.
                Err(e) => warn!("Historical-sync poll failed: {e}"),
            }
        }
    });

    (handle, shutdown_flag)
}
