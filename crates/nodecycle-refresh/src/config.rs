//! Refresh timing configuration and the cancellation signal.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{RefreshError, RefreshResult};

/// Timing and retry knobs for the refresh protocol.
///
/// Defaults match production behavior; tests shrink the durations to
/// zero rather than sleeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Wait between eviction attempts blocked by a disruption budget.
    pub eviction_backoff: Duration,
    /// Total eviction attempts per pod before giving up.
    pub max_eviction_attempts: u32,
    /// Wait between draining node *i* and node *i+1*, so evicted
    /// workloads can reschedule before further capacity is removed.
    pub pacing: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            eviction_backoff: Duration::from_secs(30),
            max_eviction_attempts: 3,
            pacing: Duration::from_secs(60),
        }
    }
}

/// Externally supplied cancellation signal. Flipping the paired sender
/// to `true` aborts the run at the next wait or protocol step.
pub type CancelSignal = watch::Receiver<bool>;

/// Create a cancellation sender/receiver pair.
pub fn cancel_pair() -> (watch::Sender<bool>, CancelSignal) {
    watch::channel(false)
}

/// Return `Cancelled` if the signal has fired.
pub(crate) fn check_cancelled(cancel: &CancelSignal) -> RefreshResult<()> {
    if *cancel.borrow() {
        return Err(RefreshError::Cancelled);
    }
    Ok(())
}

/// Sleep for `duration`, aborting early when the cancel signal fires.
///
/// A dropped sender never counts as cancellation; the wait then runs to
/// completion.
pub(crate) async fn wait(duration: Duration, cancel: &mut CancelSignal) -> RefreshResult<()> {
    check_cancelled(cancel)?;
    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return Ok(()),
            changed = cancel.changed() => match changed {
                Ok(()) => check_cancelled(cancel)?,
                Err(_) => {
                    (&mut sleep).await;
                    return Ok(());
                }
            },
        }
    }
}
