//! GPS location watch and the proximity gate on the scan action.

use crate::shutdown_signalled;
use async_trait::async_trait;
use chrono::Utc;
use geohunt_core::{Coordinate, GameConfig, ProximityCheck, Timestamp, UNLOCK_RADIUS_METERS};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Pause before asking a source again after a transient error.
const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub coordinate: Coordinate,
    pub accuracy_m: f64,
    pub observed_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("No position fix after {waited_ms}ms")]
    NoFix { waited_ms: u64 },

    #[error("Location watch stopped before a fix arrived")]
    WatchStopped,
}

impl LocationError {
    /// Errors after which the watch gives up.
    pub fn is_permanent(&self) -> bool {
        matches!(self, LocationError::PermissionDenied)
    }
}

/// A device location feed.
#[async_trait]
pub trait PositionSource: Send {
    /// Wait for the next position update.
    async fn next_fix(&mut self) -> Result<PositionFix, LocationError>;

    /// Release the device location watch.
    fn stop(&mut self);
}

struct SourceGuard(Box<dyn PositionSource>);

impl Drop for SourceGuard {
    fn drop(&mut self) {
        self.0.stop();
        tracing::debug!("position source stopped");
    }
}

// ============================================================================
// WATCH
// ============================================================================

/// Handle to a running location watch.
///
/// Dropping the handle aborts the watch, which also stops the source.
#[derive(Debug)]
pub struct LocationWatch {
    fixes: watch::Receiver<Option<PositionFix>>,
    task: Option<JoinHandle<()>>,
}

/// Start observing `source` until `shutdown` fires.
pub fn spawn_location_watch(
    source: Box<dyn PositionSource>,
    shutdown: watch::Receiver<bool>,
) -> LocationWatch {
    let (tx, rx) = watch::channel(None);
    let task = tokio::spawn(run_watch(SourceGuard(source), tx, shutdown));
    LocationWatch {
        fixes: rx,
        task: Some(task),
    }
}

async fn run_watch(
    mut source: SourceGuard,
    fixes: watch::Sender<Option<PositionFix>>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!("location watch started");
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown_signalled(&mut shutdown) => break,
            next = source.0.next_fix() => next,
        };

        match next {
            Ok(fix) if fix.coordinate.is_valid() => {
                fixes.send_replace(Some(fix));
            }
            Ok(fix) => {
                tracing::warn!(?fix, "ignoring position fix with invalid coordinate");
            }
            Err(err) if err.is_permanent() => {
                tracing::warn!(error = %err, "location watch giving up");
                break;
            }
            Err(err) => {
                tracing::debug!(error = %err, "transient location error");
                tokio::select! {
                    biased;
                    _ = shutdown_signalled(&mut shutdown) => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                }
            }
        }
    }
    tracing::info!("location watch stopped");
}

impl LocationWatch {
    /// The most recent fix, if any arrived.
    pub fn latest(&self) -> Option<PositionFix> {
        *self.fixes.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PositionFix>> {
        self.fixes.clone()
    }

    /// Wait at most `timeout` for a fix.
    pub async fn wait_for_fix(&self, timeout: Duration) -> Result<PositionFix, LocationError> {
        let mut rx = self.fixes.clone();
        let result = match tokio::time::timeout(timeout, rx.wait_for(Option::is_some)).await {
            Ok(Ok(fix)) => (*fix).ok_or(LocationError::WatchStopped),
            Ok(Err(_)) => Err(LocationError::WatchStopped),
            Err(_) => Err(LocationError::NoFix {
                waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };
        result
    }

    /// Evaluate the gate against the latest fix as of now.
    pub fn gate(&self, gate: &ProximityGate) -> GateStatus {
        gate.evaluate(self.latest().as_ref(), Utc::now())
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Wait for the watch task to exit after shutdown.
    pub async fn stopped(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                if err.is_panic() {
                    tracing::error!("location watch panicked");
                }
            }
        }
    }
}

impl Drop for LocationWatch {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

// ============================================================================
// PROXIMITY GATE
// ============================================================================

/// What the gate says about enabling the scan action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateStatus {
    NoFix,
    Stale { age: Duration },
    OutOfRange { distance_m: f64 },
    InRange { distance_m: f64 },
}

impl GateStatus {
    pub fn allows_scan(&self) -> bool {
        matches!(self, GateStatus::InRange { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityGate {
    pub target: Coordinate,
    pub threshold_m: f64,
    pub staleness: Duration,
}

impl ProximityGate {
    pub fn new(target: Coordinate, config: &GameConfig) -> Self {
        Self {
            target,
            threshold_m: UNLOCK_RADIUS_METERS,
            staleness: config.gps_staleness,
        }
    }

    pub fn evaluate(&self, fix: Option<&PositionFix>, now: Timestamp) -> GateStatus {
        let Some(fix) = fix else {
            return GateStatus::NoFix;
        };
        // A fix from the future counts as fresh.
        let age = (now - fix.observed_at).to_std().unwrap_or(Duration::ZERO);
        if age > self.staleness {
            return GateStatus::Stale { age };
        }
        let check = ProximityCheck::evaluate(Some(fix.coordinate), self.target, self.threshold_m);
        if check.within_range {
            GateStatus::InRange {
                distance_m: check.distance_m,
            }
        } else {
            GateStatus::OutOfRange {
                distance_m: check.distance_m,
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const LIBRARY: Coordinate = Coordinate {
        latitude: 40.7291,
        longitude: -73.9965,
    };

    fn fix_at(coordinate: Coordinate, observed_at: Timestamp) -> PositionFix {
        PositionFix {
            coordinate,
            accuracy_m: 5.0,
            observed_at,
        }
    }

    /// Yields scripted results then waits forever.
    struct ScriptedSource {
        script: VecDeque<Result<PositionFix, LocationError>>,
        stopped: Arc<AtomicBool>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<PositionFix, LocationError>>) -> (Self, Arc<AtomicBool>) {
            let stopped = Arc::new(AtomicBool::new(false));
            (
                Self {
                    script: script.into(),
                    stopped: Arc::clone(&stopped),
                },
                stopped,
            )
        }
    }

    #[async_trait]
    impl PositionSource for ScriptedSource {
        async fn next_fix(&mut self) -> Result<PositionFix, LocationError> {
            match self.script.pop_front() {
                Some(next) => {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    next
                }
                None => std::future::pending().await,
            }
        }

        fn stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_gate_no_fix() {
        let gate = ProximityGate::new(LIBRARY, &GameConfig::default());
        assert_eq!(gate.evaluate(None, Utc::now()), GateStatus::NoFix);
        assert!(!GateStatus::NoFix.allows_scan());
    }

    #[test]
    fn test_gate_in_and_out_of_range() {
        let gate = ProximityGate::new(LIBRARY, &GameConfig::default());
        let now = Utc::now();

        let here = gate.evaluate(Some(&fix_at(LIBRARY, now)), now);
        assert!(here.allows_scan());

        let away = Coordinate::new(LIBRARY.latitude + 0.001, LIBRARY.longitude);
        match gate.evaluate(Some(&fix_at(away, now)), now) {
            GateStatus::OutOfRange { distance_m } => assert!((distance_m - 111.19).abs() < 0.5),
            other => panic!("expected out of range, got {:?}", other),
        }
    }

    #[test]
    fn test_gate_stale_after_bound() {
        let gate = ProximityGate::new(LIBRARY, &GameConfig::default());
        let now = Utc::now();

        let fresh = fix_at(LIBRARY, now - chrono::Duration::seconds(30));
        assert!(gate.evaluate(Some(&fresh), now).allows_scan());

        let old = fix_at(LIBRARY, now - chrono::Duration::seconds(31));
        assert_eq!(
            gate.evaluate(Some(&old), now),
            GateStatus::Stale {
                age: Duration::from_secs(31)
            }
        );
    }

    #[test]
    fn test_gate_future_fix_is_fresh() {
        let gate = ProximityGate::new(LIBRARY, &GameConfig::default());
        let now = Utc::now();
        let ahead = fix_at(LIBRARY, now + chrono::Duration::seconds(5));
        assert!(gate.evaluate(Some(&ahead), now).allows_scan());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_fix_times_out() {
        let (source, _) = ScriptedSource::new(vec![]);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let watch = spawn_location_watch(Box::new(source), shutdown_rx);

        let err = watch.wait_for_fix(Duration::from_secs(15)).await.unwrap_err();
        assert_eq!(err, LocationError::NoFix { waited_ms: 15_000 });
        assert!(watch.latest().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_fix_reports_saturated_wait() {
        let (source, _) = ScriptedSource::new(vec![]);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let watch = spawn_location_watch(Box::new(source), shutdown_rx);

        let err = watch.wait_for_fix(Duration::MAX).await.unwrap_err();
        assert_eq!(err, LocationError::NoFix { waited_ms: u64::MAX });
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_latest_fix() {
        let now = Utc::now();
        let (source, _) = ScriptedSource::new(vec![
            Ok(fix_at(Coordinate::new(40.0, -73.0), now)),
            Ok(fix_at(LIBRARY, now)),
        ]);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let watch = spawn_location_watch(Box::new(source), shutdown_rx);

        let first = watch.wait_for_fix(Duration::from_secs(15)).await.unwrap();
        assert_eq!(first.coordinate, Coordinate::new(40.0, -73.0));

        let mut rx = watch.subscribe();
        rx.wait_for(|fix| fix.map(|f| f.coordinate) == Some(LIBRARY))
            .await
            .unwrap();
        assert_eq!(watch.latest().map(|f| f.coordinate), Some(LIBRARY));
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_invalid_and_transient() {
        let now = Utc::now();
        let (source, _) = ScriptedSource::new(vec![
            Ok(fix_at(Coordinate::new(f64::NAN, 0.0), now)),
            Err(LocationError::Unavailable {
                reason: "tunnel".into(),
            }),
            Ok(fix_at(LIBRARY, now)),
        ]);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let watch = spawn_location_watch(Box::new(source), shutdown_rx);

        let fix = watch.wait_for_fix(Duration::from_secs(15)).await.unwrap();
        assert_eq!(fix.coordinate, LIBRARY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_source() {
        let (source, stopped) = ScriptedSource::new(vec![]);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut watch = spawn_location_watch(Box::new(source), shutdown_rx);
        assert!(watch.is_running());

        shutdown_tx.send(true).unwrap();
        watch.stopped().await;
        assert!(stopped.load(Ordering::SeqCst));
        assert!(!watch.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_denied_ends_watch() {
        let (source, stopped) = ScriptedSource::new(vec![Err(LocationError::PermissionDenied)]);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut watch = spawn_location_watch(Box::new(source), shutdown_rx);

        watch.stopped().await;
        assert!(stopped.load(Ordering::SeqCst));
        assert_eq!(
            watch.wait_for_fix(Duration::from_secs(1)).await,
            Err(LocationError::WatchStopped)
        );
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_source() {
        let (source, stopped) = ScriptedSource::new(vec![]);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let watch = spawn_location_watch(Box::new(source), shutdown_rx);
        tokio::task::yield_now().await;
        drop(watch);

        for _ in 0..100 {
            if stopped.load(Ordering::SeqCst) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("source was not stopped after the handle was dropped");
    }
}
