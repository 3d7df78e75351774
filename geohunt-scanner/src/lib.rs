//! GeoHunt Scanner
//!
//! The two device-facing background observers of a GeoHunt client:
//!
//! - [`ScannerSession`]: camera capture and QR decode loop with a
//!   camera-less simulation fallback
//! - [`LocationWatch`]: GPS feed publishing the latest fix, plus the
//!   [`ProximityGate`] deciding whether the scan action is enabled
//!
//! Both are cancelled through a `tokio::sync::watch` shutdown signal and
//! release their device resource on every exit path.

pub mod camera;
pub mod location;
pub mod session;

pub use camera::{Camera, CameraError, CameraGuard, Frame, QrDecoder};
pub use location::{
    spawn_location_watch, GateStatus, LocationError, LocationWatch, PositionFix, PositionSource,
    ProximityGate,
};
pub use session::{
    transition, ScanOutcome, ScannerConfig, ScannerError, ScannerEvent, ScannerInput,
    ScannerSession, ScannerState,
};

use tokio::sync::watch;

/// Resolve once shutdown is signalled or the sender is gone.
pub(crate) async fn shutdown_signalled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
