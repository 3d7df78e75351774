//! Camera and decoder seams.

use async_trait::async_trait;
use thiserror::Error;

/// One captured grayscale frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, luma: Vec<u8>) -> Self {
        Self {
            width,
            height,
            luma,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("Camera unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Frame capture failed: {reason}")]
    CaptureFailed { reason: String },
}

impl CameraError {
    /// Errors that switch the session to the simulation fallback.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            CameraError::Unavailable { .. } | CameraError::PermissionDenied
        )
    }
}

/// A device camera stream.
#[async_trait]
pub trait Camera: Send {
    async fn open(&mut self) -> Result<(), CameraError>;

    async fn next_frame(&mut self) -> Result<Frame, CameraError>;

    /// Stop capture and free the device. Called even if `open` failed or
    /// never completed.
    fn release(&mut self);
}

/// Extracts the text of a QR code from a frame, if one is visible.
pub trait QrDecoder: Send + Sync {
    fn decode(&self, frame: &Frame) -> Option<String>;
}

/// Owns a camera and releases it when dropped.
pub struct CameraGuard {
    camera: Box<dyn Camera>,
}

impl CameraGuard {
    pub fn new(camera: Box<dyn Camera>) -> Self {
        Self { camera }
    }

    pub async fn open(&mut self) -> Result<(), CameraError> {
        self.camera.open().await
    }

    pub async fn next_frame(&mut self) -> Result<Frame, CameraError> {
        self.camera.next_frame().await
    }
}

impl Drop for CameraGuard {
    fn drop(&mut self) {
        self.camera.release();
        tracing::debug!("camera released");
    }
}

impl std::fmt::Debug for CameraGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraGuard").finish_non_exhaustive()
    }
}
