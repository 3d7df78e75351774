//! Scanner session: capture, decode, classify.
//!
//! # State Transition Diagram
//!
//! ```text
//! Idle ──┬── CameraOpened ──→ CameraActive ── CaptureStarted ──→ Decoding
//!        └── CameraUnavailable ──→ Simulating ── SimulationElapsed ──→ Simulated (terminal)
//!
//! Decoding ──┬── FrameDecoded(None) ──→ Decoding
//!            └── FrameDecoded(Some) ──→ Detected ──┬── Classified(Match) ──→ Accepted (terminal)
//!                                                  └── Classified(other) ──→ Rejected
//! Rejected ── CooldownElapsed ──→ Decoding
//!
//! any non-terminal ── Cancel ──→ Closed (terminal)
//! ```

use crate::camera::{Camera, CameraError, CameraGuard, QrDecoder};
use crate::shutdown_signalled;
use geohunt_core::{classify, encode_payload, GameConfig, ScanClassification, TreasureId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, sleep, MissedTickBehavior};

// ============================================================================
// STATE MACHINE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScannerState {
    Idle,
    CameraActive,
    Decoding,
    Detected { payload: String },
    Rejected { classification: ScanClassification },
    Simulating,
    Accepted { payload: String },
    Simulated { payload: String },
    Closed,
}

impl ScannerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScannerState::Idle => "idle",
            ScannerState::CameraActive => "camera_active",
            ScannerState::Decoding => "decoding",
            ScannerState::Detected { .. } => "detected",
            ScannerState::Rejected { .. } => "rejected",
            ScannerState::Simulating => "simulating",
            ScannerState::Accepted { .. } => "accepted",
            ScannerState::Simulated { .. } => "simulated",
            ScannerState::Closed => "closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScannerState::Accepted { .. } | ScannerState::Simulated { .. } | ScannerState::Closed
        )
    }
}

impl std::fmt::Display for ScannerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerInput {
    CameraOpened,
    CameraUnavailable,
    CaptureStarted,
    FrameDecoded(Option<String>),
    Classified(ScanClassification),
    CooldownElapsed,
    SimulationElapsed { payload: String },
    Cancel,
}

impl ScannerInput {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScannerInput::CameraOpened => "camera_opened",
            ScannerInput::CameraUnavailable => "camera_unavailable",
            ScannerInput::CaptureStarted => "capture_started",
            ScannerInput::FrameDecoded(_) => "frame_decoded",
            ScannerInput::Classified(_) => "classified",
            ScannerInput::CooldownElapsed => "cooldown_elapsed",
            ScannerInput::SimulationElapsed { .. } => "simulation_elapsed",
            ScannerInput::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScannerError {
    #[error("Invalid scanner transition: {input} in state {from}")]
    InvalidTransition {
        from: &'static str,
        input: &'static str,
    },

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
}

/// Pure transition function of the scanner.
pub fn transition(state: &ScannerState, input: ScannerInput) -> Result<ScannerState, ScannerError> {
    use ScannerInput as I;
    use ScannerState as S;

    let next = match (state, input) {
        (s, I::Cancel) if !s.is_terminal() => S::Closed,
        (S::Idle, I::CameraOpened) => S::CameraActive,
        (S::Idle, I::CameraUnavailable) => S::Simulating,
        (S::CameraActive, I::CaptureStarted) => S::Decoding,
        (S::Decoding, I::FrameDecoded(None)) => S::Decoding,
        (S::Decoding, I::FrameDecoded(Some(payload))) => S::Detected { payload },
        (S::Detected { payload }, I::Classified(ScanClassification::Match)) => S::Accepted {
            payload: payload.clone(),
        },
        (S::Detected { .. }, I::Classified(classification)) => S::Rejected { classification },
        (S::Rejected { .. }, I::CooldownElapsed) => S::Decoding,
        (S::Simulating, I::SimulationElapsed { payload }) => S::Simulated { payload },
        (s, input) => {
            return Err(ScannerError::InvalidTransition {
                from: s.as_str(),
                input: input.as_str(),
            })
        }
    };
    Ok(next)
}

// ============================================================================
// EVENTS AND OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// A camera frame carried the expected code.
    Accepted { payload: String },
    /// No camera; the code was assumed after the simulation delay.
    Simulated { payload: String },
    Cancelled,
}

impl ScanOutcome {
    /// Payload to submit for redemption, if the session produced one.
    pub fn payload(&self) -> Option<&str> {
        match self {
            ScanOutcome::Accepted { payload } | ScanOutcome::Simulated { payload } => Some(payload),
            ScanOutcome::Cancelled => None,
        }
    }
}

/// Notifications for the UI. Delivery is best-effort: a full channel drops events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScannerEvent {
    StateChanged { state: &'static str },
    CameraUnavailable { reason: String },
    Rejected { classification: ScanClassification },
    Finished { outcome: ScanOutcome },
}

// ============================================================================
// SESSION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerConfig {
    pub cooldown: Duration,
    pub simulation_delay: Duration,
    pub frame_interval: Duration,
}

impl From<&GameConfig> for ScannerConfig {
    fn from(config: &GameConfig) -> Self {
        Self {
            cooldown: config.scanner_cooldown,
            simulation_delay: config.simulation_delay,
            frame_interval: config.frame_interval,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::from(&GameConfig::default())
    }
}

/// One scanning attempt for a single target treasure.
pub struct ScannerSession {
    target: TreasureId,
    camera: Option<Box<dyn Camera>>,
    decoder: Arc<dyn QrDecoder>,
    config: ScannerConfig,
    state: ScannerState,
}

impl ScannerSession {
    /// A session without a camera. It runs the simulation fallback unless
    /// [`with_camera`](Self::with_camera) attaches one.
    pub fn new(target: TreasureId, decoder: Arc<dyn QrDecoder>, config: ScannerConfig) -> Self {
        Self {
            target,
            camera: None,
            decoder,
            config,
            state: ScannerState::Idle,
        }
    }

    pub fn with_camera(mut self, camera: Box<dyn Camera>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn state(&self) -> &ScannerState {
        &self.state
    }

    pub fn target(&self) -> &TreasureId {
        &self.target
    }

    /// Run until a code is accepted, the simulation completes, shutdown is
    /// signalled, or the camera fails mid-capture.
    ///
    /// The camera is released on every exit path.
    pub async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
        events: mpsc::Sender<ScannerEvent>,
    ) -> Result<ScanOutcome, ScannerError> {
        tracing::info!(target_id = %self.target, "scanner session started");
        let result = self.drive(&mut shutdown, &events).await;
        match &result {
            Ok(outcome) => {
                tracing::info!(target_id = %self.target, state = %self.state, "scanner session finished");
                emit(&events, ScannerEvent::Finished {
                    outcome: outcome.clone(),
                });
            }
            Err(err) => {
                tracing::warn!(target_id = %self.target, state = %self.state, error = %err, "scanner session failed");
            }
        }
        result
    }

    async fn drive(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
        events: &mpsc::Sender<ScannerEvent>,
    ) -> Result<ScanOutcome, ScannerError> {
        let Some(camera) = self.camera.take() else {
            return self.simulate("no camera attached".to_string(), shutdown, events).await;
        };

        let mut guard = CameraGuard::new(camera);
        let opened = tokio::select! {
            biased;
            _ = shutdown_signalled(shutdown) => return self.cancel(events),
            opened = guard.open() => opened,
        };
        match opened {
            Ok(()) => self.advance(ScannerInput::CameraOpened, events)?,
            Err(err) if err.is_unavailable() => {
                drop(guard);
                return self.simulate(err.to_string(), shutdown, events).await;
            }
            Err(err) => return Err(err.into()),
        }

        self.advance(ScannerInput::CaptureStarted, events)?;
        let mut ticker = interval(self.config.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let frame = tokio::select! {
                biased;
                _ = shutdown_signalled(shutdown) => return self.cancel(events),
                frame = async {
                    ticker.tick().await;
                    guard.next_frame().await
                } => frame?,
            };

            let Some(payload) = self.decoder.decode(&frame) else {
                self.advance(ScannerInput::FrameDecoded(None), events)?;
                continue;
            };
            self.advance(ScannerInput::FrameDecoded(Some(payload.clone())), events)?;

            let classification = classify(&payload, &self.target);
            self.advance(ScannerInput::Classified(classification.clone()), events)?;
            if classification.is_match() {
                return Ok(ScanOutcome::Accepted { payload });
            }

            tracing::debug!(?classification, "scan rejected, cooling down");
            emit(events, ScannerEvent::Rejected { classification });
            tokio::select! {
                biased;
                _ = shutdown_signalled(shutdown) => return self.cancel(events),
                _ = sleep(self.config.cooldown) => {}
            }
            self.advance(ScannerInput::CooldownElapsed, events)?;
        }
    }

    async fn simulate(
        &mut self,
        reason: String,
        shutdown: &mut watch::Receiver<bool>,
        events: &mpsc::Sender<ScannerEvent>,
    ) -> Result<ScanOutcome, ScannerError> {
        tracing::warn!(reason = %reason, "camera unavailable, simulating scan");
        emit(events, ScannerEvent::CameraUnavailable { reason });
        self.advance(ScannerInput::CameraUnavailable, events)?;

        tokio::select! {
            biased;
            _ = shutdown_signalled(shutdown) => return self.cancel(events),
            _ = sleep(self.config.simulation_delay) => {}
        }

        let payload = encode_payload(&self.target);
        self.advance(
            ScannerInput::SimulationElapsed {
                payload: payload.clone(),
            },
            events,
        )?;
        Ok(ScanOutcome::Simulated { payload })
    }

    fn cancel(&mut self, events: &mpsc::Sender<ScannerEvent>) -> Result<ScanOutcome, ScannerError> {
        self.advance(ScannerInput::Cancel, events)?;
        Ok(ScanOutcome::Cancelled)
    }

    fn advance(
        &mut self,
        input: ScannerInput,
        events: &mpsc::Sender<ScannerEvent>,
    ) -> Result<(), ScannerError> {
        let next = transition(&self.state, input)?;
        if next.as_str() != self.state.as_str() {
            tracing::debug!(from = self.state.as_str(), to = next.as_str(), "scanner transition");
            emit(events, ScannerEvent::StateChanged {
                state: next.as_str(),
            });
        }
        self.state = next;
        Ok(())
    }
}

impl std::fmt::Debug for ScannerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerSession")
            .field("target", &self.target)
            .field("has_camera", &self.camera.is_some())
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

fn emit(events: &mpsc::Sender<ScannerEvent>, event: ScannerEvent) {
    if let Err(mpsc::error::TrySendError::Full(event)) = events.try_send(event) {
        tracing::debug!(?event, "scanner event dropped, channel full");
    }
}

// ============================================================================
// TESTS
// ============================================================================
