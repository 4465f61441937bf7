//! Recording session state machine.
//!
//! Two states, `Idle` and `Recording`; "preparing" and "finalizing" are
//! transient sub-steps of the transitions, not observable states. Each
//! variant carries only the data valid in that state: the open `AviWriter`
//! lives inside `Recording`, so *handle open iff recording* holds by
//! construction rather than by runtime checks.
//!
//! The session is single-threaded by design: exactly one caller path (the
//! scheduler loop) drives it per iteration. Anything concurrent, like the
//! HTTP surface, reaches it through the control channel.

use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use crate::avi::{AviWriter, VideoParams};
use crate::capture::{FrameGuard, FrameSource};
use crate::storage::{BlockStorage, StorageFault};

use super::errors::RecordingError;

/// Flush-to-medium cadence in successful frames. Bounds data loss on abrupt
/// power cut to this many frames.
const FLUSH_EVERY_FRAMES: u32 = 10;

/// Result of a completed (or degraded-finalize) recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSummary {
    pub frame_count: u32,
    pub duration_seconds: f64,
}

/// Point-in-time view of the session, safe to take at any moment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub is_recording: bool,
    pub frame_count: u32,
    pub file_name: Option<String>,
    pub elapsed_seconds: f64,
}

enum SessionState<F> {
    Idle,
    Recording {
        writer: AviWriter<F>,
        file_name: String,
        frame_count: u32,
        started_at: Instant,
    },
}

/// The one recording session of the device.
pub struct RecordingSession<S: BlockStorage> {
    storage: S,
    params: VideoParams,
    state: SessionState<S::File>,
}

impl<S: BlockStorage> RecordingSession<S> {
    pub fn new(storage: S, params: VideoParams) -> Self {
        Self {
            storage,
            params,
            state: SessionState::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, SessionState::Recording { .. })
    }

    /// Begins a new recording. Idempotent: a start while already recording
    /// is a no-op, not an error.
    ///
    /// On any failure the session stays idle and no partially-written file
    /// is left behind.
    pub fn start(&mut self) -> Result<(), RecordingError> {
        if self.is_recording() {
            tracing::debug!(target: "recorder", "[SESSION] start ignored, already recording");
            return Ok(());
        }

        if !self.storage.available() {
            return Err(RecordingError::StorageUnavailable(
                StorageFault::Unavailable("medium not reachable".into()),
            ));
        }

        // Millisecond timestamps are unique per session instance; a
        // collision overwrites.
        let file_name = format!("/video_{}.avi", Utc::now().timestamp_millis());
        let file = self
            .storage
            .open(&file_name)
            .map_err(RecordingError::StorageUnavailable)?;

        let writer = match AviWriter::create(file, &self.params) {
            Ok(writer) => writer,
            Err(fault) => {
                // A torn header must not look like a valid recording.
                self.storage.remove(&file_name);
                tracing::error!(target: "recorder", "[SESSION] header write failed: {}", fault);
                return Err(RecordingError::HeaderWriteFailed(fault));
            }
        };

        tracing::info!(target: "recorder", "[SESSION] recording started: {}", file_name);
        self.state = SessionState::Recording {
            writer,
            file_name,
            frame_count: 0,
            started_at: Instant::now(),
        };
        Ok(())
    }

    /// Ends the recording: the session goes idle first, then the container
    /// is finalized and the handle closed.
    ///
    /// The handle closes whether or not finalize faulted; on a fault the
    /// file keeps its placeholder counts (a visible degraded outcome, not
    /// corrected automatically) and `FinalizeFailed` is returned.
    pub fn stop(&mut self) -> Result<RecordingSummary, RecordingError> {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Idle => Err(RecordingError::NotRecording),
            SessionState::Recording {
                mut writer,
                file_name,
                frame_count,
                started_at,
            } => {
                let duration_seconds = started_at.elapsed().as_secs_f64();
                let result = writer.finalize(frame_count);
                drop(writer);

                match result {
                    Ok(()) => {
                        tracing::info!(
                            target: "recorder",
                            "[SESSION] recording stopped: {} ({} frames, {:.1}s)",
                            file_name,
                            frame_count,
                            duration_seconds
                        );
                        Ok(RecordingSummary {
                            frame_count,
                            duration_seconds,
                        })
                    }
                    Err(fault) => {
                        tracing::warn!(
                            target: "recorder",
                            "[SESSION] finalize failed, {} keeps placeholder counts: {}",
                            file_name,
                            fault
                        );
                        Err(RecordingError::FinalizeFailed(fault))
                    }
                }
            }
        }
    }

    /// Captures at most one frame. No-op when idle, when no frame is ready,
    /// or when the sensor hands back a zero-length glitch frame.
    ///
    /// A short or failed write forces the session to idle — appending past
    /// a damaged point in a stream with no length markers would make the
    /// whole file unparseable — and reports `WriteFailed`. The lent frame
    /// is released on every path.
    pub fn capture_one_frame(
        &mut self,
        source: &mut dyn FrameSource,
    ) -> Result<(), RecordingError> {
        let SessionState::Recording {
            ref mut writer,
            ref mut frame_count,
            ..
        } = self.state
        else {
            return Ok(());
        };

        let Some(guard) = FrameGuard::acquire(source) else {
            return Ok(());
        };

        if guard.is_empty() {
            tracing::debug!(target: "recorder", "[SESSION] zero-length frame from sensor, dropped");
            return Ok(());
        }

        let payload = guard.bytes();
        let mut fault = match writer.append_frame(payload) {
            Ok(written) if written == payload.len() => None,
            Ok(written) => Some(StorageFault::ShortWrite {
                written,
                expected: payload.len(),
            }),
            Err(fault) => Some(fault),
        };

        if fault.is_none() {
            *frame_count += 1;
            if *frame_count % FLUSH_EVERY_FRAMES == 0 {
                fault = writer.flush().err();
            }
        }

        drop(guard);

        if let Some(fault) = fault {
            tracing::error!(
                target: "recorder",
                "[SESSION] frame write fault, recording stopped: {}",
                fault
            );
            self.state = SessionState::Idle;
            return Err(RecordingError::WriteFailed(fault));
        }
        Ok(())
    }

    /// Pure read; no side effects.
    pub fn status_snapshot(&self) -> StatusSnapshot {
        match &self.state {
            SessionState::Idle => StatusSnapshot {
                is_recording: false,
                frame_count: 0,
                file_name: None,
                elapsed_seconds: 0.0,
            },
            SessionState::Recording {
                file_name,
                frame_count,
                started_at,
                ..
            } => StatusSnapshot {
                is_recording: true,
                frame_count: *frame_count,
                file_name: Some(file_name.clone()),
                elapsed_seconds: started_at.elapsed().as_secs_f64(),
            },
        }
    }
}
