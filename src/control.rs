//! Control channel between the scheduler loop and everything concurrent.
//!
//! The session itself is single-threaded; the HTTP surface (and anything
//! else off-thread) talks to it only through `ControlHandle`. Requests
//! carry their own reply sender and are serviced to completion, one at a
//! time, at the top of each scheduler iteration — the single
//! mutual-exclusion boundary for session access.

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::recorder::{RecordingError, RecordingSummary, StatusSnapshot};

/// Requests serviced by the scheduler loop.
pub enum ControlRequest {
    Start {
        reply: Sender<Result<(), RecordingError>>,
    },
    Stop {
        reply: Sender<Result<RecordingSummary, RecordingError>>,
    },
    Status {
        reply: Sender<StatusSnapshot>,
    },
    /// Grab one frame for the live preview without recording it.
    Preview {
        reply: Sender<Option<Vec<u8>>>,
    },
    Shutdown,
}

/// Creates the control channel; the receiver goes to the scheduler.
pub fn channel() -> (ControlHandle, Receiver<ControlRequest>) {
    let (tx, rx) = bounded(16);
    (ControlHandle { tx }, rx)
}

/// Blocking client side of the control channel.
#[derive(Clone)]
pub struct ControlHandle {
    tx: Sender<ControlRequest>,
}

impl ControlHandle {
    pub fn start(&self) -> Result<(), RecordingError> {
        let (reply, response) = bounded(1);
        self.tx
            .send(ControlRequest::Start { reply })
            .map_err(|_| RecordingError::ControlUnavailable)?;
        response
            .recv()
            .map_err(|_| RecordingError::ControlUnavailable)?
    }

    pub fn stop(&self) -> Result<RecordingSummary, RecordingError> {
        let (reply, response) = bounded(1);
        self.tx
            .send(ControlRequest::Stop { reply })
            .map_err(|_| RecordingError::ControlUnavailable)?;
        response
            .recv()
            .map_err(|_| RecordingError::ControlUnavailable)?
    }

    pub fn status(&self) -> Result<StatusSnapshot, RecordingError> {
        let (reply, response) = bounded(1);
        self.tx
            .send(ControlRequest::Status { reply })
            .map_err(|_| RecordingError::ControlUnavailable)?;
        response.recv().map_err(|_| RecordingError::ControlUnavailable)
    }

    /// One preview frame, or `None` when no frame is ready (or the
    /// recorder is gone).
    pub fn preview(&self) -> Option<Vec<u8>> {
        let (reply, response) = bounded(1);
        self.tx.send(ControlRequest::Preview { reply }).ok()?;
        response.recv().ok().flatten()
    }

    /// Best-effort; the loop may already be gone.
    pub fn shutdown(&self) {
        let _ = self.tx.send(ControlRequest::Shutdown);
    }

    /// Queues a pre-built request without waiting on its reply, so
    /// single-threaded tests can drive the scheduler loop themselves.
    #[cfg(test)]
    pub(crate) fn send_raw(&self, request: ControlRequest) {
        let _ = self.tx.send(request);
    }
}
