use thiserror::Error;

use crate::storage::StorageFault;

/// Errors surfaced by `RecordingSession` operations.
///
/// Storage faults are wrapped per failure site so callers can tell a failed
/// start from a mid-recording write fault without inspecting the fault
/// itself. None of these are fatal to the process: every path hands control
/// back to the scheduler loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordingError {
    /// The medium is absent or the target file could not be opened.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StorageFault),
    /// The fixed header region could not be written in full.
    #[error("header write failed: {0}")]
    HeaderWriteFailed(#[source] StorageFault),
    /// A frame append (or the periodic durability flush) faulted; the
    /// session has already forced itself to idle.
    #[error("frame write failed, recording stopped: {0}")]
    WriteFailed(#[source] StorageFault),
    /// The summary fields could not be patched; the file keeps its
    /// placeholder counts.
    #[error("finalize failed: {0}")]
    FinalizeFailed(#[source] StorageFault),
    /// Stop was called with no recording in progress.
    #[error("no recording in progress")]
    NotRecording,
    /// The scheduler loop is gone; control requests cannot be serviced.
    #[error("recorder control channel unavailable")]
    ControlUnavailable,
}
