//! The cooperative scheduler loop.
//!
//! Single-threaded: one logical task at a time, no preemption. Each
//! iteration, in order: (a) service pending control requests to
//! completion, (b) poll the trigger at its cadence and apply a toggle,
//! (c) if recording, perform exactly one capture step. Storage and sensor
//! calls are bounded-latency and complete within the iteration; "stop" is
//! a state transition observed at the top of the next capture step, never
//! an interrupt of an in-flight write.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::capture::{FrameGuard, FrameSource};
use crate::control::ControlRequest;
use crate::recorder::RecordingSession;
use crate::storage::BlockStorage;
use crate::trigger::{TriggerDebouncer, TriggerInput};

/// Sleep per iteration; keeps the loop from spinning while staying well
/// inside the trigger cadence.
const LOOP_SLEEP: Duration = Duration::from_millis(2);

pub struct Scheduler<S: BlockStorage, F: FrameSource, T: TriggerInput> {
    session: RecordingSession<S>,
    frames: F,
    trigger: Option<T>,
    debouncer: TriggerDebouncer,
    trigger_interval: Duration,
    last_trigger_poll: Instant,
    requests: Receiver<ControlRequest>,
}

impl<S: BlockStorage, F: FrameSource, T: TriggerInput> Scheduler<S, F, T> {
    pub fn new(
        session: RecordingSession<S>,
        frames: F,
        trigger: Option<T>,
        requests: Receiver<ControlRequest>,
        trigger_interval: Duration,
    ) -> Self {
        Self {
            session,
            frames,
            trigger,
            debouncer: TriggerDebouncer::new(),
            trigger_interval,
            last_trigger_poll: Instant::now(),
            requests,
        }
    }

    /// Runs until a shutdown request arrives. Any active recording is
    /// stopped before returning.
    pub fn run(mut self) {
        tracing::info!(target: "system", "[SCHED] scheduler loop running");
        while self.tick() {
            thread::sleep(LOOP_SLEEP);
        }
        if self.session.is_recording() {
            match self.session.stop() {
                Ok(summary) => tracing::info!(
                    target: "recorder",
                    "[SCHED] recording closed on shutdown ({} frames)",
                    summary.frame_count
                ),
                Err(e) => {
                    tracing::warn!(target: "recorder", "[SCHED] stop on shutdown failed: {}", e)
                }
            }
        }
        tracing::info!(target: "system", "[SCHED] scheduler loop stopped");
    }

    /// One cooperative iteration. Returns false once shutdown is requested.
    pub fn tick(&mut self) -> bool {
        while let Ok(request) = self.requests.try_recv() {
            if !self.handle_request(request) {
                return false;
            }
        }

        let mut level = None;
        if let Some(input) = self.trigger.as_mut() {
            if self.last_trigger_poll.elapsed() >= self.trigger_interval {
                self.last_trigger_poll = Instant::now();
                level = Some(input.level());
            }
        }
        if let Some(level) = level {
            if self.debouncer.poll(level).is_some() {
                self.toggle();
            }
        }

        if self.session.is_recording() {
            // A fault has already forced the session idle; nothing else to
            // unwind here.
            if let Err(e) = self.session.capture_one_frame(&mut self.frames) {
                tracing::error!(target: "recorder", "[SCHED] capture fault: {}", e);
            }
        }
        true
    }

    fn toggle(&mut self) {
        if self.session.is_recording() {
            tracing::info!(target: "recorder", "[SCHED] trigger toggle: stopping");
            if let Err(e) = self.session.stop() {
                tracing::warn!(target: "recorder", "[SCHED] trigger stop failed: {}", e);
            }
        } else {
            tracing::info!(target: "recorder", "[SCHED] trigger toggle: starting");
            if let Err(e) = self.session.start() {
                tracing::warn!(target: "recorder", "[SCHED] trigger start failed: {}", e);
            }
        }
    }

    fn handle_request(&mut self, request: ControlRequest) -> bool {
        match request {
            ControlRequest::Start { reply } => {
                let _ = reply.send(self.session.start());
            }
            ControlRequest::Stop { reply } => {
                let _ = reply.send(self.session.stop());
            }
            ControlRequest::Status { reply } => {
                let _ = reply.send(self.session.status_snapshot());
            }
            ControlRequest::Preview { reply } => {
                let shot = FrameGuard::acquire(&mut self.frames)
                    .filter(|frame| !frame.is_empty())
                    .map(|frame| frame.bytes().to_vec());
                let _ = reply.send(shot);
            }
            ControlRequest::Shutdown => {
                tracing::info!(target: "system", "[SCHED] shutdown requested");
                return false;
            }
        }
        true
    }
}
