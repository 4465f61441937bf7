//! End-to-end recording against real files in a temp directory.

use std::time::Duration;

use avicam::avi::{HEADER_SIZE, MJPG, OFF_RIFF_SIZE, OFF_STREAM_LENGTH, OFF_TOTAL_FRAMES};
use avicam::capture::SyntheticSource;
use avicam::control;
use avicam::recorder::{RecordingError, RecordingSession};
use avicam::scheduler::Scheduler;
use avicam::storage::StdStorage;
use avicam::trigger::LevelFile;
use avicam::VideoParams;

fn params() -> VideoParams {
    VideoParams {
        width: 320,
        height: 240,
        frame_rate_hz: 25,
        codec: MJPG,
    }
}

fn u32_at(bytes: &[u8], offset: u64) -> u32 {
    let offset = offset as usize;
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

#[test]
fn full_session_produces_a_patched_container() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StdStorage::new(dir.path());
    let mut session = RecordingSession::new(storage.clone(), params());
    let mut source = SyntheticSource::new(320, 240);

    session.start().unwrap();
    let file_name = session.status_snapshot().file_name.unwrap();
    assert!(file_name.starts_with("/video_"));
    assert!(file_name.ends_with(".avi"));

    for _ in 0..25 {
        session.capture_one_frame(&mut source).unwrap();
    }
    assert_eq!(session.status_snapshot().frame_count, 25);

    let summary = session.stop().unwrap();
    assert_eq!(summary.frame_count, 25);

    let bytes = storage.read(&file_name).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"AVI ");
    assert!(bytes.len() > HEADER_SIZE as usize);
    assert_eq!(u32_at(&bytes, OFF_TOTAL_FRAMES), 25);
    assert_eq!(u32_at(&bytes, OFF_STREAM_LENGTH), 25);
    assert_eq!(u32_at(&bytes, OFF_RIFF_SIZE) as usize, bytes.len() - 8);
}

#[test]
fn empty_recording_is_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StdStorage::new(dir.path());
    let mut session = RecordingSession::new(storage.clone(), params());

    session.start().unwrap();
    let file_name = session.status_snapshot().file_name.unwrap();
    let summary = session.stop().unwrap();
    assert_eq!(summary.frame_count, 0);

    let bytes = storage.read(&file_name).unwrap();
    assert_eq!(bytes.len(), HEADER_SIZE as usize);
    assert_eq!(u32_at(&bytes, OFF_RIFF_SIZE), HEADER_SIZE as u32 - 8);
    assert_eq!(u32_at(&bytes, OFF_TOTAL_FRAMES), 0);
    assert_eq!(u32_at(&bytes, OFF_STREAM_LENGTH), 0);
}

#[test]
fn session_policy_holds_outside_recording() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StdStorage::new(dir.path());
    let mut session = RecordingSession::new(storage, params());

    assert_eq!(session.stop(), Err(RecordingError::NotRecording));

    session.start().unwrap();
    let name = session.status_snapshot().file_name;
    session.start().unwrap();
    assert_eq!(session.status_snapshot().file_name, name);
    session.stop().unwrap();
}

#[test]
fn control_handle_round_trips_through_the_scheduler() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StdStorage::new(dir.path());
    let session = RecordingSession::new(storage.clone(), params());
    let source = SyntheticSource::new(320, 240);

    let (handle, requests) = control::channel();
    let scheduler = Scheduler::new(
        session,
        source,
        None::<LevelFile>,
        requests,
        Duration::from_millis(100),
    );
    let loop_thread = std::thread::spawn(move || scheduler.run());

    handle.start().unwrap();
    let status = handle.status().unwrap();
    assert!(status.is_recording);
    let file_name = status.file_name.unwrap();

    // let the loop append a few frames
    std::thread::sleep(Duration::from_millis(100));

    let summary = handle.stop().unwrap();
    assert!(summary.frame_count > 0);
    assert!(!handle.status().unwrap().is_recording);

    let preview = handle.preview().unwrap();
    assert_eq!(&preview[..2], [0xFF, 0xD8]);

    handle.shutdown();
    loop_thread.join().unwrap();

    let bytes = storage.read(&file_name).unwrap();
    assert_eq!(u32_at(&bytes, OFF_TOTAL_FRAMES), summary.frame_count);
    assert_eq!(u32_at(&bytes, OFF_RIFF_SIZE) as usize, bytes.len() - 8);
}
