//! Frame acquisition from the image sensor.
//!
//! The sensor hands out compressed (JPEG) buffers from a bounded pool:
//! every `acquire` must be paired with exactly one `release`, including on
//! every early-return error path, or the pool drains and capture stalls.
//! `FrameGuard` makes that pairing a drop guard instead of a convention.

/// One compressed frame lent out by a `FrameSource`.
#[derive(Debug)]
pub struct Frame {
    data: Vec<u8>,
}

impl Frame {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Produces compressed image buffers on demand.
///
/// `acquire` is non-blocking and returns `None` when no frame is ready yet.
pub trait FrameSource {
    fn acquire(&mut self) -> Option<Frame>;
    fn release(&mut self, frame: Frame);
}

/// Returns a lent frame to its source when dropped.
pub struct FrameGuard<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
    frame: Option<Frame>,
}

impl<'a, S: FrameSource + ?Sized> FrameGuard<'a, S> {
    pub fn acquire(source: &'a mut S) -> Option<Self> {
        let frame = source.acquire()?;
        Some(Self {
            source,
            frame: Some(frame),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        self.frame.as_ref().map(Frame::bytes).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }
}

impl<S: FrameSource + ?Sized> Drop for FrameGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.source.release(frame);
        }
    }
}

/// Pool slots handed out by `SyntheticSource` before it reports starvation.
const SYNTHETIC_POOL_SLOTS: usize = 4;

/// Stand-in sensor generating JPEG-framed synthetic payloads.
///
/// Used by the daemon when no real sensor is wired up, and by integration
/// tests. Payload sizes vary per frame so container size accounting is
/// exercised with non-uniform frames.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    counter: u64,
    free_slots: usize,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            counter: 0,
            free_slots: SYNTHETIC_POOL_SLOTS,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn acquire(&mut self) -> Option<Frame> {
        if self.free_slots == 0 {
            return None;
        }
        self.free_slots -= 1;
        self.counter += 1;

        let body_len = (self.width * self.height / 64) as usize + (self.counter as usize % 97);
        let mut data = Vec::with_capacity(body_len + 4);
        data.extend_from_slice(&[0xFF, 0xD8]);
        for i in 0..body_len {
            data.push(((i as u64 + self.counter) % 251) as u8);
        }
        data.extend_from_slice(&[0xFF, 0xD9]);
        Some(Frame::new(data))
    }

    fn release(&mut self, frame: Frame) {
        drop(frame);
        debug_assert!(self.free_slots < SYNTHETIC_POOL_SLOTS, "over-released frame");
        self.free_slots += 1;
    }
}
