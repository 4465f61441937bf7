//! Incremental AVI writer.
//!
//! Frame count and duration are unknown while recording, so the header is
//! written up front with zeroed count/size fields and patched in place on
//! finalize. Until `finalize` runs the file is not a valid AVI.
//!
//! Frame payloads are appended raw, with no per-frame chunk wrapper; frame
//! boundaries are not recoverable from the file alone. Players that require
//! `00dc` chunking will not seek within these files.

use crate::storage::{StorageFault, StorageFile};

use super::{
    FourCc, AVIH, AVI_, HDRL, HEADER_SIZE, JUNK, LIST, OFF_RIFF_SIZE, OFF_STREAM_LENGTH,
    OFF_TOTAL_FRAMES, RIFF, STRF, STRH, STRL, VIDS,
};

const AVIH_BODY_SIZE: u32 = 52;
const STRH_BODY_SIZE: u32 = 56;
const STRF_BODY_SIZE: u32 = 40;
const STRL_LIST_SIZE: u32 = 4 + (8 + STRH_BODY_SIZE) + (8 + STRF_BODY_SIZE);
const HDRL_LIST_SIZE: u32 = 4 + (8 + AVIH_BODY_SIZE) + (8 + STRL_LIST_SIZE);
const JUNK_OFFSET: u32 = 12 + 8 + HDRL_LIST_SIZE;
const JUNK_BODY_SIZE: u32 = HEADER_SIZE as u32 - JUNK_OFFSET - 8;

/// Video stream parameters fixed at header creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoParams {
    pub width: u32,
    pub height: u32,
    pub frame_rate_hz: u32,
    pub codec: FourCc,
}

/// Incremental encoder for one AVI file.
///
/// Tracks bytes written so the RIFF size at finalize needs no stat call on
/// the medium.
pub struct AviWriter<F> {
    file: F,
    bytes_written: u64,
}

impl<F: StorageFile> AviWriter<F> {
    /// Builds the fixed header region with zeroed placeholders and writes it
    /// as the first bytes of `file`, in one logical write.
    ///
    /// A short write is a fault: the caller must discard the file, since a
    /// partial header must never be mistaken for a valid one.
    pub fn create(mut file: F, params: &VideoParams) -> Result<Self, StorageFault> {
        let header = build_header(params);
        let written = file.write(&header)?;
        if written != header.len() {
            return Err(StorageFault::ShortWrite {
                written,
                expected: header.len(),
            });
        }
        Ok(Self {
            file,
            bytes_written: HEADER_SIZE,
        })
    }

    /// Appends one frame payload at the end of the file and returns the
    /// number of bytes actually written.
    ///
    /// The caller must treat a count shorter than the payload as a storage
    /// fault and stop recording; the payload is not retried.
    pub fn append_frame(&mut self, payload: &[u8]) -> Result<usize, StorageFault> {
        let written = self.file.write(payload)?;
        self.bytes_written += written as u64;
        Ok(written)
    }

    /// Durability flush, used on the periodic flush cadence.
    pub fn flush(&mut self) -> Result<(), StorageFault> {
        self.file.flush()
    }

    /// Patches the frame-count fields and the RIFF size, then flushes.
    ///
    /// A fault leaves the file with whatever placeholders were not yet
    /// overwritten; it is reported, never panicked.
    pub fn finalize(&mut self, total_frames: u32) -> Result<(), StorageFault> {
        self.patch_u32(OFF_TOTAL_FRAMES, total_frames)?;
        self.patch_u32(OFF_STREAM_LENGTH, total_frames)?;
        self.patch_u32(OFF_RIFF_SIZE, (self.bytes_written - 8) as u32)?;
        self.file.flush()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn patch_u32(&mut self, offset: u64, value: u32) -> Result<(), StorageFault> {
        self.file.seek_to(offset)?;
        let written = self.file.write(&value.to_le_bytes())?;
        if written != 4 {
            return Err(StorageFault::ShortWrite {
                written,
                expected: 4,
            });
        }
        Ok(())
    }
}

fn build_header(params: &VideoParams) -> Vec<u8> {
    let usec_per_frame = if params.frame_rate_hz == 0 {
        0
    } else {
        1_000_000 / params.frame_rate_hz
    };

    let mut h = Vec::with_capacity(HEADER_SIZE as usize);

    put_fourcc(&mut h, RIFF);
    put_u32(&mut h, 0); // RIFF size, patched at finalize
    put_fourcc(&mut h, AVI_);

    put_fourcc(&mut h, LIST);
    put_u32(&mut h, HDRL_LIST_SIZE);
    put_fourcc(&mut h, HDRL);

    // avih main header
    put_fourcc(&mut h, AVIH);
    put_u32(&mut h, AVIH_BODY_SIZE);
    put_u32(&mut h, usec_per_frame);
    put_u32(&mut h, 0); // dwMaxBytesPerSec
    put_u32(&mut h, 0); // dwPaddingGranularity
    put_u32(&mut h, 0); // dwFlags
    put_u32(&mut h, 0); // dwTotalFrames, patched at finalize
    put_u32(&mut h, 0); // dwInitialFrames
    put_u32(&mut h, 1); // dwStreams
    put_u32(&mut h, 0); // dwSuggestedBufferSize
    put_u32(&mut h, params.width);
    put_u32(&mut h, params.height);
    put_u32(&mut h, 0); // dwReserved
    put_u32(&mut h, 0);
    put_u32(&mut h, 0);

    put_fourcc(&mut h, LIST);
    put_u32(&mut h, STRL_LIST_SIZE);
    put_fourcc(&mut h, STRL);

    // strh stream header
    put_fourcc(&mut h, STRH);
    put_u32(&mut h, STRH_BODY_SIZE);
    put_fourcc(&mut h, VIDS);
    put_fourcc(&mut h, params.codec);
    put_u32(&mut h, 0); // dwFlags
    put_u16(&mut h, 0); // wPriority
    put_u16(&mut h, 0); // wLanguage
    put_u32(&mut h, 0); // dwInitialFrames
    put_u32(&mut h, 1); // dwScale
    put_u32(&mut h, params.frame_rate_hz); // dwRate
    put_u32(&mut h, 0); // dwStart
    put_u32(&mut h, 0); // dwLength, patched at finalize
    put_u32(&mut h, 0); // dwSuggestedBufferSize
    put_u32(&mut h, 0); // dwQuality
    put_u32(&mut h, 0); // dwSampleSize
    put_u16(&mut h, 0); // rcFrame
    put_u16(&mut h, 0);
    put_u16(&mut h, params.width as u16);
    put_u16(&mut h, params.height as u16);

    // strf BITMAPINFOHEADER
    put_fourcc(&mut h, STRF);
    put_u32(&mut h, STRF_BODY_SIZE);
    put_u32(&mut h, STRF_BODY_SIZE); // biSize
    put_u32(&mut h, params.width);
    put_u32(&mut h, params.height);
    put_u16(&mut h, 1); // biPlanes
    put_u16(&mut h, 24); // biBitCount
    put_fourcc(&mut h, params.codec); // biCompression
    put_u32(&mut h, 0); // biSizeImage
    put_u32(&mut h, 0); // biXPelsPerMeter
    put_u32(&mut h, 0); // biYPelsPerMeter
    put_u32(&mut h, 0); // biClrUsed
    put_u32(&mut h, 0); // biClrImportant

    // pad the fixed region
    put_fourcc(&mut h, JUNK);
    put_u32(&mut h, JUNK_BODY_SIZE);
    h.resize(HEADER_SIZE as usize, 0);

    debug_assert_eq!(h.len(), HEADER_SIZE as usize);
    h
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_fourcc(buf: &mut Vec<u8>, fourcc: FourCc) {
    buf.extend_from_slice(&fourcc);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avi::MJPG;
    use crate::storage::mem::MemFile;

    fn params() -> VideoParams {
        VideoParams {
            width: 640,
            height: 480,
            frame_rate_hz: 25,
            codec: MJPG,
        }
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_header_layout() {
        let (file, buf) = MemFile::new();
        let writer = AviWriter::create(file, &params()).unwrap();
        assert_eq!(writer.bytes_written(), HEADER_SIZE);

        let bytes = buf.borrow();
        assert_eq!(bytes.len(), HEADER_SIZE as usize);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4), 0);
        assert_eq!(&bytes[8..12], b"AVI ");
        assert_eq!(&bytes[12..16], b"LIST");
        assert_eq!(&bytes[20..24], b"hdrl");
        assert_eq!(&bytes[24..28], b"avih");
        assert_eq!(u32_at(&bytes, 32), 40_000); // 25 Hz in usec/frame
        assert_eq!(u32_at(&bytes, 48), 0);
        assert_eq!(u32_at(&bytes, 64), 640);
        assert_eq!(u32_at(&bytes, 68), 480);
        assert_eq!(&bytes[92..96], b"strl");
        assert_eq!(&bytes[96..100], b"strh");
        assert_eq!(&bytes[104..108], b"vids");
        assert_eq!(&bytes[108..112], b"MJPG");
        assert_eq!(u32_at(&bytes, 128), 25); // dwRate
        assert_eq!(u32_at(&bytes, 136), 0);
        assert_eq!(&bytes[160..164], b"strf");
        assert_eq!(u32_at(&bytes, 172), 640);
        assert_eq!(&bytes[184..188], b"MJPG");
        assert_eq!(&bytes[208..212], b"JUNK");
        assert_eq!(u32_at(&bytes, 212), 296);
    }

    #[test]
    fn test_finalize_with_zero_frames() {
        let (file, buf) = MemFile::new();
        let mut writer = AviWriter::create(file, &params()).unwrap();
        writer.finalize(0).unwrap();

        let bytes = buf.borrow();
        assert_eq!(bytes.len(), HEADER_SIZE as usize);
        assert_eq!(u32_at(&bytes, OFF_RIFF_SIZE as usize), 504);
        assert_eq!(u32_at(&bytes, OFF_TOTAL_FRAMES as usize), 0);
        assert_eq!(u32_at(&bytes, OFF_STREAM_LENGTH as usize), 0);
    }

    #[test]
    fn test_appended_payloads_and_patched_counts() {
        let (file, buf) = MemFile::new();
        let mut writer = AviWriter::create(file, &params()).unwrap();

        let mut total = 0usize;
        for i in 0..25u32 {
            let payload = vec![i as u8; 100 + (i as usize * 7) % 41];
            total += payload.len();
            assert_eq!(writer.append_frame(&payload).unwrap(), payload.len());
        }
        writer.finalize(25).unwrap();

        let bytes = buf.borrow();
        assert_eq!(bytes.len(), HEADER_SIZE as usize + total);
        assert_eq!(u32_at(&bytes, OFF_TOTAL_FRAMES as usize), 25);
        assert_eq!(u32_at(&bytes, OFF_STREAM_LENGTH as usize), 25);
        assert_eq!(
            u32_at(&bytes, OFF_RIFF_SIZE as usize) as usize,
            bytes.len() - 8
        );
    }

    #[test]
    fn test_payloads_land_after_header_unwrapped() {
        let (file, buf) = MemFile::new();
        let mut writer = AviWriter::create(file, &params()).unwrap();
        writer.append_frame(b"alpha").unwrap();
        writer.append_frame(b"beta").unwrap();

        let bytes = buf.borrow();
        assert_eq!(&bytes[HEADER_SIZE as usize..], b"alphabeta");
    }

    #[test]
    fn test_short_header_write_is_fault() {
        let (file, buf) = MemFile::new();
        file.short_write_on_call(1, 100);
        let err = AviWriter::create(file, &params()).err().unwrap();
        assert_eq!(
            err,
            StorageFault::ShortWrite {
                written: 100,
                expected: HEADER_SIZE as usize,
            }
        );
        assert_eq!(buf.borrow().len(), 100);
    }

    #[test]
    fn test_short_append_reports_actual_count() {
        let (file, _buf) = MemFile::new();
        file.short_write_on_call(2, 3);
        let mut writer = AviWriter::create(file, &params()).unwrap();
        assert_eq!(writer.append_frame(b"0123456789").unwrap(), 3);
    }
}
