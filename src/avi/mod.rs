//! AVI/RIFF container layout.
//!
//! The on-medium file is a fixed 512-byte header region followed by raw
//! frame payloads written back-to-back. Three header fields hold zero
//! placeholders until `AviWriter::finalize` patches them in place:
//!
//! ```text
//! offset   0  "RIFF"
//! offset   4  RIFF chunk size            <- patched (file size - 8)
//! offset   8  "AVI "
//! offset  12  LIST "hdrl"
//! offset  24  "avih" main header (52-byte body)
//! offset  48    dwTotalFrames            <- patched (frame count)
//! offset  84  LIST "strl"
//! offset  96  "strh" stream header (56-byte body, fccType "vids")
//! offset 136    dwLength                 <- patched (frame count)
//! offset 160  "strf" BITMAPINFOHEADER (40-byte body)
//! offset 208  "JUNK" padding to 512
//! offset 512  first frame payload
//! ```
//!
//! All multi-byte fields are little-endian; fourcc codes are raw ASCII
//! bytes, never decoded.

pub mod writer;

pub use writer::{AviWriter, VideoParams};

/// Four-byte ASCII code stored and compared as raw bytes.
pub type FourCc = [u8; 4];

pub const RIFF: FourCc = *b"RIFF";
pub const AVI_: FourCc = *b"AVI ";
pub const LIST: FourCc = *b"LIST";
pub const HDRL: FourCc = *b"hdrl";
pub const AVIH: FourCc = *b"avih";
pub const STRL: FourCc = *b"strl";
pub const STRH: FourCc = *b"strh";
pub const STRF: FourCc = *b"strf";
pub const JUNK: FourCc = *b"JUNK";
pub const VIDS: FourCc = *b"vids";
pub const MJPG: FourCc = *b"MJPG";

/// Size of the fixed header region. Written once at creation, never grows.
pub const HEADER_SIZE: u64 = 512;

/// Patched at finalize: RIFF chunk size.
pub const OFF_RIFF_SIZE: u64 = 4;
/// Patched at finalize: `avih` total frame count.
pub const OFF_TOTAL_FRAMES: u64 = 48;
/// Patched at finalize: `strh` stream length in frames.
pub const OFF_STREAM_LENGTH: u64 = 136;
