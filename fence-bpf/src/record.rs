//! Raw ring-buffer record decoding.
//!
//! Layout of `struct event_t` (little-endian, no padding):
//! `pid: u32 | uid: u32 | comm: [u8; 16] | filename: [u8; 256] | flags: i32`

use fence_schema::{Event, COMM_LEN, PATH_LEN};
use thiserror::Error;

const PID_OFFSET: usize = 0;
const UID_OFFSET: usize = 4;
const COMM_OFFSET: usize = 8;
const PATH_OFFSET: usize = COMM_OFFSET + COMM_LEN;
const FLAGS_OFFSET: usize = PATH_OFFSET + PATH_LEN;

/// Size in bytes of one raw record.
pub const RECORD_SIZE: usize = FLAGS_OFFSET + 4;

/// Errors decoding a raw record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record too short: expected {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
}

/// Decode one raw record. Trailing bytes beyond [`RECORD_SIZE`] are ignored.
pub fn decode_record(data: &[u8]) -> Result<Event, RecordError> {
    if data.len() < RECORD_SIZE {
        return Err(RecordError::TooShort {
            expected: RECORD_SIZE,
            actual: data.len(),
        });
    }

    Ok(Event::from_raw_parts(
        le_u32(data, PID_OFFSET),
        le_u32(data, UID_OFFSET),
        &data[COMM_OFFSET..PATH_OFFSET],
        &data[PATH_OFFSET..FLAGS_OFFSET],
        le_u32(data, FLAGS_OFFSET) as i32,
    ))
}

fn le_u32(data: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[at..at + 4]);
    u32::from_le_bytes(buf)
}
