//! Request field validation shared by the handlers.

use regex::Regex;
use torr_core::digest::parse_digest;
use torr_core::message::FileInfo;
use torr_core::{Digest, Status};

use crate::store::CHUNK_SIZE;

pub const EMPTY_FILENAME: &str = "The filename is empty.";
pub const BAD_FILE_HASH: &str = "The file hash is not 16 bytes long.";
pub const NEGATIVE_INDEX: &str = "The chunk index is less than zero.";
pub const BAD_CHUNK_LIST: &str = "The chunk list does not match the file size.";
pub const INVALID_REGEX: &str = "Invalid regex.";
pub const FILE_NOT_FOUND: &str = "File not found.";
pub const CHUNK_NOT_FOUND: &str = "Chunk not found.";

/// A failed check: the status and message to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub status: Status,
    pub message: &'static str,
}

impl Rejection {
    pub const fn malformed(message: &'static str) -> Self {
        Self {
            status: Status::MalformedRequest,
            message,
        }
    }

    pub const fn not_found(message: &'static str) -> Self {
        Self {
            status: Status::NotFound,
            message,
        }
    }
}

pub fn filename(name: &str) -> Result<(), Rejection> {
    if name.is_empty() {
        return Err(Rejection::malformed(EMPTY_FILENAME));
    }
    Ok(())
}

pub fn file_hash(bytes: &[u8]) -> Result<Digest, Rejection> {
    parse_digest(bytes).ok_or(Rejection::malformed(BAD_FILE_HASH))
}

pub fn chunk_index(index: i64) -> Result<u64, Rejection> {
    u64::try_from(index).map_err(|_| Rejection::malformed(NEGATIVE_INDEX))
}

/// A descriptor must list chunks `0..n` in order, with `n` covering `size`.
pub fn chunk_list(info: &FileInfo) -> Result<(), Rejection> {
    let expected = info.size.div_ceil(CHUNK_SIZE as u64);
    let in_order = info
        .chunks
        .iter()
        .enumerate()
        .all(|(i, chunk)| chunk.index as usize == i);
    if info.chunks.len() as u64 != expected || !in_order {
        return Err(Rejection::malformed(BAD_CHUNK_LIST));
    }
    Ok(())
}

/// Compile a filename pattern for whole-name matching.
///
/// The pattern is checked as written before being anchored, so wrapping it
/// can never turn an invalid pattern into a valid one.
pub fn pattern(text: &str) -> Result<Regex, Rejection> {
    Regex::new(text).map_err(|_| Rejection::malformed(INVALID_REGEX))?;
    Regex::new(&format!("^(?:{text})$")).map_err(|_| Rejection::malformed(INVALID_REGEX))
}
