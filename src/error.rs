use thiserror::Error;

/// Errors produced while decoding a save file or ROM image. Everything is
/// fatal; the pipeline has no retry or partial-result mode.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed save data: {0}")]
    MalformedSave(String),

    #[error("unsupported game version: {0}")]
    UnsupportedVersion(String),

    #[error("expansion version {found} is older than the minimum supported {minimum}")]
    VersionTooOld { found: String, minimum: String },

    #[error(
        "read of {len} bytes at offset {offset:#x} runs past the end of {context} ({size} bytes)"
    )]
    OutOfRange {
        context: &'static str,
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("no {kind} with id {id} in the ROM tables")]
    UnknownId { kind: &'static str, id: u16 },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
