//! Error types for tactus.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Client-side validation failures,
//! driver-reported failures, and link failures are all captured here.

/// The error type for all tactus operations.
///
/// Client-side checks (zero loop counts, duplicate group keys, malformed
/// control points) are raised at construction time; driver-side checks
/// (non-integral clock divisions, buffer-size mismatches, silencer
/// rejections) are raised when a datagram is produced or sent. Nothing is
/// retried automatically; the caller decides whether to resend.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A dynamic send or group entry was given something other than one
    /// datagram or a pair of datagrams.
    #[error("invalid datagram type")]
    InvalidDatagramType,

    /// The group key map produced a key that has no entry in the data map.
    #[error("unknown group key")]
    UnknownGroupKey,

    /// The same key was registered twice in a group builder.
    #[error("key already exists")]
    KeyAlreadyExists,

    /// A quantity that must be at least 1 was given as 0.
    #[error("value must be greater than 0: {0}")]
    CantBeZero(u64),

    /// An invalid parameter was passed to a client-side constructor.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A driver-reported failure (validation, timing, firmware rejection).
    ///
    /// The message is propagated verbatim from the point of detection.
    #[error("driver error: {0}")]
    Driver(String),

    /// A link-level (transport) failure.
    #[error("link error: {0}")]
    Link(String),

    /// The controller or link has been closed; no further sends are possible.
    #[error("link is closed")]
    LinkClosed,

    /// The requested query is not supported by this link implementation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
