use thiserror::Error;

use crate::AlertKey;

/// Malformed feed data. Always fatal for the batch: nothing is written when one of these surfaces.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("entity id `{0}` does not split into <source>:<type>:<key>")]
    MalformedEntityId(String),

    #[error("entity `{id}`: {reason}")]
    MalformedEntity { id: String, reason: String },

    #[error("entity `{id}`: no `{language}` translation in {field}")]
    MissingTranslation {
        id: String,
        field: &'static str,
        language: String,
    },

    #[error("entity `{id}`: epoch timestamp {value} is out of range")]
    TimestampOutOfRange { id: String, value: i64 },

    #[error("alert `{0}` has no active windows")]
    NoActiveWindows(AlertKey),

    #[error("alert `{key}`: window {index} ends before it starts ({start} > {end})")]
    InvertedWindow {
        key: AlertKey,
        index: usize,
        start: String,
        end: String,
    },

    #[error("alert key `{0}` appears more than once in one poll")]
    DuplicateKey(AlertKey),
}
