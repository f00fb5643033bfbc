//! Fatal configuration errors.
//!
//! Per-frame anomalies (no detection, a zero-height bounding box) are not errors and never show
//! up here. Failures of the external capabilities (inference, IO, the drone link) travel as
//! [`anyhow::Error`]s.

use std::path::PathBuf;

use thiserror::Error;

/// An error that aborts a mode selection or the opening of a stream.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested tracker name is not known.
    #[error("tracker `{0}` is not implemented")]
    NotImplemented(String),

    /// A setting required by the selected mode has never been configured.
    #[error("setting `{0}` must be configured before human tracking can start")]
    MissingSetting(&'static str),

    /// A setting is present but cannot be used.
    #[error("invalid value for setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    /// The class label table of an object detector lacks a class the detector depends on.
    #[error("class label table has no `{0}` entry")]
    MissingClass(&'static str),

    /// An operation needs a tracking mode, but none has been selected.
    #[error("no tracking mode selected")]
    NoMode,

    /// A video source could not be opened.
    #[error("cannot open video source `{}`: {reason}", path.display())]
    VideoSource { path: PathBuf, reason: String },
}
