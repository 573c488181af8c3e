//! Error types of the asset pipeline.
//!
//! Every component reports its own typed error so callers can react to the
//! exact failure (a missing file, an undecodable image, a shader the compiler
//! rejected, a malformed level). [`Error`] wraps all of them for code that just
//! wants to propagate with `?`.
//!
//! Per-slot and per-node failures inside material and level resolution never
//! surface here: they degrade to engine defaults and are recorded as
//! [`LoadWarning`]s instead.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use crate::resources::shader::ShaderStage;

/// A file could not be read (missing, permissions, not a file).
#[derive(Debug, Error)]
#[error("could not read asset {}: {source}", .path.display())]
pub struct AssetReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// The bytes of an asset were read but are not a valid image or mesh.
#[derive(Debug, Error)]
#[error("could not decode {}: {reason}", .path.display())]
pub struct DecodeError {
    pub path: PathBuf,
    pub reason: String,
}

/// Failure to turn a file into a GPU texture or mesh.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error(transparent)]
    Read(#[from] AssetReadError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Failure to build a shader program from a vertex/fragment pair.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error(transparent)]
    Read(#[from] AssetReadError),
    /// A single stage was rejected; linking was not attempted.
    #[error("{stage} stage {} failed to compile:\n{log}", .path.display())]
    Compile {
        stage: ShaderStage,
        path: PathBuf,
        log: String,
    },
    /// Both stages compiled but their interfaces do not fit together.
    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
}

/// An invalid vertex format was handed to the layout binder.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("vertex format has no attributes, stride would be zero")]
    EmptyFormat,
    #[error("attribute `{semantic}` has {components} components, supported range is 1-4")]
    ComponentCount { semantic: String, components: u32 },
}

/// Structural failures of loading or saving a level.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error(transparent)]
    Read(#[from] AssetReadError),
    #[error("{}:{line}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("could not write level {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },
}

/// Soft condition: more lights were submitted than the uniform array holds.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{dropped_count} lights exceeded the light array capacity and were dropped")]
pub struct LightOverflow {
    pub dropped_count: usize,
}

/// Umbrella error for the whole crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Level(#[from] LevelError),
}

impl From<AssetReadError> for Error {
    fn from(err: AssetReadError) -> Self {
        Error::Asset(AssetError::Read(err))
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Asset(AssetError::Decode(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A degraded, non-fatal outcome recorded while resolving a material or level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// What was being resolved, e.g. `node "crate"` or `material slot normal`.
    pub subject: String,
    pub reason: String,
}

impl LoadWarning {
    pub fn new(subject: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            subject: subject.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.reason)
    }
}
