use core::fmt;

use crate::volume::Dims3;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    SizeMismatch { expected: usize, actual: usize },
    GridMismatch { expected: Dims3, actual: Dims3 },
    UnknownPolarity(String),
    UnknownStrategy(String),
    InvalidParameter { name: &'static str, value: f64 },
    InvalidScale(f64),
    EmptyScales,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected} voxels, got {actual}")
            }
            Self::GridMismatch { expected, actual } => {
                write!(f, "grid mismatch: expected {expected}, got {actual}")
            }
            Self::UnknownPolarity(v) => {
                write!(f, "unknown polarity '{v}' (expected bright or dark)")
            }
            Self::UnknownStrategy(v) => {
                write!(
                    f,
                    "unknown calibration strategy '{v}' (expected implementation or journal)"
                )
            }
            Self::InvalidParameter { name, value } => {
                write!(f, "{name} must be finite and non-negative, got {value}")
            }
            Self::InvalidScale(sigma) => write!(f, "scale must be finite and > 0, got {sigma}"),
            Self::EmptyScales => write!(f, "at least one scale is required"),
        }
    }
}

impl std::error::Error for Error {}
