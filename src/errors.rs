//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`WallError`] covers all failure modes including:
//! - Operations addressing a tile index outside the current wall
//! - Malformed option values caught at the call boundary
//! - Animations cancelled by a registry flush before they finished
//! - Collaborator failures surfaced through a rejected completion signal
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, WallError>`.
//!
//! ```rust,ignore
//! use tilewall::errors::{Result, WallError};
//!
//! fn poke_tile(index: usize) -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the tile wall engine.
///
/// Malformed inputs fail here, at the call boundary, instead of feeding
/// NaN or out-of-range values into the tween pipeline where they would
/// silently corrupt interpolated state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WallError {
    /// Operation referenced a tile index outside the current wall bounds.
    ///
    /// This always fails fast; silently ignoring a bad index would let the
    /// caller's idea of the wall drift away from the engine's.
    #[error("tile index out of bounds: {index} (wall has {len} tiles)")]
    InvalidIndex {
        /// The offending index
        index: usize,
        /// Number of tiles currently in the wall
        len: usize,
    },

    /// An option value was NaN or infinite.
    #[error("non-finite value for {what}: {value}")]
    NonFinite {
        /// Which option carried the bad value
        what: &'static str,
        /// The offending value
        value: f32,
    },

    /// An option value had to be strictly positive.
    #[error("{what} must be positive, got {value}")]
    NonPositive {
        /// Which option carried the bad value
        what: &'static str,
        /// The offending value
        value: f32,
    },

    /// The animation's channel was flushed (mode switch, queue replacement)
    /// before the animation could finish.
    #[error("animation cancelled before completion")]
    Cancelled,

    /// Failure reported by an external collaborator (asset or audio
    /// loading). The engine takes no corrective action beyond surfacing it
    /// through the rejected completion signal.
    #[error("collaborator failure: {0}")]
    Collaborator(String),
}

/// Checks that a value is finite, naming the option on failure.
pub(crate) fn ensure_finite(what: &'static str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(WallError::NonFinite { what, value })
    }
}

/// Checks that a value is finite and strictly positive.
pub(crate) fn ensure_positive(what: &'static str, value: f32) -> Result<()> {
    ensure_finite(what, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(WallError::NonPositive { what, value })
    }
}

/// Alias for `Result<T, WallError>`.
pub type Result<T> = std::result::Result<T, WallError>;
