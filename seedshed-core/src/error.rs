//! Error types for the seedshed core library.
//!
//! Defines the error enum exposed by the public API, its stable
//! machine-readable codes, and a convenient result alias.

use std::fmt;

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Names the caller-owned buffer that failed a length check.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum VolumeBuffer {
    /// The `u32` segmentation volume (seeds in, labels out).
    Segmentation,
    /// The `u8` affinity field.
    Affinity,
}

impl fmt::Display for VolumeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Segmentation => "segmentation",
            Self::Affinity => "affinity",
        })
    }
}

/// Error type produced when validating inputs or running a seeded watershed.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum WatershedError {
    /// The affinity field is not `(3, Z, Y, X)` over the segmentation's `(Z, Y, X)`.
    #[error("affinity shape {actual:?} does not match expected {expected:?}")]
    ShapeMismatch {
        /// Affinity dimensions required by the segmentation volume.
        expected: [usize; 4],
        /// Affinity dimensions supplied by the caller.
        actual: [usize; 4],
    },
    /// A buffer's length disagrees with the dimensions it was paired with.
    #[error("{buffer} buffer has {actual} elements but its shape requires {expected}")]
    BufferLengthMismatch {
        /// Which buffer failed the check.
        buffer: VolumeBuffer,
        /// Element count implied by the dimensions.
        expected: usize,
        /// Element count actually supplied.
        actual: usize,
    },
    /// The volume's voxel or edge-slot count overflows `usize`.
    #[error("volume with dimensions {dims:?} exceeds addressable capacity")]
    VolumeTooLarge {
        /// The requested `(Z, Y, X)` extents.
        dims: [usize; 3],
    },
    /// A time budget of zero can never be met.
    #[error("time budget must be greater than zero")]
    InvalidTimeBudget,
    /// The configured time budget elapsed before the union pass finished.
    #[error("time budget exhausted after {processed} of {total} ordered edges")]
    DeadlineExceeded {
        /// Ordered edges processed before the abort.
        processed: usize,
        /// Ordered edges that would have been processed.
        total: usize,
    },
    /// An internal invariant was violated, indicating a logic error.
    #[error("watershed invariant violated: {invariant} (index {index}, len {len})")]
    InvariantViolation {
        /// Name of the violated invariant to assist debugging.
        invariant: &'static str,
        /// The offending index.
        index: usize,
        /// The length of the structure that was indexed.
        len: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`WatershedError`] variants.
    enum WatershedErrorCode for WatershedError {
        /// The affinity field does not match the segmentation volume.
        ShapeMismatch => ShapeMismatch { .. } => "SEEDSHED_SHAPE_MISMATCH",
        /// A buffer's length disagrees with its dimensions.
        BufferLengthMismatch => BufferLengthMismatch { .. } => "SEEDSHED_BUFFER_LENGTH_MISMATCH",
        /// The volume exceeds addressable capacity.
        VolumeTooLarge => VolumeTooLarge { .. } => "SEEDSHED_VOLUME_TOO_LARGE",
        /// A zero time budget was configured.
        InvalidTimeBudget => InvalidTimeBudget => "SEEDSHED_INVALID_TIME_BUDGET",
        /// The time budget elapsed mid-run.
        DeadlineExceeded => DeadlineExceeded { .. } => "SEEDSHED_DEADLINE_EXCEEDED",
        /// An internal invariant was violated.
        InvariantViolation => InvariantViolation { .. } => "SEEDSHED_INVARIANT_VIOLATION",
    }
}

impl WatershedError {
    /// Returns `true` for errors raised by input validation, before the core
    /// algorithm touches any state.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::ShapeMismatch { .. }
                | Self::BufferLengthMismatch { .. }
                | Self::VolumeTooLarge { .. }
        )
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, WatershedError>;
