//! Fatal, programmer-error conditions raised by the builder surface.
//!
//! Everything here is raised at the misuse site and is never expected to be
//! recovered from; runtime `advance` never produces one of these (see the
//! module docs on [`crate::manager`]).

/// Errors raised by the fluent builder surface and by [`crate::manager`].
#[derive(Debug, thiserror::Error)]
pub enum TweenError {
    /// A negative duration was passed to a tween or timeline factory.
    #[error("duration must be >= 0, got {0}")]
    InvalidDuration(f64),

    /// A tween declared more scalar components than its manager's
    /// `combined_attrs_limit` allows.
    #[error("tween declares {declared} components, limit is {limit}")]
    CombinedAttrsOverflow {
        /// Number of components the tween tried to declare.
        declared: usize,
        /// The configured limit.
        limit: usize,
    },

    /// More waypoints were added than the manager's `waypoints_limit` allows.
    #[error("tween declares {declared} waypoints, limit is {limit}")]
    WaypointsOverflow {
        /// Number of waypoints the tween tried to declare.
        declared: usize,
        /// The configured limit.
        limit: usize,
    },

    /// `build()` could not resolve a registered accessor for the target's
    /// type.
    #[error("no accessor registered for this target type")]
    NoAccessor,

    /// A builder setter was called on a tween or timeline that has already
    /// started. Raised by panicking rather than by `Result`, since mutating a
    /// started tween is a logic bug and not a recoverable condition.
    #[error("builder method called on a tween that has already started")]
    MutateAfterStart,
}
