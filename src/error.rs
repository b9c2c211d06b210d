//! Error types for spline editing and mesh bending.

use thiserror::Error;

/// Errors from spline topology edits and sampling.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SplineError {
    /// A spline must always keep at least two nodes.
    #[error("spline needs at least {required} nodes, got {actual}")]
    NotEnoughNodes {
        /// Minimum required nodes.
        required: usize,
        /// Actual number of nodes.
        actual: usize,
    },

    /// A node index beyond the node list.
    #[error("node index {index} out of bounds (node count {count})")]
    NodeIndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// Number of nodes in the spline.
        count: usize,
    },

    /// Interior insertion starts at index 1; appending goes through `add_node`.
    #[error("cannot insert a node at index {0}: valid interior indices start at 1")]
    InvalidInsertIndex(usize),

    /// Removing a node would leave fewer than two.
    #[error("cannot remove a node from a spline with only {0} nodes")]
    NodeFloor(usize),

    /// A sampling time outside the valid range.
    #[error("time {time} is outside [0, {max}]")]
    TimeOutOfRange {
        /// The requested time.
        time: f32,
        /// Upper bound of the valid range.
        max: f32,
    },

    /// A sampling distance outside the valid range.
    #[error("distance {distance} is outside [0, {length}]")]
    DistanceOutOfRange {
        /// The requested distance.
        distance: f32,
        /// Total length of the curve or spline.
        length: f32,
    },
}

/// Result alias for spline operations.
pub type SplineResult<T> = Result<T, SplineError>;

/// Errors from building a template mesh or bending it along a spline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BendError {
    /// The bender has no template mesh assigned.
    #[error("no source mesh assigned to the bender")]
    NoSource,

    /// The template mesh has no vertices.
    #[error("source mesh has no vertices")]
    EmptySource,

    /// Tiling needs a template with positive extent along the bend axis.
    #[error("source mesh has zero length along its bend axis and cannot be tiled")]
    ZeroLengthSource,

    /// The configured interval does not fit the spline.
    #[error("invalid interval [{start}, {end}] for a spline of length {spline_length}")]
    InvalidInterval {
        /// Interval start distance.
        start: f32,
        /// Interval end distance, zero meaning "to the spline end".
        end: f32,
        /// Total spline length.
        spline_length: f32,
    },

    /// A curve index beyond the curve list.
    #[error("curve index {index} out of bounds (curve count {count})")]
    CurveIndexOutOfBounds {
        /// The requested curve index.
        index: usize,
        /// Number of curves in the spline.
        count: usize,
    },

    /// The mesh lacks an attribute the bender needs.
    #[error("mesh is missing its {0} attribute")]
    MissingAttribute(&'static str),

    /// The mesh stores an attribute in a format the bender cannot read.
    #[error("mesh {0} attribute has an unsupported format")]
    UnsupportedAttributeFormat(&'static str),

    /// A spline error surfaced during bending.
    #[error(transparent)]
    Spline(#[from] SplineError),
}

/// Result alias for bending operations.
pub type BendResult<T> = Result<T, BendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SplineError::NotEnoughNodes {
            required: 2,
            actual: 1,
        };
        assert!(err.to_string().contains("at least 2"));
        assert!(err.to_string().contains("got 1"));

        let err = BendError::InvalidInterval {
            start: 5.0,
            end: 3.0,
            spline_length: 10.0,
        };
        assert!(err.to_string().contains("[5, 3]"));
    }

    #[test]
    fn test_spline_error_converts_to_bend_error() {
        let err = SplineError::DistanceOutOfRange {
            distance: 2.0,
            length: 1.0,
        };
        let bend: BendError = err.clone().into();
        assert_eq!(bend, BendError::Spline(err));
    }
}
