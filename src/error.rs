use thiserror::Error;

/// Top-level error type for the cagedef deformation kernel.
#[derive(Debug, Error)]
pub enum CagedefError {
    #[error(transparent)]
    Cage(#[from] CageError),

    #[error(transparent)]
    Numeric(#[from] NumericError),

    #[error(transparent)]
    Weight(#[from] WeightError),
}

/// Errors raised while building or editing a cage.
#[derive(Debug, Error)]
pub enum CageError {
    #[error("empty control point list")]
    EmptyControlPoints,

    #[error("{count} control points cannot be split into degree-{degree} segments")]
    ControlPointCount { count: usize, degree: usize },

    #[error("cage needs at least {min} segments, got {got}")]
    TooFewSegments { min: usize, got: usize },

    #[error("segment {index} has a zero-length chord")]
    ZeroLengthChord { index: usize },

    #[error("cage boundary encloses no area")]
    DegenerateBoundary,

    #[error("unsupported degree change from {from} to {to}")]
    UnsupportedDegreeChange { from: usize, to: usize },

    #[error("control point index {index} out of range ({count} points)")]
    PointIndexOutOfRange { index: usize, count: usize },
}

/// Numeric failures inside the coordinate engines.
#[derive(Debug, Error)]
pub enum NumericError {
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("singular gradient system at cage vertex {vertex} (parallel incident edges)")]
    SingularSystem { vertex: usize },
}

/// Errors raised when a weight table and its inputs disagree.
#[derive(Debug, Error)]
pub enum WeightError {
    #[error("weights must be built from a degree-1/2/3 cage, got degree {got}")]
    UnsupportedSourceDegree { got: usize },

    #[error("weight table was built for {expected} segments, cage has {got}")]
    SegmentCountMismatch { expected: usize, got: usize },

    #[error("weight table expects a degree-{expected} cage, got degree {got}")]
    DegreeMismatch { expected: usize, got: usize },

    #[error("weight table has {rows} rows, mesh has {vertices} vertices")]
    VertexCountMismatch { rows: usize, vertices: usize },

    #[error("per-segment flag list has {flags} entries, cage has {segments} segments")]
    FlagCountMismatch { flags: usize, segments: usize },

    #[error("chord length list has {lengths} entries, cage has {segments} segments")]
    ChordCountMismatch { lengths: usize, segments: usize },
}

/// Convenience type alias for results using [`CagedefError`].
pub type Result<T> = std::result::Result<T, CagedefError>;
