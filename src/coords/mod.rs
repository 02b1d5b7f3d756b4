//! Cage coordinate engines and the persistent weight table.

pub mod green;
pub mod mvc;

use crate::geometry::Degree;

/// How a weight table was produced, fixing its row layout.
#[derive(Debug, Clone)]
pub enum WeightKind {
    /// Green coordinates: `2·target + 1` scalars per segment, point-term
    /// weights for the monomial coefficients followed by derivative-term
    /// weights for their rotated counterparts.
    Green { source: Degree, target: Degree },
    /// Cubic mean-value coordinates: 5 scalars per segment (vertex weight,
    /// two tangential and two normal gradient corrections), plus the
    /// bind-time chord length of every edge.
    CubicMvc { chord_lengths: Vec<f64> },
}

/// Build-time diagnostics of a weight table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildDiagnostics {
    /// Largest `‖reconstruction − vertex‖` over all rows when substituting
    /// the weights back against the bind cage's own basis. `None` for
    /// truncating targets (target degree below the cage degree), where the
    /// identity does not apply.
    pub max_reproduction_error: Option<f64>,
    /// Rows whose kernels fell back to quadrature near a degenerate root
    /// configuration.
    pub degraded_rows: usize,
}

/// Per-vertex coordinate rows bound to one cage topology.
///
/// Built once per (cage topology, mesh) pair and reused across arbitrarily
/// many cage edits; any structural cage change (degree, segment count)
/// invalidates it.
#[derive(Debug, Clone)]
pub struct WeightTable {
    rows: Vec<Vec<f64>>,
    row_len: usize,
    segment_count: usize,
    kind: WeightKind,
    cage_version: u64,
    diagnostics: BuildDiagnostics,
}

impl WeightTable {
    pub(crate) fn new(
        rows: Vec<Vec<f64>>,
        row_len: usize,
        segment_count: usize,
        kind: WeightKind,
        cage_version: u64,
        diagnostics: BuildDiagnostics,
    ) -> Self {
        Self {
            rows,
            row_len,
            segment_count,
            kind,
            cage_version,
            diagnostics,
        }
    }

    /// Returns one vertex's weight row.
    #[must_use]
    pub fn row(&self, vertex: usize) -> &[f64] {
        &self.rows[vertex]
    }

    /// Returns all rows, one per mesh vertex.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Returns the number of rows (mesh vertices).
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of scalars per row.
    #[must_use]
    pub fn row_len(&self) -> usize {
        self.row_len
    }

    /// Returns the segment count of the bind cage.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Returns how the table was produced.
    #[must_use]
    pub fn kind(&self) -> &WeightKind {
        &self.kind
    }

    /// Returns the version of the cage the table was built against.
    #[must_use]
    pub fn cage_version(&self) -> u64 {
        self.cage_version
    }

    /// Returns the build diagnostics.
    #[must_use]
    pub fn diagnostics(&self) -> BuildDiagnostics {
        self.diagnostics
    }
}
