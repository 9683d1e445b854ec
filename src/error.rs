//! Errors raised while loading puzzles and word lists or saving images. Failing to find a fill is not an error; see
//! `backtracking_search::FillFailure` for that.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::grid_config::GridCoord;

/// Problems with the geometry handed to `generate_grid_config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// An entry with length zero.
    EmptyEntry { entry_idx: usize },

    /// Two entries running in the same direction share a cell.
    ParallelOverlap { loc: GridCoord, entry_idxs: (usize, usize) },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEntry { entry_idx } => write!(f, "entry {entry_idx} has length zero"),
            Self::ParallelOverlap { loc: (row, col), entry_idxs: (a, b) } => write!(
                f,
                "entries {a} and {b} run in the same direction and share cell ({row}, {col})"
            ),
        }
    }
}

impl std::error::Error for GridError {}

/// Crate-level error type.
#[derive(Debug)]
pub enum Error {
    /// Reading an input file or writing the text output failed.
    Io { path: PathBuf, source: io::Error },

    /// The structure described an invalid grid.
    Grid(GridError),

    /// Drawing or encoding a grid image failed.
    Image { path: PathBuf, message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to access {}: {source}", path.display()),
            Self::Grid(err) => write!(f, "invalid grid: {err}"),
            Self::Image { path, message } => write!(f, "failed to save {}: {message}", path.display()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Grid(err) => Some(err),
            Self::Image { .. } => None,
        }
    }
}

impl From<GridError> for Error {
    fn from(err: GridError) -> Self {
        Self::Grid(err)
    }
}
