//! Static description of a grid: which slots exist, where they are, and which cells they share with
//! each other. Nothing here changes once a `GridConfig` has been built.

use std::collections::HashMap;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use log::debug;
use smallvec::SmallVec;

use crate::error::{Error, GridError};
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given slot, based on its index in the Grid's `slot_configs` field. This is
/// also the fixed enumeration order used to break ties during search.
pub type SlotId = usize;

/// Zero-indexed (row, col) coords for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    /// The coords of the cell `cell_idx` steps away from `start` in this direction.
    fn offset(self, (row, col): GridCoord, cell_idx: usize) -> GridCoord {
        match self {
            Direction::Across => (row, col + cell_idx),
            Direction::Down => (row + cell_idx, col),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => write!(f, "across"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing a single fillable run of cells.
#[derive(Clone, PartialEq, Eq)]
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,

    /// One entry per cell, recording the slot (if any) that shares that cell with this one.
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,
}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(|cell_idx| self.direction.offset(self.start_cell, cell_idx))
    }
}

impl Debug for SlotConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotConfig")
            .field("id", &self.id)
            .field("start_cell", &self.start_cell)
            .field("direction", &self.direction)
            .field("length", &self.length)
            .field("crossings", &self.crossings)
            .finish()
    }
}

impl fmt::Display for SlotConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (row, col) = self.start_cell;
        write!(f, "({row}, {col}) {} : {}", self.direction, self.length)
    }
}

/// An across or down entry in the input to `generate_grid_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridEntry {
    pub loc: GridCoord,
    pub len: usize,
    pub dir: Direction,
}

impl GridEntry {
    /// Generate the coords for each cell of this entry.
    fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.len).map(|cell_idx| self.dir.offset(self.loc, cell_idx))
    }
}

/// A struct representing the aspects of a grid that are static during filling.
#[derive(Debug, Clone)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,

    /// Indexed by `[row][col]`; true for every cell that takes a letter. This can include cells
    /// that aren't part of any slot.
    pub open_cells: Vec<Vec<bool>>,

    pub slot_configs: Vec<SlotConfig>,
}

impl GridConfig {
    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    /// If slots `a` and `b` share a cell, return `(i, j)` such that character `i` of `a`'s word
    /// must equal character `j` of `b`'s word. A slot never overlaps itself.
    pub fn overlap(&self, a: SlotId, b: SlotId) -> Option<(usize, usize)> {
        if a == b {
            return None;
        }

        self.slot_configs[a].crossings.iter().enumerate().find_map(|(cell_idx, crossing)| {
            crossing
                .filter(|crossing| crossing.other_slot_id == b)
                .map(|crossing| (cell_idx, crossing.other_slot_cell))
        })
    }

    /// All slots sharing a cell with `slot_id`, in the order of the cells they cross.
    pub fn neighbors(&self, slot_id: SlotId) -> SmallVec<[SlotId; MAX_SLOT_LENGTH]> {
        self.slot_configs[slot_id]
            .crossings
            .iter()
            .flatten()
            .map(|crossing| crossing.other_slot_id)
            .collect()
    }

    /// How many other slots cross this one?
    pub fn degree(&self, slot_id: SlotId) -> usize {
        self.slot_configs[slot_id].crossings.iter().flatten().count()
    }

    /// Every ordered pair of distinct slots that share a cell, in slot order.
    pub fn arcs(&self) -> Vec<(SlotId, SlotId)> {
        self.slot_configs
            .iter()
            .flat_map(|slot_config| {
                self.neighbors(slot_config.id).into_iter().map(move |other| (slot_config.id, other))
            })
            .collect()
    }
}

/// Generate a GridConfig representing a grid with specified entries. Every cell covered by an
/// entry is considered open.
pub fn generate_grid_config(entries: &[GridEntry]) -> Result<GridConfig, GridError> {
    let height = entries
        .iter()
        .map(|entry| entry.cell_coords().map(|(row, _)| row + 1).max().unwrap_or(0))
        .max()
        .unwrap_or(0);
    let width = entries
        .iter()
        .map(|entry| entry.cell_coords().map(|(_, col)| col + 1).max().unwrap_or(0))
        .max()
        .unwrap_or(0);

    let mut open_cells = vec![vec![false; width]; height];
    for entry in entries {
        for (row, col) in entry.cell_coords() {
            open_cells[row][col] = true;
        }
    }

    build_grid_config(entries, width, height, open_cells)
}

fn build_grid_config(
    entries: &[GridEntry],
    width: usize,
    height: usize,
    open_cells: Vec<Vec<bool>>,
) -> Result<GridConfig, GridError> {
    // Build a map from cell location to entries involved, which we can then use to calculate
    // crossings. Each value is a list of (entry index, cell index within entry).
    let mut entries_by_loc: HashMap<GridCoord, SmallVec<[(usize, usize); 2]>> = HashMap::new();

    for (entry_idx, entry) in entries.iter().enumerate() {
        if entry.len == 0 {
            return Err(GridError::EmptyEntry { entry_idx });
        }

        for (cell_idx, loc) in entry.cell_coords().enumerate() {
            let cell_entries = entries_by_loc.entry(loc).or_default();

            // With only two directions, any third entry in a cell has to be parallel to one of
            // the first two, so this also rules out overloaded cells.
            if let Some(&(other_idx, _)) =
                cell_entries.iter().find(|&&(other_idx, _)| entries[other_idx].dir == entry.dir)
            {
                return Err(GridError::ParallelOverlap { loc, entry_idxs: (other_idx, entry_idx) });
            }
            cell_entries.push((entry_idx, cell_idx));
        }
    }

    let slot_configs: Vec<SlotConfig> = entries
        .iter()
        .enumerate()
        .map(|(entry_idx, entry)| {
            let crossings = entry
                .cell_coords()
                .map(|loc| {
                    entries_by_loc[&loc].iter().find(|&&(e, _)| e != entry_idx).map(
                        |&(other_slot_id, other_slot_cell)| Crossing {
                            other_slot_id,
                            other_slot_cell,
                        },
                    )
                })
                .collect();

            SlotConfig {
                id: entry_idx,
                start_cell: entry.loc,
                direction: entry.dir,
                length: entry.len,
                crossings,
            }
        })
        .collect();

    debug!(
        "Built {}x{} grid with {} slots and {} crossings",
        width,
        height,
        slot_configs.len(),
        slot_configs.iter().map(|s| s.crossings.iter().flatten().count()).sum::<usize>() / 2,
    );

    Ok(GridConfig { width, height, open_cells, slot_configs })
}

/// Is this template character a fillable cell?
fn is_open_cell(c: char) -> bool {
    c == '_' || c == '.'
}

/// Generate a grid config from a string template, with `_` (or `.`) representing fillable cells and
/// anything else representing blocks. Rows shorter than the widest one are padded with blocks.
pub fn generate_grid_config_from_template_string(template: &str) -> Result<GridConfig, GridError> {
    let template: Vec<Vec<bool>> = template
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                None
            } else {
                Some(line.chars().map(is_open_cell).collect())
            }
        })
        .collect();

    let height = template.len();
    let width = template.iter().map(Vec::len).max().unwrap_or(0);
    let open_cells: Vec<Vec<bool>> = template
        .into_iter()
        .map(|mut row| {
            row.resize(width, false);
            row
        })
        .collect();

    // Each run of two or more open cells along a line is an entry. `line_count` and `line_len`
    // are in terms of the direction being scanned, and `cell_at` maps (line, position) back to
    // grid coords.
    fn build_entries(
        open_cells: &[Vec<bool>],
        dir: Direction,
        line_count: usize,
        line_len: usize,
        cell_at: impl Fn(usize, usize) -> GridCoord,
    ) -> Vec<GridEntry> {
        let mut result = vec![];

        for line in 0..line_count {
            let mut run_start: Option<usize> = None;

            for pos in 0..=line_len {
                let open = pos < line_len && {
                    let (row, col) = cell_at(line, pos);
                    open_cells[row][col]
                };

                match (open, run_start) {
                    (true, None) => run_start = Some(pos),
                    (false, Some(start)) => {
                        if pos - start > 1 {
                            result.push(GridEntry { loc: cell_at(line, start), len: pos - start, dir });
                        }
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }

        result
    }

    let mut entries = build_entries(&open_cells, Direction::Across, height, width, |row, col| {
        (row, col)
    });
    entries.extend(build_entries(&open_cells, Direction::Down, width, height, |col, row| {
        (row, col)
    }));

    build_grid_config(&entries, width, height, open_cells)
}

/// Read a structure file and build its grid config.
pub fn load_grid_config(path: impl AsRef<Path>) -> Result<GridConfig, Error> {
    let path = path.as_ref();
    let template = fs::read_to_string(path)
        .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;

    Ok(generate_grid_config_from_template_string(&template)?)
}
