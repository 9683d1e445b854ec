//! Grid filling by chronological backtracking over arc-consistent domains. Variables are ordered
//! by minimum remaining values (ties broken by degree, then slot order) and values by least
//! constraining value. Propagation runs once before the search starts; the search itself never
//! changes a domain.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;

use instant::{Duration, Instant};
use log::{debug, info, trace};
use smallvec::SmallVec;

use crate::arc_consistency::{establish_arc_consistency, SlotArc};
use crate::assignment::{is_consistent, is_consistent_choice, Assignment};
use crate::domains::Domains;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::{WordId, WordList};
use crate::{CHECK_INVARIANTS, MAX_SLOT_LENGTH};

/// Optional caps on how much work a search may do. The default is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    /// Give up once more than this many branches have been abandoned.
    pub max_backtracks: Option<u64>,

    /// Give up once the fill has been running this long.
    pub timeout: Option<Duration>,
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub node_consistency_eliminations: usize,
    pub arc_consistency_revisions: usize,
    pub arc_consistency_eliminations: usize,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct FillSuccess {
    pub assignment: Assignment,
    pub statistics: Statistics,
}

#[derive(Debug, Clone)]
pub enum FillFailure {
    /// No complete, consistent assignment exists for these domains.
    NoSolution { statistics: Statistics },

    /// A `SearchLimits` cap was hit before the search finished.
    LimitExceeded { statistics: Statistics },
}

impl FillFailure {
    pub fn statistics(&self) -> &Statistics {
        match self {
            FillFailure::NoSolution { statistics } | FillFailure::LimitExceeded { statistics } => {
                statistics
            }
        }
    }
}

impl fmt::Display for FillFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillFailure::NoSolution { .. } => write!(f, "no solution"),
            FillFailure::LimitExceeded { statistics } => write!(
                f,
                "search limit exceeded after {} states and {} backtracks",
                statistics.states, statistics.backtracks
            ),
        }
    }
}

impl std::error::Error for FillFailure {}

/// Choose the next slot to fill: the unassigned slot with the fewest remaining options, preferring
/// the one that crosses the most other slots, then the lowest slot id. Returns `None` once every
/// slot is assigned.
pub fn select_unassigned_slot(
    config: &GridConfig,
    domains: &Domains,
    assignment: &Assignment,
) -> Option<SlotId> {
    (0..config.slot_count())
        .filter(|&slot_id| !assignment.contains(slot_id))
        .min_by_key(|&slot_id| (domains.len(slot_id), Reverse(config.degree(slot_id))))
}

/// Order a slot's options by how many options they would rule out in crossing slots, fewest first.
/// Crossing domains are counted as they stand, whether or not those slots are assigned yet. Ties
/// keep lexicographic order.
pub fn order_domain_values(
    config: &GridConfig,
    word_list: &WordList,
    domains: &Domains,
    slot_id: SlotId,
) -> Vec<WordId> {
    // For each crossed cell: the cell index, how many of the crossing slot's options put each
    // glyph there, and the crossing slot's option count.
    let crossing_counts: SmallVec<[(usize, HashMap<char, usize>, usize); MAX_SLOT_LENGTH]> = config
        .slot_configs[slot_id]
        .crossings
        .iter()
        .enumerate()
        .filter_map(|(cell_idx, crossing)| {
            let crossing = crossing.as_ref()?;
            let mut glyph_counts: HashMap<char, usize> = HashMap::new();
            for word_id in domains.iter(crossing.other_slot_id) {
                if let Some(&glyph) = word_list.get(word_id).glyphs.get(crossing.other_slot_cell) {
                    *glyph_counts.entry(glyph).or_insert(0) += 1;
                }
            }
            Some((cell_idx, glyph_counts, domains.len(crossing.other_slot_id)))
        })
        .collect();

    let mut values: Vec<WordId> = domains.iter(slot_id).collect();
    values.sort_by_cached_key(|&word_id| {
        let glyphs = &word_list.get(word_id).glyphs;
        crossing_counts
            .iter()
            .map(|(cell_idx, glyph_counts, option_count)| {
                let compatible =
                    glyphs.get(*cell_idx).and_then(|glyph| glyph_counts.get(glyph)).copied().unwrap_or(0);
                option_count - compatible
            })
            .sum::<usize>()
    });
    values
}

enum SearchOutcome {
    Solved,
    Exhausted,
    Interrupted,
}

/// The state of a single depth-first search over a fixed set of domains.
struct Search<'s> {
    config: &'s GridConfig,
    word_list: &'s WordList,
    domains: &'s Domains,
    limits: SearchLimits,
    start: Instant,

    /// Value order for each slot. Domains can't change during the search, so these are computed
    /// once up front.
    value_orders: Vec<Vec<WordId>>,

    states: u64,
    backtracks: u64,
}

impl<'s> Search<'s> {
    fn new(
        config: &'s GridConfig,
        word_list: &'s WordList,
        domains: &'s Domains,
        limits: SearchLimits,
        start: Instant,
    ) -> Search<'s> {
        let value_orders = (0..config.slot_count())
            .map(|slot_id| order_domain_values(config, word_list, domains, slot_id))
            .collect();

        Search { config, word_list, domains, limits, start, value_orders, states: 0, backtracks: 0 }
    }

    fn limit_reached(&self) -> bool {
        self.limits.max_backtracks.map_or(false, |max| self.backtracks > max)
            || self.limits.timeout.map_or(false, |timeout| self.start.elapsed() >= timeout)
    }

    /// Extend `assignment` to a complete one. On `Solved` the assignment is left complete;
    /// otherwise it's left exactly as it was passed in.
    fn backtrack(&mut self, assignment: &mut Assignment) -> SearchOutcome {
        let Some(slot_id) = select_unassigned_slot(self.config, self.domains, assignment) else {
            return SearchOutcome::Solved;
        };

        for value_idx in 0..self.value_orders[slot_id].len() {
            let word_id = self.value_orders[slot_id][value_idx];

            if !is_consistent_choice(self.config, self.word_list, assignment, slot_id, word_id) {
                continue;
            }

            self.states += 1;
            if self.limit_reached() {
                return SearchOutcome::Interrupted;
            }

            let mut binding = assignment.bind(slot_id, word_id);
            if CHECK_INVARIANTS {
                assert!(
                    is_consistent(self.config, self.word_list, &binding),
                    "Inconsistent assignment after choosing {} for {}",
                    self.word_list.get(word_id).string,
                    self.config.slot_configs[slot_id],
                );
            }
            trace!(
                "Trying {} for {} at depth {}",
                self.word_list.get(word_id).string,
                self.config.slot_configs[slot_id],
                binding.len(),
            );

            match self.backtrack(&mut binding) {
                SearchOutcome::Solved => {
                    binding.keep();
                    return SearchOutcome::Solved;
                }
                SearchOutcome::Interrupted => return SearchOutcome::Interrupted,
                SearchOutcome::Exhausted => {
                    self.backtracks += 1;
                    if self.limit_reached() {
                        return SearchOutcome::Interrupted;
                    }
                }
            }
        }

        SearchOutcome::Exhausted
    }
}

/// Owns the domains for one grid and word list, and runs the whole pipeline over them: node
/// consistency, arc consistency, then backtracking search.
#[derive(Debug)]
pub struct Solver<'a> {
    config: &'a GridConfig,
    word_list: &'a WordList,
    domains: Domains,
    statistics: Statistics,
}

impl<'a> Solver<'a> {
    pub fn new(config: &'a GridConfig, word_list: &'a WordList) -> Solver<'a> {
        Solver {
            config,
            word_list,
            domains: Domains::new(config, word_list),
            statistics: Statistics::default(),
        }
    }

    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    /// Work done so far. Each step adds to these counts; `solve_with_limits` starts them over.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Remove every option whose length doesn't match its slot.
    pub fn enforce_node_consistency(&mut self) {
        self.statistics.node_consistency_eliminations +=
            self.domains.enforce_node_consistency(self.config, self.word_list);
    }

    /// Run AC-3 from the given arcs, or from every arc if `arcs` is `None`. Returns false if some
    /// domain was emptied.
    pub fn ac3(&mut self, arcs: Option<&[SlotArc]>) -> bool {
        let (revisions, eliminations, succeeded) =
            match establish_arc_consistency(self.config, self.word_list, &mut self.domains, arcs) {
                Ok(success) => (success.revisions, success.eliminations, true),
                Err(failure) => (failure.revisions, failure.eliminations, false),
            };

        self.statistics.arc_consistency_revisions += revisions;
        self.statistics.arc_consistency_eliminations += eliminations;
        succeeded
    }

    pub fn consistent(&self, assignment: &Assignment) -> bool {
        is_consistent(self.config, self.word_list, assignment)
    }

    pub fn select_unassigned_slot(&self, assignment: &Assignment) -> Option<SlotId> {
        select_unassigned_slot(self.config, &self.domains, assignment)
    }

    pub fn order_domain_values(&self, slot_id: SlotId) -> Vec<WordId> {
        order_domain_values(self.config, self.word_list, &self.domains, slot_id)
    }

    /// Search for a completion of `assignment` over the current domains, without propagating
    /// first. Returns true and leaves the assignment complete if one was found; otherwise leaves
    /// it untouched.
    pub fn backtrack(&mut self, assignment: &mut Assignment) -> bool {
        let mut search = Search::new(
            self.config,
            self.word_list,
            &self.domains,
            SearchLimits::default(),
            Instant::now(),
        );
        let outcome = search.backtrack(assignment);

        self.statistics.states += search.states;
        self.statistics.backtracks += search.backtracks;
        matches!(outcome, SearchOutcome::Solved)
    }

    /// Find a complete, consistent assignment, or `None` if there isn't one.
    pub fn solve(&mut self) -> Option<Assignment> {
        self.solve_with_limits(&SearchLimits::default()).ok().map(|success| success.assignment)
    }

    /// Like `solve`, but gives up once any of the given limits is hit and reports statistics
    /// either way.
    pub fn solve_with_limits(&mut self, limits: &SearchLimits) -> Result<FillSuccess, FillFailure> {
        let start = Instant::now();
        self.statistics = Statistics::default();

        self.enforce_node_consistency();
        if let Some(slot_id) = self.domains.any_empty() {
            debug!("No words fit {}", self.config.slot_configs[slot_id]);
            self.statistics.duration = start.elapsed();
            return Err(FillFailure::NoSolution { statistics: self.statistics.clone() });
        }

        if !self.ac3(None) {
            self.statistics.duration = start.elapsed();
            return Err(FillFailure::NoSolution { statistics: self.statistics.clone() });
        }

        let mut assignment = Assignment::new(self.config.slot_count());
        let mut search = Search::new(self.config, self.word_list, &self.domains, *limits, start);
        let outcome = search.backtrack(&mut assignment);

        self.statistics.states += search.states;
        self.statistics.backtracks += search.backtracks;
        self.statistics.duration = start.elapsed();
        let statistics = self.statistics.clone();

        match outcome {
            SearchOutcome::Solved => {
                info!(
                    "Filled {} slots in {:?} ({} states, {} backtracks)",
                    assignment.len(),
                    statistics.duration,
                    statistics.states,
                    statistics.backtracks,
                );
                Ok(FillSuccess { assignment, statistics })
            }
            SearchOutcome::Exhausted => {
                info!("No fill exists; search exhausted after {} backtracks", statistics.backtracks);
                Err(FillFailure::NoSolution { statistics })
            }
            SearchOutcome::Interrupted => {
                info!("Gave up after {} states and {} backtracks", statistics.states, statistics.backtracks);
                Err(FillFailure::LimitExceeded { statistics })
            }
        }
    }
}

/// Search for a fill for the given grid using the given word list.
pub fn find_fill(
    config: &GridConfig,
    word_list: &WordList,
    limits: &SearchLimits,
) -> Result<FillSuccess, FillFailure> {
    Solver::new(config, word_list).solve_with_limits(limits)
}
