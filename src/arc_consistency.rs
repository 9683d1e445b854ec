//! An implementation of the AC-3 algorithm for establishing arc consistency. For our purposes the
//! grid is arc-consistent when, for every pair of crossing slots X and Y, every word left in X's
//! domain has at least one word in Y's domain with the same letter in the shared cell.
//!
//! Whenever X's domain shrinks, every arc (Z, X) pointing at it goes back on the queue, including
//! arcs that were already processed.

use std::collections::{HashSet, VecDeque};

use bit_set::BitSet;
use log::{debug, trace};

use crate::domains::Domains;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::{WordId, WordList};

/// A directed constraint between two crossing slots: (X, Y) is revised by removing words from X
/// that have no support in Y.
pub type SlotArc = (SlotId, SlotId);

/// Result from a successful call to `establish_arc_consistency`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arcs were revised.
    pub revisions: usize,

    /// How many words were removed across all domains.
    pub eliminations: usize,
}

/// Result from a failed call to `establish_arc_consistency`. Domains are left as they were at the
/// moment of failure, including the empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub emptied_slot_id: SlotId,
    pub revisions: usize,
    pub eliminations: usize,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Work queue of arcs waiting to be revised. An arc is never in the queue twice at once, but it can
/// be re-added any time after it's been popped.
#[derive(Debug)]
struct ArcQueue {
    queue: VecDeque<SlotArc>,
    queued: BitSet,
    slot_count: usize,
}

impl ArcQueue {
    fn new(slot_count: usize) -> ArcQueue {
        ArcQueue {
            queue: VecDeque::new(),
            queued: BitSet::with_capacity(slot_count * slot_count),
            slot_count,
        }
    }

    fn with_initial_queue<Items>(slot_count: usize, items: Items) -> ArcQueue
    where
        Items: IntoIterator<Item = SlotArc>,
    {
        let mut queue = ArcQueue::new(slot_count);
        for arc in items {
            queue.enqueue(arc);
        }
        queue
    }

    fn key(&self, (x, y): SlotArc) -> usize {
        x * self.slot_count + y
    }

    fn enqueue(&mut self, arc: SlotArc) {
        if self.queued.insert(self.key(arc)) {
            self.queue.push_back(arc);
        }
    }

    fn pop_front(&mut self) -> Option<SlotArc> {
        let arc = self.queue.pop_front()?;
        let key = self.key(arc);
        self.queued.remove(key);
        Some(arc)
    }
}

/// Make `x` arc-consistent with `y`: remove every word from `x`'s domain that has no word in `y`'s
/// domain agreeing with it at their shared cell. Returns the number of words removed, so zero means
/// no revision was made. Slots that don't cross are never revised.
pub fn revise(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut Domains,
    x: SlotId,
    y: SlotId,
) -> usize {
    let Some((x_cell, y_cell)) = config.overlap(x, y) else {
        return 0;
    };

    // The letters `y` can still put in the shared cell. Words too short to reach the cell (only
    // possible before node consistency) contribute nothing.
    let supported: HashSet<char> = domains
        .iter(y)
        .filter_map(|word_id| word_list.get(word_id).glyphs.get(y_cell).copied())
        .collect();

    let unsupported: Vec<WordId> = domains
        .iter(x)
        .filter(|&word_id| {
            word_list
                .get(word_id)
                .glyphs
                .get(x_cell)
                .map_or(true, |glyph| !supported.contains(glyph))
        })
        .collect();

    domains.remove_all(x, unsupported)
}

/// Run AC-3 until every queued arc has been revised without emptying a domain. If `arcs` is given,
/// the queue starts with just those arcs (skipping any whose slots don't cross); otherwise it
/// starts with every arc in the grid.
pub fn establish_arc_consistency(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut Domains,
    arcs: Option<&[SlotArc]>,
) -> ArcConsistencyResult {
    let initial_arcs: Vec<SlotArc> = match arcs {
        Some(arcs) => {
            arcs.iter().copied().filter(|&(x, y)| config.overlap(x, y).is_some()).collect()
        }
        None => config.arcs(),
    };
    debug!("Establishing arc consistency from {} arcs", initial_arcs.len());

    let mut queue = ArcQueue::with_initial_queue(config.slot_count(), initial_arcs);
    let mut revisions = 0;
    let mut eliminations = 0;

    while let Some((x, y)) = queue.pop_front() {
        revisions += 1;

        let removed = revise(config, word_list, domains, x, y);
        if removed == 0 {
            continue;
        }
        eliminations += removed;
        trace!(
            "Revising {} against {} removed {} options, {} left",
            config.slot_configs[x],
            config.slot_configs[y],
            removed,
            domains.len(x),
        );

        if domains.is_empty(x) {
            debug!("Arc consistency emptied the domain of {}", config.slot_configs[x]);
            return Err(ArcConsistencyFailure { emptied_slot_id: x, revisions, eliminations });
        }

        // Anything crossing `x` may have lost its support there, so check it again.
        for z in config.neighbors(x) {
            if z != y {
                queue.enqueue((z, x));
            }
        }
    }

    debug!("Arc consistency finished: {} revisions, {} eliminations", revisions, eliminations);
    Ok(ArcConsistencySuccess { revisions, eliminations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_config::Direction::{Across, Down};
    use crate::grid_config::{generate_grid_config, generate_grid_config_from_template_string, GridEntry};

    fn words_in(domains: &Domains, word_list: &WordList, slot_id: SlotId) -> Vec<String> {
        domains.iter(slot_id).map(|word_id| word_list.get(word_id).string.clone()).collect()
    }

    fn prepared(config: &GridConfig, word_list: &WordList) -> Domains {
        let mut domains = Domains::new(config, word_list);
        domains.enforce_node_consistency(config, word_list);
        domains
    }

    /// Every word left in X has support in Y, for every crossing pair.
    fn assert_arc_consistent(config: &GridConfig, word_list: &WordList, domains: &Domains) {
        for (x, y) in config.arcs() {
            let (i, j) = config.overlap(x, y).unwrap();
            for x_word in domains.iter(x) {
                assert!(
                    domains.iter(y).any(|y_word| word_list.glyph(x_word, i) == word_list.glyph(y_word, j)),
                    "{} has no support in slot {}",
                    word_list.get(x_word).string,
                    y,
                );
            }
        }
    }

    /// A is 3 across from (0, 0), B is 3 down from (0, 1), so A[1] must equal B[0].
    fn two_slot_config() -> GridConfig {
        generate_grid_config(&[
            GridEntry { loc: (0, 0), len: 3, dir: Across },
            GridEntry { loc: (0, 1), len: 3, dir: Down },
        ])
        .unwrap()
    }

    /// A is 3 across, B is 3 down from A's last cell, C is 4 across from B's last cell.
    fn chain_config() -> GridConfig {
        generate_grid_config(&[
            GridEntry { loc: (0, 0), len: 3, dir: Across },
            GridEntry { loc: (0, 2), len: 3, dir: Down },
            GridEntry { loc: (2, 2), len: 4, dir: Across },
        ])
        .unwrap()
    }

    #[test]
    fn test_unsatisfiable_crossing_empties_a_domain() {
        let config = two_slot_config();
        let word_list = WordList::from_words(["bat", "bar", "oak"]);
        let mut domains = prepared(&config, &word_list);

        assert_eq!(words_in(&domains, &word_list, 0), vec!["BAR", "BAT", "OAK"]);
        assert_eq!(words_in(&domains, &word_list, 1), vec!["BAR", "BAT", "OAK"]);

        // Every word for A has 'A' in the middle, but no word starts with 'A'.
        let failure = establish_arc_consistency(&config, &word_list, &mut domains, None).unwrap_err();

        assert_eq!(failure.emptied_slot_id, 0);
        assert!(domains.is_empty(failure.emptied_slot_id));
    }

    #[test]
    fn test_revise_removes_unsupported_words() {
        let config = two_slot_config();
        let word_list = WordList::from_words(["bat", "are", "oak"]);
        let mut domains = prepared(&config, &word_list);

        assert_eq!(revise(&config, &word_list, &mut domains, 0, 1), 1);
        assert_eq!(words_in(&domains, &word_list, 0), vec!["BAT", "OAK"]);
        assert_eq!(revise(&config, &word_list, &mut domains, 0, 1), 0);

        assert_eq!(revise(&config, &word_list, &mut domains, 1, 0), 2);
        assert_eq!(words_in(&domains, &word_list, 1), vec!["ARE"]);
    }

    #[test]
    fn test_revise_ignores_slots_that_dont_cross() {
        let config = chain_config();
        let word_list = WordList::from_words(["aap", "zzzz"]);
        let mut domains = prepared(&config, &word_list);

        assert_eq!(revise(&config, &word_list, &mut domains, 0, 2), 0);
        assert_eq!(revise(&config, &word_list, &mut domains, 0, 0), 0);
    }

    #[test]
    fn test_success_leaves_every_arc_supported() {
        let config = two_slot_config();
        let word_list = WordList::from_words(["bat", "are", "oak"]);
        let mut domains = prepared(&config, &word_list);

        let success = establish_arc_consistency(&config, &word_list, &mut domains, None).unwrap();

        assert_eq!(success.eliminations, 3);
        assert_eq!(words_in(&domains, &word_list, 0), vec!["BAT", "OAK"]);
        assert_eq!(words_in(&domains, &word_list, 1), vec!["ARE"]);
        assert_arc_consistent(&config, &word_list, &domains);
    }

    #[test]
    fn test_already_processed_arcs_are_revisited() {
        let config = chain_config();
        let word_list = WordList::from_words(["aap", "aas", "pqr", "stu", "uxxx"]);
        let mut domains = prepared(&config, &word_list);

        // (A, B) is revised first, while B still allows both P and S at its start. Only later does
        // C rule out PQR for B, which has to send us back to (A, B) to drop AAP.
        establish_arc_consistency(&config, &word_list, &mut domains, None).unwrap();

        assert_eq!(words_in(&domains, &word_list, 0), vec!["AAS"]);
        assert_eq!(words_in(&domains, &word_list, 1), vec!["STU"]);
        assert_eq!(words_in(&domains, &word_list, 2), vec!["UXXX"]);
        assert_arc_consistent(&config, &word_list, &domains);
    }

    #[test]
    fn test_caller_supplied_arcs_still_propagate() {
        let config = chain_config();
        let word_list = WordList::from_words(["aap", "aas", "pqr", "stu", "uxxx"]);
        let mut domains = prepared(&config, &word_list);

        establish_arc_consistency(&config, &word_list, &mut domains, Some(&[(1, 2)])).unwrap();

        assert_eq!(words_in(&domains, &word_list, 1), vec!["STU"]);
        assert_eq!(words_in(&domains, &word_list, 0), vec!["AAS"]);
    }

    #[test]
    fn test_caller_supplied_arcs_without_overlap_are_skipped() {
        let config = chain_config();
        let word_list = WordList::from_words(["aap", "aas", "pqr", "stu", "uxxx"]);
        let mut domains = prepared(&config, &word_list);
        let before = domains.clone();

        let success =
            establish_arc_consistency(&config, &word_list, &mut domains, Some(&[(0, 2), (1, 1)])).unwrap();

        assert_eq!(success, ArcConsistencySuccess::default());
        assert_eq!(domains, before);
    }

    #[test]
    fn test_domains_never_grow() {
        let config = generate_grid_config_from_template_string(
            "
            ____
            _#__
            ____
            ",
        )
        .unwrap();
        let word_list = WordList::from_words([
            "abcd", "aeio", "dogs", "cats", "ace", "aid", "ado", "cog", "dot", "sat", "tea", "ab",
            "do", "so", "to",
        ]);
        let mut domains = prepared(&config, &word_list);
        let before: Vec<usize> = (0..config.slot_count()).map(|slot_id| domains.len(slot_id)).collect();

        let result = establish_arc_consistency(&config, &word_list, &mut domains, None);

        for slot_id in 0..config.slot_count() {
            assert!(domains.len(slot_id) <= before[slot_id]);
        }
        match result {
            Ok(_) => assert_arc_consistent(&config, &word_list, &domains),
            Err(failure) => assert!(domains.is_empty(failure.emptied_slot_id)),
        }
    }
}
