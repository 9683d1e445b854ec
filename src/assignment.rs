//! Partial assignments of words to slots, and the consistency rules they have to satisfy: no word
//! is used twice, and crossing slots agree on their shared letter.

use std::ops::{Deref, DerefMut};

use bit_set::BitSet;

use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::{WordId, WordList};

/// A (possibly partial) mapping from slots to words.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    count: usize,
}

impl Assignment {
    /// An empty assignment for a grid with `slot_count` slots.
    pub fn new(slot_count: usize) -> Assignment {
        Assignment { words: vec![None; slot_count], count: 0 }
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words.get(slot_id).copied().flatten()
    }

    pub fn contains(&self, slot_id: SlotId) -> bool {
        self.get(slot_id).is_some()
    }

    /// Number of assigned slots.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Does every slot have a word?
    pub fn is_complete(&self) -> bool {
        self.count == self.words.len()
    }

    /// Set the word for a slot, returning the word it replaced.
    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) -> Option<WordId> {
        let previous = self.words[slot_id].replace(word_id);
        if previous.is_none() {
            self.count += 1;
        }
        previous
    }

    /// Clear a slot, returning the word it held.
    pub fn unassign(&mut self, slot_id: SlotId) -> Option<WordId> {
        let previous = self.words[slot_id].take();
        if previous.is_some() {
            self.count -= 1;
        }
        previous
    }

    /// Assign a word to an empty slot for as long as the returned guard lives. Dropping the guard
    /// clears the slot again unless `TentativeBinding::keep` was called.
    pub fn bind(&mut self, slot_id: SlotId, word_id: WordId) -> TentativeBinding<'_> {
        debug_assert!(!self.contains(slot_id), "slot {slot_id} is already assigned");
        self.assign(slot_id, word_id);
        TentativeBinding { assignment: self, slot_id, kept: false }
    }

    /// Assigned (slot, word) pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| (slot_id, word_id)))
    }

    /// Assigned (slot, word) pairs with the words spelled out.
    pub fn to_strings<'a>(&self, word_list: &'a WordList) -> Vec<(SlotId, &'a str)> {
        self.iter().map(|(slot_id, word_id)| (slot_id, word_list.get(word_id).string.as_str())).collect()
    }
}

/// A slot assignment that's undone when it goes out of scope, so that every exit from a search
/// frame rolls back exactly the binding that frame made.
#[derive(Debug)]
pub struct TentativeBinding<'a> {
    assignment: &'a mut Assignment,
    slot_id: SlotId,
    kept: bool,
}

impl TentativeBinding<'_> {
    pub fn slot_id(&self) -> SlotId {
        self.slot_id
    }

    /// Leave the binding in place after the guard is dropped.
    pub fn keep(mut self) {
        self.kept = true;
    }
}

impl Deref for TentativeBinding<'_> {
    type Target = Assignment;

    fn deref(&self) -> &Assignment {
        self.assignment
    }
}

impl DerefMut for TentativeBinding<'_> {
    fn deref_mut(&mut self) -> &mut Assignment {
        self.assignment
    }
}

impl Drop for TentativeBinding<'_> {
    fn drop(&mut self) {
        if !self.kept {
            self.assignment.unassign(self.slot_id);
        }
    }
}

/// Do the words in two crossing slots agree at their shared cell? Words too short to reach the
/// cell never agree.
fn crossing_agrees(word_list: &WordList, word_id: WordId, cell: usize, other_id: WordId, other_cell: usize) -> bool {
    match (word_list.get(word_id).glyphs.get(cell), word_list.get(other_id).glyphs.get(other_cell)) {
        (Some(glyph), Some(other_glyph)) => glyph == other_glyph,
        _ => false,
    }
}

/// Is this assignment consistent? That is, are all of its words distinct, and does every pair of
/// assigned crossing slots agree on the shared letter? An empty assignment is consistent.
pub fn is_consistent(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> bool {
    let mut used = BitSet::with_capacity(word_list.len());
    if !assignment.iter().all(|(_, word_id)| used.insert(word_id)) {
        return false;
    }

    assignment.iter().all(|(slot_id, word_id)| {
        config.slot_configs[slot_id].crossings.iter().enumerate().all(|(cell_idx, crossing)| {
            match crossing.and_then(|crossing| {
                assignment.get(crossing.other_slot_id).map(|other_id| (other_id, crossing.other_slot_cell))
            }) {
                Some((other_id, other_cell)) => {
                    crossing_agrees(word_list, word_id, cell_idx, other_id, other_cell)
                }
                None => true,
            }
        })
    })
}

/// Would adding `word_id` in `slot_id` keep an already-consistent assignment consistent? This
/// only looks at the new word: it mustn't be used elsewhere, and it has to agree with every
/// assigned slot it crosses.
pub fn is_consistent_choice(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
    slot_id: SlotId,
    word_id: WordId,
) -> bool {
    if assignment.iter().any(|(other_slot_id, other_id)| other_slot_id != slot_id && other_id == word_id) {
        return false;
    }

    config.slot_configs[slot_id].crossings.iter().enumerate().all(|(cell_idx, crossing)| {
        let Some(crossing) = crossing else {
            return true;
        };
        match assignment.get(crossing.other_slot_id) {
            Some(other_id) => {
                crossing_agrees(word_list, word_id, cell_idx, other_id, crossing.other_slot_cell)
            }
            None => true,
        }
    })
}
