//! Per-slot candidate sets. Domains only ever shrink: node consistency and arc consistency remove
//! words, and nothing puts them back.

use bit_set::BitSet;
use log::debug;

use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::{WordId, WordList};

/// The live set of candidate words for every slot. Each domain is a set of `WordId`s, so iterating
/// it visits words in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    options: Vec<BitSet>,
}

impl Domains {
    /// Start every slot off with the full word list.
    pub fn new(config: &GridConfig, word_list: &WordList) -> Domains {
        let mut full = BitSet::with_capacity(word_list.len());
        for word_id in 0..word_list.len() {
            full.insert(word_id);
        }

        Domains { options: vec![full; config.slot_count()] }
    }

    pub fn get(&self, slot_id: SlotId) -> &BitSet {
        &self.options[slot_id]
    }

    pub fn len(&self, slot_id: SlotId) -> usize {
        self.options[slot_id].len()
    }

    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.options[slot_id].is_empty()
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.options[slot_id].contains(word_id)
    }

    /// Iterate the slot's remaining words in lexicographic order.
    pub fn iter(&self, slot_id: SlotId) -> impl Iterator<Item = WordId> + '_ {
        self.options[slot_id].iter()
    }

    /// Drop the given words from a slot's domain, returning how many were actually present.
    pub fn remove_all<I: IntoIterator<Item = WordId>>(&mut self, slot_id: SlotId, word_ids: I) -> usize {
        let domain = &mut self.options[slot_id];
        word_ids.into_iter().filter(|&word_id| domain.remove(word_id)).count()
    }

    /// Is any slot out of options?
    pub fn any_empty(&self) -> Option<SlotId> {
        self.options.iter().position(BitSet::is_empty)
    }

    /// Remove every word whose length doesn't match its slot. Returns the number of words removed;
    /// a domain can end up empty here, which the caller detects later.
    pub fn enforce_node_consistency(&mut self, config: &GridConfig, word_list: &WordList) -> usize {
        let mut eliminations = 0;

        for slot_config in &config.slot_configs {
            let mismatched: Vec<WordId> = self
                .iter(slot_config.id)
                .filter(|&word_id| word_list.get(word_id).len() != slot_config.length)
                .collect();

            eliminations += self.remove_all(slot_config.id, mismatched);
        }

        debug!("Node consistency removed {} options", eliminations);
        eliminations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_config::generate_grid_config_from_template_string;

    #[test]
    fn test_domains_start_full() {
        let config = generate_grid_config_from_template_string("___\n_#_").unwrap();
        let word_list = WordList::from_words(["ab", "abc", "x"]);

        let domains = Domains::new(&config, &word_list);

        for slot_id in 0..config.slot_count() {
            assert_eq!(domains.iter(slot_id).collect::<Vec<_>>(), vec![0, 1, 2]);
        }
    }

    #[test]
    fn test_node_consistency_matches_slot_lengths() {
        let config = generate_grid_config_from_template_string(
            "
            ____
            _##_
            _##_
            ",
        )
        .unwrap();
        let word_list = WordList::from_words(["abc", "abcd", "xyz", "wxyz", "hi", "toolong"]);

        let mut domains = Domains::new(&config, &word_list);
        let eliminations = domains.enforce_node_consistency(&config, &word_list);

        for slot_config in &config.slot_configs {
            assert!(!domains.is_empty(slot_config.id));
            for word_id in domains.iter(slot_config.id) {
                assert_eq!(word_list.get(word_id).len(), slot_config.length);
            }
        }
        // One 4-letter slot keeps 2 of 6 words; two 3-letter slots keep 2 of 6 each.
        assert_eq!(eliminations, 4 + 4 + 4);
    }

    #[test]
    fn test_node_consistency_can_empty_a_domain() {
        let config = generate_grid_config_from_template_string("_____").unwrap();
        let word_list = WordList::from_words(["cat", "dog"]);

        let mut domains = Domains::new(&config, &word_list);
        domains.enforce_node_consistency(&config, &word_list);

        assert!(domains.is_empty(0));
        assert_eq!(domains.any_empty(), Some(0));
    }
}
