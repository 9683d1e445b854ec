//! The candidate words available for filling. Words are normalized to uppercase, de-duplicated, and
//! kept in lexicographic order so that a `WordId` also encodes the enumeration order.

use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use log::debug;
use smallvec::SmallVec;

use crate::error::Error;
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field.
pub type WordId = usize;

/// A struct representing a word that can be chosen for a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,

    /// The word's characters, so that we can look up the letter at a given offset directly.
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    fn new(string: String) -> Word {
        let glyphs = string.chars().collect();
        Word { string, glyphs }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

#[derive(Clone, Default)]
pub struct WordList {
    pub words: Vec<Word>,
}

impl Debug for WordList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordList")
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .finish()
    }
}

impl WordList {
    /// Build a word list from arbitrary strings. Each one is trimmed and uppercased; blanks and
    /// duplicates are dropped.
    pub fn from_words<I, S>(words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_uppercase())
            .filter(|word| !word.is_empty())
            .collect();

        WordList { words: unique.into_iter().map(Word::new).collect() }
    }

    /// Parse a word list with one word per line.
    pub fn parse(contents: &str) -> WordList {
        WordList::from_words(contents.lines())
    }

    /// Read a word list file with one word per line.
    pub fn load(path: impl AsRef<Path>) -> Result<WordList, Error> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;

        let word_list = WordList::parse(&contents);
        debug!("Loaded {} words from {}", word_list.len(), path.display());

        Ok(word_list)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    /// The letter at `cell_idx` of the given word.
    pub fn glyph(&self, word_id: WordId, cell_idx: usize) -> char {
        self.words[word_id].glyphs[cell_idx]
    }

    /// Look up the id of a word, if it's in the list.
    pub fn find(&self, word: &str) -> Option<WordId> {
        let word = word.trim().to_uppercase();
        self.words.binary_search_by(|candidate| candidate.string.cmp(&word)).ok()
    }
}
