//! Lemma extraction
//!
//! A lemma is the normalized form of a word. The built-in extractor uses
//! lowercase Unicode words; a morphological analyzer can be plugged in
//! through [`LemmaExtractor`].

use crate::crawler::extract_text;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// Occurrence count of each lemma in one document
pub type LemmaCounts = HashMap<String, u32>;

/// Turns page content into lemma counts
pub trait LemmaExtractor: Send + Sync {
    /// Counts the lemmas of an HTML document
    fn extract(&self, content: &str) -> anyhow::Result<LemmaCounts>;
}

/// Extractor that treats each lowercased Unicode word as its own lemma
///
/// Markup, scripts and styles are stripped first. Tokens made only of
/// digits or punctuation are ignored, as are words shorter than
/// `min_length` characters.
#[derive(Debug, Clone)]
pub struct WordLemmaExtractor {
    min_length: usize,
}

impl WordLemmaExtractor {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Default for WordLemmaExtractor {
    fn default() -> Self {
        Self::new(2)
    }
}

impl LemmaExtractor for WordLemmaExtractor {
    fn extract(&self, content: &str) -> anyhow::Result<LemmaCounts> {
        let text = extract_text(content);
        let mut counts = LemmaCounts::new();

        for word in text.unicode_words() {
            if !word.chars().any(char::is_alphabetic) {
                continue;
            }
            let lemma = word.to_lowercase();
            if lemma.chars().count() < self.min_length {
                continue;
            }
            *counts.entry(lemma).or_insert(0) += 1;
        }

        Ok(counts)
    }
}
