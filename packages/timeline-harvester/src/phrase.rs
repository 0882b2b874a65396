//! Tokenizer for free-text labels that carry a count.
//!
//! Accessibility labels arrive as localized phrases like `"120 views"` or
//! `"88651 likes"`. A [`NumericPhrase`] splits such a phrase into its numeric
//! tokens (order preserved, canonicalized) and its word tokens (order
//! preserved, lowercased) so callers can pull a count out without caring
//! about the surrounding words.

/// A whitespace-tokenized phrase partitioned into numbers and words.
#[derive(Debug, Clone, Default)]
pub struct NumericPhrase {
    numbers: Vec<String>,
    words: Vec<String>,
}

impl NumericPhrase {
    /// Tokenize `text` on whitespace. A token whose leading characters are
    /// digits contributes those digits (canonicalized, leading zeros
    /// stripped) as a number; every other token is lowercased into the word
    /// list.
    pub fn new(text: &str) -> Self {
        let mut numbers = Vec::new();
        let mut words = Vec::new();

        for component in text.split_whitespace() {
            let digits: String = component.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                words.push(component.to_lowercase());
            } else {
                let canonical = digits.trim_start_matches('0');
                numbers.push(if canonical.is_empty() {
                    "0".to_string()
                } else {
                    canonical.to_string()
                });
            }
        }

        Self { numbers, words }
    }

    pub fn number_count(&self) -> usize {
        self.numbers.len()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// The `which`th numeric token, in phrase order.
    pub fn number(&self, which: usize) -> Option<&str> {
        self.numbers.get(which).map(String::as_str)
    }

    /// The `which`th word token, in phrase order.
    pub fn word(&self, which: usize) -> Option<&str> {
        self.words.get(which).map(String::as_str)
    }

    /// Substring match against the lowercased word tokens.
    pub fn contains_word(&self, word: &str) -> bool {
        if word.is_empty() {
            return false;
        }
        let needle = word.to_lowercase();
        self.words.iter().any(|w| w.contains(&needle))
    }
}
