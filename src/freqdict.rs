//! Frequency dictionary over registered keywords
//!
//! Counts how many registered commands carry each word. The matcher checks a
//! command's rarest word first, so ordering by ascending count lets most
//! commands be rejected after one containment test.

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreqDict {
    counts: HashMap<String, u32>,
}

impl FreqDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every whitespace-separated word of a keyword phrase
    pub fn add(&mut self, phrase: &str) {
        for word in phrase.split_whitespace() {
            *self.counts.entry(word.to_string()).or_insert(0) += 1;
        }
    }

    /// Uncount words, never below zero
    pub fn remove<S: AsRef<str>>(&mut self, words: &[S]) {
        for word in words {
            let word = word.as_ref();
            if let Some(count) = self.counts.get_mut(word) {
                *count -= 1;
                if *count == 0 {
                    self.counts.remove(word);
                }
            }
        }
    }

    pub fn count(&self, word: &str) -> u32 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Number of distinct words with a non-zero count
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Rarest word first; ties keep their input order
    pub fn order_by_frequency<S: AsRef<str>>(&self, words: &[S]) -> Vec<String> {
        let mut rest: Vec<&str> = words
            .iter()
            .map(|w| w.as_ref())
            .filter(|w| !w.is_empty())
            .collect();
        let mut ordered = Vec::with_capacity(rest.len());
        while !rest.is_empty() {
            let mut min_index = 0;
            let mut min_count = self.count(rest[0]);
            for (i, word) in rest.iter().enumerate().skip(1) {
                let count = self.count(word);
                if count < min_count {
                    min_count = count;
                    min_index = i;
                }
            }
            ordered.push(rest.remove(min_index).to_string());
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_count() {
        let mut dict = FreqDict::new();
        dict.add("turn on lamp");
        dict.add("turn off lamp");
        assert_eq!(dict.count("turn"), 2);
        assert_eq!(dict.count("on"), 1);
        assert_eq!(dict.count("missing"), 0);
        assert_eq!(dict.len(), 4);
    }

    #[test]
    fn test_remove_floors_at_zero() {
        let mut dict = FreqDict::new();
        dict.add("lamp");
        dict.remove(&["lamp", "lamp", "never"]);
        assert_eq!(dict.count("lamp"), 0);
        assert!(dict.is_empty());
    }

    #[test]
    fn test_order_by_frequency() {
        let mut dict = FreqDict::new();
        dict.add("turn on lamp hall");
        dict.add("turn on sconce");
        dict.add("turn off sconce");
        // hall and lamp tie at 1 and keep their order
        assert_eq!(
            dict.order_by_frequency(&["turn", "on", "lamp", "hall"]),
            vec!["lamp", "hall", "on", "turn"]
        );
    }

    #[test]
    fn test_add_remove_round_trip() {
        let mut dict = FreqDict::new();
        dict.add("turn on lamp");
        let before = dict.clone();
        dict.add("turn on sconce hall");
        dict.remove(&["hall", "sconce", "on", "turn"]);
        assert_eq!(dict, before);
    }
}
