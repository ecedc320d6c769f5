//! Keyword containment tests with suffix tolerance
//!
//! Keyword stems match utterance words exactly, or as a prefix when the word
//! carries at most `tolerance` extra trailing characters (an inflected ending).
//! Every utterance word can satisfy one keyword only.

/// Outcome of comparing a candidate phrase against a registered one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordCmp {
    /// Some candidate token has no counterpart
    Differ,
    /// Same multiset of tokens
    Same,
    /// All candidate tokens found, this many registered tokens left over
    Narrower(usize),
}

/// Exact-token comparison of two keyword phrases, case-insensitive
pub fn compare_keywords(candidate: &str, existing: &str) -> KeywordCmp {
    let mut rest: Vec<String> = existing.split_whitespace().map(str::to_lowercase).collect();
    for token in candidate.split_whitespace().map(str::to_lowercase) {
        match rest.iter().position(|w| *w == token) {
            Some(j) => {
                rest.remove(j);
            }
            None => return KeywordCmp::Differ,
        }
    }
    match rest.len() {
        0 => KeywordCmp::Same,
        n => KeywordCmp::Narrower(n),
    }
}

/// Would `candidate` be indistinguishable from `existing`
pub fn is_duplicate(candidate: &str, existing: &str) -> bool {
    compare_keywords(candidate, existing) == KeywordCmp::Same
}

/// Does `word` carry `keyword` as a stem within tolerance
pub fn stem_match(keyword: &str, word: &str, tolerance: usize) -> bool {
    if word == keyword {
        return true;
    }
    tolerance > 0
        && word.starts_with(keyword)
        && word.chars().count() - keyword.chars().count() <= tolerance
}

/// Index of the word satisfying `keyword`, exact matches first
fn find_word(keyword: &str, words: &[&str], tolerance: usize) -> Option<usize> {
    words
        .iter()
        .position(|w| *w == keyword)
        .or_else(|| words.iter().position(|w| stem_match(keyword, w, tolerance)))
}

/// True when every keyword is satisfied by a distinct utterance word
pub fn contains_keywords<K: AsRef<str>, W: AsRef<str>>(
    keywords: &[K],
    words: &[W],
    tolerance: usize,
) -> bool {
    if keywords.is_empty() || words.is_empty() {
        return false;
    }
    let mut rest: Vec<&str> = words.iter().map(|w| w.as_ref()).collect();
    for keyword in keywords {
        match find_word(keyword.as_ref(), &rest, tolerance) {
            Some(j) => {
                rest.remove(j);
            }
            None => return false,
        }
    }
    true
}

/// Utterance words left after consuming one word per matched keyword
pub fn remove_keywords<K: AsRef<str>, W: AsRef<str>>(
    keywords: &[K],
    words: &[W],
    tolerance: usize,
) -> Vec<String> {
    let mut rest: Vec<&str> = words.iter().map(|w| w.as_ref()).collect();
    for keyword in keywords {
        if let Some(j) = find_word(keyword.as_ref(), &rest, tolerance) {
            rest.remove(j);
        }
    }
    rest.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    #[test]
    fn test_exact_match() {
        assert!(contains_keywords(&words("light hall"), &words("light hall"), 0));
        assert!(!contains_keywords(&words("light hall"), &words("lights hall"), 0));
    }

    #[test]
    fn test_suffix_tolerance() {
        let keys = words("включ свет гостин");
        assert!(contains_keywords(&keys, &words("включи свет гостиная"), 3));
        assert!(contains_keywords(&keys, &words("включи свет гостиной"), 3));
        assert!(!contains_keywords(&keys, &words("включи свет спальне"), 3));
        // светильник is свет + 6 characters
        assert!(!contains_keywords(&words("свет"), &words("светильник"), 3));
    }

    #[test]
    fn test_words_consumed_once() {
        assert!(!contains_keywords(&words("light light"), &words("light on"), 1));
        assert!(contains_keywords(&words("light light"), &words("lights light"), 1));
    }

    #[test]
    fn test_exact_preferred_over_prefix() {
        // exact word wins over an earlier prefix hit
        let rest = remove_keywords(&words("on"), &words("one on"), 1);
        assert_eq!(rest, vec!["one"]);
    }

    #[test]
    fn test_remove_keywords() {
        let rest = remove_keywords(
            &words("бра включ"),
            &words("ну ка быстро бра холле включи"),
            3,
        );
        assert_eq!(rest, vec!["ну", "ка", "быстро", "холле"]);
    }

    #[test]
    fn test_compare_keywords() {
        assert_eq!(compare_keywords("turn on lamp", "Lamp turn on"), KeywordCmp::Same);
        assert_eq!(
            compare_keywords("turn on lamp", "turn on lamp hall"),
            KeywordCmp::Narrower(1)
        );
        assert_eq!(compare_keywords("turn on lamp hall", "turn on lamp"), KeywordCmp::Differ);
        assert_eq!(compare_keywords("turn on lamp", "turn off lamp"), KeywordCmp::Differ);
        assert!(is_duplicate("a b b", "b a b"));
        assert!(!is_duplicate("a b", "a b b"));
    }

    #[test]
    fn test_empty_inputs() {
        let none: Vec<&str> = Vec::new();
        assert!(!contains_keywords(&none, &words("light"), 1));
        assert!(!contains_keywords(&words("light"), &none, 1));
    }
}
