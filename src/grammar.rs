//! Morphology normalizer - turns names and phrases into keyword stems
//!
//! Two pipelines:
//! - [`expand_keywords`] builds registration keys. Ambiguous tokens (numbers,
//!   fluent vowels) branch, so one name may yield several keyword sets.
//! - [`to_word_sequence`] tokenizes an incoming utterance. No stemming.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::lang::{Act, Lang};

/// Upper bound on keyword sets kept for one name
pub const MAX_KEYWORD_SETS: usize = 64;

static KEYWORD_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[№#_/,.:;]").expect("static punctuation pattern"));

static UTTERANCE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[№#_/,.:;!?]").expect("static punctuation pattern"));

/// Which optional transforms [`expand_keywords`] applies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeywordOptions {
    /// Branch on a fluent vowel before the final consonant (санузел / санузл)
    pub fluent_vowels: bool,
    /// Strip verb infinitive endings instead of generic vowel stripping
    pub infinitive: bool,
}

impl KeywordOptions {
    pub const PLAIN: Self = Self {
        fluent_vowels: false,
        infinitive: false,
    };
    pub const FLUENT: Self = Self {
        fluent_vowels: true,
        infinitive: false,
    };
    pub const INFINITIVE: Self = Self {
        fluent_vowels: false,
        infinitive: true,
    };
}

/// Expand a name into every keyword set it may be spoken as, at most [`MAX_KEYWORD_SETS`]
pub fn expand_keywords(text: &str, lang: Lang, opts: KeywordOptions) -> Vec<String> {
    let sets = keyword_sets(text, lang, opts);
    let total = sets.combinations();
    if total > MAX_KEYWORD_SETS {
        warn!(
            "'{}' expands to {} keyword sets, keeping the first {}",
            text.trim(),
            total,
            MAX_KEYWORD_SETS
        );
    }
    sets.take(MAX_KEYWORD_SETS).collect()
}

/// Lazy form of [`expand_keywords`]; alternatives are combined on demand
pub fn keyword_sets(text: &str, lang: Lang, opts: KeywordOptions) -> KeywordSets {
    let text = cut_at_bracket(text);
    let text = lang.fold_letters(text);
    let text = KEYWORD_PUNCT.replace_all(&text, " ").to_lowercase();

    let slots = text
        .split_whitespace()
        .filter(|w| !lang.is_stop_word(w))
        .map(|word| token_alternatives(word, lang, opts))
        .collect();

    KeywordSets::new(slots)
}

/// Tokenize an utterance: case fold, drop stop-words, spell out digits
pub fn to_word_sequence(text: &str, lang: Lang) -> Vec<String> {
    let text = lang.fold_letters(text);
    let text = UTTERANCE_PUNCT.replace_all(&text, " ").to_lowercase();

    text.split_whitespace()
        .filter(|w| !lang.is_stop_word(w))
        .map(|word| {
            if is_number(word) {
                if let Some(words) = lang.digit_words(word) {
                    return words[0].to_string();
                }
            }
            word.to_string()
        })
        .collect()
}

fn token_alternatives(word: &str, lang: Lang, opts: KeywordOptions) -> Vec<String> {
    if is_number(word) {
        return match lang.digit_words(word) {
            Some(words) => words.iter().map(|w| w.to_string()).collect(),
            None => vec![word.to_string()],
        };
    }
    if opts.fluent_vowels && is_fluent_vowel(word, lang) {
        return fluent_vowel_variants(word, lang);
    }
    if opts.infinitive && is_infinitive(word, lang) {
        return vec![cut_infinitive_ending(word, lang)];
    }
    vec![cut_ending(word, lang)]
}

fn cut_at_bracket(text: &str) -> &str {
    match text.find(['(', '[', '{']) {
        Some(pos) if pos > 0 => &text[..pos],
        _ => text,
    }
}

fn is_number(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

/// A vowel before the final consonant that drops when the noun inflects
pub fn is_fluent_vowel(word: &str, lang: Lang) -> bool {
    let chars: Vec<char> = word.chars().collect();
    if lang != Lang::Ru || chars.len() < 4 {
        return false;
    }
    let last = chars[chars.len() - 1];
    let before = chars[chars.len() - 2];
    lang.consonants().contains(last) && lang.fluent_vowels().contains(before)
}

/// `санузел` -> `[санузел, санузл]`
pub fn fluent_vowel_variants(word: &str, lang: Lang) -> Vec<String> {
    if !is_fluent_vowel(word, lang) {
        return vec![word.to_string()];
    }
    let mut chars: Vec<char> = word.chars().collect();
    chars.remove(chars.len() - 2);
    vec![word.to_string(), chars.into_iter().collect()]
}

pub fn is_infinitive(word: &str, lang: Lang) -> bool {
    word.chars().count() > 3 && lang.infinitive_endings().iter().any(|e| word.ends_with(e))
}

pub fn cut_infinitive_ending(word: &str, lang: Lang) -> String {
    if !is_infinitive(word, lang) {
        return word.to_string();
    }
    lang.infinitive_endings()
        .iter()
        .find_map(|e| word.strip_suffix(e))
        .unwrap_or(word)
        .to_string()
}

/// Generic suffix stripping
pub fn cut_ending(word: &str, lang: Lang) -> String {
    match lang {
        Lang::Ru => {
            let mut chars: Vec<char> = word.chars().collect();
            if chars.len() <= 3 {
                return word.to_string();
            }
            while chars.len() > 2 && chars.last().is_some_and(|c| lang.ending_vowels().contains(c)) {
                chars.pop();
            }
            chars.into_iter().collect()
        }
        Lang::En => match word.strip_suffix('s') {
            Some(stem) if !stem.is_empty() => stem.to_string(),
            _ => word.to_string(),
        },
    }
}

/// Result verb with the gender ending the object name demands
pub fn act_result_verb(act: Act, lang: Lang, object_name: Option<&str>) -> String {
    let ending = object_name.map(|name| verb_ending(name, lang)).unwrap_or("");
    format!("{}{}", lang.act_result_verb(act), ending)
}

/// Participle ending driven by the first word of a noun phrase
pub fn verb_ending(name: &str, lang: Lang) -> &'static str {
    if lang != Lang::Ru {
        return "";
    }
    let first = match name.split_whitespace().next() {
        Some(w) => w.to_lowercase(),
        None => return "",
    };
    if first.chars().count() <= 3 {
        return "";
    }
    match first.chars().last() {
        Some('ы') | Some('и') => "ы",
        _ if first.ends_with("ые") => "ы",
        Some('а') | Some('я') => "а",
        _ => "",
    }
}

/// Cartesian product over per-token alternatives
///
/// Holds only the alternatives and one cursor; each keyword set is joined when
/// requested. The last token varies fastest.
#[derive(Debug, Clone)]
pub struct KeywordSets {
    slots: Vec<Vec<String>>,
    cursor: Option<Vec<usize>>,
}

impl KeywordSets {
    fn new(slots: Vec<Vec<String>>) -> Self {
        let cursor = if slots.is_empty() || slots.iter().any(|s| s.is_empty()) {
            None
        } else {
            Some(vec![0; slots.len()])
        };
        Self { slots, cursor }
    }

    /// Total number of sets the product yields from the start
    pub fn combinations(&self) -> usize {
        if self.cursor.is_none() {
            return 0;
        }
        self.slots.iter().fold(1usize, |n, alts| n.saturating_mul(alts.len()))
    }

    /// True when at least one token branched
    pub fn is_ambiguous(&self) -> bool {
        self.slots.iter().any(|s| s.len() > 1)
    }
}

impl Iterator for KeywordSets {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let cursor = self.cursor.as_mut()?;
        let item = self
            .slots
            .iter()
            .zip(cursor.iter())
            .map(|(alts, &i)| alts[i].as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let mut exhausted = true;
        for pos in (0..cursor.len()).rev() {
            cursor[pos] += 1;
            if cursor[pos] < self.slots[pos].len() {
                exhausted = false;
                break;
            }
            cursor[pos] = 0;
        }
        if exhausted {
            self.cursor = None;
        }
        Some(item)
    }
}
