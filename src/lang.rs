//! Language tables - stop-words, digit words, action verbs
//!
//! Every table lookup is keyed by [`Lang`], which also fixes the suffix
//! tolerance used by the matcher.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Supported vocabulary languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// Russian: heavy inflection, suffix stripping, fluent vowels
    #[default]
    Ru,
    /// English: plural `s` stripping only
    En,
}

/// Operation carried by generated device and group commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Act {
    On,
    Off,
}

impl Act {
    pub const ALL: [Act; 2] = [Act::On, Act::Off];

    pub fn as_str(&self) -> &'static str {
        match self {
            Act::On => "on",
            Act::Off => "off",
        }
    }
}

impl fmt::Display for Act {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const RU_CONSONANTS: &str = "бвгджзклмнпрстфхцчшщ";
const RU_FLUENT_VOWELS: &str = "еио";
const RU_ENDING_VOWELS: &[char] = &['а', 'я', 'е', 'о', 'у', 'ю', 'и', 'ы', 'й', 'ь'];
const RU_INFINITIVE_ENDINGS: &[&str] = &["ить", "ыть", "ать"];

const EN_STOP_WORDS: &[&str] = &["a", "the", "in", "with"];
const RU_STOP_WORDS: &[&str] = &["в", "на", "под", "над", "с", "за", "у", "перед"];

const EN_DIGITS: &[(&str, &[&str])] = &[
    ("1", &["first", "one"]),
    ("2", &["second", "two"]),
    ("3", &["third", "three"]),
    ("4", &["four", "fourth"]),
    ("5", &["fifth", "five"]),
];

const RU_DIGITS: &[(&str, &[&str])] = &[
    ("1", &["перв", "один"]),
    ("2", &["второ", "два"]),
    ("3", &["трет", "три"]),
    ("4", &["четверт", "четыре"]),
    ("5", &["пят", "пять"]),
    ("6", &["шесто", "шесть"]),
    ("7", &["седьмо", "семь"]),
    ("8", &["восьмо", "восемь"]),
    ("9", &["девят"]),
    ("10", &["десят"]),
    ("11", &["одиннацат"]),
    ("12", &["двенадцат"]),
];

impl Lang {
    pub fn code(&self) -> &'static str {
        match self {
            Lang::Ru => "ru",
            Lang::En => "en",
        }
    }

    /// How many trailing characters an utterance word may carry beyond a keyword stem
    pub fn suffix_tolerance(&self) -> usize {
        match self {
            Lang::Ru => 3,
            Lang::En => 1,
        }
    }

    pub fn stop_words(&self) -> &'static [&'static str] {
        match self {
            Lang::Ru => RU_STOP_WORDS,
            Lang::En => EN_STOP_WORDS,
        }
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words().contains(&word)
    }

    /// Word alternatives for a number, ordinal stem first
    pub fn digit_words(&self, digits: &str) -> Option<&'static [&'static str]> {
        let table = match self {
            Lang::Ru => RU_DIGITS,
            Lang::En => EN_DIGITS,
        };
        table
            .iter()
            .find(|(d, _)| *d == digits)
            .map(|(_, words)| *words)
    }

    /// Letter substitutions applied before anything else
    pub fn fold_letters(&self, text: &str) -> String {
        match self {
            Lang::Ru => text.replace('ё', "е").replace('Ё', "Е"),
            Lang::En => text.to_string(),
        }
    }

    pub(crate) fn consonants(&self) -> &'static str {
        match self {
            Lang::Ru => RU_CONSONANTS,
            Lang::En => "",
        }
    }

    pub(crate) fn fluent_vowels(&self) -> &'static str {
        match self {
            Lang::Ru => RU_FLUENT_VOWELS,
            Lang::En => "",
        }
    }

    pub(crate) fn ending_vowels(&self) -> &'static [char] {
        match self {
            Lang::Ru => RU_ENDING_VOWELS,
            Lang::En => &[],
        }
    }

    pub(crate) fn infinitive_endings(&self) -> &'static [&'static str] {
        match self {
            Lang::Ru => RU_INFINITIVE_ENDINGS,
            Lang::En => &[],
        }
    }

    /// Imperative phrase used as the first keywords of generated commands
    pub fn act_verb(&self, act: Act) -> &'static str {
        match (self, act) {
            (Lang::Ru, Act::On) => "включ",
            (Lang::Ru, Act::Off) => "выключ",
            (Lang::En, Act::On) => "turn on",
            (Lang::En, Act::Off) => "turn off",
        }
    }

    /// Past-participle result phrase before gender adjustment
    pub fn act_result_verb(&self, act: Act) -> &'static str {
        match (self, act) {
            (Lang::Ru, Act::On) => "включен",
            (Lang::Ru, Act::Off) => "выключен",
            (Lang::En, Act::On) => "is on",
            (Lang::En, Act::Off) => "is off",
        }
    }

    /// Confirmation text for an extension phrase without its own reply
    pub fn scene_reply(&self, phrase: &str) -> String {
        match self {
            Lang::Ru => format!("Команда \"{}\" выполнена.", phrase),
            Lang::En => format!("\"{}\" done.", phrase),
        }
    }

    /// Group type words used when the configuration names none
    pub fn default_group_word(&self) -> &'static str {
        match self {
            Lang::Ru => "свет",
            Lang::En => "light",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ru" => Ok(Lang::Ru),
            "en" => Ok(Lang::En),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_words() {
        assert_eq!(Lang::Ru.digit_words("1"), Some(&["перв", "один"][..]));
        assert_eq!(Lang::En.digit_words("4"), Some(&["four", "fourth"][..]));
        assert_eq!(Lang::En.digit_words("12"), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("RU".parse::<Lang>(), Ok(Lang::Ru));
        assert_eq!(" en ".parse::<Lang>(), Ok(Lang::En));
        assert!("de".parse::<Lang>().is_err());
    }

    #[test]
    fn test_tolerance() {
        assert!(Lang::Ru.suffix_tolerance() > Lang::En.suffix_tolerance());
    }

    #[test]
    fn test_fold_letters() {
        assert_eq!(Lang::Ru.fold_letters("тёплый"), "теплый");
        assert_eq!(Lang::En.fold_letters("tёst"), "tёst");
    }
}
