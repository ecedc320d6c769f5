//! Command registry and matcher
//!
//! Holds every active command, enforces keyword uniqueness on insert and
//! resolves utterances to the single most specific command.
//!
//! Commands stay sorted by their rarest keyword so the matcher can skip a
//! whole run of commands once that word is known to be absent.

use tracing::{debug, info, instrument};
use unicode_width::UnicodeWidthStr;

use crate::command::{Candidate, Command, Origin, Rejected, Resolution};
use crate::error::VocabError;
use crate::freqdict::FreqDict;
use crate::fuzzy::{contains_keywords, is_duplicate};
use crate::grammar::to_word_sequence;
use crate::lang::Lang;

/// Post-match veto on commands whose location the utterance contradicts
pub trait LocationFit {
    fn fit_location(&self, command: &Command, words: &[String], tolerance: usize) -> bool;
}

/// Location filter that never vetoes
pub struct AcceptAll;

impl LocationFit for AcceptAll {
    fn fit_location(&self, _command: &Command, _words: &[String], _tolerance: usize) -> bool {
        true
    }
}

/// Which commands [`Registry::remove`] deletes; any matching field selects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveCriteria {
    pub id: Option<String>,
    pub action: Option<String>,
    pub dn: Option<String>,
    pub origins: Vec<Origin>,
}

impl RemoveCriteria {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn by_action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Default::default()
        }
    }

    pub fn by_dn(dn: impl Into<String>) -> Self {
        Self {
            dn: Some(dn.into()),
            ..Default::default()
        }
    }

    pub fn by_origin(origins: &[Origin]) -> Self {
        Self {
            origins: origins.to_vec(),
            ..Default::default()
        }
    }

    /// Everything the vocabulary builder generated
    pub fn generated() -> Self {
        Self::by_origin(&[Origin::GeneratedDevice, Origin::GeneratedGroup])
    }

    fn selects(&self, command: &Command) -> bool {
        let id = self.id.is_some() && command.id == self.id;
        let action = self
            .action
            .as_deref()
            .is_some_and(|a| command.action.to_string() == a);
        let dn = self.dn.is_some() && command.dn() == self.dn.as_deref();
        let origin = self.origins.contains(&command.origin);
        id || action || dn || origin
    }
}

fn keyword_tokens(keywords: &str) -> Vec<String> {
    keywords.split_whitespace().map(str::to_lowercase).collect()
}

pub struct Registry {
    lang: Lang,
    tolerance: usize,
    dict: FreqDict,
    commands: Vec<Command>,
}

impl Registry {
    pub fn new(lang: Lang) -> Self {
        Self {
            lang,
            tolerance: lang.suffix_tolerance(),
            dict: FreqDict::new(),
            commands: Vec::new(),
        }
    }

    /// Override the language's suffix tolerance
    pub fn with_tolerance(mut self, tolerance: usize) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn tolerance(&self) -> usize {
        self.tolerance
    }

    pub fn dict(&self) -> &FreqDict {
        &self.dict
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Command> {
        self.commands.get(index)
    }

    /// Insert a batch; duplicates are dropped and returned
    ///
    /// A candidate is checked against earlier survivors of the same batch,
    /// then against the registry. Candidates with an empty action or no
    /// keywords are skipped silently.
    #[hotpath::measure]
    pub fn add(&mut self, candidates: Vec<Candidate>) -> Vec<Rejected> {
        let total = candidates.len();
        let mut accepted: Vec<Candidate> = Vec::with_capacity(total);
        let mut rejected = Vec::new();

        for candidate in candidates {
            if candidate.action.is_empty() || candidate.keywords.trim().is_empty() {
                debug!("Skipping empty candidate {:?}", candidate.action);
                continue;
            }
            let existing = accepted
                .iter()
                .find(|c| is_duplicate(&candidate.keywords, &c.keywords))
                .map(|c| c.action.to_string())
                .or_else(|| {
                    self.find_conflict(&candidate.keywords)
                        .map(|c| c.action.to_string())
                });
            match existing {
                Some(existing) => {
                    debug!(
                        "Duplicate keywords '{}' for {} (taken by {})",
                        candidate.keywords, candidate.action, existing
                    );
                    rejected.push(Rejected {
                        candidate,
                        existing,
                    });
                }
                None => accepted.push(candidate),
            }
        }

        let inserted = accepted.len();
        self.insert(accepted);
        info!(
            "Registered {} of {} candidates ({} duplicates), {} commands total",
            inserted,
            total,
            rejected.len(),
            self.commands.len()
        );
        rejected
    }

    /// Insert one explicitly authored command; a collision is an error
    pub fn add_one(&mut self, candidate: Candidate) -> Result<(), VocabError> {
        if candidate.action.is_empty() || candidate.keywords.trim().is_empty() {
            return Err(VocabError::InvalidInput(format!(
                "command '{}' has no action or keywords",
                candidate.action
            )));
        }
        if let Some(existing) = self.find_conflict(&candidate.keywords) {
            return Err(VocabError::DuplicateKeyword {
                keywords: candidate.keywords,
                existing: existing.action.to_string(),
            });
        }
        self.insert(vec![candidate]);
        Ok(())
    }

    /// Replace the command registered under a record id
    ///
    /// The previous command is restored when the replacement collides.
    pub fn update(&mut self, id: &str, candidate: Candidate) -> Result<(), VocabError> {
        let removed = self.take(&RemoveCriteria::by_id(id));
        if removed.is_empty() {
            return Err(VocabError::UnknownCommand(id.to_string()));
        }
        let candidate = candidate.with_id(Some(id.to_string()));
        if let Err(e) = self.add_one(candidate) {
            let previous = removed
                .into_iter()
                .map(|c| Candidate::new(c.action, c.keywords, c.reply, c.origin).with_id(c.id))
                .collect();
            self.insert(previous);
            return Err(e);
        }
        Ok(())
    }

    /// Delete every command the criteria select, returns how many
    pub fn remove(&mut self, criteria: &RemoveCriteria) -> usize {
        let count = self.take(criteria).len();
        if count > 0 {
            debug!("Removed {} commands by {:?}", count, criteria);
        }
        count
    }

    fn take(&mut self, criteria: &RemoveCriteria) -> Vec<Command> {
        let (removed, kept): (Vec<Command>, Vec<Command>) = std::mem::take(&mut self.commands)
            .into_iter()
            .partition(|c| criteria.selects(c));
        self.commands = kept;
        for command in &removed {
            self.dict.remove(&command.ordered_words);
        }
        removed
    }

    /// Count words first so every new command is ordered against the whole batch
    fn insert(&mut self, candidates: Vec<Candidate>) {
        if candidates.is_empty() {
            return;
        }
        let tokens: Vec<Vec<String>> = candidates.iter().map(|c| keyword_tokens(&c.keywords)).collect();
        for words in &tokens {
            self.dict.add(&words.join(" "));
        }
        for (candidate, words) in candidates.into_iter().zip(tokens) {
            let ordered_words = self.dict.order_by_frequency(&words);
            self.commands.push(Command {
                id: candidate.id,
                action: candidate.action,
                keywords: candidate.keywords,
                ordered_words,
                reply: candidate.reply,
                origin: candidate.origin,
            });
        }
        self.commands.sort_by(|a, b| a.first_word().cmp(b.first_word()));
    }

    /// Resolve an utterance to the most specific registered command
    ///
    /// Ties between equally long keyword sets go to the command found first.
    /// A winner vetoed by `fit` means no match; the runner-up is not tried.
    #[instrument(skip(self, fit), fields(utterance = %text))]
    #[hotpath::measure]
    pub fn match_utterance(
        &self,
        text: &str,
        fit: &dyn LocationFit,
    ) -> Result<Option<Resolution>, VocabError> {
        if text.trim().is_empty() {
            return Err(VocabError::InvalidInput("empty utterance".into()));
        }
        let words = to_word_sequence(text, self.lang);
        if words.is_empty() {
            return Ok(None);
        }
        let padded = format!(" {}", words.join(" "));

        let mut skip_word: Option<&str> = None;
        let mut best: Option<&Command> = None;
        let mut best_index = 0;
        for (i, command) in self.commands.iter().enumerate() {
            let first = command.first_word();
            if skip_word == Some(first) {
                continue;
            }
            skip_word = None;
            if !padded.contains(&format!(" {}", first)) {
                skip_word = Some(first);
                continue;
            }
            if !contains_keywords(&command.ordered_words, &words, self.tolerance) {
                continue;
            }
            let longer = best.is_none_or(|b| command.ordered_words.len() > b.ordered_words.len());
            if longer {
                best = Some(command);
                best_index = i;
            }
        }

        let Some(winner) = best else {
            debug!("No command matches");
            return Ok(None);
        };
        if !fit.fit_location(winner, &words, self.tolerance) {
            debug!("{} rejected by location filter", winner.action);
            return Ok(None);
        }
        debug!("Matched {} by '{}'", winner.action, winner.keywords);
        Ok(Some(Resolution {
            action: winner.action.clone(),
            reply: winner.reply.clone(),
            index: best_index,
        }))
    }

    /// Keywords registered for an action identifier
    pub fn keywords_for(&self, action: &str) -> Option<&str> {
        self.commands
            .iter()
            .find(|c| c.action.to_string() == action)
            .map(|c| c.keywords.as_str())
    }

    /// Registered command a keyword phrase would duplicate
    pub fn find_conflict(&self, keywords: &str) -> Option<&Command> {
        self.commands.iter().find(|c| is_duplicate(keywords, &c.keywords))
    }

    /// Device commands, for one device or all of them
    pub fn device_commands<'a>(&'a self, dn: Option<&'a str>) -> impl Iterator<Item = &'a Command> {
        self.commands
            .iter()
            .filter(move |c| c.dn().is_some_and(|d| dn.is_none_or(|want| d == want)))
    }

    /// Commands bound to one action identifier, typically a scene id
    pub fn scene_commands<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Command> {
        self.commands.iter().filter(move |c| c.action.to_string() == id)
    }

    /// Aligned dump: first word, keywords, action, reply
    pub fn listing(&self) -> String {
        let first_width = self
            .commands
            .iter()
            .map(|c| c.first_word().width())
            .max()
            .unwrap_or(0);
        let keyword_width = self
            .commands
            .iter()
            .map(|c| c.keywords.width())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for command in &self.commands {
            let first = command.first_word();
            out.push_str(first);
            out.push_str(&" ".repeat(first_width - first.width() + 2));
            out.push_str(&command.keywords);
            out.push_str(&" ".repeat(keyword_width - command.keywords.width() + 2));
            out.push_str(&format!("{:<10} {}\n", command.action.to_string(), command.reply));
        }
        out
    }
}
