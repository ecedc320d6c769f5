//! Error taxonomy for the vocabulary engine

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VocabError {
    /// Utterance is empty or otherwise unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Candidate keywords collide with an already registered command
    #[error("keywords '{keywords}' duplicate the keywords of '{existing}'")]
    DuplicateKeyword { keywords: String, existing: String },

    /// Edit or removal targeted a record id that is not registered
    #[error("unknown command record '{0}'")]
    UnknownCommand(String),

    /// Catalog document could not be read as a whole
    #[error("catalog error: {0}")]
    Catalog(String),
}
