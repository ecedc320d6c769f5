//! Spoken command vocabulary for a home automation catalog
//!
//! Builds on/off phrases for devices and device groups from a catalog of
//! places, zones and devices, registers them alongside externally authored
//! phrases, and resolves free-form utterances against them with
//! suffix-tolerant matching.

pub mod builder;
pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod freqdict;
pub mod fuzzy;
pub mod grammar;
pub mod lang;
pub mod registry;
pub mod repl;
pub mod session;
pub mod stats;

pub use builder::{BuildOptions, Channel, GroupType, VocabularyBuilder, expand_extensions};
pub use catalog::{Device, Extension, ExtensionKind, Place, Zone};
pub use command::{Action, ActionKind, Candidate, Command, GroupFilter, Origin, Rejected, Resolution};
pub use config::Config;
pub use error::VocabError;
pub use lang::{Act, Lang};
pub use registry::{AcceptAll, LocationFit, Registry, RemoveCriteria};
pub use session::{SessionClient, SessionCommand, SessionEvent, SessionManager};
pub use stats::{SharedStats, VocabStats, VocabularyObserver};
