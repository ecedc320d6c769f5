//! Session manager - owns the vocabulary and serializes reloads against matching
//!
//! All mutation and all queries run on the thread that calls [`SessionManager::run_sync`],
//! one command at a time, so a match never observes a half-rebuilt registry.

use std::thread;
use std::time::Instant;

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::builder::{BuildOptions, Channel, VocabularyBuilder, expand_extensions};
use crate::catalog::{Device, Extension};
use crate::command::{Candidate, Origin, Resolution};
use crate::config::Config;
use crate::error::VocabError;
use crate::registry::{Registry, RemoveCriteria};
use crate::stats::{RebuildKind, RebuildReport, ResolveReport, SharedStats, VocabularyObserver};

pub enum SessionCommand {
    Utterance(String),
    ReloadDevices(Vec<Device>),
    ReloadExtensions(Vec<Extension>),
    Remove(RemoveCriteria),
    Listing,
    Channels,
}

/// One event answers each command
#[derive(Clone, Debug)]
pub enum SessionEvent {
    Resolved {
        utterance: String,
        resolution: Resolution,
    },
    Unresolved {
        utterance: String,
    },
    Rebuilt(RebuildReport),
    Removed(usize),
    Listing(String),
    Channels(Vec<Channel>),
    Error(String),
}

pub struct SessionManager {
    registry: Registry,
    builder: VocabularyBuilder,
    options: BuildOptions,
    observers: Vec<Box<dyn VocabularyObserver + Send>>,
}

impl SessionManager {
    pub fn new(config: &Config) -> Self {
        Self {
            registry: Registry::new(config.lang).with_tolerance(config.suffix_tolerance()),
            builder: VocabularyBuilder::new(config.lang),
            options: config.build_options(),
            observers: Vec::new(),
        }
    }

    pub fn with_stats(self, stats: SharedStats) -> Self {
        self.with_observer(Box::new(stats))
    }

    pub fn with_observer(mut self, observer: Box<dyn VocabularyObserver + Send>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn builder(&self) -> &VocabularyBuilder {
        &self.builder
    }

    pub fn run_sync(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
    ) {
        while let Some(cmd) = cmd_rx.blocking_recv() {
            let event = self.handle(cmd);
            if event_tx.send(event).is_err() {
                break;
            }
        }
    }

    pub fn handle(&mut self, cmd: SessionCommand) -> SessionEvent {
        match cmd {
            SessionCommand::Utterance(utterance) => match self.resolve(&utterance) {
                Ok(Some(resolution)) => SessionEvent::Resolved {
                    utterance,
                    resolution,
                },
                Ok(None) => SessionEvent::Unresolved { utterance },
                Err(e) => SessionEvent::Error(e.to_string()),
            },
            SessionCommand::ReloadDevices(devices) => {
                SessionEvent::Rebuilt(self.reload_devices(&devices))
            }
            SessionCommand::ReloadExtensions(extensions) => {
                SessionEvent::Rebuilt(self.reload_extensions(&extensions))
            }
            SessionCommand::Remove(criteria) => SessionEvent::Removed(self.remove(&criteria)),
            SessionCommand::Listing => SessionEvent::Listing(self.registry.listing()),
            SessionCommand::Channels => SessionEvent::Channels(self.builder.channels().to_vec()),
        }
    }

    pub fn resolve(&mut self, utterance: &str) -> Result<Option<Resolution>, VocabError> {
        let start = Instant::now();
        let result = self.registry.match_utterance(utterance, &self.builder)?;
        let report = ResolveReport {
            utterance: utterance.to_string(),
            action: result.as_ref().map(|r| r.action.to_string()),
            elapsed: start.elapsed(),
        };
        for observer in &mut self.observers {
            observer.on_resolve(&report);
        }
        Ok(result)
    }

    /// Drop generated commands, rebuild from the fresh catalog, re-add
    pub fn reload_devices(&mut self, devices: &[Device]) -> RebuildReport {
        let removed = self.registry.remove(&RemoveCriteria::generated());
        let candidates = self.builder.rebuild(devices, &self.options);
        self.register(RebuildKind::Devices, removed, candidates)
    }

    /// Drop externally authored commands and re-add the fresh set
    pub fn reload_extensions(&mut self, extensions: &[Extension]) -> RebuildReport {
        let removed = self
            .registry
            .remove(&RemoveCriteria::by_origin(&[Origin::External]));
        let candidates = expand_extensions(extensions, self.registry.lang());
        self.register(RebuildKind::Extensions, removed, candidates)
    }

    pub fn remove(&mut self, criteria: &RemoveCriteria) -> usize {
        self.registry.remove(criteria)
    }

    fn register(
        &mut self,
        kind: RebuildKind,
        removed: usize,
        candidates: Vec<Candidate>,
    ) -> RebuildReport {
        let generated = candidates.len();
        let before = self.registry.len();
        let rejected = self.registry.add(candidates);
        let inserted = self.registry.len() - before;

        if !rejected.is_empty() {
            warn!("{} phrases not unique, skipped", rejected.len());
            for r in &rejected {
                info!(
                    "  '{}' -> {} duplicates {}",
                    r.candidate.keywords, r.candidate.action, r.existing
                );
            }
        }

        let report = RebuildReport {
            kind,
            removed,
            generated,
            inserted,
            duplicates: rejected.len(),
            at: Local::now(),
        };
        for observer in &mut self.observers {
            observer.on_rebuild(&report);
        }
        report
    }
}

/// Request/response handle to a session running on its own thread
pub struct SessionClient {
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    event_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionClient {
    pub fn spawn(session: SessionManager) -> (Self, thread::JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let handle = thread::spawn(move || session.run_sync(cmd_rx, event_tx));
        (Self { cmd_tx, event_rx }, handle)
    }

    /// Send one command and wait for its event; `None` once the session is gone
    pub fn request(&mut self, cmd: SessionCommand) -> Option<SessionEvent> {
        self.cmd_tx.send(cmd).ok()?;
        self.event_rx.blocking_recv()
    }
}
