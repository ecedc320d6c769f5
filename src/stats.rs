//! Vocabulary stats - rebuild sizes, duplicate counts, match hit/miss and latency

use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Which part of the vocabulary a rebuild replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildKind {
    Devices,
    Extensions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    pub kind: RebuildKind,
    /// Commands deleted before re-adding
    pub removed: usize,
    pub generated: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveReport {
    pub utterance: String,
    /// Resolved action identifier, `None` for no match
    pub action: Option<String>,
    pub elapsed: Duration,
}

/// Receives counts from the session instead of inline logging
pub trait VocabularyObserver {
    fn on_rebuild(&mut self, report: &RebuildReport);
    fn on_resolve(&mut self, report: &ResolveReport);
}

/// Running latency aggregate; constant size however many samples arrive
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Latency {
    pub count: u32,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl Latency {
    pub fn record(&mut self, sample: Duration) {
        if self.count == 0 || sample < self.min {
            self.min = sample;
        }
        if sample > self.max {
            self.max = sample;
        }
        self.total += sample;
        self.count += 1;
    }

    pub fn avg(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        self.total / self.count
    }
}

#[derive(Clone, Default)]
pub struct VocabStats {
    pub rebuilds: usize,
    pub last_rebuild: Option<RebuildReport>,
    pub hits: usize,
    pub misses: usize,
    pub latency: Latency,
}

impl VocabStats {
    pub fn summary(&self) -> String {
        let mut out = String::new();

        if let Some(last) = &self.last_rebuild {
            out.push_str(&format!(
                "Rebuilds (n={}): last {:?} at {}: generated={} inserted={} duplicates={} removed={}\n",
                self.rebuilds,
                last.kind,
                last.at.format("%H:%M:%S"),
                last.generated,
                last.inserted,
                last.duplicates,
                last.removed
            ));
        }

        if self.latency.count > 0 {
            out.push_str(&format!(
                "Matches (n={}): hits={} misses={} avg={}us min={}us max={}us\n",
                self.latency.count,
                self.hits,
                self.misses,
                self.latency.avg().as_micros(),
                self.latency.min.as_micros(),
                self.latency.max.as_micros()
            ));
        }

        if out.is_empty() {
            out.push_str("No stats recorded yet.\n");
        }
        out
    }
}

impl VocabularyObserver for VocabStats {
    fn on_rebuild(&mut self, report: &RebuildReport) {
        self.rebuilds += 1;
        self.last_rebuild = Some(report.clone());
    }

    fn on_resolve(&mut self, report: &ResolveReport) {
        if report.action.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.latency.record(report.elapsed);
    }
}

pub type SharedStats = Arc<Mutex<VocabStats>>;

pub fn new_shared() -> SharedStats {
    Arc::new(Mutex::new(VocabStats::default()))
}

impl VocabularyObserver for SharedStats {
    fn on_rebuild(&mut self, report: &RebuildReport) {
        if let Ok(mut stats) = self.lock() {
            stats.on_rebuild(report);
        }
    }

    fn on_resolve(&mut self, report: &ResolveReport) {
        if let Ok(mut stats) = self.lock() {
            stats.on_resolve(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        assert_eq!(VocabStats::default().summary(), "No stats recorded yet.\n");
    }

    #[test]
    fn test_hits_and_misses() {
        let mut shared = new_shared();
        for action in [Some("LAMP1.on".to_string()), None, None] {
            shared.on_resolve(&ResolveReport {
                utterance: "turn on sconce".into(),
                action,
                elapsed: Duration::from_micros(40),
            });
        }
        let stats = shared.lock().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert!(stats.summary().contains("hits=1 misses=2 avg=40us"));
    }

    #[test]
    fn test_rebuild_report() {
        let mut stats = VocabStats::default();
        stats.on_rebuild(&RebuildReport {
            kind: RebuildKind::Devices,
            removed: 0,
            generated: 12,
            inserted: 10,
            duplicates: 2,
            at: Local::now(),
        });
        assert!(stats.summary().contains("generated=12 inserted=10 duplicates=2"));
    }

    #[test]
    fn test_aggregates_stay_bounded() {
        let mut stats = VocabStats::default();
        for micros in [30, 10, 50] {
            stats.on_resolve(&ResolveReport {
                utterance: "turn on sconce".into(),
                action: None,
                elapsed: Duration::from_micros(micros),
            });
        }
        for _ in 0..3 {
            stats.on_rebuild(&RebuildReport {
                kind: RebuildKind::Extensions,
                removed: 1,
                generated: 1,
                inserted: 1,
                duplicates: 0,
                at: Local::now(),
            });
        }
        assert_eq!(stats.latency.count, 3);
        assert_eq!(stats.latency.min, Duration::from_micros(10));
        assert_eq!(stats.latency.max, Duration::from_micros(50));
        assert_eq!(stats.latency.avg(), Duration::from_micros(30));
        assert_eq!(stats.rebuilds, 3);
        assert_eq!(stats.last_rebuild.as_ref().unwrap().kind, RebuildKind::Extensions);
        assert!(stats.summary().contains("Rebuilds (n=3)"));
    }
}
