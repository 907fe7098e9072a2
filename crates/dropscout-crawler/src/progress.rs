//! Observable state of the current or most recent crawl session.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    #[default]
    Idle,
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOutcome {
    Pending,
    Succeeded,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub name: String,
    pub outcome: SourceOutcome,
    pub yielded: usize,
    pub error: Option<String>,
}

/// Snapshot handed to callers of `get_progress`; only the orchestrator
/// mutates the live copy.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CrawlProgress {
    pub session_id: Option<Uuid>,
    pub total_sources: usize,
    pub completed_sources: usize,
    pub total_products: usize,
    pub status: CrawlStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub sources: Vec<SourceReport>,
}

impl CrawlProgress {
    /// Fresh running state for a new session.
    #[must_use]
    pub(crate) fn begin(total_sources: usize) -> Self {
        Self {
            session_id: Some(Uuid::new_v4()),
            total_sources,
            completed_sources: 0,
            total_products: 0,
            status: CrawlStatus::Running,
            start_time: Some(Utc::now()),
            end_time: None,
            sources: Vec::with_capacity(total_sources),
        }
    }

    /// Share of sources finished, `0.0` when there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.total_sources == 0 {
            return 0.0;
        }
        self.completed_sources as f64 / self.total_sources as f64 * 100.0
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == CrawlStatus::Running
    }

    /// Records the final outcome of source `index`; later calls for the same
    /// source are ignored.
    pub(crate) fn settle(
        &mut self,
        index: usize,
        outcome: SourceOutcome,
        yielded: usize,
        error: Option<String>,
    ) {
        let Some(report) = self.sources.get_mut(index) else {
            return;
        };
        if report.outcome != SourceOutcome::Pending {
            return;
        }
        report.outcome = outcome;
        report.yielded = yielded;
        report.error = error;
        self.completed_sources += 1;
    }

    pub(crate) fn complete(&mut self, total_products: usize) {
        self.status = CrawlStatus::Completed;
        self.total_products = total_products;
        self.end_time = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_sources(names: &[&str]) -> CrawlProgress {
        let mut progress = CrawlProgress::begin(names.len());
        progress.sources = names
            .iter()
            .map(|name| SourceReport {
                name: (*name).to_owned(),
                outcome: SourceOutcome::Pending,
                yielded: 0,
                error: None,
            })
            .collect();
        progress
    }

    #[test]
    fn idle_progress_reports_zero_percent() {
        let progress = CrawlProgress::default();
        assert_eq!(progress.status, CrawlStatus::Idle);
        assert!(progress.percentage().abs() < f64::EPSILON);
    }

    #[test]
    fn percentage_tracks_settled_sources() {
        let mut progress = with_sources(&["a", "b", "c", "d"]);
        progress.settle(0, SourceOutcome::Succeeded, 5, None);
        progress.settle(2, SourceOutcome::Failed, 0, Some("boom".into()));
        assert!((progress.percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn settle_ignores_repeat_and_unknown_indices() {
        let mut progress = with_sources(&["a"]);
        progress.settle(0, SourceOutcome::Succeeded, 3, None);
        progress.settle(0, SourceOutcome::TimedOut, 0, None);
        progress.settle(9, SourceOutcome::Failed, 0, None);
        assert_eq!(progress.completed_sources, 1);
        assert_eq!(progress.sources[0].outcome, SourceOutcome::Succeeded);
        assert_eq!(progress.sources[0].yielded, 3);
    }

    #[test]
    fn begin_assigns_session_and_start_time() {
        let progress = CrawlProgress::begin(2);
        assert!(progress.is_running());
        assert!(progress.session_id.is_some());
        assert!(progress.start_time.is_some());
        assert!(progress.end_time.is_none());
    }

    #[test]
    fn complete_sets_end_time_and_total() {
        let mut progress = CrawlProgress::begin(0);
        progress.complete(42);
        assert_eq!(progress.status, CrawlStatus::Completed);
        assert_eq!(progress.total_products, 42);
        assert!(progress.end_time.is_some());
    }
}
