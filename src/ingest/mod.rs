pub mod boxscores;
pub mod csv;
pub mod fantasy;
pub mod games;
pub mod injuries;
pub mod ngs;
pub mod play_by_play;
pub mod resolver;
pub mod rosters;
pub mod schedule;
pub mod scoring_plays;
pub mod teams;
pub mod weather;
pub mod weekly_stats;

use serde::Serialize;

/// What one pipeline run did. Failures are per-record: a bad row bumps
/// `skipped` (and usually `errors`), never aborts the run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunReport {
    pub processed: u32,
    pub upserted: u32,
    pub skipped: u32,
    pub errors: Vec<String>,
}

impl RunReport {
    pub fn record_upsert(&mut self) {
        self.processed += 1;
        self.upserted += 1;
    }

    pub fn record_skip(&mut self) {
        self.processed += 1;
        self.skipped += 1;
    }

    pub fn record_error(&mut self, context: impl Into<String>) {
        self.processed += 1;
        self.skipped += 1;
        // Keep the list bounded; the counts carry the magnitude.
        if self.errors.len() < 50 {
            self.errors.push(context.into());
        }
    }

    pub fn finish(self, label: &str) -> Self {
        tracing::info!(
            "{}: processed={} upserted={} skipped={}",
            label,
            self.processed,
            self.upserted,
            self.skipped
        );
        for err in &self.errors {
            tracing::debug!("{}: {}", label, err);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counters_stay_consistent() {
        let mut report = RunReport::default();
        report.record_upsert();
        report.record_skip();
        report.record_error("row 3: no such player");
        assert_eq!(report.processed, 3);
        assert_eq!(report.upserted, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.errors.len(), 1);
    }
}
