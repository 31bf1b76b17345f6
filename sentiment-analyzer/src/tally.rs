use crate::types::{AnalysisResult, Sentiment};
use serde::Serialize;
use std::collections::BTreeMap;

/// Count of results per recognized label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentTally {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub mixed: usize,
    pub failed: usize,
}

impl SentimentTally {
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        let mut tally = Self::default();
        for result in results {
            tally.record(&result.sentiment);
        }
        tally
    }

    /// Unrecognized labels are ignored.
    pub fn record(&mut self, sentiment: &Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Mixed => self.mixed += 1,
            Sentiment::Failed => self.failed += 1,
            Sentiment::Unrecognized(_) => {}
        }
    }

    pub fn count(&self, sentiment: &Sentiment) -> usize {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
            Sentiment::Mixed => self.mixed,
            Sentiment::Failed => self.failed,
            Sentiment::Unrecognized(_) => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral + self.mixed + self.failed
    }

    pub fn as_map(&self) -> BTreeMap<String, usize> {
        [
            Sentiment::Positive,
            Sentiment::Negative,
            Sentiment::Neutral,
            Sentiment::Mixed,
            Sentiment::Failed,
        ]
        .iter()
        .map(|s| (s.label().to_string(), self.count(s)))
        .collect()
    }
}

/// Share of `count` in `analyzed`, in percent. Zero when nothing was analysed.
pub fn percent(count: usize, analyzed: usize) -> f64 {
    if analyzed == 0 {
        return 0.0;
    }
    count as f64 / analyzed as f64 * 100.0
}

/// Posts the model actually classified, i.e. everything except `Failed`.
pub fn analyzed_count(results: &[AnalysisResult]) -> usize {
    results.iter().filter(|r| !r.sentiment.is_failed()).count()
}
