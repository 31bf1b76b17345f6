use crate::tally::{analyzed_count, SentimentTally};
use crate::types::{AnalysisMode, AnalysisResult, Post, StrategicInsights};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ops::Range;
use uuid::Uuid;

/// A contiguous slice of the submitted posts sent in one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub index: usize,
    pub range: Range<usize>,
    pub posts: Vec<Post>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Partition `posts` into batches of at most `batch_size`, in order.
///
/// Panics on a zero batch size; callers validate configuration first.
pub fn plan_batches(posts: &[Post], batch_size: usize) -> Vec<Batch> {
    assert!(batch_size > 0, "batch size must be at least 1");
    posts
        .chunks(batch_size)
        .enumerate()
        .map(|(index, chunk)| {
            let start = index * batch_size;
            Batch {
                index,
                range: start..start + chunk.len(),
                posts: chunk.to_vec(),
            }
        })
        .collect()
}

/// A batch that was skipped after a transport or parse failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub batch_index: usize,
    pub post_range: Range<usize>,
    pub error: String,
}

impl BatchFailure {
    pub fn lost_posts(&self) -> usize {
        self.post_range.len()
    }
}

/// Everything produced by one analysis run. Recreated for every run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSession {
    pub run_id: Uuid,
    pub mode: AnalysisMode,
    pub submitted_posts: usize,
    /// Groups of posts the run was split into. In per-post mode these are
    /// progress groups only; every post is its own request.
    pub batch_count: usize,
    /// Analysis requests issued, retries included.
    pub requests_sent: usize,
    pub results: Vec<AnalysisResult>,
    pub failed_batches: Vec<BatchFailure>,
    pub insights: Option<StrategicInsights>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl AnalysisSession {
    pub fn new(mode: AnalysisMode, submitted_posts: usize, batch_count: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            mode,
            submitted_posts,
            batch_count,
            requests_sent: 0,
            results: Vec::new(),
            failed_batches: Vec::new(),
            insights: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn extend_results(&mut self, results: &[AnalysisResult]) {
        self.results.extend_from_slice(results);
    }

    pub fn record_failure(&mut self, failure: BatchFailure) {
        self.failed_batches.push(failure);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn tally(&self) -> SentimentTally {
        SentimentTally::from_results(&self.results)
    }

    /// Results whose sentiment is not `Failed`.
    pub fn analyzed_posts(&self) -> usize {
        analyzed_count(&self.results)
    }

    pub fn lost_posts(&self) -> usize {
        self.failed_batches.iter().map(BatchFailure::lost_posts).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.results.len() == self.submitted_posts
    }
}
