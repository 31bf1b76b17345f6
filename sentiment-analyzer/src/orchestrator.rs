use crate::backend::AnalysisBackend;
use crate::extractor::{parse_batch_response, parse_insights, parse_post_response};
use crate::session::{plan_batches, AnalysisSession, Batch, BatchFailure};
use crate::types::{
    AnalysisConfig, AnalysisMode, AnalysisResult, AnalyzerError, Post, ReportData, Result,
};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Progress notifications emitted while a run is in flight.
///
/// Everything about batch `i` is sent before batch `i + 1` is started.
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    RunStarted {
        run_id: Uuid,
        total_posts: usize,
        batch_count: usize,
        mode: AnalysisMode,
    },
    BatchStarted {
        index: usize,
        batch_count: usize,
    },
    BatchCompleted {
        index: usize,
        results: Vec<AnalysisResult>,
    },
    BatchFailed(BatchFailure),
    PostRetried {
        post_index: usize,
        attempt: u32,
        error: String,
    },
    PostFailed {
        post_index: usize,
        error: String,
    },
    Finalizing,
    RunFinished {
        run_id: Uuid,
        analyzed_posts: usize,
        failed_batches: usize,
    },
}

/// Drives one analysis run: batches the posts and calls the backend strictly
/// one request at a time.
///
/// A batch that fails in transport or parsing is logged, recorded on the
/// session and skipped; the run carries on with the next batch.
pub struct Orchestrator {
    backend: Arc<dyn AnalysisBackend>,
    config: AnalysisConfig,
    events: Option<mpsc::UnboundedSender<AnalysisEvent>>,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn AnalysisBackend>, config: AnalysisConfig) -> Self {
        Self {
            backend,
            config,
            events: None,
        }
    }

    pub fn with_events(mut self, sender: mpsc::UnboundedSender<AnalysisEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    fn emit(&self, event: AnalysisEvent) {
        if let Some(sender) = &self.events {
            if sender.send(event).is_err() {
                debug!("Event receiver dropped, continuing without progress updates");
            }
        }
    }

    /// Analyse `posts` and return the finished session.
    ///
    /// Only empty input and invalid configuration fail the run itself.
    pub async fn run(&self, posts: &[Post]) -> Result<AnalysisSession> {
        self.config.validate()?;
        if posts.is_empty() {
            return Err(AnalyzerError::EmptyInput);
        }

        let posts = &posts[..posts.len().min(self.config.max_posts)];
        let batches = plan_batches(posts, self.config.batch_size);
        let mut session = AnalysisSession::new(self.config.mode, posts.len(), batches.len());

        info!(
            "Starting run {} with {} posts in {} batches via {}",
            session.run_id,
            posts.len(),
            batches.len(),
            self.backend.backend_name()
        );
        self.emit(AnalysisEvent::RunStarted {
            run_id: session.run_id,
            total_posts: posts.len(),
            batch_count: batches.len(),
            mode: self.config.mode,
        });

        for batch in &batches {
            info!("Analyzing batch {} of {}", batch.index + 1, batches.len());
            self.emit(AnalysisEvent::BatchStarted {
                index: batch.index,
                batch_count: batches.len(),
            });

            match self.config.mode {
                AnalysisMode::Batched => {
                    self.run_batch(batch, batches.len() == 1, &mut session).await
                }
                AnalysisMode::PerPost => self.run_posts(batch, &mut session).await,
            }
        }

        if self.config.request_model_insights {
            self.emit(AnalysisEvent::Finalizing);
            self.request_insights(&mut session).await;
        }

        session.finish();
        info!(
            "Run {} finished: {} results, {} failed batches, {} posts lost",
            session.run_id,
            session.results.len(),
            session.failed_batches.len(),
            session.lost_posts()
        );
        self.emit(AnalysisEvent::RunFinished {
            run_id: session.run_id,
            analyzed_posts: session.analyzed_posts(),
            failed_batches: session.failed_batches.len(),
        });

        Ok(session)
    }

    /// Insights embedded in a batch response only describe that batch, so they
    /// are kept only when the batch is the whole run.
    async fn run_batch(&self, batch: &Batch, whole_run: bool, session: &mut AnalysisSession) {
        session.requests_sent += 1;
        let outcome = match self.backend.analyze_batch(&batch.posts).await {
            Ok(text) => parse_batch_response(&text, &batch.posts).map_err(AnalyzerError::from),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(parsed) => {
                debug!("Batch {} produced {} results", batch.index + 1, parsed.results.len());
                session.extend_results(&parsed.results);
                if whole_run {
                    session.insights = parsed.insights;
                } else if parsed.insights.is_some() {
                    debug!("Ignoring insights from batch {} of a multi-batch run", batch.index + 1);
                }
                self.emit(AnalysisEvent::BatchCompleted {
                    index: batch.index,
                    results: parsed.results,
                });
            }
            Err(e) => {
                let failure = BatchFailure {
                    batch_index: batch.index,
                    post_range: batch.range.clone(),
                    error: format!("Analysis failed on batch {}: {}", batch.index + 1, e),
                };
                error!("{}", failure.error);
                session.record_failure(failure.clone());
                self.emit(AnalysisEvent::BatchFailed(failure));
            }
        }
    }

    async fn run_posts(&self, batch: &Batch, session: &mut AnalysisSession) {
        let mut results = Vec::with_capacity(batch.len());
        for (offset, post) in batch.posts.iter().enumerate() {
            let (result, attempts) = self.analyze_single(post, batch.range.start + offset).await;
            session.requests_sent += attempts as usize;
            results.push(result);
        }
        session.extend_results(&results);
        self.emit(AnalysisEvent::BatchCompleted {
            index: batch.index,
            results,
        });
    }

    async fn try_post(&self, post: &Post) -> Result<AnalysisResult> {
        let text = self.backend.analyze_post(post).await?;
        Ok(parse_post_response(&text, post)?)
    }

    /// One post, retried up to the configured number of attempts. Never fails:
    /// exhausted retries produce a `Failed` result. Also returns the number of
    /// requests made.
    async fn analyze_single(&self, post: &Post, post_index: usize) -> (AnalysisResult, u32) {
        let delay = Duration::from_millis(self.config.retry.retry_delay_ms);
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: delay,
            initial_interval: delay,
            max_interval: delay * 32,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };

        let max_attempts = self.config.retry.max_attempts;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match self.try_post(post).await {
                Ok(result) => return (result, attempt),
                Err(e) => {
                    if attempt < max_attempts {
                        let wait = backoff.next_backoff().unwrap_or(delay);
                        warn!(
                            "Attempt {} failed for post {}, retrying in {:?}: {}",
                            attempt,
                            post_index + 1,
                            wait,
                            e
                        );
                        self.emit(AnalysisEvent::PostRetried {
                            post_index,
                            attempt,
                            error: e.to_string(),
                        });
                        if !wait.is_zero() {
                            tokio::time::sleep(wait).await;
                        }
                    }
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        error!(
            "Failed to analyze post {} after {} attempts: {}",
            post_index + 1,
            max_attempts,
            reason
        );
        self.emit(AnalysisEvent::PostFailed {
            post_index,
            error: reason.clone(),
        });
        let failed = AnalysisResult::failed(
            post,
            format!("Analysis failed after {} attempts: {}", max_attempts, reason),
        );
        (failed, max_attempts)
    }

    async fn request_insights(&self, session: &mut AnalysisSession) {
        let report = ReportData {
            total_posts: session.submitted_posts,
            analyzed_posts: session.analyzed_posts(),
            tally: session.tally().as_map(),
        };

        let outcome = match self.backend.generate_report(&report).await {
            Ok(text) => parse_insights(&text).map_err(AnalyzerError::from),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(insights) => {
                debug!("Received model insights ({} items)", insights.insights_list.len());
                session.insights = Some(insights);
            }
            Err(e) => warn!("Could not generate model insights, using defaults: {}", e),
        }
    }
}

/// Builder for an [`Orchestrator`].
pub struct OrchestratorBuilder {
    backend: Arc<dyn AnalysisBackend>,
    config: AnalysisConfig,
    events: Option<mpsc::UnboundedSender<AnalysisEvent>>,
}

impl OrchestratorBuilder {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Self {
        Self {
            backend,
            config: AnalysisConfig::default(),
            events: None,
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn max_posts(mut self, max_posts: usize) -> Self {
        self.config.max_posts = max_posts;
        self
    }

    pub fn mode(mut self, mode: AnalysisMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.retry.max_attempts = max_attempts;
        self
    }

    pub fn retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.config.retry.retry_delay_ms = retry_delay_ms;
        self
    }

    pub fn model_insights(mut self, enabled: bool) -> Self {
        self.config.request_model_insights = enabled;
        self
    }

    pub fn events(mut self, sender: mpsc::UnboundedSender<AnalysisEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        self.config.validate()?;
        let orchestrator = Orchestrator::new(self.backend, self.config);
        Ok(match self.events {
            Some(sender) => orchestrator.with_events(sender),
            None => orchestrator,
        })
    }
}
