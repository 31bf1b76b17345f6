pub mod types;
pub mod input;
pub mod extractor;
pub mod tally;
pub mod session;
pub mod client;
pub mod backend;
pub mod orchestrator;
pub mod report;

pub use types::*;
pub use backend::{AnalysisBackend, MockBackend, MockReply};
pub use client::ProxyClient;
pub use extractor::{extract_json, parse_batch_response, parse_insights, parse_post_response, ParsedBatch};
pub use input::NormalizedInput;
pub use orchestrator::{AnalysisEvent, Orchestrator, OrchestratorBuilder};
pub use session::{plan_batches, AnalysisSession, Batch, BatchFailure};
pub use tally::SentimentTally;
