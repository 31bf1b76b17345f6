//! Recovering JSON payloads from free-form model output.
//!
//! Models are asked for "a single clean JSON object" but routinely wrap it in
//! a markdown fence or surround it with prose. Everything here works on the
//! raw response text returned by the proxy.

use crate::types::{AnalysisResult, ExtractError, Post, Sentiment, StrategicInsights};
use interfaces::wire::{BatchPayload, PostVerdict};
use serde_json::Value;
use tracing::debug;

const FENCE: &str = "```";
const MISSING_JUSTIFICATION: &str = "N/A";

/// Results recovered from one batch response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBatch {
    pub results: Vec<AnalysisResult>,
    pub insights: Option<StrategicInsights>,
}

/// Content of the first fenced code block that looks like it holds an object.
fn fenced_block(text: &str) -> Option<&str> {
    let mut rest = text;
    while let Some(open) = rest.find(FENCE) {
        let after_fence = &rest[open + FENCE.len()..];
        // Skip the info string, e.g. "json".
        let body_start = after_fence
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(after_fence.len());
        let body = &after_fence[body_start..];
        let close = body.find(FENCE)?;
        let content = &body[..close];
        if content.contains('{') {
            return Some(content);
        }
        rest = &body[close + FENCE.len()..];
    }
    None
}

/// Slice from the first `{` to the last `}` of `text`.
fn outer_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Locate and parse the JSON object embedded in a model response.
pub fn extract_json(text: &str) -> Result<Value, ExtractError> {
    let region = fenced_block(text).unwrap_or(text);
    let candidate = outer_braces(region).ok_or(ExtractError::NoJsonObject)?;
    serde_json::from_str(candidate).map_err(|e| ExtractError::InvalidJson(e.to_string()))
}

fn verdict_to_result(post: &Post, verdict: PostVerdict) -> AnalysisResult {
    if let Some(echoed) = verdict.text.as_deref() {
        if echoed.trim() != post.as_str() {
            debug!("Model echoed different text for post {:?}: {:?}", post.as_str(), echoed);
        }
    }
    let sentiment = verdict
        .sentiment
        .as_deref()
        .map(Sentiment::parse)
        .unwrap_or_else(Sentiment::missing);
    let justification = verdict
        .justification
        .unwrap_or_else(|| MISSING_JUSTIFICATION.to_string());
    AnalysisResult::new(post, sentiment, justification)
}

/// Parse a batch response into one result per post, in input order.
pub fn parse_batch_response(text: &str, batch: &[Post]) -> Result<ParsedBatch, ExtractError> {
    let value = extract_json(text)?;
    let payload: BatchPayload =
        serde_json::from_value(value).map_err(|e| ExtractError::InvalidJson(e.to_string()))?;

    let results = if let Some(verdicts) = payload.post_analysis {
        if verdicts.len() != batch.len() {
            return Err(ExtractError::LengthMismatch {
                expected: batch.len(),
                actual: verdicts.len(),
            });
        }
        batch
            .iter()
            .zip(verdicts)
            .map(|(post, verdict)| verdict_to_result(post, verdict))
            .collect()
    } else if let Some(labels) = payload.sentiments {
        if labels.len() != batch.len() {
            return Err(ExtractError::LengthMismatch {
                expected: batch.len(),
                actual: labels.len(),
            });
        }
        let mut justifications = payload.justifications.unwrap_or_default().into_iter();
        batch
            .iter()
            .zip(labels)
            .map(|(post, label)| {
                let verdict = PostVerdict {
                    text: None,
                    sentiment: label,
                    justification: justifications.next(),
                };
                verdict_to_result(post, verdict)
            })
            .collect()
    } else {
        return Err(ExtractError::MissingField("post_analysis"));
    };

    Ok(ParsedBatch {
        results,
        insights: payload.strategic_insights,
    })
}

/// Parse a single-post response. A model-reported `Failed` label comes back
/// as a normal result.
pub fn parse_post_response(text: &str, post: &Post) -> Result<AnalysisResult, ExtractError> {
    let value = extract_json(text)?;

    let verdict = match value.get("post_analysis").and_then(Value::as_array) {
        Some(items) if items.len() == 1 => serde_json::from_value::<PostVerdict>(items[0].clone()),
        Some(items) => {
            return Err(ExtractError::LengthMismatch {
                expected: 1,
                actual: items.len(),
            })
        }
        None => serde_json::from_value::<PostVerdict>(value),
    }
    .map_err(|e| ExtractError::InvalidJson(e.to_string()))?;

    if verdict.sentiment.is_none() {
        return Err(ExtractError::MissingField("sentiment"));
    }
    Ok(verdict_to_result(post, verdict))
}

/// Parse a written report, bare or nested under `strategic_insights`.
pub fn parse_insights(text: &str) -> Result<StrategicInsights, ExtractError> {
    let value = extract_json(text)?;
    let value = match value.get("strategic_insights") {
        Some(nested) => nested.clone(),
        None => value,
    };
    if value.get("summary").is_none() {
        return Err(ExtractError::MissingField("summary"));
    }
    serde_json::from_value(value).map_err(|e| ExtractError::InvalidJson(e.to_string()))
}
