use crate::defs::{Post, Sentiment};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// Bodies accepted by the proxy. A body carrying a `task` field is a task
// request, anything else with `posts` is a batch request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProxyRequest {
    Task(TaskRequest),
    Batch(BatchRequest),
}

impl<'de> Deserialize<'de> for ProxyRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        // An invalid task must not be read as a batch.
        if value.get("task").is_some() {
            TaskRequest::deserialize(value)
                .map(ProxyRequest::Task)
                .map_err(D::Error::custom)
        } else {
            BatchRequest::deserialize(value)
                .map(ProxyRequest::Batch)
                .map_err(D::Error::custom)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub posts: Vec<Post>,
    #[serde(rename = "analysisType", default, skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TaskRequest {
    AnalyzePost {
        post: Post,
    },
    ExplainSentiment {
        post: Post,
        sentiment: Sentiment,
    },
    GenerateReport {
        #[serde(rename = "reportData")]
        report_data: ReportData,
    },
}

impl ProxyRequest {
    pub fn batch(posts: &[Post]) -> Self {
        ProxyRequest::Batch(BatchRequest {
            posts: posts.to_vec(),
            analysis_type: None,
        })
    }

    pub fn analyze_post(post: &Post) -> Self {
        ProxyRequest::Task(TaskRequest::AnalyzePost { post: post.clone() })
    }

    pub fn generate_report(report_data: ReportData) -> Self {
        ProxyRequest::Task(TaskRequest::GenerateReport { report_data })
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyRequest::Batch(BatchRequest { analysis_type: None, .. }) => "batch",
            ProxyRequest::Batch(BatchRequest { analysis_type: Some(_), .. }) => "typed_batch",
            ProxyRequest::Task(TaskRequest::AnalyzePost { .. }) => "analyze_post",
            ProxyRequest::Task(TaskRequest::ExplainSentiment { .. }) => "explain_sentiment",
            ProxyRequest::Task(TaskRequest::GenerateReport { .. }) => "generate_report",
        }
    }
}

/// Aggregate figures handed to the model when asking for a written report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub total_posts: usize,
    pub analyzed_posts: usize,
    pub tally: BTreeMap<String, usize>,
}

/// Error body returned by the proxy with a non-2xx status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// What the model is asked to produce. Every field is optional because the
// model does not always follow instructions; the analyzer validates shape.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostVerdict {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub justification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicInsights {
    pub summary: String,
    #[serde(default)]
    pub insights_list: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchPayload {
    #[serde(default)]
    pub post_analysis: Option<Vec<PostVerdict>>,
    #[serde(default)]
    pub sentiments: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub justifications: Option<Vec<String>>,
    #[serde(default)]
    pub strategic_insights: Option<StrategicInsights>,
}
