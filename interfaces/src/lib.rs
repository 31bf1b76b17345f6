pub mod defs;
pub mod wire;

pub use defs::{normalize_label, AnalysisResult, Post, Sentiment};
pub use wire::{
    BatchPayload, BatchRequest, ErrorBody, PostVerdict, ProxyRequest, ReportData,
    StrategicInsights, TaskRequest,
};
