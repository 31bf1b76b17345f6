use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single unit of user-submitted text, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Post(String);

impl Post {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Post {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Post {
    fn from(text: &str) -> Self {
        Self(text.to_owned())
    }
}

impl From<String> for Post {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Label assigned to a post by the model.
///
/// Anything outside the closed set is kept as `Unrecognized` so it can still
/// be shown to the user, but it never counts towards a tally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
    Failed,
    Unrecognized(String),
}

impl Sentiment {
    /// Labels shown on the chart, in display order.
    pub const CHARTED: [Sentiment; 4] = [
        Sentiment::Positive,
        Sentiment::Negative,
        Sentiment::Neutral,
        Sentiment::Mixed,
    ];

    /// Parse a model label, normalising its casing first.
    pub fn parse(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "Positive" => Sentiment::Positive,
            "Negative" => Sentiment::Negative,
            "Neutral" => Sentiment::Neutral,
            "Mixed" => Sentiment::Mixed,
            "Failed" => Sentiment::Failed,
            "N/a" => Sentiment::missing(),
            normalized => Sentiment::Unrecognized(normalized.to_owned()),
        }
    }

    /// Used when the model left the label out entirely.
    pub fn missing() -> Self {
        Sentiment::Unrecognized("N/A".to_owned())
    }

    pub fn label(&self) -> &str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
            Sentiment::Mixed => "Mixed",
            Sentiment::Failed => "Failed",
            Sentiment::Unrecognized(label) => label,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Sentiment::Unrecognized(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Sentiment::Failed)
    }

    /// Lowercase, whitespace-free label used for styling cards and badges.
    pub fn css_class(&self) -> String {
        self.label()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase()
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Sentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Sentiment::parse(&label))
    }
}

/// First letter uppercase, the rest lowercase.
pub fn normalize_label(label: &str) -> String {
    let trimmed = label.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// The outcome for one submitted post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub text: String,
    pub sentiment: Sentiment,
    pub justification: String,
}

impl AnalysisResult {
    pub fn new(post: &Post, sentiment: Sentiment, justification: impl Into<String>) -> Self {
        Self {
            text: post.as_str().to_owned(),
            sentiment,
            justification: justification.into(),
        }
    }

    /// Placeholder for a post that could not be analysed.
    pub fn failed(post: &Post, reason: impl Into<String>) -> Self {
        Self::new(post, Sentiment::Failed, reason)
    }
}
