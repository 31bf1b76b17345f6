use crate::types::{AnalyzerError, Post, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Posts recovered from user input, already capped at the post limit.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    pub posts: Vec<Post>,
    /// Number of posts detected before truncation, when the limit kicked in.
    pub truncated_from: Option<usize>,
    pub max_posts: usize,
}

impl NormalizedInput {
    pub fn new(posts: Vec<Post>, max_posts: usize) -> Self {
        let detected = posts.len();
        let mut posts = posts;
        let truncated_from = if detected > max_posts {
            warn!("Detected {} posts, using the first {} due to limit", detected, max_posts);
            posts.truncate(max_posts);
            Some(detected)
        } else {
            None
        };

        Self {
            posts,
            truncated_from,
            max_posts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn detected_count(&self) -> usize {
        self.truncated_from.unwrap_or(self.posts.len())
    }

    /// Status line shown to the user before a run.
    pub fn post_count_info(&self) -> String {
        let mut info = format!("Posts detected: {}", self.detected_count());
        if self.truncated_from.is_some() {
            info.push_str(&format!(
                " (Warning: Using first {} posts due to limit.)",
                self.max_posts
            ));
        }
        info
    }
}

/// Split pasted text into posts.
///
/// Text containing a blank line is split on runs of blank lines, so a post
/// may span several lines. Otherwise every non-empty line is its own post.
pub fn split_posts(raw: &str) -> Vec<Post> {
    let blank_line_separated = raw.contains("\n\n") || raw.contains("\r\n\r\n");

    let posts: Vec<Post> = if blank_line_separated {
        let mut posts = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                push_group(&mut posts, &mut current);
            } else {
                current.push(line);
            }
        }
        push_group(&mut posts, &mut current);
        posts
    } else {
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Post::from)
            .collect()
    };

    debug!(
        "Split {} bytes into {} posts (blank-line mode: {})",
        raw.len(),
        posts.len(),
        blank_line_separated
    );
    posts
}

fn push_group(posts: &mut Vec<Post>, current: &mut Vec<&str>) {
    if current.is_empty() {
        return;
    }
    let joined = current.join("\n");
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        posts.push(Post::from(trimmed));
    }
    current.clear();
}

/// Take the first column of every non-empty CSV row.
pub fn split_csv(raw: &str) -> Result<Vec<Post>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let mut posts = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(first) = record.get(0) {
            let value = first.trim();
            if !value.is_empty() {
                posts.push(Post::from(value));
            }
        }
    }

    debug!("Parsed {} posts from CSV input", posts.len());
    Ok(posts)
}

pub fn normalize_text(raw: &str, max_posts: usize) -> NormalizedInput {
    NormalizedInput::new(split_posts(raw), max_posts)
}

pub fn normalize_csv(raw: &str, max_posts: usize) -> Result<NormalizedInput> {
    Ok(NormalizedInput::new(split_csv(raw)?, max_posts))
}

fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Read a `.txt` or `.csv` file and normalise it.
pub async fn load_file(path: &Path, max_posts: usize) -> Result<NormalizedInput> {
    info!("Reading input file: {}", path.display());

    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        AnalyzerError::Input(format!(
            "Error reading file {}. Please ensure it's a valid .txt or .csv file encoded in UTF-8: {}",
            path.display(),
            e
        ))
    })?;

    if is_csv_path(path) {
        normalize_csv(&raw, max_posts).map_err(|e| {
            AnalyzerError::Input(format!(
                "Error parsing CSV file {}. Please ensure it's a valid CSV: {}",
                path.display(),
                e
            ))
        })
    } else {
        Ok(normalize_text(&raw, max_posts))
    }
}
