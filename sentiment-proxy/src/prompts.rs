use interfaces::wire::{BatchRequest, ProxyRequest, ReportData, TaskRequest};
use interfaces::{Post, Sentiment};

const POST_SEPARATOR: &str = "\n-----\n";

fn join_posts(posts: &[Post]) -> String {
    posts
        .iter()
        .map(Post::as_str)
        .collect::<Vec<_>>()
        .join(POST_SEPARATOR)
}

/// Full report for a batch: per-post analysis plus strategic insights.
pub fn batch_prompt(posts: &[Post]) -> String {
    format!(
        r#"You are a helpful, expert social media research assistant for a university professor.
Your task is to analyze a series of social media posts and provide a complete report in a single, clean JSON object.

The final JSON object MUST have two top-level keys: "post_analysis" and "strategic_insights".

1. The "post_analysis" key must contain an array with exactly one object per post, in the order the posts are given. Each object has the following three keys:
   - "text": The original, unmodified post text.
   - "sentiment": Your classification, which must be one of "Positive", "Negative", "Neutral", or "Mixed".
   - "justification": A brief, one-sentence explanation for your sentiment classification.

2. The "strategic_insights" key must contain an object with two keys:
   - "summary": A paragraph starting with "What these results mean...". This should be a concise summary of the overall sentiment distribution.
   - "insights_list": An array of exactly three strings. Each string should be a distinct, actionable strategic insight for a public relations or advertising professional, based on the analysis.

The {count} posts to analyze are separated by lines of dashes:
{posts}
"#,
        count = posts.len(),
        posts = join_posts(posts)
    )
}

/// Free-form analysis of a given kind, still requested as one JSON object.
pub fn typed_batch_prompt(posts: &[Post], analysis_type: &str) -> String {
    format!(
        "You are a social media text analysis expert. Analyze the following {count} posts for {kind}. Provide the results as a single JSON object.\n\nPosts:\n{posts}\n",
        count = posts.len(),
        kind = analysis_type,
        posts = posts.iter().map(Post::as_str).collect::<Vec<_>>().join("\n")
    )
}

pub fn post_prompt(post: &Post) -> String {
    format!(
        r#"You are an expert social media analyst. Classify the sentiment of the single post below.

Respond with one JSON object with exactly two keys:
- "sentiment": one of "Positive", "Negative", "Neutral", or "Mixed". If the post cannot be analyzed (for example it is empty, unreadable, or not natural language), use "Failed".
- "justification": a brief, one-sentence explanation. When the sentiment is "Failed", explain why the post could not be analyzed.

Post:
{post}
"#,
        post = post.as_str()
    )
}

pub fn explain_prompt(post: &Post, sentiment: &Sentiment) -> String {
    format!(
        r#"You are an expert social media analyst. The post below was classified as "{sentiment}".

Respond with one JSON object with a single key "justification": a brief, one-sentence explanation of why that classification fits the post.

Post:
{post}
"#,
        sentiment = sentiment.label(),
        post = post.as_str()
    )
}

pub fn report_prompt(report: &ReportData) -> String {
    let distribution = report
        .tally
        .iter()
        .map(|(label, count)| format!("- {}: {}", label, count))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a helpful, expert social media research assistant for a university professor.
A sentiment analysis of {total} social media posts has been completed; {analyzed} of them were analyzed successfully.

Sentiment distribution:
{distribution}

Respond with one JSON object with two keys:
- "summary": A paragraph starting with "What these results mean...", concisely summarizing the sentiment distribution.
- "insights_list": An array of exactly three strings, each a distinct, actionable strategic insight for a public relations or advertising professional.
"#,
        total = report.total_posts,
        analyzed = report.analyzed_posts,
        distribution = distribution
    )
}

/// The prompt sent to the model for a proxy request.
pub fn build_prompt(request: &ProxyRequest) -> String {
    match request {
        ProxyRequest::Batch(BatchRequest {
            posts,
            analysis_type: None,
        }) => batch_prompt(posts),
        ProxyRequest::Batch(BatchRequest {
            posts,
            analysis_type: Some(kind),
        }) => typed_batch_prompt(posts, kind),
        ProxyRequest::Task(TaskRequest::AnalyzePost { post }) => post_prompt(post),
        ProxyRequest::Task(TaskRequest::ExplainSentiment { post, sentiment }) => {
            explain_prompt(post, sentiment)
        }
        ProxyRequest::Task(TaskRequest::GenerateReport { report_data }) => {
            report_prompt(report_data)
        }
    }
}
