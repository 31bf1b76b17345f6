use crate::session::AnalysisSession;
use crate::tally::{percent, SentimentTally};
use crate::types::{AnalysisMode, AnalysisResult, Result, Sentiment, StrategicInsights};
use serde::Serialize;
use std::path::Path;
use tracing::info;

const CHART_TITLE: &str = "Final Sentiment Distribution";
const CHART_COLORS: [&str; 4] = ["#28a745", "#dc3545", "#6c757d", "#ffc107"];
const NO_ANALYZED_POSTS: &str = "No posts were successfully analyzed to generate insights.";

/// Bar chart input: one bar per charted label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<usize>,
    pub colors: Vec<String>,
}

impl ChartData {
    pub fn from_tally(tally: &SentimentTally) -> Self {
        Self {
            title: CHART_TITLE.to_string(),
            labels: Sentiment::CHARTED.iter().map(|s| s.label().to_string()).collect(),
            values: Sentiment::CHARTED.iter().map(|s| tally.count(s)).collect(),
            colors: CHART_COLORS.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn max_value(&self) -> usize {
        self.values.iter().copied().max().unwrap_or(0)
    }
}

/// Headline figures for the interpretation section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Narrative {
    pub analyzed_posts: usize,
    pub positive_percent: f64,
    pub negative_percent: f64,
}

impl Narrative {
    /// `None` when no post was analysed successfully.
    pub fn from_session(session: &AnalysisSession) -> Option<Self> {
        let analyzed_posts = session.analyzed_posts();
        if analyzed_posts == 0 {
            return None;
        }
        let tally = session.tally();
        Some(Self {
            analyzed_posts,
            positive_percent: percent(tally.positive, analyzed_posts),
            negative_percent: percent(tally.negative, analyzed_posts),
        })
    }

    pub fn summary(&self) -> String {
        format!(
            "The analysis of {} posts shows that the conversation is {:.1}% positive and {:.1}% negative. This indicates the general tone of the discussion.",
            self.analyzed_posts, self.positive_percent, self.negative_percent
        )
    }
}

/// Fallback insights used when the model did not write any.
pub fn default_insights() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Leverage Positive Themes",
            "Identify common topics within the 'Positive' posts. These represent what your audience enjoys and can be amplified in future content and advertising to build on existing goodwill.",
        ),
        (
            "Address Negative Feedback",
            "The 'Negative' posts are a valuable source of direct feedback. Analyze the justifications to pinpoint specific issues or complaints. Addressing these concerns publicly and transparently can turn a negative into a brand-building opportunity.",
        ),
        (
            "Monitor and Adapt",
            "This analysis serves as a snapshot in time. It is worth repeating periodically to monitor shifts in public opinion and adapt campaign strategies accordingly.",
        ),
    ]
}

fn insight_lines(insights: Option<&StrategicInsights>) -> Vec<String> {
    match insights {
        Some(model) if !model.insights_list.is_empty() => model.insights_list.clone(),
        _ => default_insights()
            .into_iter()
            .map(|(title, body)| format!("{}: {}", title, body))
            .collect(),
    }
}

/// One result as a terminal card.
pub fn render_card(result: &AnalysisResult) -> String {
    format!(
        "\"{}\"\n  Sentiment: [{}]\n  Justification: {}\n",
        result.text, result.sentiment, result.justification
    )
}

pub fn render_cards(results: &[AnalysisResult]) -> String {
    results.iter().map(render_card).collect::<Vec<_>>().join("\n")
}

/// Horizontal text bar chart scaled to `width` columns.
pub fn render_bar_chart(chart: &ChartData, width: usize) -> String {
    let max = chart.max_value();
    let label_width = chart.labels.iter().map(|l| l.len()).max().unwrap_or(0);

    let mut output = format!("{}\n", chart.title);
    for (label, value) in chart.labels.iter().zip(&chart.values) {
        let bar_len = if max == 0 { 0 } else { value * width / max };
        output.push_str(&format!(
            "  {:<label_width$} | {} {}\n",
            label,
            "#".repeat(bar_len),
            value,
            label_width = label_width
        ));
    }
    output
}

pub fn render_interpretation(session: &AnalysisSession) -> String {
    let narrative = match Narrative::from_session(session) {
        Some(narrative) => narrative,
        None => return format!("{}\n", NO_ANALYZED_POSTS),
    };

    let mut output = String::from("What these results mean\n");
    match &session.insights {
        Some(model) if !model.summary.is_empty() => {
            output.push_str(&format!("{}\n{}\n", narrative.summary(), model.summary));
        }
        _ => output.push_str(&format!("{}\n", narrative.summary())),
    }

    output.push_str("\nStrategic Insights\n");
    for line in insight_lines(session.insights.as_ref()) {
        output.push_str(&format!("  - {}\n", line));
    }
    output
}

pub fn render_technical_report(session: &AnalysisSession) -> String {
    let (method, first_step) = match session.mode {
        AnalysisMode::Batched => (
            "The list was broken into smaller batches to ensure reliability and prevent timeouts, and each batch was analyzed independently.",
            format!(
                "The {} social media posts were sent in {} sequential batches.",
                session.submitted_posts, session.batch_count
            ),
        ),
        AnalysisMode::PerPost => (
            "Each post was sent on its own, and a post whose request failed was retried before being marked as failed.",
            format!(
                "The {} social media posts were sent one at a time in {} sequential requests, retries included.",
                session.submitted_posts, session.requests_sent
            ),
        ),
    };

    let mut output = String::from("Computational Techniques Used\n");
    output.push_str(&format!(
        "The posts were sent through the analysis proxy to a large language model. {}\n",
        method
    ));
    output.push_str("\nProcess of Data Analysis\n");
    output.push_str(&format!("  1. {}\n", first_step));
    output.push_str(
        "  2. The model classified each post's emotional tone and justified its classification.\n",
    );
    output.push_str(
        "  3. The individual results were combined into the final visualization and report.\n",
    );
    if !session.failed_batches.is_empty() {
        output.push_str(&format!(
            "  Note: {} of {} batches failed and {} posts were not analyzed.\n",
            session.failed_batches.len(),
            session.batch_count,
            session.lost_posts()
        ));
    }
    let failed_posts = session.tally().failed;
    if failed_posts > 0 {
        output.push_str(&format!("  Note: {} posts could not be analyzed.\n", failed_posts));
    }
    output
}

/// The full plain-text report printed at the end of a run.
pub fn render_summary(session: &AnalysisSession) -> String {
    let chart = ChartData::from_tally(&session.tally());
    let mut output = String::new();
    output.push_str(&render_bar_chart(&chart, 40));
    output.push('\n');
    output.push_str(&render_interpretation(session));
    output.push('\n');
    output.push_str(&render_technical_report(session));
    for failure in &session.failed_batches {
        output.push_str(&format!("  ! {}\n", failure.error));
    }
    output
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Standalone HTML page with cards, a CSS bar chart and the narrative.
pub fn render_html(session: &AnalysisSession) -> String {
    let chart = ChartData::from_tally(&session.tally());
    let max = chart.max_value().max(1);

    let mut html = String::new();
    html.push_str(r#"<!doctype html>
<html>
<head>
<meta charset="utf-8" />
<title>Sentiment Analysis Report</title>
<style>
body { font-family: system-ui, -apple-system, Segoe UI, Roboto, sans-serif; margin: 20px; }
.analysis-card { border-left: 4px solid #999; padding: 8px 12px; margin-bottom: 12px; background: #fafafa; }
.card-positive { border-color: #28a745; } .card-negative { border-color: #dc3545; }
.card-neutral { border-color: #6c757d; } .card-mixed { border-color: #ffc107; }
.card-failed { border-color: #000; }
.badge { padding: 2px 6px; border-radius: 4px; color: #fff; background: #999; }
.badge-positive { background: #28a745; } .badge-negative { background: #dc3545; }
.badge-neutral { background: #6c757d; } .badge-mixed { background: #ffc107; color: #000; }
.badge-failed { background: #000; }
.bar-row { display: flex; align-items: center; margin: 4px 0; }
.bar-label { width: 90px; } .bar { height: 18px; margin-right: 6px; }
.error { color: red; font-weight: bold; }
</style>
</head>
<body>
<h1>Sentiment Analysis</h1>
"#);

    html.push_str("<h2>Summary</h2>\n");
    for result in &session.results {
        let class = result.sentiment.css_class();
        html.push_str(&format!(
            r#"<div class="analysis-card card-{class}"><blockquote class="post-text">"{text}"</blockquote><p class="post-sentiment"><strong>Sentiment:</strong> <span class="badge badge-{class}">{sentiment}</span></p><p class="post-details"><strong>Justification:</strong> {justification}</p></div>
"#,
            class = class,
            text = html_escape(&result.text),
            sentiment = html_escape(result.sentiment.label()),
            justification = html_escape(&result.justification),
        ));
    }
    for failure in &session.failed_batches {
        html.push_str(&format!("<p class=\"error\">{}</p>\n", html_escape(&failure.error)));
    }

    html.push_str(&format!("<h2>{}</h2>\n", html_escape(&chart.title)));
    for ((label, value), color) in chart.labels.iter().zip(&chart.values).zip(&chart.colors) {
        html.push_str(&format!(
            r#"<div class="bar-row"><span class="bar-label">{label}</span><span class="bar" style="width: {width}px; background: {color};"></span>{value}</div>
"#,
            label = label,
            width = value * 400 / max,
            color = color,
            value = value,
        ));
    }

    html.push_str("<h2>Interpretation</h2>\n");
    match Narrative::from_session(session) {
        None => html.push_str(&format!("<p>{}</p>\n", NO_ANALYZED_POSTS)),
        Some(narrative) => {
            html.push_str("<p><strong>What these results mean</strong></p>\n");
            html.push_str(&format!("<p>{}</p>\n", html_escape(&narrative.summary())));
            if let Some(model) = &session.insights {
                html.push_str(&format!("<p>{}</p>\n", html_escape(&model.summary)));
            }
            html.push_str("<p><strong>Strategic Insights</strong></p>\n<ul>\n");
            for line in insight_lines(session.insights.as_ref()) {
                html.push_str(&format!("<li>{}</li>\n", html_escape(&line)));
            }
            html.push_str("</ul>\n");
        }
    }

    html.push_str("<h2>Technical Report</h2>\n<pre>");
    html.push_str(&html_escape(&render_technical_report(session)));
    html.push_str("</pre>\n</body>\n</html>\n");
    html
}

/// Write `report.html` and `results.json` into `out_dir`.
pub async fn write_outputs(session: &AnalysisSession, out_dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(out_dir).await?;

    let html_path = out_dir.join("report.html");
    info!("Writing HTML report: {}", html_path.display());
    tokio::fs::write(&html_path, render_html(session)).await?;

    let json_path = out_dir.join("results.json");
    info!("Writing results: {}", json_path.display());
    let json = serde_json::to_string_pretty(session)?;
    tokio::fs::write(&json_path, json).await?;

    Ok(())
}
