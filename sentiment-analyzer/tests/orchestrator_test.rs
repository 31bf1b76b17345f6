use sentiment_analyzer::{
    plan_batches, AnalysisEvent, AnalysisMode, AnalyzerError, MockBackend, MockReply,
    OrchestratorBuilder, Post, ProxyRequest, Sentiment,
};
use std::sync::{Arc, Once};
use tokio::sync::mpsc;
use tracing::info;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

fn numbered_posts(count: usize) -> Vec<Post> {
    (1..=count).map(|i| Post::new(format!("post number {}", i))).collect()
}

fn batch_sizes(calls: &[ProxyRequest]) -> Vec<usize> {
    calls
        .iter()
        .map(|call| match call {
            ProxyRequest::Batch(batch) => batch.posts.len(),
            other => panic!("expected a batch request, got {:?}", other),
        })
        .collect()
}

#[test]
fn test_plan_batches_ranges() {
    let posts = numbered_posts(60);
    let batches = plan_batches(&posts, 25);

    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].range, 0..25);
    assert_eq!(batches[1].range, 25..50);
    assert_eq!(batches[2].range, 50..60);
    assert_eq!(batches[2].posts[0].as_str(), "post number 51");
}

#[tokio::test]
async fn test_batches_are_sent_in_order() -> sentiment_analyzer::Result<()> {
    init_tracing();

    let backend = Arc::new(MockBackend::new("ordering").with_delay(5));
    let orchestrator = OrchestratorBuilder::new(backend.clone()).batch_size(25).build()?;

    let posts = numbered_posts(60);
    let session = orchestrator.run(&posts).await?;

    let calls = backend.calls().await;
    assert_eq!(batch_sizes(&calls), vec![25, 25, 10]);
    assert_eq!(session.batch_count, 3);
    assert_eq!(session.results.len(), 60);
    for (result, post) in session.results.iter().zip(&posts) {
        assert_eq!(result.text, post.as_str());
    }
    assert!(session.is_complete());
    Ok(())
}

#[tokio::test]
async fn test_three_post_tally() -> sentiment_analyzer::Result<()> {
    init_tracing();

    let reply = r#"Here you go:
```json
{"post_analysis": [
  {"text": "I love this phone", "sentiment": "Positive", "justification": "Praise."},
  {"text": "Battery is awful", "sentiment": "Negative", "justification": "Complaint."},
  {"text": "Arrived on Tuesday", "sentiment": "Neutral", "justification": "Factual."}
]}
```"#;
    let backend = Arc::new(MockBackend::new("tally").with_replies([MockReply::Text(reply.to_string())]));
    let orchestrator = OrchestratorBuilder::new(backend.clone()).build()?;

    let posts = vec![
        Post::from("I love this phone"),
        Post::from("Battery is awful"),
        Post::from("Arrived on Tuesday"),
    ];
    let session = orchestrator.run(&posts).await?;

    let tally = session.tally();
    assert_eq!((tally.positive, tally.negative, tally.neutral, tally.mixed), (1, 1, 1, 0));
    assert_eq!(tally.total(), session.results.len());
    assert_eq!(backend.calls().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_empty_input_makes_no_calls() {
    init_tracing();

    let backend = Arc::new(MockBackend::new("empty"));
    let orchestrator = OrchestratorBuilder::new(backend.clone()).build().unwrap();

    let err = orchestrator.run(&[]).await.unwrap_err();
    assert!(matches!(err, AnalyzerError::EmptyInput));
    assert_eq!(err.to_string(), "Please paste or upload some text to analyze.");
    assert!(backend.calls().await.is_empty());
}

#[tokio::test]
async fn test_zero_batch_size_is_rejected() {
    let backend = Arc::new(MockBackend::new("config"));
    let err = OrchestratorBuilder::new(backend).batch_size(0).build().err().unwrap();
    assert!(matches!(err, AnalyzerError::Config(_)));
}

#[tokio::test]
async fn test_failed_batch_is_skipped() -> sentiment_analyzer::Result<()> {
    init_tracing();

    let backend = Arc::new(MockBackend::new("flaky").with_replies([
        MockReply::Text(r#"{"post_analysis": [{"sentiment": "Positive"}, {"sentiment": "Positive"}]}"#.to_string()),
        MockReply::Transport {
            status: 500,
            message: "An error occurred inside the function.".to_string(),
        },
    ]));
    let orchestrator = OrchestratorBuilder::new(backend.clone()).batch_size(2).build()?;

    let posts = numbered_posts(5);
    let session = orchestrator.run(&posts).await?;

    // Third batch falls back to the mock's keyword answers.
    assert_eq!(backend.calls().await.len(), 3);
    assert_eq!(session.failed_batches.len(), 1);
    let failure = &session.failed_batches[0];
    assert_eq!(failure.batch_index, 1);
    assert_eq!(failure.post_range, 2..4);
    assert!(failure.error.starts_with("Analysis failed on batch 2:"));
    assert!(failure.error.contains("An error occurred inside the function."));

    assert_eq!(session.results.len(), posts.len() - session.lost_posts());
    assert_eq!(session.results[2].text, "post number 5");
    assert!(!session.is_complete());
    Ok(())
}

#[tokio::test]
async fn test_unparseable_batch_is_skipped() -> sentiment_analyzer::Result<()> {
    init_tracing();

    let backend = Arc::new(MockBackend::new("prose").with_replies([
        MockReply::Text("I'm sorry, I can't produce JSON today.".to_string()),
        MockReply::Text(r#"{"sentiments": ["Positive"]}"#.to_string()),
    ]));
    let orchestrator = OrchestratorBuilder::new(backend).batch_size(1).build()?;

    let session = orchestrator.run(&numbered_posts(2)).await?;

    assert_eq!(session.failed_batches.len(), 1);
    assert!(session.failed_batches[0].error.contains("Parse error"));
    assert_eq!(session.results.len(), 1);
    assert_eq!(session.results[0].text, "post number 2");
    Ok(())
}

#[tokio::test]
async fn test_max_posts_caps_the_run() -> sentiment_analyzer::Result<()> {
    let backend = Arc::new(MockBackend::new("cap"));
    let orchestrator = OrchestratorBuilder::new(backend.clone()).max_posts(3).batch_size(2).build()?;

    let session = orchestrator.run(&numbered_posts(10)).await?;

    assert_eq!(session.submitted_posts, 3);
    assert_eq!(batch_sizes(&backend.calls().await), vec![2, 1]);
    Ok(())
}

#[tokio::test]
async fn test_per_post_retry_then_success() -> sentiment_analyzer::Result<()> {
    init_tracing();

    let backend = Arc::new(MockBackend::new("retry").with_replies([
        MockReply::Transport {
            status: 502,
            message: "Bad Gateway".to_string(),
        },
        MockReply::Text(r#"{"sentiment": "Mixed", "justification": "Both."}"#.to_string()),
    ]));
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let orchestrator = OrchestratorBuilder::new(backend.clone())
        .mode(AnalysisMode::PerPost)
        .events(sender)
        .build()?;

    let session = orchestrator.run(&[Post::from("Good food, bad service")]).await?;
    drop(orchestrator);

    assert_eq!(backend.calls().await.len(), 2);
    assert_eq!(session.results[0].sentiment, Sentiment::Mixed);

    let mut retried = 0;
    while let Some(event) = receiver.recv().await {
        if let AnalysisEvent::PostRetried { post_index, attempt, .. } = event {
            assert_eq!((post_index, attempt), (0, 1));
            retried += 1;
        }
    }
    assert_eq!(retried, 1);
    Ok(())
}

#[tokio::test]
async fn test_per_post_failure_becomes_failed_result() -> sentiment_analyzer::Result<()> {
    init_tracing();

    let backend = Arc::new(MockBackend::new("down").with_replies([
        MockReply::Transport {
            status: 500,
            message: "first".to_string(),
        },
        MockReply::Transport {
            status: 500,
            message: "second".to_string(),
        },
    ]));
    let orchestrator = OrchestratorBuilder::new(backend.clone())
        .mode(AnalysisMode::PerPost)
        .build()?;

    let posts = vec![Post::from("Unlucky post"), Post::from("I love sunny days")];
    let session = orchestrator.run(&posts).await?;

    assert_eq!(backend.calls().await.len(), 3);
    assert_eq!(session.results.len(), 2);
    assert!(session.results[0].sentiment.is_failed());
    assert!(session.results[0].justification.starts_with("Analysis failed after 2 attempts"));
    assert!(session.results[0].justification.contains("second"));
    assert_eq!(session.results[1].sentiment, Sentiment::Positive);

    // Failed posts are not part of the analysed denominator.
    assert_eq!(session.analyzed_posts(), 1);
    assert_eq!(session.tally().failed, 1);
    assert!(session.is_complete());
    Ok(())
}

#[tokio::test]
async fn test_event_order() -> sentiment_analyzer::Result<()> {
    init_tracing();

    let backend = Arc::new(MockBackend::new("events").with_replies([
        MockReply::Text(r#"{"sentiments": ["Neutral", "Neutral"]}"#.to_string()),
        MockReply::Text("not json".to_string()),
    ]));
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let orchestrator = OrchestratorBuilder::new(backend)
        .batch_size(2)
        .model_insights(true)
        .events(sender)
        .build()?;

    orchestrator.run(&numbered_posts(4)).await?;
    drop(orchestrator);

    let mut names = Vec::new();
    while let Some(event) = receiver.recv().await {
        let name = match event {
            AnalysisEvent::RunStarted { batch_count, .. } => {
                assert_eq!(batch_count, 2);
                "run_started"
            }
            AnalysisEvent::BatchStarted { .. } => "batch_started",
            AnalysisEvent::BatchCompleted { results, .. } => {
                assert_eq!(results.len(), 2);
                "batch_completed"
            }
            AnalysisEvent::BatchFailed(_) => "batch_failed",
            AnalysisEvent::PostRetried { .. } => "post_retried",
            AnalysisEvent::PostFailed { .. } => "post_failed",
            AnalysisEvent::Finalizing => "finalizing",
            AnalysisEvent::RunFinished { analyzed_posts, failed_batches, .. } => {
                assert_eq!((analyzed_posts, failed_batches), (2, 1));
                "run_finished"
            }
        };
        names.push(name);
    }

    info!("Events: {:?}", names);
    assert_eq!(
        names,
        vec![
            "run_started",
            "batch_started",
            "batch_completed",
            "batch_started",
            "batch_failed",
            "finalizing",
            "run_finished",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_model_insights_are_requested_last() -> sentiment_analyzer::Result<()> {
    init_tracing();

    let backend = Arc::new(MockBackend::new("insights"));
    let orchestrator = OrchestratorBuilder::new(backend.clone())
        .batch_size(2)
        .model_insights(true)
        .build()?;

    let session = orchestrator
        .run(&[Post::from("Great launch"), Post::from("Terrible queue"), Post::from("Ok")])
        .await?;

    let calls = backend.calls().await;
    assert_eq!(calls.len(), 3);
    match calls.last() {
        Some(ProxyRequest::Task(interfaces::TaskRequest::GenerateReport { report_data })) => {
            assert_eq!(report_data.total_posts, 3);
            assert_eq!(report_data.analyzed_posts, 3);
            assert_eq!(report_data.tally.get("Positive"), Some(&1));
        }
        other => panic!("expected a report request last, got {:?}", other),
    }

    let insights = session.insights.expect("model insights");
    assert!(insights.summary.starts_with("What these results mean"));
    assert_eq!(insights.insights_list.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_broken_model_insights_keep_defaults() -> sentiment_analyzer::Result<()> {
    let backend = Arc::new(MockBackend::new("no-insights").with_replies([
        MockReply::Text(r#"{"sentiments": ["Positive"]}"#.to_string()),
        MockReply::Text("no report today".to_string()),
    ]));
    let orchestrator = OrchestratorBuilder::new(backend).model_insights(true).build()?;

    let session = orchestrator.run(&[Post::from("Nice")]).await?;

    assert!(session.insights.is_none());
    assert!(session.failed_batches.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_pasted_text_end_to_end() -> sentiment_analyzer::Result<()> {
    init_tracing();

    let normalized =
        sentiment_analyzer::input::normalize_text("Great product!\n\nTerrible support.\n\nIt's okay.", 500);
    assert_eq!(normalized.posts.len(), 3);

    let backend = Arc::new(MockBackend::new("scenario"));
    let orchestrator = OrchestratorBuilder::new(backend.clone()).build()?;
    let session = orchestrator.run(&normalized.posts).await?;

    assert_eq!(backend.calls().await.len(), 1);
    let tally = session.tally();
    assert_eq!((tally.positive, tally.negative, tally.neutral, tally.mixed), (1, 1, 1, 0));
    Ok(())
}

#[tokio::test]
async fn test_batch_insights_only_describe_single_batch_runs() -> sentiment_analyzer::Result<()> {
    init_tracing();

    let cheerful = r#"{"post_analysis": [{"sentiment": "Positive"}, {"sentiment": "Positive"}],
        "strategic_insights": {"summary": "What these results mean... everyone is delighted.", "insights_list": ["Celebrate."]}}"#;
    let gloomy = r#"{"post_analysis": [{"sentiment": "Negative"}, {"sentiment": "Negative"}]}"#;

    let backend = Arc::new(MockBackend::new("partial-insights").with_replies([
        MockReply::Text(cheerful.to_string()),
        MockReply::Text(gloomy.to_string()),
        MockReply::Text(gloomy.to_string()),
    ]));
    let orchestrator = OrchestratorBuilder::new(backend).batch_size(2).build()?;
    let session = orchestrator.run(&numbered_posts(6)).await?;

    assert!(session.insights.is_none());
    let text = sentiment_analyzer::report::render_interpretation(&session);
    assert!(text.contains("33.3% positive and 66.7% negative"));
    assert!(!text.contains("everyone is delighted"));
    assert!(!text.contains("Celebrate."));
    assert!(text.contains("Leverage Positive Themes"));

    let backend = Arc::new(MockBackend::new("whole-run-insights").with_replies([MockReply::Text(cheerful.to_string())]));
    let orchestrator = OrchestratorBuilder::new(backend).batch_size(2).build()?;
    let session = orchestrator.run(&numbered_posts(2)).await?;

    let insights = session.insights.expect("single batch keeps its insights");
    assert_eq!(insights.insights_list, vec!["Celebrate.".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_per_post_report_counts_requests() -> sentiment_analyzer::Result<()> {
    init_tracing();

    let backend = Arc::new(MockBackend::new("per-post-report").with_replies([
        MockReply::Transport {
            status: 503,
            message: "busy".to_string(),
        },
    ]));
    let orchestrator = OrchestratorBuilder::new(backend.clone())
        .mode(AnalysisMode::PerPost)
        .batch_size(2)
        .build()?;

    let session = orchestrator.run(&numbered_posts(3)).await?;

    assert_eq!(backend.calls().await.len(), 4);
    assert_eq!(session.requests_sent, 4);
    assert!(session.failed_batches.is_empty());

    let report = sentiment_analyzer::report::render_technical_report(&session);
    assert!(report.contains("The 3 social media posts were sent one at a time in 4 sequential requests"));
    assert!(!report.contains("sequential batches"));
    assert!(!report.contains("could not be analyzed"));
    Ok(())
}

#[tokio::test]
async fn test_batched_report_counts_batches() -> sentiment_analyzer::Result<()> {
    let backend = Arc::new(MockBackend::new("batched-report"));
    let orchestrator = OrchestratorBuilder::new(backend).batch_size(2).build()?;

    let session = orchestrator.run(&numbered_posts(5)).await?;

    assert_eq!(session.requests_sent, 3);
    let report = sentiment_analyzer::report::render_technical_report(&session);
    assert!(report.contains("The 5 social media posts were sent in 3 sequential batches."));
    Ok(())
}
