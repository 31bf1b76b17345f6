use sentiment_analyzer::{
    extract_json, parse_batch_response, parse_insights, parse_post_response, ExtractError, Post,
    Sentiment,
};

fn posts(texts: &[&str]) -> Vec<Post> {
    texts.iter().map(|t| Post::from(*t)).collect()
}

#[test]
fn test_fenced_block_is_preferred() {
    let text = "Here is the report:\n```json\n{\"a\": 1}\n```\nLet me know if {you} need more.";
    let value = extract_json(text).unwrap();
    assert_eq!(value["a"], 1);
}

#[test]
fn test_fence_without_info_string() {
    let text = "```\n{\"b\": [1, 2]}\n```";
    assert_eq!(extract_json(text).unwrap()["b"][1], 2);
}

#[test]
fn test_prose_wrapped_object() {
    let text = "Sure! {\"ok\": true} Hope this helps.";
    assert_eq!(extract_json(text).unwrap()["ok"], true);
}

#[test]
fn test_no_object_at_all() {
    assert_eq!(extract_json("I cannot help with that."), Err(ExtractError::NoJsonObject));
    assert_eq!(extract_json("} backwards {"), Err(ExtractError::NoJsonObject));
}

#[test]
fn test_broken_json_is_invalid() {
    let err = extract_json("```json\n{\"a\": }\n```").unwrap_err();
    assert!(matches!(err, ExtractError::InvalidJson(_)));
}

#[test]
fn test_post_analysis_in_input_order() {
    let batch = posts(&["I love it", "I hate it", "It exists"]);
    let text = r#"```json
{
  "post_analysis": [
    {"text": "I love it", "sentiment": "positive", "justification": "Approving."},
    {"text": "I hate it", "sentiment": "Negative", "justification": "Critical."},
    {"text": "It exists", "sentiment": "Neutral", "justification": "Factual."}
  ],
  "strategic_insights": {
    "summary": "What these results mean... mostly balanced.",
    "insights_list": ["one", "two", "three"]
  }
}
```"#;

    let parsed = parse_batch_response(text, &batch).unwrap();
    let labels: Vec<_> = parsed.results.iter().map(|r| r.sentiment.clone()).collect();
    assert_eq!(labels, vec![Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral]);
    assert_eq!(parsed.results[1].justification, "Critical.");

    let insights = parsed.insights.unwrap();
    assert_eq!(insights.insights_list.len(), 3);
}

#[test]
fn test_result_text_comes_from_input_not_echo() {
    let batch = posts(&["Original text"]);
    let text = r#"{"post_analysis": [{"text": "Paraphrased", "sentiment": "Mixed"}]}"#;

    let parsed = parse_batch_response(text, &batch).unwrap();
    assert_eq!(parsed.results[0].text, "Original text");
    assert_eq!(parsed.results[0].justification, "N/A");
}

#[test]
fn test_sentiments_shape() {
    let batch = posts(&["a", "b"]);
    let text = r#"{"sentiments": ["Positive", null], "justifications": ["Nice."]}"#;

    let parsed = parse_batch_response(text, &batch).unwrap();
    assert_eq!(parsed.results[0].sentiment, Sentiment::Positive);
    assert_eq!(parsed.results[0].justification, "Nice.");
    assert_eq!(parsed.results[1].sentiment, Sentiment::missing());
    assert_eq!(parsed.results[1].justification, "N/A");
}

#[test]
fn test_length_mismatch_is_rejected() {
    let batch = posts(&["a", "b", "c"]);

    let err = parse_batch_response(r#"{"sentiments": ["Positive", "Negative"]}"#, &batch).unwrap_err();
    assert_eq!(err, ExtractError::LengthMismatch { expected: 3, actual: 2 });

    let err = parse_batch_response(
        r#"{"post_analysis": [{"sentiment": "Positive"}, {"sentiment": "Positive"}, {"sentiment": "Positive"}, {"sentiment": "Positive"}]}"#,
        &batch,
    )
    .unwrap_err();
    assert_eq!(err, ExtractError::LengthMismatch { expected: 3, actual: 4 });
}

#[test]
fn test_missing_analysis_array() {
    let err = parse_batch_response(r#"{"summary": "hi"}"#, &posts(&["a"])).unwrap_err();
    assert_eq!(err, ExtractError::MissingField("post_analysis"));
}

#[test]
fn test_single_post_shapes() {
    let post = Post::from("Best coffee in town");

    let bare = parse_post_response(r#"{"sentiment": "POSITIVE", "justification": "Praise."}"#, &post).unwrap();
    assert_eq!(bare.sentiment, Sentiment::Positive);
    assert_eq!(bare.text, "Best coffee in town");

    let wrapped = parse_post_response(
        r#"```json
{"post_analysis": [{"sentiment": "Failed", "justification": "Not language."}]}
```"#,
        &post,
    )
    .unwrap();
    assert!(wrapped.sentiment.is_failed());

    let err = parse_post_response(r#"{"justification": "No label."}"#, &post).unwrap_err();
    assert_eq!(err, ExtractError::MissingField("sentiment"));
}

#[test]
fn test_insights_bare_or_nested() {
    let bare = parse_insights(r#"{"summary": "What these results mean...", "insights_list": ["x"]}"#).unwrap();
    assert_eq!(bare.insights_list, vec!["x".to_string()]);

    let nested = parse_insights(r#"{"strategic_insights": {"summary": "s"}}"#).unwrap();
    assert_eq!(nested.summary, "s");
    assert!(nested.insights_list.is_empty());

    assert_eq!(
        parse_insights(r#"{"insights_list": []}"#).unwrap_err(),
        ExtractError::MissingField("summary")
    );
}

#[test]
fn test_fenced_sentiments_must_match_batch() {
    let text = "```json\n{\"sentiments\": [\"Positive\", \"Negative\"]}\n```";

    let parsed = parse_batch_response(text, &posts(&["good", "bad"])).unwrap();
    assert_eq!(parsed.results[1].sentiment, Sentiment::Negative);

    let one = "```json\n{\"sentiments\": [\"Positive\"]}\n```";
    assert!(matches!(
        parse_batch_response(one, &posts(&["good", "bad"])),
        Err(ExtractError::LengthMismatch { expected: 2, actual: 1 })
    ));
}
