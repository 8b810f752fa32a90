//! Answer streaming against a mock OpenAI-compatible endpoint.
//!
//! These tests drive the real generator adapter through
//! [`AnswerAssembler`] and check what a caller of the answer stream sees:
//! - request shape (system prompt, sampling settings, streaming flag)
//! - deltas followed by exactly one final chunk
//! - provider failures turned into a single readable error chunk

use std::sync::Arc;

use futures_util::StreamExt;
use kenning::answer::stream::ANSWER_ERROR_PREFIX;
use kenning::generation::OpenAiGenerator;
use kenning::{AnswerAssembler, AnswerChunk, GenerationConfig, SearchResult};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> GenerationConfig {
    GenerationConfig {
        base_url: server.uri(),
        api_key: Some("sk-test".into()),
        ..Default::default()
    }
}

async fn answer(server: &MockServer, results: &[SearchResult]) -> Vec<AnswerChunk> {
    let config = config_for(server);
    let generator = Arc::new(OpenAiGenerator::from_config(&config).expect("generator"));
    AnswerAssembler::new(generator, &config)
        .stream_answer("what is new in rust?", results, CancellationToken::new())
        .collect()
        .await
}

fn sources() -> Vec<SearchResult> {
    vec![SearchResult::web(
        "Rust 2024",
        "https://blog.rust-lang.org/2024",
        "The 2024 edition is stable.",
    )]
}

#[tokio::test]
async fn streams_deltas_then_one_final_chunk() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"The 2024 edition \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"shipped [1].\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "stream": true,
            "max_tokens": 1000
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse),
        )
        .expect(1)
        .mount(&server)
        .await;

    let chunks = answer(&server, &sources()).await;

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].text, "The 2024 edition ");
    assert!(!chunks[0].is_final && !chunks[1].is_final);
    let last = &chunks[2];
    assert!(last.is_final);
    assert!(last.text.is_empty());
    assert_eq!(last.cumulative_text, "The 2024 edition shipped [1].");
}

#[tokio::test]
async fn prompt_lists_numbered_web_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("data: [DONE]\n\n"))
        .mount(&server)
        .await;

    let chunks = answer(&server, &sources()).await;
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].is_final && !chunks[0].is_error());

    let requests = server.received_requests().await.expect("recording enabled");
    let body: serde_json::Value = requests[0].body_json().expect("json body");
    let messages = body["messages"].as_array().expect("messages");
    assert_eq!(messages[0]["role"], "system");
    let user = messages[1]["content"].as_str().expect("prompt");
    assert!(user.contains("WEB SEARCH RESULTS"));
    assert!(user.contains("[1] Rust 2024"));
    assert!(user.contains("QUESTION: what is new in rust?"));
    assert!(!user.contains("PERSONAL KNOWLEDGE"));
}

#[tokio::test]
async fn server_error_becomes_single_error_chunk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "The server had an error", "type": "server_error"}
        })))
        .mount(&server)
        .await;

    let chunks = answer(&server, &sources()).await;

    assert_eq!(chunks.len(), 1);
    let only = &chunks[0];
    assert!(only.is_final);
    assert!(only.text.starts_with(ANSWER_ERROR_PREFIX));
    assert!(only.text.contains("The server had an error"));
}

#[tokio::test]
async fn inline_stream_error_ends_answer() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Partial\"}}]}\n\n",
        "data: {\"error\":{\"message\":\"overloaded\"}}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" ignored\"}}]}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse))
        .mount(&server)
        .await;

    let chunks = answer(&server, &sources()).await;

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text, "Partial");
    assert!(chunks[1].is_error());
    assert!(chunks[1].text.contains("overloaded"));
    assert_eq!(chunks.iter().filter(|c| c.is_final).count(), 1);
}

#[tokio::test]
async fn missing_api_key_reports_error_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = GenerationConfig {
        base_url: server.uri(),
        api_key: None,
        ..Default::default()
    };
    let generator = Arc::new(OpenAiGenerator::from_config(&config).expect("generator"));
    let chunks: Vec<AnswerChunk> = AnswerAssembler::new(generator, &config)
        .stream_answer("q", &[], CancellationToken::new())
        .collect()
        .await;

    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].is_error());
}
