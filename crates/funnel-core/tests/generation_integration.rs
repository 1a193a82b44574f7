//! Query tools against a mocked Gemini endpoint, driven through the runtime.

use std::sync::Arc;
use std::time::Duration;

use funnel_core::generation::{ANALYZER_INSTRUCTION, GENERATOR_INSTRUCTION};
use funnel_core::{
    Config, Event, GeminiClient, Launcher, QueryKind, Session, SessionRuntime,
};
use url::Url;

struct NoopLauncher;

impl Launcher for NoopLauncher {
    fn launch(&self, _url: &Url) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

async fn next_finished(
    events: &mut tokio::sync::mpsc::Receiver<Event>,
) -> (QueryKind, String) {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await {
                Some(Event::QueryFinished { kind, result, .. }) => return (kind, result),
                Some(_) => continue,
                None => panic!("runtime closed before the query finished"),
            }
        }
    })
    .await
    .expect("query did not finish in time")
}

fn session() -> Session {
    let config = Config {
        seed: Some(8),
        ..Config::default()
    };
    Session::new(&config).unwrap()
}

#[tokio::test]
async fn analyzer_result_lands_in_its_slot() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "systemInstruction": { "parts": [{ "text": ANALYZER_INSTRUCTION }] },
            "contents": [{ "parts": [{ "text": "você está exagerando" }] }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Tática: Gaslighting"}]}}]}"#)
        .create_async()
        .await;

    let client = GeminiClient::new("key", server.url());
    let (handle, mut events, task) =
        SessionRuntime::spawn(session(), Arc::new(client), Arc::new(NoopLauncher));

    handle
        .submit(QueryKind::Analyzer, "você está exagerando")
        .await
        .unwrap();
    let (kind, result) = next_finished(&mut events).await;
    assert_eq!(kind, QueryKind::Analyzer);
    assert_eq!(result, "Tática: Gaslighting");

    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.analyzer.result_text, "Tática: Gaslighting");
    assert_eq!(snap.generator.result_text, "");

    handle.shutdown().await.unwrap();
    task.await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn service_failure_shows_fixed_error_text() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "systemInstruction": { "parts": [{ "text": GENERATOR_INSTRUCTION }] }
        })))
        .with_status(429)
        .with_body("quota")
        .create_async()
        .await;

    let client = GeminiClient::new("key", server.url());
    let (handle, mut events, task) =
        SessionRuntime::spawn(session(), Arc::new(client), Arc::new(NoopLauncher));

    handle
        .submit(QueryKind::Generator, "você nunca me escuta")
        .await
        .unwrap();
    let (kind, result) = next_finished(&mut events).await;
    assert_eq!(kind, QueryKind::Generator);
    assert_eq!(result, "Erro ao conectar com o laboratório neural.");
    assert!(!handle.snapshot().await.unwrap().generator.busy);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn empty_candidate_uses_tool_specific_fallback() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .with_status(200)
        .with_body(r#"{"candidates":[]}"#)
        .create_async()
        .await;

    let client = GeminiClient::new("key", server.url());
    let (handle, mut events, task) =
        SessionRuntime::spawn(session(), Arc::new(client), Arc::new(NoopLauncher));

    handle.submit(QueryKind::Generator, "provocação").await.unwrap();
    let (_, result) = next_finished(&mut events).await;
    assert_eq!(result, "Não foi possível gerar a defesa.");

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}
