//! Send pipeline tests against a mock Gmail API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod support;

use chrono::Utc;
use sendgmail_core::{Error, MemoryStore, Relay, RetryBudget};
use sendgmail_mime::RawMessage;
use serde_json::json;
use std::sync::Arc;
use support::{ScriptedTerminal, config, granted_token, refresh_mock, store};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Fixture {
    server: MockServer,
    vault: Arc<MemoryStore>,
}

impl Fixture {
    /// Mock server plus a vault holding a fresh token with access token `cached`.
    async fn start() -> Self {
        let server = MockServer::start().await;
        let vault = Arc::new(MemoryStore::new());
        store(&vault, &config(&server), &granted_token("cached", 3600), Utc::now());
        Self { server, vault }
    }

    fn relay(&self, terminal: Arc<ScriptedTerminal>) -> Relay {
        Relay::from_config(&config(&self.server), self.vault.clone(), terminal)
    }
}

fn send_with(access_token: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("authorization", format!("Bearer {access_token}").as_str()))
}

fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({
        "error": {
            "code": 401,
            "message": "Request had invalid authentication credentials.",
            "errors": [{ "reason": "authError" }]
        }
    }))
}

#[tokio::test]
async fn message_is_posted_as_raw_json_with_bearer_token() {
    let fixture = Fixture::start().await;
    send_with("cached")
        .and(header("content-type", "application/json"))
        .and(body_string(r#"{"raw":"SGk="}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "msg-1" })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let mut relay = fixture.relay(Arc::new(ScriptedTerminal::detached()));
    relay.send(&RawMessage::from_bytes(b"Hi")).await.unwrap();
}

#[tokio::test]
async fn single_unauthorized_triggers_one_refresh_and_one_resend() {
    let fixture = Fixture::start().await;
    send_with("cached")
        .respond_with(unauthorized())
        .expect(1)
        .mount(&fixture.server)
        .await;
    send_with("refreshed")
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&fixture.server)
        .await;
    refresh_mock("refreshed").expect(1).mount(&fixture.server).await;

    let terminal = Arc::new(ScriptedTerminal::interactive());
    let mut relay = fixture.relay(terminal.clone());
    relay.send(&RawMessage::from_bytes(b"Hi")).await.unwrap();

    assert!(terminal.prompts().is_empty());
    assert_eq!(fixture.vault.write_count(), 1);
}

#[tokio::test]
async fn second_unauthorized_is_final() {
    let fixture = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(unauthorized())
        .expect(2)
        .mount(&fixture.server)
        .await;
    refresh_mock("refreshed").expect(1).mount(&fixture.server).await;

    // Even with someone at the terminal, the second 401 is not offered for retry.
    let terminal = Arc::new(ScriptedTerminal::interactive().with_confirms(&[true, true]));
    let mut relay = fixture.relay(terminal.clone());
    let err = relay.send(&RawMessage::from_bytes(b"Hi")).await.unwrap_err();

    assert!(matches!(err, Error::SendUnauthorized(_)));
    assert_eq!(
        err.to_string(),
        "Google send email request returned Request had invalid authentication credentials. \
         (code 'authError') with status code 401 Unauthorized."
    );
    assert!(terminal.prompts().is_empty());
}

#[tokio::test]
async fn empty_budget_makes_first_unauthorized_final() {
    let fixture = Fixture::start().await;
    send_with("cached")
        .respond_with(unauthorized())
        .expect(1)
        .mount(&fixture.server)
        .await;
    refresh_mock("refreshed").expect(0).mount(&fixture.server).await;

    let mut relay = fixture.relay(Arc::new(ScriptedTerminal::detached()));
    let mut budget = RetryBudget::new(0);
    let err = relay
        .send_with_budget(&RawMessage::from_bytes(b"Hi"), &mut budget)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SendUnauthorized(_)));
}

#[tokio::test]
async fn refused_message_without_terminal_is_final() {
    let fixture = Fixture::start().await;
    send_with("cached")
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "Invalid To header",
                "errors": [{ "reason": "invalidArgument" }]
            }
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let mut relay = fixture.relay(Arc::new(ScriptedTerminal::detached()));
    let err = relay.send(&RawMessage::from_bytes(b"Hi")).await.unwrap_err();

    assert!(matches!(err, Error::SendFailed(_)));
    assert_eq!(
        err.to_string(),
        "Google send email request returned Invalid To header (code 'invalidArgument') \
         with status code 400 Bad Request."
    );
}

#[tokio::test]
async fn refused_message_is_resent_on_request() {
    let fixture = Fixture::start().await;
    send_with("cached")
        .respond_with(ResponseTemplate::new(500).set_body_raw("oops", "text/plain"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&fixture.server)
        .await;
    send_with("cached")
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let terminal = Arc::new(ScriptedTerminal::interactive().with_confirms(&[true]));
    let mut relay = fixture.relay(terminal.clone());
    relay.send(&RawMessage::from_bytes(b"Hi")).await.unwrap();

    let prompts = terminal.prompts();
    assert_eq!(
        prompts,
        [
            "Google send email request returned unexpected error of type text/plain \
             with status code 500 Internal Server Error. Keep trying?"
        ]
    );
}
