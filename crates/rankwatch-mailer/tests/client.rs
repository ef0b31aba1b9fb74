//! Integration tests for `HttpMailer` using wiremock HTTP mocks.

use rankwatch_core::{
    dispatch, Alert, DispatchError, DispatchOutcome, Language, MailSender, OutboundEmail,
};
use rankwatch_mailer::{HttpMailer, MailerError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_mailer(base_url: &str) -> HttpMailer {
    HttpMailer::with_base_url("mail-key", "alerts@example.com", 30, base_url)
        .expect("mailer construction should not fail")
}

fn email() -> OutboundEmail {
    OutboundEmail {
        to: vec!["ops@example.com".to_string(), "seo@example.com".to_string()],
        subject: "Keyword ranking alert: 1 significant change".to_string(),
        html: "<h1>alert</h1>".to_string(),
        text: "alert".to_string(),
    }
}

#[tokio::test]
async fn send_posts_expected_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer mail-key"))
        .and(body_json(serde_json::json!({
            "from": "alerts@example.com",
            "to": ["ops@example.com", "seo@example.com"],
            "subject": "Keyword ranking alert: 1 significant change",
            "html": "<h1>alert</h1>",
            "text": "alert"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "msg_1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    test_mailer(&server.uri())
        .send_email(&email())
        .await
        .expect("send should succeed");
}

#[tokio::test]
async fn non_success_status_is_rejected_with_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid from address"))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_mailer(&server.uri())
        .send_email(&email())
        .await
        .unwrap_err();
    match err {
        MailerError::Rejected { status, body } => {
            assert_eq!(status, 422);
            assert_eq!(body, "invalid from address");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn mail_sender_trait_maps_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mailer = test_mailer(&server.uri());
    let sender: &dyn MailSender = &mailer;
    let err = sender.send(&email()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Rejected { status: 500, .. }));
}

#[tokio::test]
async fn dispatch_sends_one_digest_through_http_mailer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let alerts = vec![
        Alert {
            keyword: "sniper bot".to_string(),
            language: Language::En,
            old_position: 12,
            new_position: 7,
            change: 5,
            url: "https://example.com/en/sniper-bot".to_string(),
        },
        Alert {
            keyword: "krypto bot".to_string(),
            language: Language::De,
            old_position: 4,
            new_position: 11,
            change: -7,
            url: "https://example.com/de/krypto-bot".to_string(),
        },
    ];
    let recipients = vec!["ops@example.com".to_string()];

    let mailer = test_mailer(&server.uri());
    let outcome = dispatch(&mailer, &alerts, &recipients).await.unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Sent {
            alerts: 2,
            recipients: 1
        }
    );
}
