use serde_json::json;
use serde_json::Value;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::created;
use crate::helpers::email_conflict;
use crate::helpers::expect_upstream_calls;
use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with;
use crate::helpers::valid_contact;

const THANKS: &str = "Thank you for your message! We'll get back to you soon.";

#[tokio::test]
async fn contact_ok_echoes_record() {
    let app = spawn_app().await;

    Mock::given(path("/api/subscribers"))
        .and(method("POST"))
        .and(body_json(json!({
            "email": "a@b.com",
            "fields": { "name": "Jo", "subject": "Hi!", "message": "1234567890" },
        })))
        .respond_with(created("a@b.com"))
        .expect(1)
        .mount(&app.subscriber_api)
        .await;

    let resp = app.post_contact(&valid_contact()).await;

    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "ok": true,
            "message": THANKS,
            "contact": { "id": "1", "email": "a@b.com", "status": "active" },
        })
    );
}

#[tokio::test]
async fn configured_group_is_assigned() {
    let app = spawn_app_with(|cfg| cfg.forms.contact.group_id = Some(42)).await;

    Mock::given(path("/api/subscribers"))
        .and(body_json(json!({
            "email": "a@b.com",
            "fields": { "name": "Jo", "subject": "Hi!", "message": "1234567890" },
            "groups": [42],
        })))
        .respond_with(created("a@b.com"))
        .expect(1)
        .mount(&app.subscriber_api)
        .await;

    let resp = app.post_contact(&valid_contact()).await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn existing_email_is_not_an_error() {
    let app = spawn_app().await;
    expect_upstream_calls(&app, 1, email_conflict()).await;

    let resp = app.post_contact(&valid_contact()).await;

    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "ok": true, "message": THANKS }));
}

#[tokio::test]
async fn upstream_failure() {
    for (upstream, expected) in [(400, 400), (422, 400), (502, 500)] {
        let app = spawn_app().await;
        expect_upstream_calls(&app, 1, ResponseTemplate::new(upstream)).await;

        let resp = app.post_contact(&valid_contact()).await;

        assert_eq!(resp.status().as_u16(), expected, "upstream {upstream}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "submission_failed");
        assert_eq!(body["message"], "Failed to send message. Please try again later.");
    }
}

#[tokio::test]
async fn first_failing_rule_is_reported() {
    let app = spawn_app().await;
    expect_upstream_calls(&app, 0, created("a@b.com")).await;

    let with = |key: &str, value: Value| {
        let mut body = valid_contact();
        body[key] = value;
        body
    };

    for (body, code, message) in [
        (
            json!({ "email": "nope", "subject": "Hi!", "message": "1234567890" }),
            "invalid_email",
            "Please enter a valid email address.",
        ),
        (with("name", json!("")), "name_required", "Please enter your name."),
        (with("name", json!("J")), "name_required", "Please enter your name."),
        (
            with("name", json!("a".repeat(81))),
            "name_too_long",
            "Name must be 80 characters or fewer.",
        ),
        (with("subject", json!("Hi")), "subject_required", "Please enter a subject."),
        (
            with("subject", json!("a".repeat(201))),
            "subject_too_long",
            "Subject must be 200 characters or fewer.",
        ),
        (
            with("message", json!("too short")),
            "message_too_short",
            "Message must be at least 10 characters.",
        ),
        (
            with("message", json!("a".repeat(2001))),
            "message_too_long",
            "Message must be 2000 characters or fewer.",
        ),
        // every minimum runs before any maximum
        (
            json!({
                "email": "a@b.com",
                "name": "a".repeat(81),
                "subject": "Hi!",
                "message": "short",
            }),
            "message_too_short",
            "Message must be at least 10 characters.",
        ),
    ] {
        let resp = app.post_contact(&body).await;
        assert_eq!(resp.status().as_u16(), 400, "{body}");
        let json: Value = resp.json().await.unwrap();
        assert_eq!(
            json,
            json!({ "ok": false, "error": code, "message": message }),
            "{body}"
        );
    }
}

#[tokio::test]
async fn whitespace_only_fields_count_as_missing() {
    let app = spawn_app().await;
    expect_upstream_calls(&app, 0, created("a@b.com")).await;

    let mut body = valid_contact();
    body["subject"] = json!("     ");
    let resp = app.post_contact(&body).await;

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "subject_required");
}

#[tokio::test]
async fn boundary_lengths_are_accepted() {
    let app = spawn_app().await;
    expect_upstream_calls(&app, 1, created("a@b.com")).await;

    let resp = app
        .post_contact(&json!({
            "email": "a@b.com",
            "name": "a".repeat(80),
            "subject": "a".repeat(200),
            "message": "a".repeat(2000),
        }))
        .await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn honeypot_pretends_success() {
    let app = spawn_app().await;
    expect_upstream_calls(&app, 0, created("a@b.com")).await;

    let mut body = valid_contact();
    body["hp"] = json!("I am a bot");
    let resp = app.post_contact(&body).await;

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json, json!({ "ok": true, "message": THANKS }));
}

#[tokio::test]
async fn non_string_values_are_coerced() {
    let app = spawn_app().await;

    Mock::given(path("/api/subscribers"))
        .and(body_json(json!({
            "email": "a@b.com",
            "fields": { "name": "Jo", "subject": "12345", "message": "1234567890" },
        })))
        .respond_with(created("a@b.com"))
        .expect(1)
        .mount(&app.subscriber_api)
        .await;

    let resp = app
        .post_contact(&json!({
            "email": "a@b.com",
            "name": "Jo",
            "subject": 12345,
            "message": 1234567890,
        }))
        .await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn empty_body_is_a_validation_failure() {
    let app = spawn_app().await;
    expect_upstream_calls(&app, 0, created("a@b.com")).await;

    let resp = app.post_raw("/contact", "").await;

    assert_eq!(resp.status().as_u16(), 400);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "invalid_email");
}

#[tokio::test]
async fn oversized_body_gets_json_error_with_cors() {
    let app = spawn_app().await;
    expect_upstream_calls(&app, 0, created("a@b.com")).await;

    let mut body = valid_contact();
    body["message"] = json!("a".repeat(300_000));
    let resp = app.post_contact(&body).await;

    assert_eq!(resp.status().as_u16(), 413);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/json; charset=utf-8"
    );
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
    let json: Value = resp.json().await.unwrap();
    assert_eq!(
        json,
        json!({
            "ok": false,
            "error": "payload_too_large",
            "message": "The request body is too large.",
        })
    );
}
