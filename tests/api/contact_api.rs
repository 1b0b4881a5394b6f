use std::time::Duration;

use wiremock::matchers::any;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path_regex;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_contact_api_app;

#[tokio::test]
async fn contact_created() {
    let app = spawn_contact_api_app().await;

    Mock::given(path_regex(r"^/audiences/[^/]+/contacts$"))
        .and(method("POST"))
        .and(body_json(serde_json::json!({
            "email": "foo@bar.com",
            "unsubscribed": false,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "object": "contact",
            "id": "479e3145-dd38-476b-932c-529ceb705947",
        })))
        .expect(1)
        .mount(&app.contacts_server)
        .await;

    // this backend never sends email itself
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let resp = app.post_subscribe("email=%20foo%40bar.com".to_owned()).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "success": true }));
}

/// The provider answering with an error object is reported as such
#[tokio::test]
async fn contact_rejected() {
    let app = spawn_contact_api_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "statusCode": 422,
            "name": "validation_error",
            "message": "Invalid `email` field.",
        })))
        .expect(1)
        .mount(&app.contacts_server)
        .await;

    let resp = app.post_subscribe("email=foo%40bar.com".to_owned()).await;
    assert_eq!(resp.status().as_u16(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Failed to subscribe" }));
}

/// No answer at all (here: the client times out) is an internal error, not a
/// provider rejection
#[tokio::test]
async fn contact_api_unreachable() {
    let app = spawn_contact_api_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(30)))
        .expect(1)
        .mount(&app.contacts_server)
        .await;

    let resp = app.post_subscribe("email=foo%40bar.com".to_owned()).await;
    assert_eq!(resp.status().as_u16(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Internal server error" }));
}

/// Validation happens before the provider is ever called
#[tokio::test]
async fn contact_api_invalid_email() {
    let app = spawn_contact_api_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.contacts_server)
        .await;

    for (body, error) in [
        ("email=", "Email is required"),
        ("email=foo%40bar", "Invalid email format"),
    ] {
        let resp = app.post_subscribe(body.to_owned()).await;
        assert_eq!(resp.status().as_u16(), 400, "{body}");
        let got: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(got, serde_json::json!({ "error": error }), "{body}");
    }
}

#[tokio::test]
async fn contact_created_from_multipart() {
    let app = spawn_contact_api_app().await;

    Mock::given(path_regex(r"^/audiences/[^/]+/contacts$"))
        .and(method("POST"))
        .and(body_json(serde_json::json!({
            "email": "foo@bar.com",
            "unsubscribed": false,
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.contacts_server)
        .await;

    let resp = app
        .post_subscribe_multipart(&[("email", "foo@bar.com\u{feff}")])
        .await;
    assert_eq!(resp.status().as_u16(), 200);
}
