//! Contact route tests.

use axum::http::StatusCode;
use serde_json::json;

use sms_manager_integration_tests::TestApp;

const NAME_MESSAGE: &str = "\"firstname\" is required and must start with a letter, can have spaces, fullstops or hyphens and be 3 - 40 characters long";
const NUMBER_MESSAGE: &str = "\"number\" is required and must contain numbers, be at least 3 - 14 characters long and can start with a +";

#[tokio::test]
async fn test_create_contact_trims_trailing_name_spaces() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            "/v1/contacts",
            &json!({ "firstname": "Ada   ", "lastname": "Love-Lace ", "number": "+2348012345678" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["statusCode"], 201);
    assert_eq!(response.body["message"], "Contact added successfully");

    let data = &response.body["data"];
    assert!(data["id"].is_number());
    assert_eq!(data["firstname"], "Ada");
    assert_eq!(data["lastname"], "Love-Lace");
    assert_eq!(data["number"], "+2348012345678");
    assert!(data["createdAt"].is_string());
    assert!(data.get("updatedAt").is_none());
}

#[tokio::test]
async fn test_create_contact_rejects_padding_outside_the_pattern() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/v1/contacts", &json!({ "firstname": " Ada", "number": " 0801234" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["details"]["firstname"], json!([NAME_MESSAGE]));
    assert_eq!(response.body["details"]["number"], json!([NUMBER_MESSAGE]));

    let padded = format!("Ada{}", " ".repeat(40));
    let response = app
        .post("/v1/contacts", &json!({ "firstname": padded, "number": "0809999" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["details"]["firstname"], json!([NAME_MESSAGE]));

    assert_eq!(app.get("/v1/contacts").await.body["data"], json!([]));
}

#[tokio::test]
async fn test_contact_number_not_utf8() {
    let app = TestApp::spawn().await;

    for response in [
        app.get("/v1/contacts/%FF").await,
        app.delete("/v1/contacts/%FF").await,
    ] {
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["details"]["number"], json!([NUMBER_MESSAGE]));
    }
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            "/v1/contacts",
            &json!({ "firstname": "a".repeat(3 * 1024 * 1024), "number": "0801234" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["statusCode"], 413);
    assert_eq!(response.body["error"], "Payload Too Large");
    assert_eq!(response.body["message"], "Request payload is too large");
}

#[tokio::test]
async fn test_create_duplicate_contact_conflicts() {
    let app = TestApp::spawn().await;
    app.create_contact("Ada", "08012345678").await;

    let response = app
        .post(
            "/v1/contacts",
            &json!({ "firstname": "Someone", "number": "08012345678" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "Conflict");
    assert_eq!(response.body["message"], "This contact already exists");
}

#[tokio::test]
async fn test_create_contact_validation() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            "/v1/contacts",
            &json!({ "firstname": "9x", "lastname": "", "number": "080-123", "nickname": "x" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let details = &response.body["details"];
    assert_eq!(details["firstname"], json!([NAME_MESSAGE]));
    assert_eq!(
        details["lastname"],
        json!([
            "\"lastname\" must start with a letter, can have spaces, fullstops or hyphens and be 3 - 40 characters long"
        ])
    );
    assert_eq!(details["number"], json!([NUMBER_MESSAGE]));
    assert_eq!(details["nickname"], json!(["\"nickname\" is not allowed"]));
}

#[tokio::test]
async fn test_create_contact_missing_fields() {
    let app = TestApp::spawn().await;

    let response = app.post("/v1/contacts", &json!({})).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["details"]["firstname"], json!([NAME_MESSAGE]));
    assert_eq!(response.body["details"]["number"], json!([NUMBER_MESSAGE]));
    assert!(response.body["details"].get("lastname").is_none());
}

#[tokio::test]
async fn test_fetch_contact() {
    let app = TestApp::spawn().await;
    let created = app.create_contact("Grace", "08099999999").await;

    let response = app.get("/v1/contacts/08099999999").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Contact fetched successfully");
    assert_eq!(response.body["data"], created);
}

#[tokio::test]
async fn test_fetch_missing_contact() {
    let app = TestApp::spawn().await;

    let response = app.get("/v1/contacts/08000000000").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Contact does not exist");
}

#[tokio::test]
async fn test_fetch_contact_invalid_number() {
    let app = TestApp::spawn().await;

    let response = app.get("/v1/contacts/not-a-number").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["details"]["number"], json!([NUMBER_MESSAGE]));
}

#[tokio::test]
async fn test_list_contacts_in_id_order() {
    let app = TestApp::spawn().await;
    app.create_contact("First", "0801").await;
    app.create_contact("Second", "0802").await;

    let response = app.get("/v1/contacts").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Contacts fetched successfully");
    let numbers: Vec<_> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["number"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(numbers, ["0801", "0802"]);
}

#[tokio::test]
async fn test_delete_contact() {
    let app = TestApp::spawn().await;
    app.create_contact("Grace", "08099999999").await;

    let response = app.delete("/v1/contacts/08099999999").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Contact deleted successfully");
    assert!(response.body.get("data").is_none());

    let response = app.get("/v1/contacts/08099999999").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.delete("/v1/contacts/08099999999").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Contact does not exist");
}

#[tokio::test]
async fn test_delete_contact_cascades_messages() {
    let app = TestApp::spawn().await;
    app.create_contact("Alice", "0801").await;
    app.create_contact("Bob", "0802").await;

    let sent = app
        .post(
            "/v1/messages",
            &json!({ "sender": "0801", "receiver": "0802", "message": "hi bob" }),
        )
        .await;
    let received = app
        .post(
            "/v1/messages",
            &json!({ "sender": "0802", "receiver": "0801", "message": "hi alice" }),
        )
        .await;
    let sent_id = sent.body["data"]["id"].as_i64().unwrap();
    let received_id = received.body["data"]["id"].as_i64().unwrap();

    assert_eq!(app.delete("/v1/contacts/0801").await.status, StatusCode::OK);

    let response = app.get(&format!("/v1/messages/{sent_id}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.get(&format!("/v1/messages/{received_id}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["sender"], "0802");
    assert!(response.body["data"]["receiver"].is_null());
}
