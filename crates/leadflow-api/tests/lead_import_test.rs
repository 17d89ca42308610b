//! Lead import API integration tests.
//!
//! Run with: `cargo test -p leadflow-api --test lead_import_test`

mod helpers;

use axum::http::{header::AUTHORIZATION, HeaderValue};
use chrono::Utc;
use helpers::auth::{bearer, bearer_for_tenant};
use helpers::fixtures::{csv, form, import_data, xlsx};
use helpers::{setup_test_app, setup_test_app_with_permissions, ACCOUNT_ID, TENANT_ID};
use leadflow_core::models::LeadImportStatus;
use leadflow_services::test_helpers::StaticPermissions;
use serde_json::Value;

const IMPORT_PATH: &str = "/api/v1/leads/import";

#[tokio::test]
async fn test_health_without_database() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "not configured");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/v1/openapi.json").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["paths"]["/api/v1/leads/import"].is_object());
}

#[tokio::test]
async fn test_import_requires_bearer() {
    let app = setup_test_app().await;
    let file = csv(&[["Ana", "11987654321", "", "", ""]]);

    let response = app
        .client()
        .post(IMPORT_PATH)
        .multipart(form(&import_data("no auth"), "leads.csv", file))
        .await;

    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_import_rejects_forged_token() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/v1/leads/imports")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer not.a.token"))
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_permission_denied() {
    let app = setup_test_app_with_permissions(StaticPermissions::Deny).await;
    let file = csv(&[["Ana", "11987654321", "", "", ""]]);

    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&import_data("denied"), "leads.csv", file))
        .await;

    assert_eq!(response.status_code(), 403);
    let body: Value = response.json();
    assert_eq!(body["error"], "UNABLE_TO_IMPORT_LEADS");
    assert!(app.store.imports().is_empty());
}

#[tokio::test]
async fn test_permission_oracle_unavailable() {
    let app = setup_test_app_with_permissions(StaticPermissions::Unavailable).await;
    let file = csv(&[["Ana", "11987654321", "", "", ""]]);

    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&import_data("oracle down"), "leads.csv", file))
        .await;

    assert_eq!(response.status_code(), 502);
    let body: Value = response.json();
    assert_eq!(body["code"], "EXTERNAL_SERVICE_ERROR");
}

#[tokio::test]
async fn test_csv_import_end_to_end() {
    let mut app = setup_test_app().await;
    app.store.add_lead_phone(TENANT_ID, ACCOUNT_ID, "21987654321");
    let file = csv(&[
        ["Ana Souza", "+55 11 98765-4321", "529.982.247-25", "ana@example.com", "VIP, fair"],
        ["Bruno", "(21) 98765-4321", "", "", ""],
        ["Carla", "31987654321", "", "", "vip"],
    ]);

    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&import_data("March fair"), "leads.csv", file))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let import_id = body["import_id"].as_i64().unwrap();

    let finished = app.next_finished().await;
    assert_eq!(finished.import_id, import_id);
    assert_eq!(finished.status, LeadImportStatus::Finished);
    assert_eq!(finished.counters.created, 2);
    assert_eq!(finished.counters.existing, 1);
    assert_eq!(finished.counters.errors, 0);

    let response = app
        .client()
        .get(&format!("/api/v1/leads/imports/{}", import_id))
        .add_header(AUTHORIZATION, bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let job: Value = response.json();
    assert_eq!(job["status"], "FINISHED");
    assert_eq!(job["total_created"], 2);
    assert_eq!(job["total_existing"], 1);

    let leads = app.store.leads_for_import(import_id);
    assert_eq!(leads.len(), 2);
    assert!(leads.iter().all(|l| l.chat_id.is_some()));
    assert_eq!(app.chats.chats().len(), 2);

    let tag_names: Vec<String> = app
        .store
        .tags(TENANT_ID)
        .into_iter()
        .map(|t| t.name.to_lowercase())
        .collect();
    assert_eq!(tag_names.iter().filter(|n| *n == "vip").count(), 1);

    assert_eq!(app.cache.invalidated(), vec![TENANT_ID]);
    let events = app.events.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, "lead:import-finished");
}

#[tokio::test]
async fn test_xlsx_import() {
    let mut app = setup_test_app().await;
    let file = xlsx(&[["Dora", "11987654321", "", "dora@example.com", ""]]);

    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&import_data("sheet"), "leads.xlsx", file))
        .await;

    assert_eq!(response.status_code(), 200);
    let finished = app.next_finished().await;
    assert_eq!(finished.status, LeadImportStatus::Finished);
    assert_eq!(finished.counters.created, 1);
}

#[tokio::test]
async fn test_rejected_phone_counts_as_error() {
    let mut app = setup_test_app().await;
    app.phones.reject("11987654321");
    let file = csv(&[
        ["Ana", "11987654321", "", "", ""],
        ["Bruno", "21987654321", "", "", ""],
    ]);

    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&import_data("oracle"), "leads.csv", file))
        .await;

    assert_eq!(response.status_code(), 200);
    let finished = app.next_finished().await;
    assert_eq!(finished.status, LeadImportStatus::Finished);
    assert_eq!(finished.counters.created, 1);
    assert_eq!(finished.counters.errors, 1);
}

#[tokio::test]
async fn test_invalid_rows_reject_whole_file() {
    let app = setup_test_app().await;
    let file = csv(&[
        ["Ana", "11987654321", "", "", ""],
        ["Bruno", "123", "", "", ""],
        ["", "21987654321", "", "", ""],
    ]);

    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&import_data("broken"), "leads.csv", file))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_ROWS");
    assert_eq!(body["error"], "file contains invalid rows");
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["row"], 3);
    assert_eq!(errors[0]["column"], "phone");
    assert_eq!(errors[0]["message"], "invalid phone number");
    assert_eq!(errors[1]["row"], 4);
    assert_eq!(errors[1]["message"], "name is required");
    assert!(app.store.imports().is_empty());
}

#[tokio::test]
async fn test_file_layout_errors() {
    let app = setup_test_app().await;

    let bad_header = b"name,email,phone,cpf,tags\nAna,,11987654321,,\n".to_vec();
    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&import_data("header"), "leads.csv", bad_header))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "FILE_VALIDATION_FAILED");
    assert_eq!(body["error"], "column 2 must be 'phone', got 'email'");

    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&import_data("txt"), "leads.txt", b"anything".to_vec()))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "unsupported file format: txt");

    let header_only = csv(&[]);
    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&import_data("empty"), "leads.csv", header_only))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "file must have at least 1 data row");
}

#[tokio::test]
async fn test_missing_form_fields() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(
            axum_test::multipart::MultipartForm::new()
                .add_text("data", import_data("no file").to_string()),
        )
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("missing 'file'"));

    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(axum_test::multipart::MultipartForm::new().add_part(
            "file",
            axum_test::multipart::Part::bytes(csv(&[["Ana", "11987654321", "", "", ""]]))
                .file_name("leads.csv"),
        ))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "missing 'data' form field");
}

#[tokio::test]
async fn test_request_validation() {
    let app = setup_test_app().await;
    let mut data = import_data("");
    data["tag_ids"] = serde_json::json!([1, 2, 3, 4, 5, 6]);

    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&data, "leads.csv", csv(&[["Ana", "11987654321", "", "", ""]])))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(
        body["error"],
        "name is required and must be at most 255 characters"
    );
}

#[tokio::test]
async fn test_preflight_statuses() {
    let app = setup_test_app().await;
    let file = || csv(&[["Ana", "11987654321", "", "", ""]]);

    let mut unknown_source = import_data("unknown source");
    unknown_source["source_id"] = 99.into();
    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&unknown_source, "leads.csv", file()))
        .await;
    assert_eq!(response.status_code(), 404);

    app.store.add_import(TENANT_ID, ACCOUNT_ID, "taken", 0, Utc::now());
    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&import_data("taken"), "leads.csv", file()))
        .await;
    assert_eq!(response.status_code(), 409);

    let mut bad_tags = import_data("bad tags");
    bad_tags["tag_ids"] = serde_json::json!([424242]);
    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&bad_tags, "leads.csv", file()))
        .await;
    assert_eq!(response.status_code(), 422);

    for i in 0..4 {
        app.store
            .add_import(TENANT_ID, ACCOUNT_ID, &format!("earlier-{}", i), 0, Utc::now());
    }
    let response = app
        .client()
        .post(IMPORT_PATH)
        .add_header(AUTHORIZATION, bearer())
        .multipart(form(&import_data("over the limit"), "leads.csv", file()))
        .await;
    assert_eq!(response.status_code(), 429);
    let body: Value = response.json();
    assert_eq!(body["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(app.store.imports().len(), 5);
}

#[tokio::test]
async fn test_list_and_get_are_tenant_scoped() {
    let app = setup_test_app().await;
    let earlier = Utc::now() - chrono::Duration::minutes(5);
    let first = app.store.add_import(TENANT_ID, ACCOUNT_ID, "first", 1, earlier);
    let second = app.store.add_import(TENANT_ID, ACCOUNT_ID, "second", 2, Utc::now());
    let foreign = app.store.add_import(2, 99, "foreign", 3, Utc::now());
    let deleted = app.store.add_import(TENANT_ID, ACCOUNT_ID, "deleted", 0, Utc::now());
    app.store.soft_delete_import(deleted.id);

    let response = app
        .client()
        .get("/api/v1/leads/imports")
        .add_header(AUTHORIZATION, bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let jobs: Vec<Value> = response.json();
    let ids: Vec<i64> = jobs.iter().map(|j| j["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let response = app
        .client()
        .get("/api/v1/leads/imports")
        .add_query_param("limit", 1)
        .add_query_param("offset", 1)
        .add_header(AUTHORIZATION, bearer())
        .await;
    let jobs: Vec<Value> = response.json();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"].as_i64(), Some(first.id));

    let response = app
        .client()
        .get(&format!("/api/v1/leads/imports/{}", foreign.id))
        .add_header(AUTHORIZATION, bearer())
        .await;
    assert_eq!(response.status_code(), 404);

    let response = app
        .client()
        .get(&format!("/api/v1/leads/imports/{}", foreign.id))
        .add_header(AUTHORIZATION, bearer_for_tenant(2))
        .await;
    assert_eq!(response.status_code(), 200);
}
