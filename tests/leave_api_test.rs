//! HTTP tests for the leave endpoints, wired to the in-memory stores.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::from_fn;
use actix_web::web::{self, Data};
use actix_web::{App, test};
use iset_leave::auth::jwt::generate_access_token;
use iset_leave::auth::middleware::auth_middleware;
use iset_leave::config::Config;
use iset_leave::leave::{LeavePolicy, LeaveService};
use iset_leave::model::requester::RequesterProfile;
use iset_leave::model::role::Role;
use iset_leave::routes;
use iset_leave::store::memory::{MemoryLeaveStore, MemoryRequesterDirectory};
use serde_json::{Value, json};

const SECRET: &str = "test-secret";
const AMAL: u64 = 1000;
const KARIM: u64 = 1001;

fn config() -> Config {
    Config {
        database_url: "mysql://unused".to_string(),
        jwt_secret: SECRET.to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        access_token_ttl: 900,
        rate_login_per_min: 60,
        rate_protected_per_min: 1000,
        api_prefix: "/api".to_string(),
        log_dir: "logs".to_string(),
        leave_base_allowance: 30,
        leave_max_span_days: 30,
        leave_refresh_interval_secs: 30,
    }
}

fn service() -> Arc<LeaveService> {
    let directory = MemoryRequesterDirectory::new([
        RequesterProfile {
            id: AMAL,
            display_name: "Amal Ben Salah".to_string(),
            department: Some("Informatique".to_string()),
        },
        RequesterProfile {
            id: KARIM,
            display_name: "Karim Jaziri".to_string(),
            department: None,
        },
    ]);
    Arc::new(LeaveService::new(
        Arc::new(MemoryLeaveStore::new()),
        Arc::new(directory),
        LeavePolicy::default(),
    ))
}

fn admin_token() -> String {
    generate_access_token(1, "admin".to_string(), Role::Admin.id(), None, SECRET, 900).unwrap()
}

fn teacher_token(requester_id: u64) -> String {
    generate_access_token(
        requester_id + 10,
        format!("teacher{requester_id}"),
        Role::Teacher.id(),
        Some(requester_id),
        SECRET,
        900,
    )
    .unwrap()
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

macro_rules! init_app {
    ($service:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new(config()))
                .app_data(Data::from($service.clone()))
                .service(
                    web::scope("/api")
                        .wrap(from_fn(auth_middleware))
                        .configure(routes::protected_routes),
                ),
        )
        .await
    };
}

fn leave_payload(start: &str, end: &str) -> Value {
    json!({
        "category": "annual",
        "start_date": start,
        "end_date": end,
        "reason": "Family event"
    })
}

#[actix_web::test]
async fn requests_without_a_token_are_unauthorized() {
    let service = service();
    let app = init_app!(service);

    let req = test::TestRequest::get().uri("/api/leave").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn teacher_submits_and_admin_approves() {
    let service = service();
    let app = init_app!(service);

    let req = test::TestRequest::post()
        .uri("/api/leave")
        .insert_header(bearer(&teacher_token(AMAL)))
        .set_json(leave_payload("2025-03-10", "2025-03-12"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["status"], "pending");
    assert_eq!(created["days_requested"], 3);
    assert_eq!(created["requester_name"], "Amal Ben Salah");
    let id = created["id"].as_u64().unwrap();

    // teachers cannot decide
    let req = test::TestRequest::put()
        .uri(&format!("/api/leave/{id}/approve"))
        .insert_header(bearer(&teacher_token(AMAL)))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::put()
        .uri(&format!("/api/leave/{id}/approve"))
        .insert_header(bearer(&admin_token()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let decided: Value = test::read_body_json(resp).await;
    assert_eq!(decided["request"]["status"], "approved");
    assert_eq!(decided["request"]["processed_by"], 1);
    assert_eq!(decided["balance"]["days_remaining"], 27);

    let req = test::TestRequest::put()
        .uri(&format!("/api/leave/{id}/approve"))
        .insert_header(bearer(&admin_token()))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CONFLICT
    );

    let req = test::TestRequest::get()
        .uri("/api/leave/balance?year=2025")
        .insert_header(bearer(&teacher_token(AMAL)))
        .to_request();
    let balance: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(balance["days_used"], 3);
    assert_eq!(balance["approved_count"], 1);
}

#[actix_web::test]
async fn invalid_submission_lists_every_field() {
    let service = service();
    let app = init_app!(service);

    let req = test::TestRequest::post()
        .uri("/api/leave")
        .insert_header(bearer(&teacher_token(AMAL)))
        .set_json(json!({
            "category": "holiday",
            "start_date": "2025-03-12",
            "end_date": "2025-03-10",
            "reason": ""
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"category"));
    assert!(fields.contains(&"reason"));
    assert!(fields.contains(&"end_date"));
    assert!(service.list(&Default::default()).await.is_empty());
}

#[actix_web::test]
async fn store_timestamp_dates_are_accepted() {
    let service = service();
    let app = init_app!(service);

    let req = test::TestRequest::post()
        .uri("/api/leave")
        .insert_header(bearer(&teacher_token(AMAL)))
        .set_json(json!({
            "category": "sick",
            "start_date": { "seconds": 1_741_599_000, "nanoseconds": 0 },
            "end_date": "2025-03-11T08:00:00Z",
            "reason": "flu"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["start_date"], "2025-03-10");
    assert_eq!(created["end_date"], "2025-03-11");
}

#[actix_web::test]
async fn rejection_without_reason_is_a_bad_request() {
    let service = service();
    let created = service
        .submit(
            AMAL,
            serde_json::from_value(leave_payload("2025-03-10", "2025-03-12")).unwrap(),
        )
        .await
        .unwrap();
    let app = init_app!(service);

    let req = test::TestRequest::put()
        .uri(&format!("/api/leave/{}/reject", created.id))
        .insert_header(bearer(&admin_token()))
        .set_json(json!({ "reason": "" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::put()
        .uri(&format!("/api/leave/{}/reject", created.id))
        .insert_header(bearer(&admin_token()))
        .set_json(json!({ "reason": "Exam week" }))
        .to_request();
    let decided: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(decided["request"]["status"], "rejected");
    assert_eq!(decided["request"]["rejection_reason"], "Exam week");
}

#[actix_web::test]
async fn teachers_only_see_their_own_requests() {
    let service = service();
    for requester in [AMAL, KARIM] {
        service
            .submit(
                requester,
                serde_json::from_value(leave_payload("2025-03-10", "2025-03-12")).unwrap(),
            )
            .await
            .unwrap();
    }
    let karims = service
        .list(&iset_leave::leave::LeaveFilter::for_requester(KARIM))
        .await;
    let app = init_app!(service);

    // asking for someone else's requests still yields one's own
    let req = test::TestRequest::get()
        .uri(&format!("/api/leave?requester_id={KARIM}"))
        .insert_header(bearer(&teacher_token(AMAL)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["requester_id"], AMAL);

    let req = test::TestRequest::get()
        .uri(&format!("/api/leave/{}", karims[0].id))
        .insert_header(bearer(&teacher_token(AMAL)))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri("/api/leave")
        .insert_header(bearer(&admin_token()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 2);
}

#[actix_web::test]
async fn pending_queue_is_admin_only() {
    let service = service();
    service
        .submit(
            KARIM,
            serde_json::from_value(leave_payload("2025-03-10", "2025-03-12")).unwrap(),
        )
        .await
        .unwrap();
    let app = init_app!(service);

    let req = test::TestRequest::get()
        .uri("/api/leave/pending")
        .insert_header(bearer(&teacher_token(KARIM)))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::get()
        .uri("/api/leave/pending")
        .insert_header(bearer(&admin_token()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/leave/stats/departments")
        .insert_header(bearer(&admin_token()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["department"], "unassigned");
    assert_eq!(body[0]["stats"]["pending"], 1);
}

fn error_fields(body: &Value) -> Vec<&str> {
    body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect()
}

#[actix_web::test]
async fn impossible_dates_are_field_errors() {
    let service = service();
    let app = init_app!(service);

    let req = test::TestRequest::post()
        .uri("/api/leave")
        .insert_header(bearer(&teacher_token(AMAL)))
        .set_json(json!({
            "category": "annual",
            "start_date": "2025-02-30",
            "end_date": "2025-03-02",
            "reason": ""
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_fields(&body), vec!["start_date", "reason"]);
    assert!(service.list(&Default::default()).await.is_empty());
}

#[actix_web::test]
async fn unreadable_body_has_the_validation_shape() {
    let service = service();
    let app = init_app!(service);

    let req = test::TestRequest::post()
        .uri("/api/leave")
        .insert_header(bearer(&teacher_token(AMAL)))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_fields(&body), vec!["body"]);
}

#[actix_web::test]
async fn rejection_without_a_body_asks_for_the_reason() {
    let service = service();
    let created = service
        .submit(
            AMAL,
            serde_json::from_value(leave_payload("2025-03-10", "2025-03-12")).unwrap(),
        )
        .await
        .unwrap();
    let app = init_app!(service);

    let req = test::TestRequest::put()
        .uri(&format!("/api/leave/{}/reject", created.id))
        .insert_header(bearer(&admin_token()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_fields(&body), vec!["reason"]);
    assert_eq!(
        service.get(created.id).await.unwrap().status,
        iset_leave::model::leave_request::LeaveStatus::Pending
    );
}

#[actix_web::test]
async fn huge_page_numbers_yield_an_empty_page() {
    let service = service();
    service
        .submit(
            AMAL,
            serde_json::from_value(leave_payload("2025-03-10", "2025-03-12")).unwrap(),
        )
        .await
        .unwrap();
    let app = init_app!(service);

    let req = test::TestRequest::get()
        .uri(&format!("/api/leave?page={}&per_page=100", u64::MAX))
        .insert_header(bearer(&admin_token()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["total"], 1);
    assert_eq!(body["page"], u32::MAX);
}
