mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{loan_body, TestApp};
use moni_backend::models::{LoanStatus, UserRole};

// ============================================================================
// Public submission
// ============================================================================

#[tokio::test]
async fn test_submit_eligible_applicant_is_approved() {
    let app = TestApp::new(true);

    let (status, body) = app
        .send(Method::POST, "/loan-requests/", None, Some(loan_body("20123456789")))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "APR");
    assert_eq!(body["id_number"], "20123456789");
    assert_eq!(body["gender"], "M");
    assert_eq!(body["amount"], "15000.00");
    assert!(body["id"].as_i64().is_some());
    assert!(body["created_at"].is_string());
    assert!(body["updated_at"].is_string());

    assert_eq!(app.loans.snapshot().len(), 1);
    assert_eq!(app.checker.calls.lock().unwrap().as_slice(), ["20123456789"]);
}

#[tokio::test]
async fn test_submit_ineligible_applicant_is_rejected() {
    let app = TestApp::new(false);

    let (status, body) = app
        .send(Method::POST, "/loan-requests/", None, Some(loan_body("27111111111")))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "REJ");
    assert_eq!(app.loans.snapshot()[0].status, LoanStatus::Rejected);
}

#[tokio::test]
async fn test_submit_never_stays_pending() {
    for eligible in [true, false] {
        let app = TestApp::new(eligible);
        let (_, body) = app
            .send(Method::POST, "/loan-requests/", None, Some(loan_body("20999999999")))
            .await;
        assert_ne!(body["status"], "PEN");
    }
}

#[tokio::test]
async fn test_submit_invalid_email_persists_nothing() {
    let app = TestApp::new(true);
    let mut body = loan_body("20123456789");
    body["email"] = json!("not-an-email");

    let (status, errors) = app
        .send(Method::POST, "/loan-requests/", None, Some(body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(errors["email"].is_array());
    assert!(app.loans.snapshot().is_empty());
    assert_eq!(app.checker.call_count(), 0);
}

#[tokio::test]
async fn test_submit_missing_amount() {
    let app = TestApp::new(true);
    let mut body = loan_body("20123456789");
    body.as_object_mut().unwrap().remove("amount");

    let (status, errors) = app
        .send(Method::POST, "/loan-requests/", None, Some(body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors["amount"], json!(["This field is required."]));
    assert!(app.loans.snapshot().is_empty());
}

#[tokio::test]
async fn test_submit_reports_every_invalid_field() {
    let app = TestApp::new(true);
    let body = json!({
        "id_number": "12345678901234567",
        "full_name": "",
        "gender": "X",
        "email": "nope",
        "amount": "12.345"
    });

    let (status, errors) = app
        .send(Method::POST, "/loan-requests/", None, Some(body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["id_number", "full_name", "gender", "email", "amount"] {
        assert!(errors[field].is_array(), "expected error for {}", field);
    }
    assert_eq!(errors["gender"], json!(["\"X\" is not a valid choice."]));
}

#[tokio::test]
async fn test_submit_duplicate_id_number() {
    let app = TestApp::new(true);
    app.send(Method::POST, "/loan-requests/", None, Some(loan_body("20123456789")))
        .await;

    let (status, errors) = app
        .send(Method::POST, "/loan-requests/", None, Some(loan_body("20123456789")))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(errors["id_number"].is_array());
    assert_eq!(app.loans.snapshot().len(), 1);
    assert_eq!(app.checker.call_count(), 1);
}

#[tokio::test]
async fn test_submit_ignores_client_status() {
    let app = TestApp::new(false);
    let mut body = loan_body("20123456789");
    body["status"] = json!("APR");
    body["id"] = json!(999);

    let (status, created) = app
        .send(Method::POST, "/loan-requests/", None, Some(body))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "REJ");
    assert_ne!(created["id"], 999);
}

#[tokio::test]
async fn test_submit_malformed_json() {
    let app = TestApp::new(true);
    let (status, _, body) = app
        .send_raw(Method::POST, "/loan-requests/", None, None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["non_field_errors"].is_array());
}

#[tokio::test]
async fn test_submit_overlong_email_is_a_field_error() {
    let app = TestApp::new(true);
    let mut body = loan_body("20123456789");
    body["email"] = json!(format!("{}@example.com", "a".repeat(250)));

    let (status, errors) = app
        .send(Method::POST, "/loan-requests/", None, Some(body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(errors["email"]
        .as_array()
        .unwrap()
        .contains(&json!("Ensure this field has no more than 254 characters.")));
    assert!(app.loans.snapshot().is_empty());
    assert_eq!(app.checker.call_count(), 0);
}

#[tokio::test]
async fn test_submit_numeric_id_number_is_accepted() {
    let app = TestApp::new(true);
    let mut body = loan_body("unused");
    body["id_number"] = json!(20123456700u64);

    let (status, created) = app
        .send(Method::POST, "/loan-requests/", None, Some(body))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id_number"], "20123456700");
}

#[tokio::test]
async fn test_submit_wrong_type_is_keyed_by_field() {
    let app = TestApp::new(true);
    let mut body = loan_body("20123456789");
    body["gender"] = json!({"value": "M"});

    let (status, errors) = app
        .send(Method::POST, "/loan-requests/", None, Some(body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors["gender"], json!(["Not a valid string."]));
    assert!(errors.get("non_field_errors").is_none());
    assert!(app.loans.snapshot().is_empty());
}

#[tokio::test]
async fn test_submit_trims_text_before_uniqueness() {
    let app = TestApp::new(true);
    let mut first = loan_body(" 20123456789 ");
    first["full_name"] = json!("  Juan Pérez ");
    first["email"] = json!(" juan@example.com ");

    let (status, created) = app
        .send(Method::POST, "/loan-requests/", None, Some(first))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id_number"], "20123456789");
    assert_eq!(created["full_name"], "Juan Pérez");
    assert_eq!(created["email"], "juan@example.com");

    let (status, errors) = app
        .send(Method::POST, "/loan-requests/", None, Some(loan_body("20123456789")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(errors["id_number"].is_array());

    let stored = app.loans.snapshot();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id_number, "20123456789");
}

// ============================================================================
// Administration: authentication and policy
// ============================================================================

#[tokio::test]
async fn test_admin_routes_require_authentication() {
    let app = TestApp::new(true);
    let loan = app.seed_loan("20123456789", LoanStatus::Pending).await;
    let detail = format!("/admin/loans/{}/", loan.id);
    let approve = format!("/admin/loans/{}/approve/", loan.id);

    for (method, uri) in [
        (Method::GET, "/admin/loans/"),
        (Method::GET, detail.as_str()),
        (Method::PATCH, detail.as_str()),
        (Method::POST, approve.as_str()),
    ] {
        let (status, headers, body) = app.send_raw(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert!(headers.contains_key("www-authenticate"));
        assert!(body["detail"].is_string());
    }
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let app = TestApp::new(true);
    let (status, _) = app
        .send(Method::GET, "/admin/loans/", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_analyst_can_read() {
    let app = TestApp::new(true);
    let first = app.seed_loan("20000000001", LoanStatus::Approved).await;
    app.seed_loan("20000000002", LoanStatus::Rejected).await;
    let token = app.analyst_token();

    let (status, list) = app
        .send(Method::GET, "/admin/loans/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], first.id);

    let (status, detail) = app
        .send(
            Method::GET,
            &format!("/admin/loans/{}/", first.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["id_number"], "20000000001");
}

#[tokio::test]
async fn test_analyst_cannot_modify() {
    let app = TestApp::new(true);
    let loan = app.seed_loan("20123456789", LoanStatus::Pending).await;
    let token = app.analyst_token();
    let detail = format!("/admin/loans/{}/", loan.id);

    let attempts = [
        (Method::PATCH, detail.clone(), Some(json!({"amount": "1.00"}))),
        (Method::PUT, detail.clone(), Some(loan_body("20123456789"))),
        (Method::DELETE, detail.clone(), None),
        (Method::POST, format!("{}approve/", detail), None),
        (Method::POST, format!("{}reject/", detail), None),
        (Method::POST, "/admin/loans/".to_string(), Some(loan_body("20999999999"))),
    ];

    for (method, uri, body) in attempts {
        let (status, response) = app.send(method, &uri, Some(&token), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(
            response["detail"],
            "You do not have permission to perform this action."
        );
    }

    let stored = &app.loans.snapshot()[0];
    assert_eq!(stored.status, LoanStatus::Pending);
    assert_eq!(stored.amount.to_string(), "5000.00");
}

#[tokio::test]
async fn test_account_without_role_is_forbidden() {
    let app = TestApp::new(true);
    let token = app.token_for(None);

    let (status, _) = app
        .send(Method::GET, "/admin/loans/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_change_applies_to_existing_token() {
    let app = TestApp::new(true);
    let user = app.add_user("promoted", "Secret1234", Some(UserRole::Analyst));
    let token = app
        .auth
        .issue(&user, moni_backend::auth::TokenType::Access)
        .unwrap();
    let loan = app.seed_loan("20123456789", LoanStatus::Pending).await;
    let approve = format!("/admin/loans/{}/approve/", loan.id);

    let (status, _) = app.send(Method::POST, &approve, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.users.set_role(user.id, Some(UserRole::Admin));
    let (status, _) = app.send(Method::POST, &approve, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_forbidden_before_not_found() {
    let app = TestApp::new(true);
    let token = app.analyst_token();

    let (status, _) = app
        .send(Method::POST, "/admin/loans/424242/approve/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Administration: admin operations
// ============================================================================

#[tokio::test]
async fn test_admin_partial_update_amount() {
    let app = TestApp::new(true);
    let loan = app.seed_loan("20123456789", LoanStatus::Pending).await;
    let token = app.admin_token();

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/admin/loans/{}/", loan.id),
            Some(&token),
            Some(json!({"amount": 7500.5})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], "7500.50");
    assert_eq!(body["full_name"], "Ana Gómez");
    assert_eq!(body["status"], "PEN");
    assert_eq!(app.loans.snapshot()[0].amount.to_string(), "7500.50");
}

#[tokio::test]
async fn test_admin_partial_update_status() {
    let app = TestApp::new(true);
    let loan = app.seed_loan("20123456789", LoanStatus::Rejected).await;
    let token = app.admin_token();

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/admin/loans/{}/", loan.id),
            Some(&token),
            Some(json!({"status": "PEN"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PEN");
}

#[tokio::test]
async fn test_admin_partial_update_invalid_field() {
    let app = TestApp::new(true);
    let loan = app.seed_loan("20123456789", LoanStatus::Pending).await;
    let token = app.admin_token();

    let (status, errors) = app
        .send(
            Method::PATCH,
            &format!("/admin/loans/{}/", loan.id),
            Some(&token),
            Some(json!({"email": "broken", "status": "DONE"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(errors["email"].is_array());
    assert!(errors["status"].is_array());
    assert_eq!(app.loans.snapshot()[0].email, "ana@example.com");
}

#[tokio::test]
async fn test_admin_partial_update_rejects_null() {
    let app = TestApp::new(true);
    let loan = app.seed_loan("20123456789", LoanStatus::Pending).await;
    let token = app.admin_token();

    let (status, errors) = app
        .send(
            Method::PATCH,
            &format!("/admin/loans/{}/", loan.id),
            Some(&token),
            Some(json!({"amount": null, "id_number": null})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors["amount"], json!(["This field may not be null."]));
    assert_eq!(errors["id_number"], json!(["This field may not be null."]));

    let stored = &app.loans.snapshot()[0];
    assert_eq!(stored.id_number, "20123456789");
    assert_eq!(stored.amount.to_string(), "5000.00");
}

#[tokio::test]
async fn test_admin_update_to_taken_id_number() {
    let app = TestApp::new(true);
    app.seed_loan("20000000001", LoanStatus::Pending).await;
    let second = app.seed_loan("20000000002", LoanStatus::Pending).await;
    let token = app.admin_token();

    let (status, errors) = app
        .send(
            Method::PATCH,
            &format!("/admin/loans/{}/", second.id),
            Some(&token),
            Some(json!({"id_number": "20000000001"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(errors["id_number"].is_array());

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/admin/loans/{}/", second.id),
            Some(&token),
            Some(json!({"id_number": "20000000002"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_full_update() {
    let app = TestApp::new(true);
    let loan = app.seed_loan("20123456789", LoanStatus::Pending).await;
    let token = app.admin_token();
    let uri = format!("/admin/loans/{}/", loan.id);

    let (status, errors) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({"amount": "10.00"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(errors["id_number"].is_array());
    assert!(errors["email"].is_array());

    let mut body = loan_body("27222222222");
    body["gender"] = json!("O");
    let (status, updated) = app.send(Method::PUT, &uri, Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id_number"], "27222222222");
    assert_eq!(updated["gender"], "O");
    assert_eq!(updated["status"], "PEN");
}

#[tokio::test]
async fn test_admin_approve_then_reject() {
    let app = TestApp::new(true);
    let loan = app.seed_loan("20123456789", LoanStatus::Pending).await;
    let token = app.admin_token();

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/admin/loans/{}/approve/", loan.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    assert_eq!(app.loans.snapshot()[0].status, LoanStatus::Approved);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/admin/loans/{}/reject/", loan.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.loans.snapshot()[0].status, LoanStatus::Rejected);
}

#[tokio::test]
async fn test_admin_approve_is_idempotent() {
    let app = TestApp::new(true);
    let loan = app.seed_loan("20123456789", LoanStatus::Approved).await;
    let token = app.admin_token();
    let uri = format!("/admin/loans/{}/approve/", loan.id);

    for _ in 0..2 {
        let (status, _) = app.send(Method::POST, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
    assert_eq!(app.loans.snapshot()[0].status, LoanStatus::Approved);
}

#[tokio::test]
async fn test_admin_unknown_id_is_not_found() {
    let app = TestApp::new(true);
    let token = app.admin_token();

    for (method, uri) in [
        (Method::GET, "/admin/loans/999/"),
        (Method::POST, "/admin/loans/999/approve/"),
        (Method::POST, "/admin/loans/999/reject/"),
        (Method::DELETE, "/admin/loans/999/"),
        (Method::GET, "/admin/loans/abc/"),
    ] {
        let (status, body) = app.send(method, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["detail"], "No LoanRequest matches the given query.");
    }

    let (status, _) = app
        .send(
            Method::PATCH,
            "/admin/loans/999/",
            Some(&token),
            Some(json!({"amount": "1.00"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_cannot_create_through_admin_collection() {
    let app = TestApp::new(true);
    let token = app.admin_token();

    let (status, body) = app
        .send(
            Method::POST,
            "/admin/loans/",
            Some(&token),
            Some(loan_body("20123456789")),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.is_null());
    assert!(app.loans.snapshot().is_empty());
}

#[tokio::test]
async fn test_admin_delete() {
    let app = TestApp::new(true);
    let loan = app.seed_loan("20123456789", LoanStatus::Pending).await;
    let token = app.admin_token();
    let uri = format!("/admin/loans/{}/", loan.id);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.loans.snapshot().is_empty());

    let (status, _) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Cross-cutting middleware
// ============================================================================

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = TestApp::new(true);
    let (_, headers, _) = app
        .send_raw(Method::GET, "/admin/loans/", None, None)
        .await;

    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["cache-control"], "no-store");
}
