//! API integration tests
//!
//! Need a running server with a fresh database and the bootstrap admin
//! configured (`PASSHUB_AUTH__ADMIN_EMAIL` / `PASSHUB_AUTH__ADMIN_PASSWORD`).

use chrono::{Duration, FixedOffset, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Server "today" with the default +05:30 offset
fn today() -> NaiveDate {
    let offset = FixedOffset::east_opt(330 * 60).unwrap();
    Utc::now().with_timezone(&offset).date_naive()
}

fn admin_credentials() -> (String, String) {
    (
        std::env::var("PASSHUB_AUTH__ADMIN_EMAIL").unwrap_or_else(|_| "admin@passhub.local".to_string()),
        std::env::var("PASSHUB_AUTH__ADMIN_PASSWORD").unwrap_or_else(|_| "change-me-now".to_string()),
    )
}

async fn login(client: &Client, email: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

const PASSWORD: &str = "a-long-password";

/// Register a fresh account and return (user id, email)
async fn register_as(client: &Client, role: &str) -> (String, String) {
    let email = format!("{}-{}@example.com", role.to_lowercase(), Uuid::new_v4().simple());
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": email,
            "password": PASSWORD,
            "full_name": format!("Test {}", role),
            "role": role
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    (body["id"].as_str().unwrap().to_string(), email)
}

/// Register a fresh account and return (user id, token)
async fn register(client: &Client, role: &str) -> (String, String) {
    let (id, email) = register_as(client, role).await;
    (id, login(client, &email, PASSWORD).await)
}

/// Register a visitor, have the admin promote it to SECURITY, and return (user id, token)
async fn security_user(client: &Client, admin: &str) -> (String, String) {
    let (id, email) = register_as(client, "VISITOR").await;
    let response = client
        .put(format!("{}/admin/users/{}/role", BASE_URL, id))
        .bearer_auth(admin)
        .json(&json!({ "role": "SECURITY" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Role changes need a fresh token
    (id, login(client, &email, PASSWORD).await)
}

async fn set_capacity(client: &Client, token: &str, place_id: &str, capacity: i32) -> reqwest::Response {
    client
        .put(format!("{}/host/places/{}/capacity", BASE_URL, place_id))
        .bearer_auth(token)
        .json(&json!({ "daily_capacity": capacity }))
        .send()
        .await
        .expect("Failed to update capacity")
}

async fn cancel(client: &Client, token: &str, pass_id: &str) -> reqwest::Response {
    client
        .post(format!("{}/passes/cancel/{}", BASE_URL, pass_id))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to cancel pass")
}

async fn scan(client: &Client, token: &str, payload: &str) -> reqwest::Response {
    client
        .post(format!("{}/security/scan-pass", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "qr_payload": payload }))
        .send()
        .await
        .expect("Failed to scan pass")
}

/// Status of a booking as seen by the place host
async fn booking_status(client: &Client, host: &str, place_id: &str, booking_id: &str) -> String {
    let bookings: Value = client
        .get(format!("{}/host/places/{}/bookings", BASE_URL, place_id))
        .bearer_auth(host)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    bookings
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["id"] == booking_id)
        .expect("booking listed")["status"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn create_place(client: &Client, token: &str, capacity: i32, start: NaiveDate, price: &str) -> String {
    let response = client
        .post(format!("{}/host/places", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "name": "Test Fair",
            "location": "Exhibition Grounds",
            "price": price,
            "daily_capacity": capacity,
            "start_date": start.to_string(),
            "end_date": (start + Duration::days(30)).to_string()
        }))
        .send()
        .await
        .expect("Failed to create place");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn book(client: &Client, token: &str, place_id: &str, date: NaiveDate, guests: &[&str]) -> reqwest::Response {
    client
        .post(format!("{}/passes/request", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "place_id": place_id,
            "visit_date": date.to_string(),
            "guests": guests
        }))
        .send()
        .await
        .expect("Failed to request passes")
}

async fn confirm(client: &Client, token: &str, booking: &Value) -> Value {
    let payment_id = booking["payment"]["id"].as_str().expect("No payment");
    let response = client
        .post(format!("{}/payments/{}/confirm", BASE_URL, payment_id))
        .bearer_auth(token)
        .json(&json!({ "transaction_id": "txn_test" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");

    let ready = client.get(format!("{}/ready", BASE_URL)).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_register_login_me() {
    let client = Client::new();
    let (id, token) = register(&client, "VISITOR").await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["role"], "VISITOR");
    assert!(body.get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": "nobody@example.com", "password": "wrong-password" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_register_cannot_pick_security_role() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": format!("guard-{}@example.com", Uuid::new_v4().simple()),
            "password": "a-long-password",
            "full_name": "Sneaky Guard",
            "role": "SECURITY"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_visitor_cannot_publish_place() {
    let client = Client::new();
    let (_, visitor) = register(&client, "VISITOR").await;

    let response = client
        .post(format!("{}/host/places", BASE_URL))
        .bearer_auth(&visitor)
        .json(&json!({
            "name": "Nope",
            "location": "Nowhere",
            "price": "10.00",
            "daily_capacity": 10,
            "start_date": today().to_string(),
            "end_date": today().to_string()
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_capacity_exceeded() {
    let client = Client::new();
    let (_, host) = register(&client, "HOST").await;
    let (_, visitor) = register(&client, "VISITOR").await;
    let visit = today() + Duration::days(10);
    let place_id = create_place(&client, &host, 2, today(), "100.00").await;

    let response = book(&client, &visitor, &place_id, visit, &["A", "B", "C"]).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "CapacityExceeded");

    let response = book(&client, &visitor, &place_id, visit, &["A", "B"]).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let availability: Value = client
        .get(format!("{}/places/{}/availability?date={}", BASE_URL, place_id, visit))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(availability["remaining"], 0);
}

#[tokio::test]
#[ignore]
async fn test_book_confirm_and_cancel_with_full_refund() {
    let client = Client::new();
    let (_, host) = register(&client, "HOST").await;
    let (_, visitor) = register(&client, "VISITOR").await;
    let place_id = create_place(&client, &host, 50, today(), "250.00").await;

    let response = book(&client, &visitor, &place_id, today() + Duration::days(10), &["Asha", "Ravi"]).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let booking: Value = response.json().await.unwrap();
    assert_eq!(booking["booking"]["status"], "PENDING");
    assert_eq!(booking["passes"].as_array().unwrap().len(), 2);

    let confirmed = confirm(&client, &visitor, &booking).await;
    assert_eq!(confirmed["booking"]["status"], "CONFIRMED");
    let pass_id = confirmed["passes"][0]["id"].as_str().unwrap().to_string();

    let quote: Value = client
        .get(format!("{}/passes/{}/refund-quote", BASE_URL, pass_id))
        .bearer_auth(&visitor)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(quote["percent"], 100);

    let response = cancel(&client, &visitor, &pass_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cancelled: Value = response.json().await.unwrap();
    assert_eq!(cancelled["pass"]["status"], "CANCELLED");
    assert_eq!(cancelled["refund"]["percent"], 100);
    assert_eq!(cancelled["refund_pending"], false);
    assert!(cancelled["pass"]["refund_reference"].is_string());

    // Nothing left to quote once cancelled
    let response = client
        .get(format!("{}/passes/{}/refund-quote", BASE_URL, pass_id))
        .bearer_auth(&visitor)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // A second cancellation never refunds again
    let response = cancel(&client, &visitor, &pass_id).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "AlreadyCancelled");
}

#[tokio::test]
#[ignore]
async fn test_failed_payment_frees_slots() {
    let client = Client::new();
    let (_, host) = register(&client, "HOST").await;
    let (_, visitor) = register(&client, "VISITOR").await;
    let visit = today() + Duration::days(5);
    let place_id = create_place(&client, &host, 1, today(), "80.00").await;

    let booking: Value = book(&client, &visitor, &place_id, visit, &["Solo"]).await.json().await.unwrap();
    let payment_id = booking["payment"]["id"].as_str().unwrap();

    let response = client
        .post(format!("{}/payments/{}/fail", BASE_URL, payment_id))
        .bearer_auth(&visitor)
        .json(&json!({ "reason": "card declined" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let failed: Value = response.json().await.unwrap();
    assert_eq!(failed["booking"]["status"], "CANCELLED");

    let response = book(&client, &visitor, &place_id, visit, &["Solo again"]).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let rebooked: Value = response.json().await.unwrap();
    assert_eq!(rebooked["passes"][0]["slot_number"], 1);
}

#[tokio::test]
#[ignore]
async fn test_capacity_change_respects_upcoming_passes() {
    let client = Client::new();
    let (_, host) = register(&client, "HOST").await;
    let (_, visitor) = register(&client, "VISITOR").await;
    let place_id = create_place(&client, &host, 5, today(), "100.00").await;

    let booking: Value = book(&client, &visitor, &place_id, today() + Duration::days(8), &["A", "B", "C"])
        .await
        .json()
        .await
        .unwrap();
    let confirmed = confirm(&client, &visitor, &booking).await;
    let passes = confirmed["passes"].as_array().unwrap();
    assert_eq!(passes.len(), 3);
    assert_eq!(passes[0]["slot_number"], 1);
    assert_eq!(passes[2]["slot_number"], 3);

    // Three seats taken on one day
    let response = set_capacity(&client, &host, &place_id, 2).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Two seats left, but slot 3 is still held
    let response = cancel(&client, &visitor, passes[0]["id"].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = set_capacity(&client, &host, &place_id, 2).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = cancel(&client, &visitor, passes[2]["id"].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = set_capacity(&client, &host, &place_id, 2).await;
    assert_eq!(response.status(), StatusCode::OK);
    let place: Value = response.json().await.unwrap();
    assert_eq!(place["daily_capacity"], 2);
}

#[tokio::test]
#[ignore]
async fn test_security_scan_flow() {
    let client = Client::new();
    let (admin_email, admin_password) = admin_credentials();
    let admin = login(&client, &admin_email, &admin_password).await;

    let (_, host) = register(&client, "HOST").await;
    let (_, visitor) = register(&client, "VISITOR").await;
    let (guard_id, guard) = security_user(&client, &admin).await;
    let (_, outsider) = security_user(&client, &admin).await;

    let place_id = create_place(&client, &host, 20, today(), "0").await;
    let response = client
        .put(format!("{}/host/places/{}/security", BASE_URL, place_id))
        .bearer_auth(&host)
        .json(&json!({ "staff_ids": [guard_id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Free entry is confirmed without a payment
    let booking: Value = book(&client, &visitor, &place_id, today(), &["Meera"]).await.json().await.unwrap();
    assert_eq!(booking["booking"]["status"], "CONFIRMED");
    assert!(booking["payment"].is_null());
    let booking_id = booking["booking"]["id"].as_str().unwrap().to_string();
    let payload = booking["passes"][0]["qr_payload"].as_str().unwrap().to_string();

    // Security staff of another place are turned away
    let response = scan(&client, &outsider, &payload).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let first: Value = scan(&client, &guard, &payload).await.json().await.unwrap();
    assert_eq!(first["valid"], true);
    assert_eq!(first["verdict"], "ADMITTED");
    assert_eq!(booking_status(&client, &host, &place_id, &booking_id).await, "COMPLETED");

    let second: Value = scan(&client, &guard, &payload).await.json().await.unwrap();
    assert_eq!(second["valid"], false);
    assert_eq!(second["verdict"], "ALREADY_CHECKED_IN");

    let mut tampered = payload.clone();
    tampered.pop();
    tampered.push(if payload.ends_with('0') { '1' } else { '0' });
    let response = scan(&client, &guard, &tampered).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_cancelling_last_unused_pass_completes_booking() {
    let client = Client::new();
    let (admin_email, admin_password) = admin_credentials();
    let admin = login(&client, &admin_email, &admin_password).await;

    let (_, host) = register(&client, "HOST").await;
    let (_, visitor) = register(&client, "VISITOR").await;
    let (guard_id, guard) = security_user(&client, &admin).await;

    let place_id = create_place(&client, &host, 20, today(), "0").await;
    client
        .put(format!("{}/host/places/{}/security", BASE_URL, place_id))
        .bearer_auth(&host)
        .json(&json!({ "staff_ids": [guard_id] }))
        .send()
        .await
        .unwrap();

    let booking: Value = book(&client, &visitor, &place_id, today(), &["Meera", "Kiran"])
        .await
        .json()
        .await
        .unwrap();
    let booking_id = booking["booking"]["id"].as_str().unwrap().to_string();
    let passes = booking["passes"].as_array().unwrap();

    let admitted: Value = scan(&client, &guard, passes[0]["qr_payload"].as_str().unwrap())
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(admitted["verdict"], "ADMITTED");
    assert_eq!(booking_status(&client, &host, &place_id, &booking_id).await, "CONFIRMED");

    let response = cancel(&client, &visitor, passes[1]["id"].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(booking_status(&client, &host, &place_id, &booking_id).await, "COMPLETED");
}
