use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};
use wayfarer_api::app::{build_app, services::AppServices};
use wayfarer_infra::{NumberingConfig, RetryPolicy};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(NumberingConfig::default()).await
    }

    async fn spawn_with(numbering: NumberingConfig) -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let app = build_app(Arc::new(AppServices::in_memory(numbering)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn hotel_body(customer: &str, total: u64, advance: u64) -> Value {
    json!({
        "details": {
            "type": "hotel",
            "customer": { "name": customer, "phone": "+92 300 0000000" },
            "hotel_name": "Pearl Continental",
            "room_type": "Executive",
            "check_in": "2026-05-10",
            "check_out": "2026-05-12",
            "rooms": 1,
            "guests": 2
        },
        "total": total,
        "amount_paid_in_advance": advance
    })
}

fn tour_body(customer: &str, total: u64) -> Value {
    json!({
        "details": {
            "type": "tour",
            "customer": { "name": customer },
            "package_name": "Swat Kalam 4D",
            "destination": "Kalam",
            "travel_date": "2026-07-02",
            "travellers": 3
        },
        "total": total
    })
}

fn voucher_body(paid_to: &str, total: u64) -> Value {
    json!({
        "details": {
            "type": "paymentVoucher",
            "paid_to": paid_to,
            "purpose": "Coaster rental",
            "payment_method": "bank_transfer",
            "payment_date": "2026-05-11"
        },
        "total": total
    })
}

async fn create(client: &reqwest::Client, srv: &TestServer, path: &str, body: Value) -> Value {
    let res = client.post(srv.url(path)).json(&body).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    body["data"].clone()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn invoices_are_numbered_per_family() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let first = create(&client, &srv, "/invoices", hotel_body("Ali Raza", 120_000, 20_000)).await;
    let second = create(&client, &srv, "/invoices", hotel_body("Sara", 80_000, 0)).await;
    let tour = create(&client, &srv, "/invoices", tour_body("Bilal", 45_000)).await;
    let voucher = create(&client, &srv, "/vouchers", voucher_body("Northern Coaches", 30_000)).await;

    assert_eq!(first["number"], "HTL0001");
    assert_eq!(second["number"], "HTL0002");
    assert_eq!(tour["number"], "TUR0001");
    assert_eq!(voucher["number"], "PAY001");
    assert_eq!(voucher["family"], "payment_voucher");

    assert_eq!(first["due_amount"], 100_000);
    assert_eq!(first["status"], "pending");
}

#[tokio::test]
async fn overpayment_clamps_due_and_marks_paid() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let doc = create(&client, &srv, "/invoices", hotel_body("Hina", 1000, 1500)).await;
    assert_eq!(doc["due_amount"], 0);
    assert_eq!(doc["status"], "paid");
}

#[tokio::test]
async fn partial_update_recomputes_due_from_stored_total() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let doc = create(&client, &srv, "/invoices", hotel_body("Usman", 1000, 200)).await;
    let id = doc["id"].as_str().unwrap();

    let res = client
        .put(srv.url(&format!("/invoices/{id}")))
        .json(&json!({ "amount_paid_in_advance": 1000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1000);
    assert_eq!(body["data"]["due_amount"], 0);
    assert_eq!(body["data"]["status"], "paid");
    assert_eq!(body["data"]["number"], doc["number"]);

    // Explicit status wins over the derived one.
    let res = client
        .put(srv.url(&format!("/invoices/{id}")))
        .json(&json!({ "total": 5000, "status": "overdue" }))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["due_amount"], 4000);
    assert_eq!(body["data"]["status"], "overdue");
}

#[tokio::test]
async fn cross_kind_access_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let voucher = create(&client, &srv, "/vouchers", voucher_body("Fuel Station", 9000)).await;
    let id = voucher["id"].as_str().unwrap();

    let res = client.get(srv.url(&format!("/invoices/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);

    let res = client
        .post(srv.url("/vouchers"))
        .json(&tour_body("Wrong Door", 100))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_input_is_reported_in_the_envelope() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/invoices"))
        .json(&hotel_body("", 1000, 0))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "validation_error");

    let res = client.get(srv.url("/invoices/not-a-uuid")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/invoices"))
        .header("content-type", "application/json")
        .body("{\"total\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    create(&client, &srv, "/invoices", hotel_body("Kamran", 1000, 1000)).await;
    create(&client, &srv, "/invoices", hotel_body("Nadia", 1000, 0)).await;
    create(&client, &srv, "/invoices", tour_body("kamran sheikh", 2000)).await;
    create(&client, &srv, "/vouchers", voucher_body("Kamran Travels", 500)).await;

    let res = client
        .get(srv.url("/invoices?party=KAMRAN&sort=number&order=asc"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(body["data"]["total"], 2);
    let numbers: Vec<&str> = items.iter().map(|d| d["number"].as_str().unwrap()).collect();
    assert_eq!(numbers, vec!["HTL0001", "TUR0001"]);

    let res = client
        .get(srv.url("/invoices?family=hotel&status=pending"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["number"], "HTL0002");

    let res = client.get(srv.url("/invoices?limit=1")).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["has_more"], true);

    let res = client.get(srv.url("/invoices?status=late")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_the_maximum_lets_its_number_be_reissued() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    create(&client, &srv, "/vouchers", voucher_body("A", 100)).await;
    let last = create(&client, &srv, "/vouchers", voucher_body("B", 100)).await;
    assert_eq!(last["number"], "PAY002");

    let id = last["id"].as_str().unwrap();
    let res = client.delete(srv.url(&format!("/vouchers/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url(&format!("/vouchers/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let preview: Value = client
        .get(srv.url("/numbering/payment_voucher/next"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(preview["data"]["number"], "PAY002");
}

#[tokio::test]
async fn numbering_preview_rejects_unknown_family() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/numbering/cruise/next")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = reqwest::get(srv.url("/numbering/hotel/next")).await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["number"], "HTL0001");
    assert_eq!(body["data"]["value"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_posts_get_distinct_numbers() {
    const REQUESTS: u32 = 12;

    let srv = TestServer::spawn_with(NumberingConfig {
        retry: RetryPolicy::immediate(REQUESTS),
        ..Default::default()
    })
    .await;
    let client = reqwest::Client::new();

    let mut handles = Vec::new();
    for i in 0..REQUESTS {
        let client = client.clone();
        let url = srv.url("/invoices");
        handles.push(tokio::spawn(async move {
            let res = client
                .post(url)
                .json(&tour_body(&format!("Guest {i}"), 1000))
                .send()
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::CREATED);
            let body: Value = res.json().await.unwrap();
            body["data"]["number"].as_str().unwrap().to_string()
        }));
    }

    let mut numbers = Vec::new();
    for h in handles {
        numbers.push(h.await.unwrap());
    }
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), REQUESTS as usize);
    assert_eq!(numbers.first().map(String::as_str), Some("TUR0001"));
    assert_eq!(numbers.last().map(String::as_str), Some("TUR0012"));
}
