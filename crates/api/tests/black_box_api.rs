use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use stockbook_core::{ProductId, UserId};
use stockbook_store::{InMemoryStockStore, ProductSeed, StockStore};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(store: Arc<InMemoryStockStore>) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = stockbook_api::app::build_app(store as Arc<dyn StockStore>);
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
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct Seeded {
    store: Arc<InMemoryStockStore>,
    user: UserId,
}

impl Seeded {
    fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStockStore::new()),
            user: UserId::new(),
        }
    }

    fn product(&self, name: &str, qty: f64) -> ProductId {
        let id = ProductId::new();
        self.store.insert_product(
            ProductSeed::new(id, name)
                .owned_by(self.user)
                .with_stock_quantity(qty),
        );
        id
    }
}

#[tokio::test]
async fn manufacturing_order_success_contract() {
    let seeded = Seeded::new();
    let flour = seeded.product("flour", 10.0);
    let bread = seeded.product("bread", 0.0);
    let server = TestServer::spawn(Arc::clone(&seeded.store)).await;

    let res = reqwest::Client::new()
        .post(format!("{}/manufacturing-orders", server.base_url))
        .header("x-user-id", seeded.user.to_string())
        .json(&json!({
            "finishedProductId": bread.to_string(),
            "outputQty": 2.0,
            "outputUnit": "pcs",
            "components": [{ "productId": flour.to_string(), "qty": 4.0 }],
            "notes": "morning batch",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["finishedProductName"], json!("bread"));
    assert_eq!(body["data"]["outputQty"], json!(2.0));
    assert_eq!(body["data"]["componentsCount"], json!(1));

    assert_eq!(seeded.store.stored_quantity(flour, "stock_quantity"), Some(6.0));
    assert_eq!(seeded.store.stored_quantity(bread, "stock_quantity"), Some(2.0));
}

#[tokio::test]
async fn insufficient_stock_reports_every_component() {
    let seeded = Seeded::new();
    let flour = seeded.product("flour", 1.0);
    let sugar = seeded.product("sugar", 1.0);
    let cake = seeded.product("cake", 0.0);
    let server = TestServer::spawn(Arc::clone(&seeded.store)).await;

    let res = reqwest::Client::new()
        .post(format!("{}/manufacturing-orders", server.base_url))
        .header("x-user-id", seeded.user.to_string())
        .json(&json!({
            "finishedProductId": cake.to_string(),
            "outputQty": 1.0,
            "components": [
                { "productId": flour.to_string(), "qty": 5.0 },
                { "productId": sugar.to_string(), "qty": 3.0 },
            ],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    let insufficient = body["meta"]["insufficient"].as_array().unwrap();
    assert_eq!(insufficient.len(), 2);
    assert!(insufficient[0].get("available").is_some());
    assert!(insufficient[0].get("requested").is_some());

    // Full no-op.
    assert_eq!(seeded.store.stored_quantity(flour, "stock_quantity"), Some(1.0));
    assert_eq!(seeded.store.stored_quantity(sugar, "stock_quantity"), Some(1.0));
}

#[tokio::test]
async fn self_referential_order_is_a_validation_error() {
    let seeded = Seeded::new();
    let bread = seeded.product("bread", 5.0);
    let server = TestServer::spawn(Arc::clone(&seeded.store)).await;

    let res = reqwest::Client::new()
        .post(format!("{}/manufacturing-orders", server.base_url))
        .header("x-user-id", seeded.user.to_string())
        .json(&json!({
            "finishedProductId": bread.to_string(),
            "outputQty": 1.0,
            "components": [{ "productId": bread.to_string(), "qty": 1.0 }],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("cannot be one of its own components")
    );
}

#[tokio::test]
async fn unknown_products_are_listed_in_meta() {
    let seeded = Seeded::new();
    let bread = seeded.product("bread", 0.0);
    let ghost = ProductId::new();
    let server = TestServer::spawn(Arc::clone(&seeded.store)).await;

    let res = reqwest::Client::new()
        .post(format!("{}/manufacturing-orders", server.base_url))
        .header("x-user-id", seeded.user.to_string())
        .json(&json!({
            "finishedProductId": bread.to_string(),
            "outputQty": 1.0,
            "components": [{ "productId": ghost.to_string(), "qty": 1.0 }],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    let missing = body["meta"]["missingProductIds"].as_array().unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0], json!(ghost.to_string()));
}

#[tokio::test]
async fn requests_without_user_header_are_rejected() {
    let seeded = Seeded::new();
    let server = TestServer::spawn(Arc::clone(&seeded.store)).await;

    let res = reqwest::Client::new()
        .post(format!("{}/stock/adjust", server.base_url))
        .json(&json!({ "productId": ProductId::new().to_string(), "delta": 1.0 }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn stock_adjust_roundtrip() {
    let seeded = Seeded::new();
    let rice = seeded.product("rice", 5.0);
    let server = TestServer::spawn(Arc::clone(&seeded.store)).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/stock/adjust", server.base_url))
        .header("x-user-id", seeded.user.to_string())
        .json(&json!({ "productId": rice.to_string(), "delta": -2.0, "note": "spill" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["newQuantity"], json!(3.0));
}
