use std::sync::Arc;

use sqlx::PgPool;

use stockbook_store::{InMemoryStockStore, PostgresStockStore, StockStore};

#[tokio::main]
async fn main() {
    stockbook_observability::init();

    let store: Arc<dyn StockStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = PgPool::connect(&url)
                .await
                .expect("failed to connect to DATABASE_URL");
            Arc::new(PostgresStockStore::new(pool))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (dev only)");
            Arc::new(InMemoryStockStore::new())
        }
    };

    let app = stockbook_api::app::build_app(store);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("failed to bind 0.0.0.0:8080");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
