//! Product listing integration tests for pos-service.

mod common;

use common::TestApp;
use reqwest::Client;

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn list_products_defaults_to_active_only() {
    let app = TestApp::spawn().await;
    app.seed_product("espresso", "Espresso", "Coffee", "2.50", true)
        .await;
    app.seed_product("retired", "Retired Blend", "Coffee", "3.00", false)
        .await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/api/products", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["ok"], true);

    let items = body["items"].as_array().expect("items missing");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "espresso");
    assert_eq!(items[0]["isActive"], true);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn active_zero_lifts_the_filter() {
    let app = TestApp::spawn().await;
    app.seed_product("espresso", "Espresso", "Coffee", "2.50", true)
        .await;
    app.seed_product("retired", "Retired Blend", "Coffee", "3.00", false)
        .await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/api/products?active=0", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let items = body["items"].as_array().expect("items missing");
    assert_eq!(items.len(), 2);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn products_are_listed_newest_first() {
    let app = TestApp::spawn().await;
    app.seed_product("older", "Older Product", "Tea", "2.00", true)
        .await;
    sqlx::query("UPDATE products SET created_at = NOW() - INTERVAL '1 day' WHERE id = 'older'")
        .execute(app.db.pool())
        .await
        .expect("Failed to backdate product");
    app.seed_product("newer", "Newer Product", "Tea", "2.20", true)
        .await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/api/products", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let items = body["items"].as_array().expect("items missing");
    assert_eq!(items[0]["id"], "newer");
    assert_eq!(items[1]["id"], "older");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn empty_catalog_lists_nothing() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/api/products", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["items"].as_array().expect("items missing").len(), 0);

    app.cleanup().await;
}
