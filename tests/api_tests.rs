use series_catalog::{
    AppConfig, AppState, MemoryRepository, create_router,
    models::User,
    repository::{Repository, RepositoryState},
};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

const ADMIN_ID: Uuid = Uuid::from_u128(1);

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new());
    repo.create_user(User {
        id: ADMIN_ID,
        email: "admin@library.test".to_string(),
        role: "admin".to_string(),
        access_level: 10,
    })
    .await
    .unwrap();

    let state = AppState {
        repo: repo as RepositoryState,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

fn client() -> reqwest::Client {
    // Redirects are part of the contract under test; never follow them.
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let response = client()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_series_lifecycle() {
    let app = spawn_app().await;
    let client = client();
    let admin = ADMIN_ID.to_string();

    // Create
    let response = client
        .post(format!("{}/series", app.address))
        .header("x-user-id", &admin)
        .form(&[("name", "Foo"), ("accessLevel", "1")])
        .send()
        .await
        .expect("post fail");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["locals"]["notice"]["message"], "Series saved!");
    let id = body["locals"]["series"]["id"].as_str().unwrap().to_string();

    // Show
    let response = client
        .get(format!("{}/series/{}", app.address, id))
        .header("x-user-id", &admin)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["template"], "series/show");
    assert_eq!(body["locals"]["series"]["name"], "Foo");

    // Delete
    let response = client
        .delete(format!("{}/series/{}", app.address, id))
        .header("x-user-id", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(response.headers()["location"], "/series");

    // Gone from the listing.
    let response = client
        .get(format!("{}/series", app.address))
        .header("x-user-id", &admin)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert!(body["locals"]["series"].as_array().unwrap().is_empty());
}
