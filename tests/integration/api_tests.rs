//! API integration tests
//!
//! Expects a running server with a bootstrap staff account `admin`/`admin`:
//! `BOOKLEND_AUTH__BOOTSTRAP_USERNAME=admin BOOKLEND_AUTH__BOOTSTRAP_PASSWORD=admin`

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Helper to get a staff token
async fn get_auth_token(client: &Client) -> String {
    login(client, "admin", "admin").await
}

/// Suffix keeping slugs and usernames unique across runs
fn unique_suffix() -> String {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default().to_string()
}

async fn create_reader(client: &Client, staff_token: &str, username: &str) -> String {
    let response = client
        .post(format!("{}/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", staff_token))
        .json(&json!({
            "username": username,
            "password": "reader-password"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    login(client, username, "reader-password").await
}

async fn post_action(client: &Client, token: &str, url: String) -> (u16, Value) {
    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status().as_u16();
    let body: Value = response.json().await.expect("Failed to parse response");
    (status, body)
}

async fn get_json(client: &Client, token: &str, url: String) -> Value {
    let response = client
        .get(url)
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse response")
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
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_get_profile() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let body = get_json(&client, &token, format!("{}/profile", BASE_URL)).await;
    assert_eq!(body["username"], "admin");
    assert_eq!(body["is_staff"], true);
    assert!(body["borrowed_books_count"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_list_libraries() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let body = get_json(&client, &token, format!("{}/libraries?per_page=5", BASE_URL)).await;
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
    assert_eq!(body["per_page"], 5);
}

#[tokio::test]
#[ignore]
async fn test_invalid_pagination() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/books?page=0", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/libraries", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_unknown_library() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/libraries/no-such-library/books/1/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_lending_scenario() {
    let client = Client::new();
    let staff = get_auth_token(&client).await;
    let suffix = unique_suffix();
    let slug = format!("scenario-{}", suffix);

    // Library with one book and two copies
    let response = client
        .post(format!("{}/libraries", BASE_URL))
        .header("Authorization", format!("Bearer {}", staff))
        .json(&json!({ "slug": slug, "name": "Scenario library" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", staff))
        .json(&json!({ "title": "The Pragmatic Programmer", "author": "Hunt & Thomas" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let book: Value = response.json().await.expect("Failed to parse response");
    let book_id = book["id"].as_i64().expect("No book ID");

    for _ in 0..2 {
        let response = client
            .post(format!("{}/copies", BASE_URL))
            .header("Authorization", format!("Bearer {}", staff))
            .json(&json!({ "book_id": book_id, "library_slug": slug }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);
    }

    let first = create_reader(&client, &staff, &format!("first-{}", suffix)).await;
    let second = create_reader(&client, &staff, &format!("second-{}", suffix)).await;
    let third = create_reader(&client, &staff, &format!("third-{}", suffix)).await;

    let book_url = format!("{}/libraries/{}/books/{}", BASE_URL, slug, book_id);
    let library_url = format!("{}/libraries/{}", BASE_URL, slug);
    let free_copies = |body: Value| body["free_copies_count"].as_i64();

    assert_eq!(get_json(&client, &first, book_url.clone()).await["action"], "BORROW");
    assert_eq!(free_copies(get_json(&client, &staff, library_url.clone()).await), Some(2));

    // First reader borrows
    let (status, body) = post_action(&client, &first, format!("{}/borrow", book_url)).await;
    assert_eq!(status, 200);
    assert_eq!(body["action"], "RETURN");
    assert_eq!(free_copies(get_json(&client, &staff, library_url.clone()).await), Some(1));
    assert_eq!(get_json(&client, &second, book_url.clone()).await["action"], "BORROW");

    // Second reader takes the last copy
    let (status, _) = post_action(&client, &second, format!("{}/borrow", book_url)).await;
    assert_eq!(status, 200);
    assert_eq!(free_copies(get_json(&client, &staff, library_url.clone()).await), Some(0));
    assert_eq!(get_json(&client, &third, book_url.clone()).await["action"], "NONE");

    // Nothing left for the third reader
    let (status, body) = post_action(&client, &third, format!("{}/borrow", book_url)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "NoCopyAvailable");
    assert_eq!(free_copies(get_json(&client, &staff, library_url.clone()).await), Some(0));

    // Returning without holding a copy is refused
    let (status, body) = post_action(&client, &third, format!("{}/return", book_url)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "NoBorrowedCopy");

    let profile = get_json(&client, &first, format!("{}/profile/books", BASE_URL)).await;
    assert_eq!(profile.as_array().map(Vec::len), Some(1));

    // First reader returns, third reader can now borrow
    let (status, body) = post_action(&client, &first, format!("{}/return", book_url)).await;
    assert_eq!(status, 200);
    assert_eq!(body["action"], "BORROW");
    assert_eq!(free_copies(get_json(&client, &staff, library_url.clone()).await), Some(1));
    assert_eq!(get_json(&client, &third, book_url.clone()).await["action"], "BORROW");

    let listing = get_json(
        &client,
        &second,
        format!("{}/books?book_title=pragmatic", library_url),
    )
    .await;
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["items"][0]["action"], "RETURN");

    // A library holding a borrowed copy cannot be removed
    let response = client
        .delete(library_url.clone())
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Cleanup
    let (status, _) = post_action(&client, &second, format!("{}/return", book_url)).await;
    assert_eq!(status, 200);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .delete(library_url)
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_copy_level_lending() {
    let client = Client::new();
    let staff = get_auth_token(&client).await;
    let suffix = unique_suffix();
    let slug = format!("copies-{}", suffix);

    let response = client
        .post(format!("{}/libraries", BASE_URL))
        .header("Authorization", format!("Bearer {}", staff))
        .json(&json!({ "slug": slug, "name": "Copy library" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", staff))
        .json(&json!({ "title": "Refactoring", "author": "Fowler" }))
        .send()
        .await
        .expect("Failed to send request");
    let book: Value = response.json().await.expect("Failed to parse response");
    let book_id = book["id"].as_i64().expect("No book ID");

    let response = client
        .post(format!("{}/copies", BASE_URL))
        .header("Authorization", format!("Bearer {}", staff))
        .json(&json!({ "book_id": book_id, "library_slug": slug }))
        .send()
        .await
        .expect("Failed to send request");
    let copy: Value = response.json().await.expect("Failed to parse response");
    let copy_id = copy["id"].as_i64().expect("No copy ID");
    assert!(copy["user_id"].is_null());

    let reader = create_reader(&client, &staff, &format!("copy-reader-{}", suffix)).await;
    let copy_url = format!("{}/copies/{}", BASE_URL, copy_id);

    let (status, body) = post_action(&client, &reader, format!("{}/borrow", copy_url)).await;
    assert_eq!(status, 200);
    assert_eq!(body["action"], "RETURN");

    let (status, body) = post_action(&client, &staff, format!("{}/borrow", copy_url)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "NoCopyAvailable");

    let (status, _) = post_action(&client, &staff, format!("{}/return", copy_url)).await;
    assert_eq!(status, 400);

    let details = get_json(&client, &staff, copy_url.clone()).await;
    assert!(details["borrower_username"].is_string());

    let (status, body) = post_action(&client, &reader, format!("{}/return", copy_url)).await;
    assert_eq!(status, 200);
    assert_eq!(body["action"], "BORROW");

    let response = client
        .delete(format!("{}/libraries/{}", BASE_URL, slug))
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrowers_share_one_copy() {
    const READERS: usize = 8;

    let client = Client::new();
    let staff = get_auth_token(&client).await;
    let suffix = unique_suffix();
    let slug = format!("race-{}", suffix);

    let response = client
        .post(format!("{}/libraries", BASE_URL))
        .header("Authorization", format!("Bearer {}", staff))
        .json(&json!({ "slug": slug, "name": "Race library" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", staff))
        .json(&json!({ "title": "Designing Data-Intensive Applications", "author": "Kleppmann" }))
        .send()
        .await
        .expect("Failed to send request");
    let book: Value = response.json().await.expect("Failed to parse response");
    let book_id = book["id"].as_i64().expect("No book ID");

    let response = client
        .post(format!("{}/copies", BASE_URL))
        .header("Authorization", format!("Bearer {}", staff))
        .json(&json!({ "book_id": book_id, "library_slug": slug }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let mut tokens = Vec::with_capacity(READERS);
    for i in 0..READERS {
        tokens.push(create_reader(&client, &staff, &format!("racer-{}-{}", i, suffix)).await);
    }

    let book_url = format!("{}/libraries/{}/books/{}", BASE_URL, slug, book_id);
    let handles: Vec<_> = tokens
        .into_iter()
        .map(|token| {
            let client = client.clone();
            let url = format!("{}/borrow", book_url);
            tokio::spawn(async move {
                let outcome = post_action(&client, &token, url).await;
                (token, outcome)
            })
        })
        .collect();

    let mut winners = Vec::new();
    let mut refused = 0;
    for handle in handles {
        let (token, (status, body)) = handle.await.expect("Borrow task panicked");
        match status {
            200 => winners.push(token),
            400 => {
                assert_eq!(body["error"], "NoCopyAvailable");
                refused += 1;
            }
            other => panic!("Unexpected status {}: {}", other, body),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(refused, READERS - 1);

    let library_url = format!("{}/libraries/{}", BASE_URL, slug);
    let library = get_json(&client, &staff, library_url.clone()).await;
    assert_eq!(library["free_copies_count"], 0);
    assert_eq!(library["copies_count"], 1);

    // Cleanup
    let (status, _) = post_action(&client, &winners[0], format!("{}/return", book_url)).await;
    assert_eq!(status, 200);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .delete(library_url)
        .header("Authorization", format!("Bearer {}", staff))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}
