use serde_json::{json, Value};
use streamnest_backend::api;
use streamnest_backend::bootstrap;
use streamnest_backend::config::{StreamnestConfig, StreamnestPaths};
use tempfile::{tempdir, TempDir};
use tokio::time::{sleep, Duration};

struct TestServer {
    _dir: TempDir,
    base_url: String,
    client: reqwest::Client,
    server: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn shutdown(self) {
        self.server.abort();
        let _ = self.server.await;
    }
}

fn next_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .unwrap()
        .port()
}

async fn wait_for_health(client: &reqwest::Client, base_url: &str) {
    for _ in 0..50 {
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not become healthy in time");
}

async fn spawn_server() -> TestServer {
    let dir = tempdir().expect("tempdir");
    let port = next_port();
    let config = StreamnestConfig::new(
        port,
        StreamnestPaths::from_base_dir(dir.path()).expect("paths"),
    );

    let resources = bootstrap::initialize(&config).expect("bootstrap");
    let database = resources.database.clone();
    let server = tokio::spawn(async move {
        let _ = api::serve_http(config, database).await;
    });

    let base_url = format!("http://127.0.0.1:{port}");
    let client = reqwest::Client::new();
    wait_for_health(&client, &base_url).await;

    TestServer {
        _dir: dir,
        base_url,
        client,
        server,
    }
}

/// Registers a user and returns `(user_id, api_token)`.
async fn register_user(server: &TestServer, name: &str) -> (String, String) {
    let resp = server
        .client
        .post(format!("{}/users", server.base_url))
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("register response");
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.expect("register json");
    (
        body["id"].as_str().expect("user id").to_string(),
        body["api_token"].as_str().expect("api token").to_string(),
    )
}

async fn create_item(server: &TestServer, token: &str, kind: &str, title: &str) -> String {
    let resp = server
        .client
        .post(format!("{}/items", server.base_url))
        .bearer_auth(token)
        .json(&json!({ "kind": kind, "title": title }))
        .send()
        .await
        .expect("create item response");
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.expect("item json");
    body["id"].as_str().expect("item id").to_string()
}

async fn add_comment(
    server: &TestServer,
    token: &str,
    item_id: &str,
    content: &str,
    parent: Option<&str>,
) -> Value {
    let mut payload = json!({ "content": content });
    if let Some(parent_id) = parent {
        payload["parent_comment_id"] = json!(parent_id);
    }
    let resp = server
        .client
        .post(format!("{}/items/{item_id}/comments", server.base_url))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await
        .expect("create comment response");
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.expect("comment json");
    body["comment"].clone()
}

async fn list_comments(server: &TestServer, token: &str, item_id: &str, query: &str) -> Value {
    let resp = server
        .client
        .get(format!(
            "{}/items/{item_id}/comments{query}",
            server.base_url
        ))
        .bearer_auth(token)
        .send()
        .await
        .expect("list response");
    assert_eq!(resp.status(), 200);
    resp.json().await.expect("list json")
}

fn top_level_contents(listing: &Value) -> Vec<&str> {
    listing["comments"]
        .as_array()
        .expect("comments array")
        .iter()
        .map(|c| c["content"].as_str().expect("content"))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rest_comment_thread_roundtrip() {
    let server = spawn_server().await;

    let (_alice_id, alice_token) = register_user(&server, "alice").await;
    let (_bob_id, bob_token) = register_user(&server, "bob").await;

    let item_id = create_item(&server, &alice_token, "video", "First upload").await;

    // No token, no comment.
    let resp = server
        .client
        .post(format!("{}/items/{item_id}/comments", server.base_url))
        .json(&json!({ "content": "anonymous" }))
        .send()
        .await
        .expect("unauthenticated response");
    assert_eq!(resp.status(), 401);

    let root = add_comment(&server, &alice_token, &item_id, "hello", None).await;
    let root_id = root["id"].as_str().expect("root id").to_string();
    assert!(root["parent_comment_id"].is_null());
    assert_eq!(root["author"]["name"].as_str(), Some("alice"));

    let reply = add_comment(&server, &bob_token, &item_id, "hi back", Some(&root_id)).await;
    let reply_id = reply["id"].as_str().expect("reply id").to_string();
    add_comment(&server, &alice_token, &item_id, "deep reply", Some(&reply_id)).await;

    let listing = list_comments(&server, &bob_token, &item_id, "").await;
    assert_eq!(listing["total_comments"], 1);
    assert_eq!(listing["total_pages"], 1);
    assert_eq!(listing["current_page"], 1);
    let comments = listing["comments"].as_array().expect("comments");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["id"].as_str(), Some(root_id.as_str()));
    let replies = comments[0]["replies"].as_array().expect("replies");
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["id"].as_str(), Some(reply_id.as_str()));
    assert_eq!(replies[0]["author"]["name"].as_str(), Some("bob"));
    let nested = replies[0]["replies"].as_array().expect("nested replies");
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0]["content"].as_str(), Some("deep reply"));

    // Replying under a parent from another item is rejected.
    let other_item = create_item(&server, &alice_token, "tweet", "Hot take").await;
    let resp = server
        .client
        .post(format!("{}/items/{other_item}/comments", server.base_url))
        .bearer_auth(&alice_token)
        .json(&json!({ "content": "cross-item", "parent_comment_id": root_id }))
        .send()
        .await
        .expect("cross-item response");
    assert_eq!(resp.status(), 404);

    // Blank content is rejected.
    let resp = server
        .client
        .post(format!("{}/items/{item_id}/comments", server.base_url))
        .bearer_auth(&alice_token)
        .json(&json!({ "content": "   " }))
        .send()
        .await
        .expect("blank content response");
    assert_eq!(resp.status(), 400);

    // Only the author may delete; the thread is untouched by the attempt.
    let resp = server
        .client
        .delete(format!("{}/comments/{root_id}", server.base_url))
        .bearer_auth(&bob_token)
        .send()
        .await
        .expect("forbidden delete response");
    assert_eq!(resp.status(), 403);
    let listing = list_comments(&server, &alice_token, &item_id, "").await;
    assert_eq!(listing["total_comments"], 1);

    // The author's delete takes the entire subtree with it.
    let resp = server
        .client
        .delete(format!("{}/comments/{root_id}", server.base_url))
        .bearer_auth(&alice_token)
        .send()
        .await
        .expect("delete response");
    assert_eq!(resp.status(), 200);
    let listing = list_comments(&server, &alice_token, &item_id, "").await;
    assert_eq!(listing["total_comments"], 0);
    assert!(listing["comments"].as_array().unwrap().is_empty());

    let resp = server
        .client
        .delete(format!("{}/comments/{root_id}", server.base_url))
        .bearer_auth(&alice_token)
        .send()
        .await
        .expect("double delete response");
    assert_eq!(resp.status(), 404);

    // Unknown items list as empty pages, not errors.
    let listing = list_comments(&server, &alice_token, "nonexistent-id", "").await;
    assert_eq!(listing["total_comments"], 0);
    assert!(listing["comments"].as_array().unwrap().is_empty());

    // The item's derived comment count reflects the deletions.
    let resp = server
        .client
        .get(format!("{}/items/{item_id}", server.base_url))
        .send()
        .await
        .expect("item response");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("item json");
    assert_eq!(body["comment_count"], 0);

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn comment_pages_are_newest_first_and_disjoint() {
    let server = spawn_server().await;

    let (_user_id, token) = register_user(&server, "carol").await;
    let item_id = create_item(&server, &token, "tweet", "Thread me").await;

    for idx in 1..=7 {
        add_comment(&server, &token, &item_id, &format!("c{idx}"), None).await;
    }

    let page1 = list_comments(&server, &token, &item_id, "?page=1&page_size=3").await;
    assert_eq!(page1["total_comments"], 7);
    assert_eq!(page1["total_pages"], 3);
    assert_eq!(top_level_contents(&page1), vec!["c7", "c6", "c5"]);

    let page2 = list_comments(&server, &token, &item_id, "?page=2&page_size=3").await;
    assert_eq!(top_level_contents(&page2), vec!["c4", "c3", "c2"]);

    let page3 = list_comments(&server, &token, &item_id, "?page=3&page_size=3").await;
    assert_eq!(page3["current_page"], 3);
    assert_eq!(top_level_contents(&page3), vec!["c1"]);

    let beyond = list_comments(&server, &token, &item_id, "?page=4&page_size=3").await;
    assert!(beyond["comments"].as_array().unwrap().is_empty());
    assert_eq!(beyond["total_comments"], 7);

    server.shutdown().await;
}
