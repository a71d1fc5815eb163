use notebox::auth::{PasswordHasher, TokenService};
use notebox::configuration::{SigningSecret, TableSettings};
use notebox::startup::{run, AppState};
use notebox::store::{MemoryStore, TableRegistry};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let tables = TableSettings::default();
    let store = Arc::new(MemoryStore::new(TableRegistry::from_settings(&tables)));
    let state = AppState::new(
        store,
        &tables,
        PasswordHasher::new(4),
        TokenService::new(&SigningSecret::configured("notes-integration-secret")),
    );

    let server = run(listener, state).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

/// A registered, logged-in user
pub struct TestUser {
    pub user_id: String,
    pub token: String,
}

impl TestApp {
    async fn signup(&self, email: &str) -> TestUser {
        let credentials = json!({ "email": email, "password": "NotePass123" });

        self.client
            .post(&format!("{}/auth/register", &self.address))
            .json(&credentials)
            .send()
            .await
            .expect("Failed to execute request.");

        let body: Value = self
            .client
            .post(&format!("{}/auth/login", &self.address))
            .json(&credentials)
            .send()
            .await
            .expect("Failed to execute request.")
            .json()
            .await
            .unwrap();

        TestUser {
            user_id: body["data"]["user"]["userId"].as_str().unwrap().to_string(),
            token: body["data"]["token"].as_str().unwrap().to_string(),
        }
    }

    async fn create_note(&self, user: &TestUser, body: Value) -> reqwest::Response {
        self.client
            .post(&format!("{}/notes", &self.address))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn list_notes(&self, user: &TestUser) -> Vec<Value> {
        let body: Value = self
            .client
            .get(&format!("{}/notes", &self.address))
            .bearer_auth(&user.token)
            .send()
            .await
            .expect("Failed to execute request.")
            .json()
            .await
            .unwrap();
        body["data"].as_array().unwrap().clone()
    }

    async fn update_note(&self, user: &TestUser, note_id: &str, body: Value) -> reqwest::Response {
        self.client
            .put(&format!("{}/notes/{}", &self.address, note_id))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn delete_note(&self, user: &TestUser, note_id: &str) -> reqwest::Response {
        self.client
            .delete(&format!("{}/notes/{}", &self.address, note_id))
            .bearer_auth(&user.token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

#[tokio::test]
async fn full_note_lifecycle() {
    let app = spawn_app();
    let user = app.signup("a@x.com").await;

    let duplicate = app
        .client
        .post(&format!("{}/auth/register", &app.address))
        .json(&json!({ "email": "a@x.com", "password": "OtherPass123" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(409, duplicate.status().as_u16());

    let wrong_login = app
        .client
        .post(&format!("{}/auth/login", &app.address))
        .json(&json!({ "email": "a@x.com", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, wrong_login.status().as_u16());

    let response = app
        .create_note(&user, json!({ "title": "T", "content": "C" }))
        .await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Note created successfully");
    let note = body["data"].clone();
    let note_id = note["noteId"].as_str().unwrap().to_string();
    assert_eq!(note["userId"], user.user_id.as_str());
    assert_eq!(note["createdAt"], note["updatedAt"]);

    let notes = app.list_notes(&user).await;
    assert_eq!(1, notes.len());
    assert_eq!(notes[0]["noteId"], note_id.as_str());

    tokio::time::sleep(Duration::from_millis(5)).await;

    let response = app
        .update_note(&user, &note_id, json!({ "title": "T2" }))
        .await;
    assert_eq!(200, response.status().as_u16());

    let updated: Value = response.json().await.unwrap();
    let updated = &updated["data"];
    assert_eq!(updated["title"], "T2");
    assert_eq!(updated["content"], "C");
    assert_eq!(updated["createdAt"], note["createdAt"]);
    assert!(updated["updatedAt"].as_str().unwrap() > note["createdAt"].as_str().unwrap());

    let response = app.delete_note(&user, &note_id).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Note deleted successfully");
    assert!(body.get("data").is_none());

    assert!(app.list_notes(&user).await.is_empty());
}

#[tokio::test]
async fn notes_require_a_token() {
    let app = spawn_app();

    let requests = vec![
        app.client.get(&format!("{}/notes", &app.address)),
        app.client
            .post(&format!("{}/notes", &app.address))
            .json(&json!({ "title": "T" })),
        app.client.put(&format!("{}/notes/some-id", &app.address)),
        app.client.delete(&format!("{}/notes/some-id", &app.address)),
    ];

    for request in requests {
        let response = request.send().await.expect("Failed to execute request.");
        assert_eq!(401, response.status().as_u16());
    }
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let app = spawn_app();

    let response = app
        .client
        .get(&format!("{}/notes", &app.address))
        .bearer_auth("garbage")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn create_ignores_client_supplied_owner() {
    let app = spawn_app();
    let alice = app.signup("alice@x.com").await;
    let bob = app.signup("bob@x.com").await;

    let response = app
        .create_note(&alice, json!({ "title": "Mine", "userId": bob.user_id }))
        .await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["userId"], alice.user_id.as_str());

    assert!(app.list_notes(&bob).await.is_empty());
    assert_eq!(1, app.list_notes(&alice).await.len());
}

#[tokio::test]
async fn create_without_title_is_rejected() {
    let app = spawn_app();
    let user = app.signup("a@x.com").await;

    for body in [json!({ "content": "C" }), json!({ "title": "   " })] {
        let response = app.create_note(&user, body).await;
        assert_eq!(400, response.status().as_u16());
    }
}

#[tokio::test]
async fn list_returns_newest_first() {
    let app = spawn_app();
    let user = app.signup("a@x.com").await;

    for title in ["first", "second", "third"] {
        app.create_note(&user, json!({ "title": title })).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let titles: Vec<String> = app
        .list_notes(&user)
        .await
        .iter()
        .map(|n| n["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn other_users_note_looks_missing_and_is_unchanged() {
    let app = spawn_app();
    let alice = app.signup("alice@x.com").await;
    let bob = app.signup("bob@x.com").await;

    let body: Value = app
        .create_note(&alice, json!({ "title": "Private", "content": "secret" }))
        .await
        .json()
        .await
        .unwrap();
    let note_id = body["data"]["noteId"].as_str().unwrap().to_string();

    let foreign_update = app
        .update_note(&bob, &note_id, json!({ "title": "Hacked" }))
        .await;
    let missing_update = app
        .update_note(&bob, "no-such-note", json!({ "title": "Hacked" }))
        .await;
    assert_eq!(404, foreign_update.status().as_u16());
    assert_eq!(404, missing_update.status().as_u16());

    let a: Value = foreign_update.json().await.unwrap();
    let b: Value = missing_update.json().await.unwrap();
    assert_eq!(a, b);

    let foreign_get = app
        .client
        .get(&format!("{}/notes/{}", &app.address, note_id))
        .bearer_auth(&bob.token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, foreign_get.status().as_u16());

    let foreign_delete = app.delete_note(&bob, &note_id).await;
    assert_eq!(404, foreign_delete.status().as_u16());

    let notes = app.list_notes(&alice).await;
    assert_eq!(1, notes.len());
    assert_eq!(notes[0]["title"], "Private");
    assert_eq!(notes[0]["content"], "secret");
}

#[tokio::test]
async fn update_cannot_reassign_owner() {
    let app = spawn_app();
    let alice = app.signup("alice@x.com").await;
    let bob = app.signup("bob@x.com").await;

    let body: Value = app
        .create_note(&alice, json!({ "title": "Mine" }))
        .await
        .json()
        .await
        .unwrap();
    let note_id = body["data"]["noteId"].as_str().unwrap().to_string();

    let response = app
        .update_note(&alice, &note_id, json!({ "userId": bob.user_id }))
        .await;
    assert_eq!(400, response.status().as_u16());

    assert!(app.list_notes(&bob).await.is_empty());

    let notes = app.list_notes(&alice).await;
    assert_eq!(notes[0]["userId"], alice.user_id.as_str());
}

#[tokio::test]
async fn deleted_note_is_gone() {
    let app = spawn_app();
    let user = app.signup("a@x.com").await;

    let body: Value = app
        .create_note(&user, json!({ "title": "T" }))
        .await
        .json()
        .await
        .unwrap();
    let note_id = body["data"]["noteId"].as_str().unwrap().to_string();

    assert_eq!(200, app.delete_note(&user, &note_id).await.status().as_u16());
    assert_eq!(404, app.delete_note(&user, &note_id).await.status().as_u16());
    assert_eq!(
        404,
        app.update_note(&user, &note_id, json!({ "title": "T2" }))
            .await
            .status()
            .as_u16()
    );
}
