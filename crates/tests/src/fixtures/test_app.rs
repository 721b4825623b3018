use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use burrow_api::{build_router, state::AppState};
use burrow_config::{Settings, StorageBackend};
use burrow_db::models::{MeetingRole, User};
use burrow_services::store::MembershipStore;
use burrow_services::{MemoryStore, Stores};
use serde_json::{Value, json};

use super::chat_client::ChatClient;

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;
const HOUR_MILLIS: i64 = 60 * 60 * 1000;

pub struct TestUser {
    pub id: String,
    pub access_token: String,
}

/// The full router on an ephemeral port, backed by the in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let mut settings = Settings::default();
        settings.database.backend = StorageBackend::Memory;
        settings.jwt.secret = "integration-test-secret".to_string();

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(settings, Stores::memory(store.clone()));
        let app = build_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server");
        });

        Self {
            addr,
            client: reqwest::Client::new(),
            state,
            store,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn seed_user(&self, id: &str, name: &str) -> TestUser {
        self.store.add_user(User {
            id: id.to_string(),
            name: name.to_string(),
            email: Some(format!("{id}@example.com")),
        });
        let access_token = self
            .state
            .auth
            .issue_access_token(id)
            .expect("issue token");
        TestUser {
            id: id.to_string(),
            access_token,
        }
    }

    pub fn auth_get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn auth_post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token)
    }

    /// Creates a one hour meeting tomorrow and returns its id.
    pub async fn create_meeting(&self, host: &TestUser, capacity: u32) -> String {
        let resp = self
            .auth_post("/api/meeting", &host.access_token)
            .json(&meeting_body("Study group", capacity))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201, "Failed to create meeting");
        let meeting: Value = resp.json().await.unwrap();
        meeting["id"].as_str().unwrap().to_string()
    }

    pub async fn join(&self, user: &TestUser, meeting_id: &str) -> reqwest::Response {
        self.auth_post(&format!("/api/meeting/{meeting_id}/join"), &user.access_token)
            .send()
            .await
            .unwrap()
    }

    pub async fn leave(&self, user: &TestUser, meeting_id: &str) -> reqwest::Response {
        self.auth_post(&format!("/api/meeting/{meeting_id}/leave"), &user.access_token)
            .send()
            .await
            .unwrap()
    }

    /// Viewer's own membership as reported by the meeting overview.
    pub async fn status_of(&self, user: &TestUser, meeting_id: &str) -> Option<String> {
        let resp = self
            .auth_get(&format!("/api/meeting/{meeting_id}"), &user.access_token)
            .send()
            .await
            .unwrap();
        let meeting: Value = resp.json().await.unwrap();
        meeting["membership"]["status"].as_str().map(str::to_string)
    }

    /// Changes a member's role directly in the store.
    pub async fn set_role(&self, user: &TestUser, meeting_id: &str, role: MeetingRole) {
        let mut row = MembershipStore::get(&*self.store, meeting_id, &user.id)
            .await
            .unwrap()
            .expect("membership row");
        row.role = role;
        MembershipStore::upsert(&*self.store, &row).await.unwrap();
    }

    pub async fn chat(&self, meeting_id: &str) -> ChatClient {
        ChatClient::connect(&format!("ws://{}/api/meeting/{}/chat", self.addr, meeting_id)).await
    }
}

pub fn meeting_body(title: &str, capacity: u32) -> Value {
    let begin = tomorrow_at(10);
    json!({
        "title": title,
        "description": "Weekly session",
        "location": "Library",
        "tags": ["study"],
        "capacity": capacity,
        "beginning_time": begin,
        "end_time": begin + HOUR_MILLIS,
    })
}

/// Epoch millis for the given UTC hour tomorrow.
pub fn tomorrow_at(hour: i64) -> i64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_millis() as i64;
    (now / DAY_MILLIS + 1) * DAY_MILLIS + hour * HOUR_MILLIS
}
