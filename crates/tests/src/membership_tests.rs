use burrow_db::models::MeetingRole;

use crate::fixtures::test_app::{TestApp, meeting_body, tomorrow_at};
use serde_json::{Value, json};

#[tokio::test]
async fn create_meeting_seats_host() {
    let app = TestApp::spawn().await;
    let host = app.seed_user("host", "Hana");

    let resp = app
        .auth_post("/api/meeting", &host.access_token)
        .json(&meeting_body("Algorithms", 4))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["id"].as_str().unwrap().len(), 8);
    assert_eq!(json["owner_id"], "host");
    assert_eq!(json["joined"], 1);
    assert_eq!(json["waiting"], 0);
    assert_eq!(json["membership"]["role"], "HOST");
    assert_eq!(json["membership"]["status"], "JOINED");
}

#[tokio::test]
async fn invalid_meeting_is_rejected() {
    let app = TestApp::spawn().await;
    let host = app.seed_user("host", "Hana");

    let mut body = meeting_body("Too short", 4);
    body["end_time"] = json!(body["beginning_time"].as_i64().unwrap() + 60_000);
    let resp = app
        .auth_post("/api/meeting", &host.access_token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let mut body = meeting_body("Crowded", 4);
    body["capacity"] = json!(500);
    let resp = app
        .auth_post("/api/meeting", &host.access_token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let mut body = meeting_body("Past", 4);
    body["beginning_time"] = json!(tomorrow_at(10) - 3 * 24 * 60 * 60 * 1000);
    let resp = app
        .auth_post("/api/meeting", &host.access_token)
        .json(&body)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "validation");
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/meeting/whatever/join"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = app
        .auth_post("/api/meeting/whatever/join", "not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn unknown_meeting_is_not_found() {
    let app = TestApp::spawn().await;
    let user = app.seed_user("u1", "One");

    assert_eq!(app.join(&user, "missing1").await.status().as_u16(), 404);
    let resp = app
        .auth_get("/api/meeting/missing1", &user.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn waitlist_promotion_end_to_end() {
    let app = TestApp::spawn().await;
    let a = app.seed_user("a", "Ana");
    let b = app.seed_user("b", "Ben");
    let c = app.seed_user("c", "Cy");
    let meeting = app.create_meeting(&a, 1).await;

    let resp = app.join(&b, &meeting).await;
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "JOINED");

    let json: Value = app.join(&c, &meeting).await.json().await.unwrap();
    assert_eq!(json["status"], "WAITLISTED");

    let resp = app.leave(&b, &meeting).await;
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["left"], true);
    assert_eq!(json["promoted"]["user_id"], "c");

    assert_eq!(app.status_of(&b, &meeting).await.as_deref(), Some("LEFT"));
    assert_eq!(app.status_of(&c, &meeting).await.as_deref(), Some("JOINED"));
}

#[tokio::test]
async fn join_and_leave_conflicts() {
    let app = TestApp::spawn().await;
    let host = app.seed_user("host", "Hana");
    let b = app.seed_user("b", "Ben");
    let meeting = app.create_meeting(&host, 0).await;

    assert_eq!(app.join(&b, &meeting).await.status().as_u16(), 200);
    assert_eq!(app.join(&b, &meeting).await.status().as_u16(), 409);

    assert_eq!(app.leave(&b, &meeting).await.status().as_u16(), 200);
    assert_eq!(app.leave(&b, &meeting).await.status().as_u16(), 404);

    // Host may never leave.
    assert_eq!(app.leave(&host, &meeting).await.status().as_u16(), 409);
    assert_eq!(app.status_of(&host, &meeting).await.as_deref(), Some("JOINED"));
}

#[tokio::test]
async fn ban_blocks_join_until_unban() {
    let app = TestApp::spawn().await;
    let host = app.seed_user("host", "Hana");
    let b = app.seed_user("b", "Ben");
    let c = app.seed_user("c", "Cy");
    let meeting = app.create_meeting(&host, 0).await;
    app.join(&b, &meeting).await;
    app.join(&c, &meeting).await;

    // Members cannot moderate.
    let resp = app
        .auth_post(&format!("/api/meeting/{meeting}/ban/b"), &c.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_post(&format!("/api/meeting/{meeting}/ban/b"), &host.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "BANNED");
    assert_eq!(json["role"], "MEMBER");

    assert_eq!(app.join(&b, &meeting).await.status().as_u16(), 403);

    let resp = app
        .auth_post(&format!("/api/meeting/{meeting}/unban/b"), &host.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "LEFT");

    assert_eq!(app.join(&b, &meeting).await.status().as_u16(), 200);
}

#[tokio::test]
async fn moderator_cannot_ban_host() {
    let app = TestApp::spawn().await;
    let host = app.seed_user("host", "Hana");
    let moderator = app.seed_user("mod", "Mo");
    let meeting = app.create_meeting(&host, 0).await;
    app.join(&moderator, &meeting).await;
    app.set_role(&moderator, &meeting, MeetingRole::Moderator).await;

    let resp = app
        .auth_post(&format!("/api/meeting/{meeting}/ban/host"), &moderator.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
    assert_eq!(app.status_of(&host, &meeting).await.as_deref(), Some("JOINED"));

    let resp = app
        .auth_post(&format!("/api/meeting/{meeting}/unban/host"), &moderator.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
    assert_eq!(app.status_of(&host, &meeting).await.as_deref(), Some("JOINED"));
}

#[tokio::test]
async fn attendees_visible_to_joined_members_only() {
    let app = TestApp::spawn().await;
    let host = app.seed_user("host", "Hana");
    let b = app.seed_user("b", "Ben");
    let outsider = app.seed_user("x", "Xan");
    let meeting = app.create_meeting(&host, 0).await;
    app.join(&b, &meeting).await;

    let path = format!("/api/meeting/{meeting}/attendees");
    let resp = app.auth_get(&path, &outsider.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app.auth_get(&path, &b.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let attendees = json.as_array().unwrap();
    assert_eq!(attendees.len(), 2);
    assert!(
        attendees
            .iter()
            .any(|a| a["user"]["name"] == "Hana" && a["membership"]["role"] == "HOST")
    );
}
