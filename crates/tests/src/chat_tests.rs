use crate::fixtures::test_app::TestApp;
use serde_json::json;

#[tokio::test]
async fn actions_before_authorize_are_refused() {
    let app = TestApp::spawn().await;
    let host = app.seed_user("host", "Hana");
    let meeting = app.create_meeting(&host, 0).await;

    let mut ws = app.chat(&meeting).await;
    ws.send(json!({ "action": "CREATE_MESSAGE", "message": "hi" })).await;
    let event = ws.next_event().await;
    assert_eq!(event["action"], "ERROR");
    assert_eq!(event["payload"], "You are not authorized.");

    ws.send(json!({ "action": "AUTHORIZE", "token": "bogus" })).await;
    let event = ws.next_event().await;
    assert_eq!(event["payload"], "Invalid token.");

    let history = app.state.chat.history(&meeting, 0).await.unwrap();
    assert!(history.messages.is_empty());
}

#[tokio::test]
async fn non_member_cannot_join_chat() {
    let app = TestApp::spawn().await;
    let host = app.seed_user("host", "Hana");
    let outsider = app.seed_user("x", "Xan");
    let meeting = app.create_meeting(&host, 0).await;

    let mut ws = app.chat(&meeting).await;
    ws.send(json!({ "action": "AUTHORIZE", "token": outsider.access_token })).await;
    let event = ws.next_event().await;
    assert_eq!(event["action"], "ERROR");
    assert_eq!(event["payload"], "You are not in this meeting!");
    assert_eq!(app.state.registry.session_count(&meeting), 0);
}

#[tokio::test]
async fn authorize_greets_with_roster_and_history() {
    let app = TestApp::spawn().await;
    let host = app.seed_user("host", "Hana");
    let meeting = app.create_meeting(&host, 0).await;

    let mut ws = app.chat(&meeting).await;
    ws.send(json!({ "action": "AUTHORIZE", "token": host.access_token })).await;

    let members = ws.next_event().await;
    assert_eq!(members["action"], "MEMBERS");
    assert_eq!(members["payload"], json!([{ "userId": "host", "name": "Hana" }]));

    let history = ws.next_event().await;
    assert_eq!(history["action"], "HISTORY");
    assert_eq!(history["payload"]["page"], 0);
    assert_eq!(history["payload"]["pageCount"], 0);
    assert_eq!(history["payload"]["messages"], json!([]));
}

#[tokio::test]
async fn messages_fan_out_to_the_room() {
    let app = TestApp::spawn().await;
    let host = app.seed_user("host", "Hana");
    let b = app.seed_user("b", "Ben");
    let meeting = app.create_meeting(&host, 0).await;
    app.join(&b, &meeting).await;

    let mut host_ws = app.chat(&meeting).await;
    host_ws.authorize(&host.access_token).await;
    let mut b_ws = app.chat(&meeting).await;
    b_ws.authorize(&b.access_token).await;
    // Host sees the refreshed roster.
    assert_eq!(host_ws.next_event().await["action"], "MEMBERS");

    b_ws.send(json!({ "action": "CREATE_MESSAGE", "message": "hello all" })).await;

    for ws in [&mut host_ws, &mut b_ws] {
        let event = ws.next_event().await;
        assert_eq!(event["action"], "NEW_MESSAGE");
        assert_eq!(event["payload"]["message"], "hello all");
        assert_eq!(event["payload"]["userId"], "b");
        assert_eq!(event["payload"]["meetingId"], meeting.as_str());
        assert!(event["payload"]["date"].is_i64());
    }
}

#[tokio::test]
async fn edit_and_delete_permissions() {
    let app = TestApp::spawn().await;
    let host = app.seed_user("host", "Hana");
    let b = app.seed_user("b", "Ben");
    let c = app.seed_user("c", "Cy");
    let meeting = app.create_meeting(&host, 0).await;
    app.join(&b, &meeting).await;
    app.join(&c, &meeting).await;

    let mut host_ws = app.chat(&meeting).await;
    host_ws.authorize(&host.access_token).await;
    let mut b_ws = app.chat(&meeting).await;
    b_ws.authorize(&b.access_token).await;
    let mut c_ws = app.chat(&meeting).await;
    c_ws.authorize(&c.access_token).await;
    // Roster refreshes from the later joins.
    host_ws.next_event().await;
    host_ws.next_event().await;
    b_ws.next_event().await;

    b_ws.send(json!({ "action": "CREATE_MESSAGE", "message": "draft" })).await;
    let id = b_ws.next_event().await["payload"]["messageId"]
        .as_str()
        .unwrap()
        .to_string();
    host_ws.next_event().await;
    c_ws.next_event().await;

    // C is neither author nor moderator.
    c_ws.send(json!({ "action": "EDIT_MESSAGE", "id": id, "contents": "mine now" })).await;
    assert_eq!(
        c_ws.next_event().await["payload"],
        "You do not have permission to edit this message."
    );
    c_ws.send(json!({ "action": "DELETE_MESSAGE", "id": id })).await;
    assert_eq!(
        c_ws.next_event().await["payload"],
        "You do not have permission to delete this message."
    );
    b_ws.expect_silence().await;

    b_ws.send(json!({ "action": "EDIT_MESSAGE", "id": id, "contents": "final" })).await;
    let event = b_ws.next_event().await;
    assert_eq!(event["action"], "MESSAGE_UPDATED");
    assert_eq!(event["payload"], json!({ "messageId": id, "newMessage": "final" }));
    host_ws.next_event().await;
    c_ws.next_event().await;

    // The host moderates any message.
    host_ws.send(json!({ "action": "DELETE_MESSAGE", "id": id })).await;
    for ws in [&mut host_ws, &mut b_ws, &mut c_ws] {
        let event = ws.next_event().await;
        assert_eq!(event["action"], "MESSAGE_DELETED");
        assert_eq!(event["payload"]["messageId"], id.as_str());
    }
}

#[tokio::test]
async fn history_pages_are_fifty_newest_first() {
    let app = TestApp::spawn().await;
    let host = app.seed_user("host", "Hana");
    let meeting = app.create_meeting(&host, 0).await;
    for i in 0..120 {
        app.state
            .chat
            .create(&meeting, "host", &format!("message {i}"))
            .await
            .unwrap();
    }

    let mut ws = app.chat(&meeting).await;
    ws.authorize(&host.access_token).await;

    ws.send(json!({ "action": "RECEIVE_HISTORY", "page": 0 })).await;
    let event = ws.next_event().await;
    assert_eq!(event["action"], "HISTORY");
    assert_eq!(event["payload"]["pageCount"], 2);
    let messages = event["payload"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 50);
    assert_eq!(messages[0]["message"], "message 119");

    ws.send(json!({ "action": "RECEIVE_HISTORY", "page": "2" })).await;
    let event = ws.next_event().await;
    assert_eq!(event["payload"]["page"], 2);
    assert_eq!(event["payload"]["messages"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn closing_socket_leaves_room() {
    let app = TestApp::spawn().await;
    let host = app.seed_user("host", "Hana");
    let meeting = app.create_meeting(&host, 0).await;

    let mut ws = app.chat(&meeting).await;
    ws.authorize(&host.access_token).await;
    assert_eq!(app.state.registry.session_count(&meeting), 1);

    ws.close().await;
    for _ in 0..50 {
        if app.state.registry.room_count() == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(app.state.registry.room_count(), 0);
}
