//! Session tests against a scripted in-process gateway.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

use mirai_adapter_api_http::{ConnectionState, Friend, Group, GroupMessage, MiraiBot, MiraiConfig};
use mirai_core::ApiError;

const ACCOUNT: i64 = 10001;

type Ws = WebSocketStream<TcpStream>;

/// Accepts one connection and runs `script` on it.
async fn gateway<F, Fut>(script: F) -> SocketAddr
where
    F: FnOnce(Ws) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        script(ws).await;
    });
    addr
}

/// Accepts connections until the test ends, running `script` on each with its index.
async fn gateway_each<F, Fut>(mut script: F) -> SocketAddr
where
    F: FnMut(usize, Ws) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut index = 0;
        while let Ok((stream, _)) = listener.accept().await {
            let Ok(ws) = accept_async(stream).await else {
                continue;
            };
            tokio::spawn(script(index, ws));
            index += 1;
        }
    });
    addr
}

fn bot_for(addr: SocketAddr) -> Arc<MiraiBot> {
    bot_with_attempts(addr, 1)
}

fn bot_with_attempts(addr: SocketAddr, attempts: u32) -> Arc<MiraiBot> {
    let mut config = MiraiConfig::new("127.0.0.1", addr.port(), ACCOUNT, "key");
    config.retry.max_attempts = attempts;
    config.retry.connect_delay_ms = 50;
    config.api_timeout_ms = Some(5_000);
    MiraiBot::new(config).unwrap()
}

async fn send(ws: &mut Ws, frame: Value) {
    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
}

async fn handshake(ws: &mut Ws) {
    handshake_with(ws, "abc123").await;
}

async fn handshake_with(ws: &mut Ws, session: &str) {
    send(ws, json!({"syncId": "", "data": {"code": 0, "session": session}})).await;
}

/// Reads the next command frame, skipping control frames.
async fn next_command(ws: &mut Ws) -> Value {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(text.as_str()).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("connection ended: {other:?}"),
        }
    }
}

/// Keeps the connection open until the client goes away.
async fn drain(ws: &mut Ws) {
    while let Some(Ok(msg)) = ws.next().await {
        if msg.is_close() {
            break;
        }
    }
}

fn group_message(sender_id: i64, text: &str) -> Value {
    json!({
        "syncId": "-1",
        "data": {
            "type": "GroupMessage",
            "sender": {
                "id": sender_id,
                "memberName": "someone",
                "permission": "MEMBER",
                "group": {"id": 123, "name": "test", "permission": "MEMBER"}
            },
            "messageChain": [
                {"type": "Source", "id": 1, "time": 0},
                {"type": "Plain", "text": text}
            ]
        }
    })
}

#[tokio::test]
async fn test_handshake_stores_session_key() {
    let addr = gateway(|mut ws| async move {
        handshake(&mut ws).await;
        drain(&mut ws).await;
    })
    .await;

    let bot = bot_for(addr);
    bot.connect().await.unwrap();
    assert_eq!(bot.session_key().as_deref(), Some("abc123"));
    assert_eq!(bot.state(), ConnectionState::Ready);
    assert!(bot.close());
}

#[tokio::test]
async fn test_rejected_handshake_is_verify_error() {
    let addr = gateway(|mut ws| async move {
        send(&mut ws, json!({"syncId": "", "data": {"code": 1, "msg": "wrong key"}})).await;
        drain(&mut ws).await;
    })
    .await;

    let bot = bot_for(addr);
    match bot.connect().await {
        Err(ApiError::Verify(msg)) => assert_eq!(msg, "wrong key"),
        other => panic!("unexpected {other:?}"),
    }
    assert_ne!(bot.state(), ConnectionState::Ready);
    assert!(bot.session_key().is_none());
}

#[tokio::test]
async fn test_push_dispatch_skips_own_messages() {
    let addr = gateway(|mut ws| async move {
        handshake(&mut ws).await;
        send(&mut ws, group_message(ACCOUNT, "mine")).await;
        send(&mut ws, group_message(111, "hi")).await;
        drain(&mut ws).await;
    })
    .await;

    let bot = bot_for(addr);
    let (tx, mut rx) = mpsc::unbounded_channel();
    bot.dispatcher().registry_mut(|r| {
        r.register_sync("GroupMessage", move |msg: GroupMessage| {
            let _ = tx.send(msg);
        });
    });
    bot.connect().await.unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(msg.sender.id, 111);
    assert_eq!(msg.message_chain.to_str(), "hi");

    // The self-sent message came first and was never delivered.
    assert!(rx.try_recv().is_err());
    bot.close();
}

#[tokio::test]
async fn test_status_code_becomes_typed_error() {
    let addr = gateway(|mut ws| async move {
        handshake(&mut ws).await;
        let command = next_command(&mut ws).await;
        assert_eq!(command["command"], "mute");
        assert_eq!(command["content"], json!({"target": 123, "memberId": 456, "time": 60}));
        send(
            &mut ws,
            json!({"syncId": command["syncId"], "data": {"code": 10, "msg": "no permission"}}),
        )
        .await;
        drain(&mut ws).await;
    })
    .await;

    let bot = bot_for(addr);
    bot.connect().await.unwrap();
    match bot.mute(123_i64, 456_i64, 60).await {
        Err(ApiError::PermissionDenied(msg)) => assert_eq!(msg, "no permission"),
        other => panic!("unexpected {other:?}"),
    }
    // A domain error leaves the session usable.
    assert_eq!(bot.state(), ConnectionState::Ready);
    bot.close();
}

#[tokio::test]
async fn test_interleaved_responses_reach_their_callers() {
    let addr = gateway(|mut ws| async move {
        handshake(&mut ws).await;
        let first = next_command(&mut ws).await;
        let second = next_command(&mut ws).await;

        for command in [second, first] {
            let data = match command["command"].as_str() {
                Some("friendList") => json!([{"id": 1, "nickname": "f", "remark": ""}]),
                Some("groupList") => json!([{"id": 2, "name": "g", "permission": "OWNER"}]),
                other => panic!("unexpected command {other:?}"),
            };
            send(
                &mut ws,
                json!({"syncId": command["syncId"], "data": {"code": 0, "msg": "", "data": data}}),
            )
            .await;
        }
        drain(&mut ws).await;
    })
    .await;

    let bot = bot_for(addr);
    bot.connect().await.unwrap();

    let (friends, groups) = tokio::join!(bot.friend_list(), bot.group_list());
    let friends: Vec<Friend> = friends.unwrap();
    let groups: Vec<Group> = groups.unwrap();
    assert_eq!(friends[0].id, 1);
    assert_eq!(groups[0].id, 2);
    bot.close();
}

#[tokio::test]
async fn test_close_twice_and_pending_commands_fail() {
    let addr = gateway(|mut ws| async move {
        handshake(&mut ws).await;
        // Swallow the command without answering.
        let _ = next_command(&mut ws).await;
        drain(&mut ws).await;
    })
    .await;

    let bot = bot_for(addr);
    bot.connect().await.unwrap();

    let caller = Arc::clone(&bot);
    let pending = tokio::spawn(async move { caller.bot_profile().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(bot.close());
    assert!(!bot.close());
    assert_eq!(bot.state(), ConnectionState::Closed);

    let result = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(result, Err(ApiError::NotConnected)));
}

#[tokio::test]
async fn test_drop_right_after_handshake_never_leaves_session_ready() {
    let addr = gateway(|mut ws| async move {
        handshake(&mut ws).await;
        let _ = ws.close(None).await;
    })
    .await;

    let bot = bot_for(addr);
    let _ = bot.connect().await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_ne!(bot.state(), ConnectionState::Ready);
    assert!(!bot.is_ready());
}

#[tokio::test]
async fn test_idle_drop_reconnects_in_background() {
    let addr = gateway_each(|index, mut ws| async move {
        handshake_with(&mut ws, &format!("s{index}")).await;
        if index == 0 {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let _ = ws.close(None).await;
        } else {
            drain(&mut ws).await;
        }
    })
    .await;

    let bot = bot_with_attempts(addr, 3);
    bot.connect().await.unwrap();
    assert_eq!(bot.session_key().as_deref(), Some("s0"));

    tokio::time::timeout(Duration::from_secs(5), async {
        while bot.session_key().as_deref() != Some("s1") {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(bot.state(), ConnectionState::Ready);
    assert!(!bot.is_closed());
    bot.close();
}

#[tokio::test]
async fn test_unrecoverable_drop_closes_session() {
    let addr = gateway(|mut ws| async move {
        handshake(&mut ws).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = ws.close(None).await;
    })
    .await;

    let bot = bot_for(addr);
    bot.connect().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), bot.wait_closed())
        .await
        .unwrap();
    assert_eq!(bot.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_command_survives_connection_drop() {
    let addr = gateway_each(|index, mut ws| async move {
        handshake(&mut ws).await;
        let command = next_command(&mut ws).await;
        assert_eq!(command["command"], "friendList");
        if index == 0 {
            // Lose the connection with the command unanswered.
            let _ = ws.close(None).await;
            return;
        }
        send(
            &mut ws,
            json!({
                "syncId": command["syncId"],
                "data": {"code": 0, "msg": "", "data": [{"id": 1, "nickname": "f", "remark": ""}]}
            }),
        )
        .await;
        drain(&mut ws).await;
    })
    .await;

    let bot = bot_with_attempts(addr, 3);
    bot.connect().await.unwrap();

    let friends: Vec<Friend> = tokio::time::timeout(Duration::from_secs(10), bot.friend_list())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(friends[0].id, 1);
    assert_eq!(bot.state(), ConnectionState::Ready);
    bot.close();
}
