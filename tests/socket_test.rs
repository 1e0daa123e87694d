//! Tests for the match socket, driven over a real listener.

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use strictly_gomoku::{
    AppState, CLOSE_MATCH_NOT_FOUND, CLOSE_UNAUTHENTICATED, EventKind, Identity, MatchCoordinator,
    MatchId, MemoryStore, ServerEvent, SessionRegistry, TokenDirectory, router,
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn spawn_server() -> (SocketAddr, Arc<MatchCoordinator>) {
    let directory = TokenDirectory::from_entries([
        ("tok-alice".to_string(), Identity::new(1, "alice".to_string())),
        ("tok-bob".to_string(), Identity::new(2, "bob".to_string())),
    ]);
    let coordinator = Arc::new(MatchCoordinator::new(
        Arc::new(MemoryStore::new()),
        Arc::new(directory),
        SessionRegistry::new(),
    ));
    let app = router(AppState::new(coordinator.clone()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, coordinator)
}

async fn open(addr: SocketAddr, id: MatchId, token: Option<&str>) -> Client {
    let url = match token {
        Some(token) => format!("ws://{}/ws/game/{}?token={}", addr, id, token),
        None => format!("ws://{}/ws/game/{}", addr, id),
    };
    let (client, _) = connect_async(url).await.expect("Handshake failed");
    client
}

/// Reads frames until a close frame arrives, returning its code if it had one.
///
/// `None` means the stream ended without a close frame.
async fn close_code(client: &mut Client) -> Option<Option<u16>> {
    let read = async {
        while let Some(frame) = client.next().await {
            match frame {
                Ok(Message::Close(frame)) => return Some(frame.map(|f| u16::from(f.code))),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
        None
    };
    tokio::time::timeout(WAIT, read).await.expect("No close frame")
}

/// Reads events until one of type `kind` arrives.
async fn expect_event(client: &mut Client, kind: &str) -> EventKind {
    let read = async {
        while let Some(frame) = client.next().await {
            if let Ok(Message::Text(text)) = frame {
                let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
                if value["type"] == kind {
                    let event: ServerEvent = serde_json::from_value(value).unwrap();
                    return event.kind;
                }
            }
        }
        panic!("Socket ended before {}", kind);
    };
    tokio::time::timeout(WAIT, read).await.expect("Event not received")
}

async fn started_match(coordinator: &MatchCoordinator) -> MatchId {
    let game = coordinator.create_match(1).await.unwrap();
    coordinator.join_match(game.id(), 2).await.unwrap();
    game.id()
}

#[tokio::test]
async fn test_bad_or_missing_token_closes_with_4001() {
    let (addr, coordinator) = spawn_server().await;
    let id = started_match(&coordinator).await;

    let mut forged = open(addr, id, Some("forged")).await;
    assert_eq!(close_code(&mut forged).await, Some(Some(CLOSE_UNAUTHENTICATED)));

    let mut anonymous = open(addr, id, None).await;
    assert_eq!(close_code(&mut anonymous).await, Some(Some(CLOSE_UNAUTHENTICATED)));
}

#[tokio::test]
async fn test_unknown_match_closes_with_4002() {
    let (addr, _coordinator) = spawn_server().await;
    let mut client = open(addr, 404, Some("tok-alice")).await;
    assert_eq!(close_code(&mut client).await, Some(Some(CLOSE_MATCH_NOT_FOUND)));
}

#[tokio::test]
async fn test_move_is_relayed_as_game_move() {
    let (addr, coordinator) = spawn_server().await;
    let id = started_match(&coordinator).await;

    let mut alice = open(addr, id, Some("tok-alice")).await;
    expect_event(&mut alice, "game_start").await;
    let mut bob = open(addr, id, Some("tok-bob")).await;
    expect_event(&mut bob, "game_start").await;

    alice.send(Message::text("not json")).await.unwrap();
    alice
        .send(Message::text(r#"{"type":"move","data":{"position":[7,7]}}"#))
        .await
        .unwrap();

    match expect_event(&mut bob, "game_move").await {
        EventKind::GameMove {
            player_id,
            position,
            next_turn,
            board,
        } => {
            assert_eq!(player_id, 1);
            assert_eq!(position, [7, 7]);
            assert_eq!(next_turn, 2);
            assert_eq!(board[7][7], 1);
        }
        other => panic!("Expected game_move, got {:?}", other),
    }
    assert!(matches!(
        expect_event(&mut alice, "game_move").await,
        EventKind::GameMove { player_id: 1, .. }
    ));
}

#[tokio::test]
async fn test_reconnect_closes_superseded_socket() {
    let (addr, coordinator) = spawn_server().await;
    let id = started_match(&coordinator).await;

    let mut first = open(addr, id, Some("tok-alice")).await;
    expect_event(&mut first, "player_join").await;
    let mut second = open(addr, id, Some("tok-alice")).await;
    expect_event(&mut second, "player_join").await;

    assert_eq!(close_code(&mut first).await, Some(None), "Old socket gets a bare close");
    assert_eq!(coordinator.registry().player_count(id), 1);
}
