//! End-to-end check of the WebSocket transport against a local receiver.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use ttt_core::board::Mark;
use ttt_core::codec::{decode_command, encode_event, ChannelFrame};
use ttt_core::messages::{Command, Event, TTT_NAMESPACE};
use ttt_sender::{ControllerConfig, Phase, SessionController, WebSocketTransport};

/// Accepts one sender, answers `join` with `joined{O}`, and returns every
/// command it saw once the sender closes the socket.
async fn fake_receiver(listener: TcpListener) -> Vec<Command> {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();
    let mut commands = Vec::new();

    while let Some(Ok(msg)) = ws.next().await {
        match msg {
            Message::Text(text) => {
                let frame = ChannelFrame::decode(&text).unwrap();
                assert_eq!(frame.namespace, TTT_NAMESPACE);
                let command = decode_command(&frame.data).unwrap();
                if matches!(command, Command::Join { .. }) {
                    let joined = encode_event(&Event::Joined { player: Mark::O }).unwrap();
                    let reply = ChannelFrame::new(TTT_NAMESPACE, joined).encode().unwrap();
                    ws.send(Message::Text(reply)).await.unwrap();
                }
                commands.push(command);
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    commands
}

#[tokio::test]
async fn plays_against_websocket_receiver() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let receiver = tokio::spawn(fake_receiver(listener));

    let transport = WebSocketTransport::new(format!("ws://{addr}")).unwrap();
    let mut controller = SessionController::new(
        transport,
        ControllerConfig {
            layout_delay: Duration::from_secs(3600),
            ..Default::default()
        },
    );

    controller.play();
    timeout(Duration::from_secs(10), async {
        while controller.model().symbol.is_none() {
            assert!(controller.step().await);
        }
    })
    .await
    .expect("receiver never answered join");

    assert_eq!(controller.phase(), Phase::InProgress);
    assert_eq!(controller.model().player_number(), Some(2));
    assert!(!controller.model().my_turn);

    controller.stop();
    timeout(Duration::from_secs(10), async {
        while !controller.model().message.contains("Session stopped") {
            assert!(controller.step().await);
        }
    })
    .await
    .expect("session never reported stopped");

    let commands = receiver.await.unwrap();
    assert_eq!(
        commands.first(),
        Some(&Command::Join {
            name: "web player".into()
        })
    );
    assert_eq!(commands.last(), Some(&Command::Endgame));
}

#[tokio::test]
async fn receiver_hangup_removes_session() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let receiver = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();
    });

    let transport = WebSocketTransport::new(format!("ws://{addr}")).unwrap();
    let mut controller = SessionController::new(
        transport,
        ControllerConfig {
            layout_delay: Duration::from_secs(3600),
            ..Default::default()
        },
    );

    controller.connect();
    assert!(controller.step().await);
    assert!(controller.has_session());

    timeout(Duration::from_secs(10), async {
        while controller.has_session() {
            assert!(controller.step().await);
        }
    })
    .await
    .expect("hangup never reported");

    assert_eq!(controller.phase(), Phase::Disconnected);
    assert!(controller.model().message.contains("Session Removed"));
    receiver.await.unwrap();
}
