use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::handling::types::InputSample;
use crate::physics::PhysicsWorld;
use crate::state::SharedGameState;

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Input {
        #[serde(default)]
        gas: f32,
        #[serde(default)]
        steering: f32,
        #[serde(default)]
        drift: bool,
        #[serde(default)]
        boost: bool,
    },
    Ping,
}

impl ClientMessage {
    pub fn from_json(txt: &str) -> Option<Self> {
        serde_json::from_str(txt).ok()
    }
}

/// Out-of-band replies; snapshots are serialised by `state`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Welcome { player_id: String },
    Pong,
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub async fn start_websocket_server(
    bind: SocketAddr,
    state: Arc<Mutex<SharedGameState>>,
    physics: Arc<Mutex<PhysicsWorld>>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!(%bind, "websocket listening");

    loop {
        let (raw, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        tokio::spawn(handle_connection(raw, peer, Arc::clone(&state), Arc::clone(&physics)));
    }
}

async fn handle_connection(
    raw: TcpStream,
    peer: SocketAddr,
    state: Arc<Mutex<SharedGameState>>,
    physics: Arc<Mutex<PhysicsWorld>>,
) {
    let ws = match accept_async(raw).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "websocket handshake failed");
            return;
        }
    };
    let (mut write, mut read) = ws.split();

    // -------------------------------
    // 1) Outgoing channel + send loop
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // -------------------------------
    // 2) Vehicle + controller (physics before state, same as the tick loop)
    // -------------------------------
    let player_id = {
        let mut phys = physics.lock().await;
        let mut game = state.lock().await;
        match game.add_vehicle(&mut phys) {
            Ok(id) => {
                game.register_client(tx.clone());
                id
            }
            Err(e) => {
                warn!(%peer, error = %e, "could not create vehicle");
                return;
            }
        }
    };
    info!(%peer, player = %player_id, "player connected");

    match (ServerMessage::Welcome { player_id: player_id.clone() }).to_json() {
        Ok(welcome) => {
            let _ = tx.send(welcome);
        }
        Err(e) => warn!(error = %e, "welcome serialisation failed"),
    }

    // -------------------------------
    // 3) Receive loop
    // -------------------------------
    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(_) => break,
        };
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else { continue };

        match ClientMessage::from_json(text) {
            Some(ClientMessage::Ping) => {
                if let Ok(pong) = ServerMessage::Pong.to_json() {
                    let _ = tx.send(pong);
                }
            }
            Some(ClientMessage::Input { gas, steering, drift, boost }) => {
                let input = InputSample { gas, steering, drift, boost };
                state.lock().await.update_input(&player_id, input);
            }
            None => debug!(player = %player_id, "ignored malformed message"),
        }
    }

    info!(player = %player_id, "player disconnected");
    let mut phys = physics.lock().await;
    let mut game = state.lock().await;
    game.remove_entity(&player_id, &mut phys);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_input_with_defaults() {
        let m = ClientMessage::from_json(r#"{"type":"input","gas":0.5,"drift":true}"#);
        assert_eq!(
            m,
            Some(ClientMessage::Input { gas: 0.5, steering: 0.0, drift: true, boost: false })
        );
    }

    #[test]
    fn parses_ping_and_rejects_unknown() {
        assert_eq!(ClientMessage::from_json(r#"{"type":"ping"}"#), Some(ClientMessage::Ping));
        assert_eq!(ClientMessage::from_json(r#"{"type":"teleport"}"#), None);
        assert_eq!(ClientMessage::from_json("not json"), None);
    }

    #[test]
    fn server_messages_are_tagged() {
        let w = ServerMessage::Welcome { player_id: "abc".into() }.to_json().unwrap_or_default();
        assert_eq!(w, r#"{"type":"welcome","player_id":"abc"}"#);
        assert_eq!(ServerMessage::Pong.to_json().unwrap_or_default(), r#"{"type":"pong"}"#);
    }
}
