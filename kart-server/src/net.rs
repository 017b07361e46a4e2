// src/net.rs
//
// Websocket front door. One task per connection: an outgoing channel drained
// by a send loop, and a receive loop feeding `SessionState::handle_message`.

use futures::{SinkExt, Stream, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use uuid::Uuid;

use crate::error::ServerError;
use crate::state::{ClientMessage, SessionState};

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!(%addr, "websocket listening");
    Ok(listener)
}

pub async fn start_websocket_server(listener: TcpListener, state: Arc<Mutex<SessionState>>) {
    loop {
        let (raw, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                continue;
            }
        };
        let state_clone = Arc::clone(&state);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(raw, state_clone).await {
                tracing::warn!(%peer, error = %e, "connection ended with an error");
            }
        });
    }
}

async fn handle_connection(raw: TcpStream, state: Arc<Mutex<SessionState>>) -> Result<(), ServerError> {
    let ws = accept_async(raw).await?;
    let (mut write, mut read) = ws.split();

    // -------------------------------
    // 1) Outgoing message channel
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // -------------------------------
    // 2) Send loop
    // -------------------------------
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // -------------------------------
    // 3) Register + claim a seat
    // -------------------------------
    let client_id = {
        let mut session = state.lock().await;
        let (id, seat) = session.register_client(tx);
        if let Some(welcome) = session.welcome(&id) {
            session.send_to(&id, &welcome)?;
        }
        match seat {
            Some(seat) => tracing::info!(client = %id, kart = %seat, "player connected"),
            None => tracing::info!(client = %id, "spectator connected"),
        }
        id
    };

    // -------------------------------
    // 4) Receive loop
    // -------------------------------
    let result = receive_loop(&mut read, &state, client_id).await;

    tracing::info!(client = %client_id, "disconnected");
    state.lock().await.remove_client(&client_id);
    result
}

async fn receive_loop<S>(read: &mut S, state: &Arc<Mutex<SessionState>>, client_id: Uuid) -> Result<(), ServerError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(_) => break,
        };
        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        let text = match msg.to_text() {
            Ok(t) => t,
            Err(_) => continue,
        };

        let parsed: ClientMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(client = %client_id, error = %e, "unparsable client message");
                continue;
            }
        };

        let mut session = state.lock().await;
        if let Some(reply) = session.handle_message(&client_id, parsed) {
            session.send_to(&client_id, &reply)?;
        }
    }
    Ok(())
}
