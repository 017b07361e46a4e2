// src/state.rs
//
// Shared between the tick loop and every websocket task behind one
// `tokio::sync::Mutex`. Holds the race, the connected clients and which
// client sits in which human seat.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::error::ServerError;
use crate::race::Race;
use crate::vehicle::{Command, VehicleId};

/// Messages from a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Input(Command),
    Ping,
    Restart,
}

/// Messages to one client; snapshots go out through `broadcast_snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Welcome {
        client_id: Uuid,
        vehicle_id: Option<VehicleId>,
        course: String,
        laps: u32,
    },
    Pong,
}

pub struct Client {
    pub id: Uuid,
    pub tx: UnboundedSender<String>,
    pub seat: Option<VehicleId>,
}

pub struct SessionState {
    pub race: Race,
    pub clients: HashMap<Uuid, Client>,
}

impl SessionState {
    pub fn new(race: Race) -> Self {
        Self {
            race,
            clients: HashMap::new(),
        }
    }

    fn seat_taken(&self, seat: VehicleId) -> bool {
        self.clients.values().any(|c| c.seat == Some(seat))
    }

    /// Register a client and give it the first free human seat, if any.
    /// Spectators (no seat) still receive snapshots.
    pub fn register_client(&mut self, tx: UnboundedSender<String>) -> (Uuid, Option<VehicleId>) {
        let id = Uuid::new_v4();
        let seat = self.race.human_ids().into_iter().find(|&s| !self.seat_taken(s));
        self.clients.insert(id, Client { id, tx, seat });
        (id, seat)
    }

    pub fn remove_client(&mut self, id: &Uuid) {
        if let Some(client) = self.clients.remove(id) {
            if let Some(seat) = client.seat {
                self.race.release_seat(seat);
            }
        }
    }

    pub fn welcome(&self, id: &Uuid) -> Option<ServerMessage> {
        let client = self.clients.get(id)?;
        Some(ServerMessage::Welcome {
            client_id: client.id,
            vehicle_id: client.seat,
            course: self.race.course().name().to_string(),
            laps: self.race.config().laps,
        })
    }

    /// Apply one client message. Returns the direct reply, if any.
    pub fn handle_message(&mut self, id: &Uuid, message: ClientMessage) -> Option<ServerMessage> {
        match message {
            ClientMessage::Ping => Some(ServerMessage::Pong),
            ClientMessage::Input(command) => {
                let seat = self.clients.get(id)?.seat?;
                self.race.set_human_command(seat, command);
                None
            }
            ClientMessage::Restart => {
                if self.race.is_over() {
                    self.race.restart();
                }
                None
            }
        }
    }

    /// Send a message to one client.
    pub fn send_to(&self, id: &Uuid, message: &ServerMessage) -> Result<(), ServerError> {
        let json = serde_json::to_string(message)?;
        if let Some(client) = self.clients.get(id) {
            let _ = client.tx.send(json);
        }
        Ok(())
    }

    /// Build and send a snapshot of the race to all clients.
    pub fn broadcast_snapshot(&self) -> Result<(), ServerError> {
        let json = serde_json::to_string(&self.race.snapshot())?;

        for client in self.clients.values() {
            let _ = client.tx.send(json.clone());
        }
        Ok(())
    }
}
