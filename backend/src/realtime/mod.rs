//! In-process fan-out of server events to connected WebSocket clients.
//!
//! Every client automatically sits in its user room (`user:{id}`) and may
//! join project rooms (`project:{id}`). Delivery is fire-and-forget: a client
//! that is not connected simply misses the push.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use uuid::Uuid;

mod messages;

pub use messages::{ClientMessage, ServerEvent};

pub type ClientId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    User(i32),
    Project(i32),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::User(id) => write!(f, "user:{}", id),
            Room::Project(id) => write!(f, "project:{}", id),
        }
    }
}

struct Client {
    user_id: i32,
    tx: UnboundedSender<ServerEvent>,
}

#[derive(Default)]
struct HubState {
    clients: HashMap<ClientId, Client>,
    rooms: HashMap<Room, HashSet<ClientId>>,
}

impl HubState {
    fn remove_client(&mut self, client_id: &ClientId) {
        self.clients.remove(client_id);
        self.rooms.retain(|_, members| {
            members.remove(client_id);
            !members.is_empty()
        });
    }
}

#[derive(Default)]
pub struct NotificationHub {
    state: Mutex<HubState>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a client for `user_id` and place it in its user room.
    pub fn connect(&self, user_id: i32) -> (ClientId, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = unbounded_channel();
        let client_id = Uuid::new_v4();
        let mut state = self.lock();
        state.clients.insert(client_id, Client { user_id, tx });
        state
            .rooms
            .entry(Room::User(user_id))
            .or_default()
            .insert(client_id);
        log::debug!("Client {} connected for user {}", client_id, user_id);
        (client_id, rx)
    }

    pub fn disconnect(&self, client_id: &ClientId) {
        self.lock().remove_client(client_id);
        log::debug!("Client {} disconnected", client_id);
    }

    /// Returns false when the client is unknown.
    pub fn join(&self, client_id: &ClientId, room: Room) -> bool {
        let mut state = self.lock();
        if !state.clients.contains_key(client_id) {
            return false;
        }
        state.rooms.entry(room).or_default().insert(*client_id);
        true
    }

    pub fn leave(&self, client_id: &ClientId, room: Room) {
        let mut state = self.lock();
        if let Some(members) = state.rooms.get_mut(&room) {
            members.remove(client_id);
            if members.is_empty() {
                state.rooms.remove(&room);
            }
        }
    }

    pub fn user_of(&self, client_id: &ClientId) -> Option<i32> {
        self.lock().clients.get(client_id).map(|c| c.user_id)
    }

    /// Push `event` to every client in `room`; returns how many received it.
    pub fn emit(&self, room: Room, event: &ServerEvent) -> usize {
        let mut state = self.lock();
        let Some(members) = state.rooms.get(&room) else {
            return 0;
        };

        let mut delivered = 0;
        let mut gone = Vec::new();
        for client_id in members {
            match state.clients.get(client_id) {
                Some(client) if client.tx.send(event.clone()).is_ok() => delivered += 1,
                _ => gone.push(*client_id),
            }
        }

        for client_id in gone {
            state.remove_client(&client_id);
        }
        delivered
    }

    pub fn emit_to_user(&self, user_id: i32, event: &ServerEvent) -> usize {
        self.emit(Room::User(user_id), event)
    }

    pub fn emit_to_project(&self, project_id: i32, event: &ServerEvent) -> usize {
        self.emit(Room::Project(project_id), event)
    }

    pub fn connection_count(&self) -> usize {
        self.lock().clients.len()
    }
}
