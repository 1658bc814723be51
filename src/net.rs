//////////////////////////
// net.rs
//////////////////////////
//
// Wire types for the event relay, plus the sync adapter that keeps two
// remote copies of the engine in lockstep. Field names on the JSON
// surface are the relay's contract; keep them camelCase.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use uuid::Uuid;

use crate::game::GameState;
use crate::types::{AppliedMove, Color, Move, MoveError, PromotionKind};

/// One committed half-move as relayed between peers.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    pub from_row: usize,
    pub from_col: usize,
    pub to_row: usize,
    pub to_col: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionKind>,
}

impl MovePayload {
    pub fn from_move(mv: &Move) -> Self {
        MovePayload {
            from_row: mv.from.0,
            from_col: mv.from.1,
            to_row: mv.to.0,
            to_col: mv.to.1,
            promotion: mv.promotion,
        }
    }

    pub fn to_move(&self) -> Move {
        Move {
            from: (self.from_row, self.from_col),
            to: (self.to_row, self.to_col),
            promotion: self.promotion,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    pub joined: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameEndPayload {
    pub winner: Color,
}

/// Every message a room's event log can carry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetMessage {
    #[serde(rename_all = "camelCase")]
    Move {
        room_id: String,
        sender_id: String,
        payload: MovePayload,
    },
    #[serde(rename_all = "camelCase")]
    Presence {
        room_id: String,
        sender_id: String,
        payload: PresencePayload,
    },
    #[serde(rename_all = "camelCase")]
    GameEnd {
        room_id: String,
        sender_id: String,
        payload: GameEndPayload,
    },
}

impl NetMessage {
    pub fn room_id(&self) -> &str {
        match self {
            NetMessage::Move { room_id, .. }
            | NetMessage::Presence { room_id, .. }
            | NetMessage::GameEnd { room_id, .. } => room_id,
        }
    }

    pub fn sender_id(&self) -> &str {
        match self {
            NetMessage::Move { sender_id, .. }
            | NetMessage::Presence { sender_id, .. }
            | NetMessage::GameEnd { sender_id, .. } => sender_id,
        }
    }
}

/// An entry of a room's ordered event log. Ids are stringified sequence
/// numbers assigned by the relay.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RoomEvent {
    pub id: String,
    pub message: serde_json::Value,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct EventsResponse {
    pub events: Vec<RoomEvent>,
}

/// Delivery of `NetMessage`s between peers. `drain` hands over everything
/// that arrived since the last call, in relay order.
pub trait Transport {
    fn send(&self, message: NetMessage);
    fn drain(&mut self) -> Vec<NetMessage>;
}

/// In-process transport over a broadcast channel: both peers of a room
/// subscribe to the same sender. A peer never sees its own messages back,
/// matching how a relay-backed transport behaves.
pub struct BroadcastTransport {
    sender_id: String,
    tx: broadcast::Sender<NetMessage>,
    rx: broadcast::Receiver<NetMessage>,
}

impl BroadcastTransport {
    pub fn channel() -> broadcast::Sender<NetMessage> {
        broadcast::channel(64).0
    }

    pub fn connect(tx: &broadcast::Sender<NetMessage>, sender_id: impl Into<String>) -> Self {
        BroadcastTransport {
            sender_id: sender_id.into(),
            tx: tx.clone(),
            rx: tx.subscribe(),
        }
    }
}

impl Transport for BroadcastTransport {
    fn send(&self, message: NetMessage) {
        // nobody listening is not an error for a broadcast
        let _ = self.tx.send(message);
    }

    fn drain(&mut self) -> Vec<NetMessage> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    if message.sender_id() != self.sender_id {
                        out.push(message);
                    }
                }
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        out
    }
}

/// Glue between one local `GameState` and the relay. Local moves run
/// through `apply_move` before anything is emitted; remote moves are
/// replayed through the very same validator, so an illegal peer move is
/// rejected rather than trusted.
pub struct GameSync {
    game: GameState,
    room_id: String,
    sender_id: String,
    color: Color,
    pending_wire: Option<Move>,
}

impl GameSync {
    pub fn new(room_id: impl Into<String>, color: Color) -> Self {
        Self::with_sender(room_id, color, Uuid::new_v4().to_string())
    }

    pub fn with_sender(
        room_id: impl Into<String>,
        color: Color,
        sender_id: impl Into<String>,
    ) -> Self {
        GameSync {
            game: GameState::new(),
            room_id: room_id.into(),
            sender_id: sender_id.into(),
            color,
            pending_wire: None,
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    /// The presence announcement sent when entering a room.
    pub fn join_message(&self, display_name: Option<String>) -> NetMessage {
        NetMessage::Presence {
            room_id: self.room_id.clone(),
            sender_id: self.sender_id.clone(),
            payload: PresencePayload {
                joined: true,
                desired_color: Some(self.color),
                display_name,
            },
        }
    }

    pub fn game_end_message(&self, winner: Color) -> NetMessage {
        NetMessage::GameEnd {
            room_id: self.room_id.clone(),
            sender_id: self.sender_id.clone(),
            payload: GameEndPayload { winner },
        }
    }

    /// Commit a move by the local player. Returns the wire message to
    /// relay; a move that suspends on promotion returns no message until
    /// `complete_promotion` supplies the choice.
    pub fn commit_local(
        &mut self,
        mv: Move,
    ) -> Result<(AppliedMove, Option<NetMessage>), MoveError> {
        if self.game.turn() != self.color {
            return Err(MoveError::WrongTurn);
        }
        let applied = self.game.apply_move(&mv)?;
        match applied {
            AppliedMove::PromotionPending { .. } => {
                self.pending_wire = Some(mv);
                Ok((applied, None))
            }
            AppliedMove::Completed { .. } => {
                Ok((applied, Some(self.move_message(MovePayload::from_move(&mv)))))
            }
        }
    }

    /// Finish a suspended local promotion and emit the full move,
    /// promotion choice included, as the original half-move's message.
    /// Only a promotion suspended by `commit_local` can be completed
    /// here; a peer's choiceless far-rank move stays suspended until its
    /// sender relays the choice, and this peer's state is untouched.
    pub fn complete_promotion(
        &mut self,
        kind: PromotionKind,
    ) -> Result<(AppliedMove, NetMessage), MoveError> {
        let mv = self.pending_wire.take().ok_or(MoveError::NoPendingPromotion)?;
        let applied = match self.game.complete_promotion(kind) {
            Ok(applied) => applied,
            Err(err) => {
                self.pending_wire = Some(mv);
                return Err(err);
            }
        };
        let mut payload = MovePayload::from_move(&mv);
        payload.promotion = Some(kind);
        Ok((applied, self.move_message(payload)))
    }

    /// Replay a remotely committed move through the standard pipeline.
    pub fn apply_remote(&mut self, payload: &MovePayload) -> Result<AppliedMove, MoveError> {
        self.game.apply_move(&payload.to_move())
    }

    /// Feed one relayed message through. Messages from other rooms, from
    /// this peer itself, and non-move messages are ignored.
    pub fn handle_message(
        &mut self,
        message: &NetMessage,
    ) -> Result<Option<AppliedMove>, MoveError> {
        if message.room_id() != self.room_id || message.sender_id() == self.sender_id {
            return Ok(None);
        }
        match message {
            NetMessage::Move { payload, .. } => self.apply_remote(payload).map(Some),
            _ => Ok(None),
        }
    }

    fn move_message(&self, payload: MovePayload) -> NetMessage {
        NetMessage::Move {
            room_id: self.room_id.clone(),
            sender_id: self.sender_id.clone(),
            payload,
        }
    }
}
