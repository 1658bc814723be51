//////////////////////////
// lib.rs
//////////////////////////
//
// Two-player chess synchronized through a thin HTTP event relay. The
// engine (board, rules, attack, game) is pure and deterministic; net
// carries moves between peers; server is the relay itself.

pub mod attack;
pub mod board;
pub mod game;
pub mod net;
pub mod rules;
pub mod server;
pub mod types;

pub use board::Board;
pub use game::GameState;
pub use net::{BroadcastTransport, GameSync, NetMessage, Transport};
pub use server::start_server;
pub use types::{AppliedMove, Color, Move, MoveError, MoveFlags, Piece, PieceKind, PromotionKind};
