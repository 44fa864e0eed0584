//! Rules engine for the chess coach: board representation, FEN, legal
//! move generation, SAN and game-level terminal predicates.

pub mod board;
pub mod fen;
pub mod game;
pub mod game_state;
pub mod move_gen;
pub mod notation;
pub mod types;
mod zobrist;

pub use board::*;
pub use fen::{positions, FenError};
pub use game::{Game, GameOutcome};
pub use game_state::*;
pub use move_gen::*;
pub use notation::{legal_moves_verbose, resolve_coords, resolve_san, MoveError, MoveInfo};
pub use types::*;
