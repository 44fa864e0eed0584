//! Board overlay bookkeeping.
//!
//! The coach draws moved pieces on top of the photographed board. Every
//! square a move has touched is masked, and the piece now standing on a
//! destination is recorded so it can be drawn over the mask.

use std::collections::{BTreeMap, BTreeSet};

use chess_core::{castle_rook_squares, Color, MoveInfo, Piece, PieceType, Square};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayState {
    pub hidden_squares: BTreeSet<Square>,
    pub pieces: BTreeMap<Square, Piece>,
}

impl OverlayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Masks both endpoints and moves the overlay piece. Repeating the
    /// same call leaves the state unchanged.
    pub fn record_move(&mut self, from: Square, to: Square, kind: PieceType, color: Color) {
        self.hidden_squares.insert(from);
        self.hidden_squares.insert(to);
        self.pieces.remove(&from);
        self.pieces.insert(to, Piece::new(kind, color));
    }

    /// Records a played move, showing the promoted piece rather than the
    /// pawn and adding the rook's relocation when castling.
    pub fn record_played(&mut self, info: &MoveInfo) {
        let kind = info.promotion().unwrap_or(info.piece);
        self.record_move(info.from(), info.to(), kind, info.color);

        if info.is_castle() {
            let (rook_from, rook_to) = castle_rook_squares(info.mv);
            self.record_move(rook_from, rook_to, PieceType::Rook, info.color);
        }
    }

    pub fn is_hidden(&self, square: Square) -> bool {
        self.hidden_squares.contains(&square)
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pieces.get(&square).copied()
    }

    pub fn clear(&mut self) {
        self.hidden_squares.clear();
        self.pieces.clear();
    }
}
