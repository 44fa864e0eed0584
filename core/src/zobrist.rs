use std::sync::LazyLock;

use crate::game_state::GameState;
use crate::types::{CastlingRights, Color, Piece, Square};

/// Zobrist keys used to fingerprint positions for repetition detection.
#[derive(Debug, Clone)]
struct ZobristKeys {
    piece_square: [[[u64; 64]; 6]; 2],
    black_to_move: u64,
    castling: [u64; 16],
    en_passant: [u64; 8],
}

impl ZobristKeys {
    /// Deterministic xorshift keys; hashes are stable across runs.
    fn new() -> Self {
        let mut state = 0x1234_5678_9ABC_DEF0u64;
        let mut next_random = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };

        let mut piece_square = [[[0u64; 64]; 6]; 2];
        for per_color in piece_square.iter_mut() {
            for per_piece in per_color.iter_mut() {
                for key in per_piece.iter_mut() {
                    *key = next_random();
                }
            }
        }

        let black_to_move = next_random();
        let castling = std::array::from_fn(|_| next_random());
        let en_passant = std::array::from_fn(|_| next_random());

        Self {
            piece_square,
            black_to_move,
            castling,
            en_passant,
        }
    }

    fn piece_square_key(&self, piece: Piece, square: Square) -> u64 {
        self.piece_square[piece.color as usize][piece.piece_type as usize][square.index() as usize]
    }

    fn castling_key(&self, rights: CastlingRights) -> u64 {
        let flags = [
            rights.white.kingside,
            rights.white.queenside,
            rights.black.kingside,
            rights.black.queenside,
        ];
        let mut index = 0usize;
        for (bit, set) in flags.into_iter().enumerate() {
            if set {
                index |= 1 << bit;
            }
        }
        self.castling[index]
    }
}

static ZOBRIST: LazyLock<ZobristKeys> = LazyLock::new(ZobristKeys::new);

impl GameState {
    /// Position fingerprint: placement, side to move, castling rights and
    /// en passant file. Move counters are ignored, so repeated positions
    /// hash equal.
    pub fn zobrist_hash(&self) -> u64 {
        let keys = &*ZOBRIST;
        let mut hash = self
            .board
            .pieces()
            .fold(0u64, |acc, (square, piece)| {
                acc ^ keys.piece_square_key(piece, square)
            });

        if self.turn == Color::Black {
            hash ^= keys.black_to_move;
        }
        hash ^= keys.castling_key(self.castling);
        if let Some(square) = self.en_passant {
            hash ^= keys.en_passant[square.file().index() as usize];
        }

        hash
    }
}
