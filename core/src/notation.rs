//! Verbose legal moves and Standard Algebraic Notation.
//!
//! `MoveInfo` is the read-only description of a legal move that the
//! heuristic layer consumes: who moves, what is captured, how the move is
//! classified and how it is written.

use crate::game_state::GameState;
use crate::move_gen::{generate_legal_moves, has_legal_move};
use crate::types::{Color, Move, MoveFlags, PieceType, Square};

/// Errors raised when a move request cannot be matched to a legal move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("Unrecognised move notation: {0:?}")]
    UnknownNotation(String),
    #[error("No legal move from {from} to {to}")]
    IllegalMove { from: Square, to: Square },
    #[error("Invalid square: {0}")]
    InvalidSquare(#[from] crate::types::ParseSquareError),
}

/// A legal move with everything needed to score and describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveInfo {
    pub mv: Move,
    pub color: Color,
    pub piece: PieceType,
    pub captured: Option<PieceType>,
    pub flags: MoveFlags,
    pub san: String,
}

impl MoveInfo {
    pub fn from(&self) -> Square {
        self.mv.from
    }

    pub fn to(&self) -> Square {
        self.mv.to
    }

    pub fn promotion(&self) -> Option<PieceType> {
        self.mv.promotion
    }

    pub fn is_capture(&self) -> bool {
        self.flags.contains(MoveFlags::CAPTURE)
    }

    pub fn is_check(&self) -> bool {
        self.flags.contains(MoveFlags::CHECK)
    }

    pub fn is_mate(&self) -> bool {
        self.flags.contains(MoveFlags::MATE)
    }

    pub fn is_castle(&self) -> bool {
        self.flags.intersects(MoveFlags::CASTLE)
    }

    pub fn is_promotion(&self) -> bool {
        self.flags.contains(MoveFlags::PROMOTION)
    }
}

/// Enumerates the legal moves of the side to move in verbose form.
///
/// Order follows [`generate_legal_moves`].
pub fn legal_moves_verbose(state: &GameState) -> Vec<MoveInfo> {
    let moves = generate_legal_moves(state);
    moves
        .iter()
        .filter_map(|&mv| describe_move(state, mv, &moves))
        .collect()
}

/// Builds the verbose description of `mv`, which must be one of `legal`.
fn describe_move(state: &GameState, mv: Move, legal: &[Move]) -> Option<MoveInfo> {
    let mover = state.board.piece_at(mv.from)?;
    let captured = state.captured_piece(mv);

    let mut flags = MoveFlags::empty();
    if captured.is_some() {
        flags |= MoveFlags::CAPTURE;
    }
    if mv.is_promotion() {
        flags |= MoveFlags::PROMOTION;
    }
    if mv.is_castle(mover) {
        flags |= if mv.to.file() > mv.from.file() {
            MoveFlags::CASTLE_KINGSIDE
        } else {
            MoveFlags::CASTLE_QUEENSIDE
        };
    }

    let next = state.apply_move(mv);
    if next.is_in_check() {
        flags |= MoveFlags::CHECK;
        if !has_legal_move(&next) {
            flags |= MoveFlags::MATE;
        }
    }

    let san = san_for(state, mv, mover.piece_type, flags, legal);

    Some(MoveInfo {
        mv,
        color: mover.color,
        piece: mover.piece_type,
        captured,
        flags,
        san,
    })
}

/// Writes `mv` in SAN, e.g. `Nbd7`, `exd5`, `e8=Q+`, `O-O`, `Qh4#`.
fn san_for(
    state: &GameState,
    mv: Move,
    piece: PieceType,
    flags: MoveFlags,
    legal: &[Move],
) -> String {
    let mut san = String::new();

    if flags.contains(MoveFlags::CASTLE_KINGSIDE) {
        san.push_str("O-O");
    } else if flags.contains(MoveFlags::CASTLE_QUEENSIDE) {
        san.push_str("O-O-O");
    } else {
        match piece.san_letter() {
            None => {
                if flags.contains(MoveFlags::CAPTURE) {
                    san.push(mv.from.file().to_char());
                }
            }
            Some(letter) => {
                san.push(letter);
                san.push_str(&disambiguation(state, mv, piece, legal));
            }
        }

        if flags.contains(MoveFlags::CAPTURE) {
            san.push('x');
        }
        san.push_str(&mv.to.to_string());

        if let Some(letter) = mv.promotion.and_then(PieceType::san_letter) {
            san.push('=');
            san.push(letter);
        }
    }

    if flags.contains(MoveFlags::MATE) {
        san.push('#');
    } else if flags.contains(MoveFlags::CHECK) {
        san.push('+');
    }

    san
}

/// File, rank or full square needed to tell `mv` apart from sibling moves.
fn disambiguation(state: &GameState, mv: Move, piece: PieceType, legal: &[Move]) -> String {
    let rivals: Vec<Square> = legal
        .iter()
        .filter(|other| other.to == mv.to && other.from != mv.from)
        .filter(|other| {
            state
                .board
                .piece_at(other.from)
                .is_some_and(|p| p.piece_type == piece)
        })
        .map(|other| other.from)
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|sq| sq.file() != mv.from.file()) {
        mv.from.file().to_char().to_string()
    } else if rivals.iter().all(|sq| sq.rank() != mv.from.rank()) {
        mv.from.rank().to_char().to_string()
    } else {
        mv.from.to_string()
    }
}

/// Reduces SAN to a canonical comparison key: annotations and the
/// promotion `=` are dropped and zero-style castling is accepted.
fn normalize_san(san: &str) -> String {
    san.trim()
        .chars()
        .filter(|c| !matches!(c, '+' | '#' | '!' | '?' | '='))
        .collect::<String>()
        .replace('0', "O")
}

/// Finds the legal move written as `san` in this position.
pub fn resolve_san(state: &GameState, san: &str) -> Result<MoveInfo, MoveError> {
    let wanted = normalize_san(san);
    if wanted.is_empty() {
        return Err(MoveError::UnknownNotation(san.to_string()));
    }

    legal_moves_verbose(state)
        .into_iter()
        .find(|info| normalize_san(&info.san) == wanted)
        .ok_or_else(|| MoveError::UnknownNotation(san.to_string()))
}

/// Finds the legal move between two squares.
///
/// Without an explicit promotion piece a promoting move resolves to the
/// queen promotion.
pub fn resolve_coords(
    state: &GameState,
    from: Square,
    to: Square,
    promotion: Option<PieceType>,
) -> Result<MoveInfo, MoveError> {
    let wanted_promotion = |info: &MoveInfo| match (promotion, info.promotion()) {
        (Some(wanted), Some(actual)) => wanted == actual,
        (None, Some(actual)) => actual == PieceType::Queen,
        (_, None) => true,
    };

    legal_moves_verbose(state)
        .into_iter()
        .find(|info| info.from() == from && info.to() == to && wanted_promotion(info))
        .ok_or(MoveError::IllegalMove { from, to })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::positions;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn sans(fen: &str) -> Vec<String> {
        let state = GameState::from_fen(fen).unwrap();
        legal_moves_verbose(&state).into_iter().map(|m| m.san).collect()
    }

    #[test]
    fn test_starting_position_san() {
        let moves = sans(positions::STARTING);
        assert_eq!(moves.len(), 20);
        assert!(moves.contains(&"e4".to_string()));
        assert!(moves.contains(&"Nf3".to_string()));
        assert!(moves.contains(&"Na3".to_string()));
    }

    #[test]
    fn test_pawn_capture_san() {
        let state = GameState::from_fen(
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2",
        )
        .unwrap();
        let info = resolve_san(&state, "exd5").unwrap();
        assert_eq!(info.captured, Some(PieceType::Pawn));
        assert!(info.is_capture());
        assert_eq!(info.piece, PieceType::Pawn);
    }

    #[test]
    fn test_disambiguation() {
        // Knights on b1 and f1 can both reach d2
        let moves = sans("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1");
        assert!(moves.contains(&"Nbd2".to_string()));
        assert!(moves.contains(&"Nfd2".to_string()));

        // Rooks on a1 and a5 share a file
        let moves = sans("4k3/8/8/R7/8/8/8/R3K3 w - - 0 1");
        assert!(moves.contains(&"R1a3".to_string()));
        assert!(moves.contains(&"R5a3".to_string()));
    }

    #[test]
    fn test_castling_san_and_flags() {
        let state = GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let short = resolve_san(&state, "O-O").unwrap();
        assert!(short.flags.contains(MoveFlags::CASTLE_KINGSIDE));
        assert_eq!(short.to(), sq("g1"));

        let long = resolve_san(&state, "0-0-0").unwrap();
        assert!(long.flags.contains(MoveFlags::CASTLE_QUEENSIDE));
        assert_eq!(long.to(), sq("c1"));
    }

    #[test]
    fn test_promotion_san() {
        let state = GameState::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let moves: Vec<String> = legal_moves_verbose(&state).into_iter().map(|m| m.san).collect();
        assert!(moves.contains(&"a8=Q+".to_string()));
        assert!(moves.contains(&"a8=N".to_string()));

        let info = resolve_san(&state, "a8=Q").unwrap();
        assert_eq!(info.promotion(), Some(PieceType::Queen));
        assert!(info.is_promotion());
        assert!(info.is_check());
    }

    #[test]
    fn test_mate_suffix() {
        let state = GameState::from_fen(
            "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq g3 0 2",
        )
        .unwrap();
        let info = resolve_san(&state, "Qh4").unwrap();
        assert_eq!(info.san, "Qh4#");
        assert!(info.is_mate());
        assert!(info.is_check());
    }

    #[test]
    fn test_resolve_coords_defaults_to_queen() {
        let state = GameState::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let info = resolve_coords(&state, sq("a7"), sq("a8"), None).unwrap();
        assert_eq!(info.promotion(), Some(PieceType::Queen));

        let under = resolve_coords(&state, sq("a7"), sq("a8"), Some(PieceType::Rook)).unwrap();
        assert_eq!(under.san, "a8=R+");
    }

    #[test]
    fn test_unresolvable_requests() {
        let state = GameState::new();
        assert!(matches!(
            resolve_san(&state, "e5"),
            Err(MoveError::UnknownNotation(_))
        ));
        assert!(resolve_san(&state, "").is_err());
        assert_eq!(
            resolve_coords(&state, sq("e2"), sq("e5"), None),
            Err(MoveError::IllegalMove {
                from: sq("e2"),
                to: sq("e5")
            })
        );
    }
}
