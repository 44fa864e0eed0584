//! Legal move generation by filtering pseudo-legal moves through a
//! king-safety check on the resulting position.

use crate::types::{Color, File, Move, Piece, PieceType, Square};
use crate::game_state::{
    leaper_targets, ray, GameState, DIAGONAL_DIRS, KING_DELTAS, KNIGHT_DELTAS, STRAIGHT_DIRS,
};

const QUEEN_DIRS: [(i8, i8); 8] = [
    DIAGONAL_DIRS[0],
    DIAGONAL_DIRS[1],
    DIAGONAL_DIRS[2],
    DIAGONAL_DIRS[3],
    STRAIGHT_DIRS[0],
    STRAIGHT_DIRS[1],
    STRAIGHT_DIRS[2],
    STRAIGHT_DIRS[3],
];

/// Every legal move for the side to move.
///
/// Moves come out grouped by piece kind (pawns, knights, bishops, rooks,
/// queens, king, castling) and, within a kind, in a1..h8 order of the
/// moving piece. Callers that stable-sort rely on this order.
pub fn generate_legal_moves(state: &GameState) -> Vec<Move> {
    let mut moves = generate_pseudo_legal_moves(state);
    moves.retain(|&mv| is_legal(state, mv));
    moves
}

/// Stops at the first legal move found.
pub fn has_legal_move(state: &GameState) -> bool {
    generate_pseudo_legal_moves(state)
        .into_iter()
        .any(|mv| is_legal(state, mv))
}

pub fn is_checkmate(state: &GameState) -> bool {
    state.is_in_check() && !has_legal_move(state)
}

pub fn is_stalemate(state: &GameState) -> bool {
    !state.is_in_check() && !has_legal_move(state)
}

fn is_legal(state: &GameState, mv: Move) -> bool {
    !state.apply_move(mv).is_side_in_check(state.turn)
}

/// Moves that obey piece movement but may leave the king attacked.
fn generate_pseudo_legal_moves(state: &GameState) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    let color = state.turn;

    generate_pawn_moves(state, color, &mut moves);
    generate_leaper_moves(state, color, PieceType::Knight, &KNIGHT_DELTAS, &mut moves);
    generate_slider_moves(state, color, PieceType::Bishop, &mut moves);
    generate_slider_moves(state, color, PieceType::Rook, &mut moves);
    generate_slider_moves(state, color, PieceType::Queen, &mut moves);
    generate_leaper_moves(state, color, PieceType::King, &KING_DELTAS, &mut moves);
    generate_castling_moves(state, color, &mut moves);

    moves
}

/// Expands a move onto the last rank into one move per promotion choice.
fn push_pawn_move(moves: &mut Vec<Move>, from: Square, to: Square, color: Color) {
    if to.rank() == color.promotion_rank() {
        moves.extend(
            PieceType::PROMOTIONS
                .iter()
                .map(|&promotion| Move::new_promotion(from, to, promotion)),
        );
    } else {
        moves.push(Move::new(from, to));
    }
}

/// Pushes, double steps, captures and en passant for every pawn of `color`.
fn generate_pawn_moves(state: &GameState, color: Color, moves: &mut Vec<Move>) {
    let board = &state.board;
    let forward = color.pawn_direction();

    for from in board.squares_of(Piece::new(PieceType::Pawn, color)) {
        if let Some(single) = from.offset(0, forward).filter(|&to| board.is_empty(to)) {
            push_pawn_move(moves, from, single, color);

            let double = single.offset(0, forward).filter(|&to| board.is_empty(to));
            if let Some(double) = double.filter(|_| from.rank() == color.pawn_rank()) {
                moves.push(Move::new(from, double));
            }
        }

        for target in [-1, 1].into_iter().filter_map(|df| from.offset(df, forward)) {
            if board.is_enemy(target, color) {
                push_pawn_move(moves, from, target, color);
            } else if state.en_passant == Some(target) {
                moves.push(Move::new(from, target));
            }
        }
    }
}

/// Single jumps for knights or the king, castling excluded.
fn generate_leaper_moves(
    state: &GameState,
    color: Color,
    piece_type: PieceType,
    deltas: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    let board = &state.board;
    for from in board.squares_of(Piece::new(piece_type, color)) {
        moves.extend(
            leaper_targets(from, deltas)
                .filter(|&to| !board.is_color(to, color))
                .map(|to| Move::new(from, to)),
        );
    }
}

/// Rays for bishops, rooks or queens, each ending at the first piece met.
fn generate_slider_moves(
    state: &GameState,
    color: Color,
    piece_type: PieceType,
    moves: &mut Vec<Move>,
) {
    let board = &state.board;
    let dirs: &[(i8, i8)] = match piece_type {
        PieceType::Bishop => &DIAGONAL_DIRS,
        PieceType::Rook => &STRAIGHT_DIRS,
        _ => &QUEEN_DIRS,
    };

    for from in board.squares_of(Piece::new(piece_type, color)) {
        for &(df, dr) in dirs {
            for to in ray(from, df, dr) {
                match board.piece_at(to) {
                    None => moves.push(Move::new(from, to)),
                    Some(piece) => {
                        if piece.color != color {
                            moves.push(Move::new(from, to));
                        }
                        break;
                    }
                }
            }
        }
    }
}

/// Generates castling moves for the given color.
fn generate_castling_moves(state: &GameState, color: Color, moves: &mut Vec<Move>) {
    let rights = state.castling.get(color);
    if !rights.any() {
        return;
    }

    let back_rank = color.back_rank();
    let king_square = Square::new(File::E, back_rank);
    let board = &state.board;
    if board.piece_at(king_square) != Some(Piece::new(PieceType::King, color)) {
        return;
    }

    let enemy = color.opponent();
    if state.is_attacked_by(king_square, enemy) {
        return;
    }

    let rook = Some(Piece::new(PieceType::Rook, color));
    let at = |file: File| Square::new(file, back_rank);

    if rights.kingside
        && board.piece_at(at(File::H)) == rook
        && [File::F, File::G].iter().all(|&f| board.is_empty(at(f)))
        && [File::F, File::G]
            .iter()
            .all(|&f| !state.is_attacked_by(at(f), enemy))
    {
        moves.push(Move::new(king_square, at(File::G)));
    }

    if rights.queenside
        && board.piece_at(at(File::A)) == rook
        && [File::B, File::C, File::D]
            .iter()
            .all(|&f| board.is_empty(at(f)))
        && [File::C, File::D]
            .iter()
            .all(|&f| !state.is_attacked_by(at(f), enemy))
    {
        moves.push(Move::new(king_square, at(File::C)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::positions;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_starting_position_moves() {
        let state = GameState::new();
        let moves = generate_legal_moves(&state);

        // Starting position has exactly 20 legal moves
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn test_kiwipete_move_count() {
        let state = GameState::from_fen(positions::KIWIPETE).unwrap();
        assert_eq!(generate_legal_moves(&state).len(), 48);
    }

    #[test]
    fn test_pawns_come_first_in_square_order() {
        let moves = generate_legal_moves(&GameState::new());
        let d4 = moves.iter().position(|m| m.to == sq("d4")).unwrap();
        let e4 = moves.iter().position(|m| m.to == sq("e4")).unwrap();
        let nf3 = moves.iter().position(|m| m.to == sq("f3") && m.from == sq("g1")).unwrap();
        assert!(d4 < e4);
        assert!(e4 < nf3);
    }

    #[test]
    fn test_pawn_promotion() {
        let state = GameState::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let moves = generate_legal_moves(&state);

        let pawn_moves: Vec<_> = moves.iter().filter(|m| m.from == sq("a7")).collect();
        assert_eq!(pawn_moves.len(), 4);
        assert!(pawn_moves.iter().all(|m| m.is_promotion()));
    }

    #[test]
    fn test_castling_blocked_by_attack() {
        // Black rook on f8 covers f1, so only queenside castling remains
        let state = GameState::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let moves = generate_legal_moves(&state);
        assert!(!moves.contains(&Move::new(sq("e1"), sq("g1"))));
        assert!(moves.contains(&Move::new(sq("e1"), sq("c1"))));
    }

    #[test]
    fn test_castling_needs_rook() {
        let mut state = GameState::from_fen("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        state.board.set_square(sq("h1"), None);
        let moves = generate_legal_moves(&state);
        assert!(!moves.contains(&Move::new(sq("e1"), sq("g1"))));
    }

    #[test]
    fn test_en_passant_generated() {
        let state = GameState::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert!(generate_legal_moves(&state).contains(&Move::new(sq("e5"), sq("d6"))));
    }

    #[test]
    fn test_checkmate_and_stalemate() {
        let mate = GameState::from_fen(positions::FOOLS_MATE).unwrap();
        assert!(is_checkmate(&mate));
        assert!(!is_stalemate(&mate));

        let stalemate = GameState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(is_stalemate(&stalemate));
        assert!(!has_legal_move(&stalemate));
    }
}
