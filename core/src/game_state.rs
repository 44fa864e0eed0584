//! Position-level rules: applying moves, attacks and draws by material.

use std::iter::successors;

use crate::board::Board;
use crate::types::*;

/// Everything a FEN string records about a position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameState {
    pub board: Board,
    pub turn: Color,
    pub castling: CastlingRights,
    /// Square skipped by a pawn's double step on the previous move.
    pub en_passant: Option<Square>,
    /// Plies since the last capture or pawn move.
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            board: Board::starting_position(),
            castling: CastlingRights::all(),
            ..Self::empty()
        }
    }

    /// No pieces, White to move, no castling rights.
    pub fn empty() -> Self {
        Self {
            board: Board::empty(),
            turn: Color::White,
            castling: CastlingRights::none(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn side_to_move(&self) -> Color {
        self.turn
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// True when neither side keeps enough to mate: bare kings, a lone
    /// minor piece, or bishops that all stand on one square colour. Two
    /// knights against a bare king play on.
    pub fn is_insufficient_material(&self) -> bool {
        let extras: Vec<(Square, Piece)> = self
            .board
            .pieces()
            .filter(|(_, piece)| piece.piece_type != PieceType::King)
            .collect();

        let only_minors = extras
            .iter()
            .all(|(_, p)| matches!(p.piece_type, PieceType::Knight | PieceType::Bishop));
        if !only_minors {
            return false;
        }
        if extras.len() <= 1 {
            return true;
        }

        let light = extras.iter().filter(|(square, _)| square.is_light()).count();
        extras.iter().all(|(_, p)| p.piece_type == PieceType::Bishop)
            && (light == 0 || light == extras.len())
    }

    pub fn is_capture(&self, mv: Move) -> bool {
        self.captured_piece(mv).is_some()
    }

    /// The kind of piece `mv` would take, counting en passant.
    pub fn captured_piece(&self, mv: Move) -> Option<PieceType> {
        match self.board.piece_at(mv.to) {
            Some(target) => Some(target.piece_type),
            None => self.is_en_passant(mv).then_some(PieceType::Pawn),
        }
    }

    fn is_en_passant(&self, mv: Move) -> bool {
        self.en_passant == Some(mv.to)
            && mv.from.file() != mv.to.file()
            && self
                .board
                .piece_at(mv.from)
                .is_some_and(|p| p.piece_type == PieceType::Pawn)
    }

    /// The position after `mv`. Legality is not checked; a move from an
    /// empty square yields an unchanged copy.
    pub fn apply_move(&self, mv: Move) -> Self {
        let mut next = self.clone();
        let Some(piece) = self.board.piece_at(mv.from) else {
            return next;
        };

        next.en_passant = None;
        if mv.is_castle(piece) {
            let (rook_from, rook_to) = castle_rook_squares(mv);
            next.board.move_piece(mv.from, mv.to);
            next.board.move_piece(rook_from, rook_to);
            next.halfmove_clock += 1;
        } else {
            let en_passant = self.is_en_passant(mv);
            let captured = next.board.move_piece(mv.from, mv.to);
            if en_passant {
                next.board.set_square(Square::new(mv.to.file(), mv.from.rank()), None);
            }
            if let Some(kind) = mv.promotion {
                next.board.set_square(mv.to, Some(Piece::new(kind, piece.color)));
            }

            let is_pawn = piece.piece_type == PieceType::Pawn;
            if is_pawn && mv.from.distance(mv.to) == 2 {
                next.en_passant = mv.from.offset(0, piece.color.pawn_direction());
            }
            if is_pawn || captured.is_some() {
                next.halfmove_clock = 0;
            } else {
                next.halfmove_clock += 1;
            }
        }

        next.castling = self.castling.update_after_move(mv.from, mv.to);
        if self.turn == Color::Black {
            next.fullmove_number += 1;
        }
        next.turn = self.turn.opponent();
        next
    }

    /// True if any piece of `attacker` could take on `square`.
    pub fn is_attacked_by(&self, square: Square, attacker: Color) -> bool {
        let holds = |at: Square, kind: PieceType| {
            self.board.piece_at(at) == Some(Piece::new(kind, attacker))
        };

        // Pawns attack forwards, so look one rank back from their side
        let pawn_attack = [-1, 1].into_iter().any(|df| {
            square
                .offset(df, -attacker.pawn_direction())
                .is_some_and(|at| holds(at, PieceType::Pawn))
        });

        pawn_attack
            || leaper_targets(square, &KNIGHT_DELTAS).any(|at| holds(at, PieceType::Knight))
            || leaper_targets(square, &KING_DELTAS).any(|at| holds(at, PieceType::King))
            || self.slider_attack(square, attacker, &DIAGONAL_DIRS, PieceType::Bishop)
            || self.slider_attack(square, attacker, &STRAIGHT_DIRS, PieceType::Rook)
    }

    /// Looks along each direction for the first piece and reports whether
    /// it is an enemy `kind` or queen.
    fn slider_attack(
        &self,
        square: Square,
        attacker: Color,
        dirs: &[(i8, i8)],
        kind: PieceType,
    ) -> bool {
        dirs.iter().any(|&(df, dr)| {
            ray(square, df, dr)
                .find_map(|at| self.board.piece_at(at))
                .is_some_and(|p| {
                    p.color == attacker && (p.piece_type == kind || p.piece_type == PieceType::Queen)
                })
        })
    }

    pub fn is_in_check(&self) -> bool {
        self.is_side_in_check(self.turn)
    }

    /// A side without a king is never in check.
    pub fn is_side_in_check(&self, color: Color) -> bool {
        self.board
            .king_square(color)
            .is_some_and(|king| self.is_attacked_by(king, color.opponent()))
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the rook goes when the king makes `king_move`.
pub fn castle_rook_squares(king_move: Move) -> (Square, Square) {
    let rank = king_move.from.rank();
    if king_move.to.file() > king_move.from.file() {
        (Square::new(File::H, rank), Square::new(File::F, rank))
    } else {
        (Square::new(File::A, rank), Square::new(File::D, rank))
    }
}

pub(crate) const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

pub(crate) const KING_DELTAS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub(crate) const DIAGONAL_DIRS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
pub(crate) const STRAIGHT_DIRS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Squares one jump away by each of `deltas`.
pub(crate) fn leaper_targets(
    square: Square,
    deltas: &[(i8, i8)],
) -> impl Iterator<Item = Square> + '_ {
    deltas
        .iter()
        .filter_map(move |&(df, dr)| square.offset(df, dr))
}

/// Squares from `square` (exclusive) to the edge in one direction.
pub(crate) fn ray(square: Square, df: i8, dr: i8) -> impl Iterator<Item = Square> {
    successors(square.offset(df, dr), move |at| at.offset(df, dr))
}
