//! Piece placement, one optional piece per square.

use crate::types::*;

const HOME_ROW: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// The 64 squares, indexed by `Square::index()`.
///
/// Iteration always runs a1, b1, ... h8, so anything built from it
/// (move lists, hashes, attack maps) comes out in a stable order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Board {
    squares: [Option<Piece>; 64],
}

impl Board {
    pub const fn empty() -> Self {
        Self {
            squares: [None; 64],
        }
    }

    pub fn starting_position() -> Self {
        let mut board = Self::empty();
        for color in [Color::White, Color::Black] {
            for (file, &kind) in File::ALL.iter().zip(HOME_ROW.iter()) {
                board.set_square(Square::new(*file, color.back_rank()), Some(Piece::new(kind, color)));
                board.set_square(
                    Square::new(*file, color.pawn_rank()),
                    Some(Piece::new(PieceType::Pawn, color)),
                );
            }
        }
        board
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index() as usize]
    }

    /// Places a piece on `square`, or clears it with `None`.
    pub fn set_square(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.index() as usize] = piece;
    }

    /// Lifts the piece on `from` onto `to` and returns whatever stood on
    /// `to`. An empty `from` leaves the board untouched.
    pub fn move_piece(&mut self, from: Square, to: Square) -> Option<Piece> {
        let piece = self.piece_at(from)?;
        self.set_square(from, None);
        self.squares[to.index() as usize].replace(piece)
    }

    pub fn is_empty(&self, square: Square) -> bool {
        self.piece_at(square).is_none()
    }

    /// True if `square` holds a piece of `color`.
    pub fn is_color(&self, square: Square, color: Color) -> bool {
        self.piece_at(square).is_some_and(|p| p.color == color)
    }

    /// True if `square` holds a piece of the side opposing `color`.
    pub fn is_enemy(&self, square: Square, color: Color) -> bool {
        self.is_color(square, color.opponent())
    }

    /// Where the king of `color` stands, if it is on the board at all.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.squares_of(Piece::new(PieceType::King, color)).next()
    }

    /// Every occupied square with its piece.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |square| self.piece_at(square).map(|p| (square, p)))
    }

    /// The squares holding exactly `piece`.
    pub fn squares_of(&self, piece: Piece) -> impl Iterator<Item = Square> + '_ {
        self.pieces()
            .filter(move |&(_, p)| p == piece)
            .map(|(square, _)| square)
    }

    pub fn count(&self, piece: Piece) -> usize {
        self.squares_of(piece).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::starting_position()
    }
}
