use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank holding the king and rooks at the start.
    pub const fn back_rank(self) -> Rank {
        match self {
            Color::White => Rank::FIRST,
            Color::Black => Rank::EIGHTH,
        }
    }

    /// Rank holding the pawns at the start.
    pub const fn pawn_rank(self) -> Rank {
        match self {
            Color::White => Rank::SECOND,
            Color::Black => Rank::SEVENTH,
        }
    }

    pub const fn promotion_rank(self) -> Rank {
        self.opponent().back_rank()
    }

    /// +1 when pawns advance up the board, -1 when they advance down.
    pub const fn pawn_direction(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Side-to-move letter used in FEN.
    pub const fn to_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Color::White => "White",
            Color::Black => "Black",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// Promotion choices, strongest first.
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    pub const fn is_slider(self) -> bool {
        matches!(self, PieceType::Bishop | PieceType::Rook | PieceType::Queen)
    }

    /// Uppercase letter used in algebraic notation; pawns have none.
    pub const fn san_letter(self) -> Option<char> {
        match self {
            PieceType::Pawn => None,
            PieceType::Knight => Some('N'),
            PieceType::Bishop => Some('B'),
            PieceType::Rook => Some('R'),
            PieceType::Queen => Some('Q'),
            PieceType::King => Some('K'),
        }
    }

    /// Reads a piece letter in either case, pawns included.
    pub const fn from_letter(c: char) -> Option<Self> {
        Some(match c.to_ascii_uppercase() {
            'P' => PieceType::Pawn,
            'N' => PieceType::Knight,
            'B' => PieceType::Bishop,
            'R' => PieceType::Rook,
            'Q' => PieceType::Queen,
            'K' => PieceType::King,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            PieceType::Pawn => "Pawn",
            PieceType::Knight => "Knight",
            PieceType::Bishop => "Bishop",
            PieceType::Rook => "Rook",
            PieceType::Queen => "Queen",
            PieceType::King => "King",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
}

const WHITE_GLYPHS: [char; 6] = ['♙', '♘', '♗', '♖', '♕', '♔'];
const BLACK_GLYPHS: [char; 6] = ['♟', '♞', '♝', '♜', '♛', '♚'];

impl Piece {
    pub const fn new(piece_type: PieceType, color: Color) -> Self {
        Self { piece_type, color }
    }

    /// Unicode chess symbol, outlined for White and filled for Black.
    pub const fn glyph(self) -> char {
        let glyphs = match self.color {
            Color::White => WHITE_GLYPHS,
            Color::Black => BLACK_GLYPHS,
        };
        glyphs[self.piece_type as usize]
    }
}

/// Shared shape of `File` and `Rank`: a 0..8 index written as one
/// character counted from `$first`.
macro_rules! board_line {
    ($(#[$doc:meta])* $name:ident, $first:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(u8);

        impl $name {
            pub const ALL: [$name; 8] = [
                $name(0), $name(1), $name(2), $name(3),
                $name(4), $name(5), $name(6), $name(7),
            ];

            pub const fn new(index: u8) -> Option<Self> {
                if index < 8 {
                    Some($name(index))
                } else {
                    None
                }
            }

            pub const fn from_char(c: char) -> Option<Self> {
                let offset = (c as u32).wrapping_sub($first as u32);
                if offset < 8 {
                    Some($name(offset as u8))
                } else {
                    None
                }
            }

            pub const fn to_char(self) -> char {
                ($first as u8 + self.0) as char
            }

            pub const fn index(self) -> u8 {
                self.0
            }

            /// The line `delta` steps away, if it is still on the board.
            pub const fn offset(self, delta: i8) -> Option<Self> {
                let moved = self.0 as i8 + delta;
                if moved >= 0 && moved < 8 {
                    Some($name(moved as u8))
                } else {
                    None
                }
            }
        }
    };
}

board_line!(
    /// Column a..h.
    File,
    'a'
);
board_line!(
    /// Row 1..8.
    Rank,
    '1'
);

impl File {
    pub const A: File = File(0);
    pub const B: File = File(1);
    pub const C: File = File(2);
    pub const D: File = File(3);
    pub const E: File = File(4);
    pub const F: File = File(5);
    pub const G: File = File(6);
    pub const H: File = File(7);
}

impl Rank {
    pub const FIRST: Rank = Rank(0);
    pub const SECOND: Rank = Rank(1);
    pub const FOURTH: Rank = Rank(3);
    pub const SEVENTH: Rank = Rank(6);
    pub const EIGHTH: Rank = Rank(7);
}

/// A square, numbered a1 = 0, b1 = 1, ... h8 = 63.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Square(u8);

impl Square {
    pub const fn new(file: File, rank: Rank) -> Self {
        Square(rank.0 * 8 + file.0)
    }

    /// All 64 squares, a1 first and h8 last.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }

    pub const fn file(self) -> File {
        File(self.0 % 8)
    }

    pub const fn rank(self) -> Rank {
        Rank(self.0 / 8)
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    /// The square `df` files and `dr` ranks away, if it is on the board.
    pub const fn offset(self, df: i8, dr: i8) -> Option<Square> {
        match (self.file().offset(df), self.rank().offset(dr)) {
            (Some(file), Some(rank)) => Some(Square::new(file, rank)),
            _ => None,
        }
    }

    /// a1 is dark, h1 is light.
    pub const fn is_light(self) -> bool {
        (self.file().0 + self.rank().0) % 2 == 1
    }

    /// Number of king steps between the two squares.
    pub const fn distance(self, other: Square) -> u8 {
        let files = self.file().0.abs_diff(other.file().0);
        let ranks = self.rank().0.abs_diff(other.rank().0);
        if files > ranks {
            files
        } else {
            ranks
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file().to_char(), self.rank().to_char())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid square: {0:?}")]
pub struct ParseSquareError(pub String);

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(f), Some(r), None) => File::from_char(f)
                .zip(Rank::from_char(r))
                .map(|(file, rank)| Square::new(file, rank))
                .ok_or_else(|| ParseSquareError(s.to_string())),
            _ => Err(ParseSquareError(s.to_string())),
        }
    }
}

/// Squares serialize as their names, e.g. `"e4"`.
impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SideCastlingRights {
    pub kingside: bool,
    pub queenside: bool,
}

impl SideCastlingRights {
    pub const fn both() -> Self {
        Self {
            kingside: true,
            queenside: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            kingside: false,
            queenside: false,
        }
    }

    pub const fn any(self) -> bool {
        self.kingside || self.queenside
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct CastlingRights {
    pub white: SideCastlingRights,
    pub black: SideCastlingRights,
}

impl CastlingRights {
    pub const fn all() -> Self {
        Self {
            white: SideCastlingRights::both(),
            black: SideCastlingRights::both(),
        }
    }

    pub const fn none() -> Self {
        Self {
            white: SideCastlingRights::none(),
            black: SideCastlingRights::none(),
        }
    }

    pub const fn get(self, color: Color) -> SideCastlingRights {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    fn side_mut(&mut self, color: Color) -> &mut SideCastlingRights {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Rights left once something leaves `from` and lands on `to`. Any
    /// traffic through a king or rook home square forfeits that right.
    pub fn update_after_move(self, from: Square, to: Square) -> Self {
        let mut rights = self;
        for color in [Color::White, Color::Black] {
            let home = |file| Square::new(file, color.back_rank());
            let side = rights.side_mut(color);
            if from == home(File::E) {
                *side = SideCastlingRights::none();
            }
            if from == home(File::A) || to == home(File::A) {
                side.queenside = false;
            }
            if from == home(File::H) || to == home(File::H) {
                side.kingside = false;
            }
        }
        rights
    }
}

/// A move given by its squares, plus the promotion piece if any.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
}

impl Move {
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub const fn new_promotion(from: Square, to: Square, promotion: PieceType) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    pub const fn is_promotion(self) -> bool {
        self.promotion.is_some()
    }

    /// A king travelling two files is castling.
    pub fn is_castle(self, piece: Piece) -> bool {
        piece.piece_type == PieceType::King && self.from.distance(self.to) == 2
    }
}

/// Coordinate notation, e.g. `e2e4` or `e7e8q`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(letter) = self.promotion.and_then(PieceType::san_letter) {
            write!(f, "{}", letter.to_ascii_lowercase())?;
        }
        Ok(())
    }
}

bitflags::bitflags! {
    /// Tags the rules engine attaches to a played or candidate move.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct MoveFlags: u8 {
        const CAPTURE = 1;
        const CHECK = 1 << 1;
        const MATE = 1 << 2;
        const CASTLE_KINGSIDE = 1 << 3;
        const CASTLE_QUEENSIDE = 1 << 4;
        const PROMOTION = 1 << 5;

        /// Either castling tag.
        const CASTLE = Self::CASTLE_KINGSIDE.bits() | Self::CASTLE_QUEENSIDE.bits();
    }
}
