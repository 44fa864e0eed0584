//! Reading and writing positions as FEN.

use crate::board::Board;
use crate::game_state::GameState;
use crate::types::{
    CastlingRights, Color, File, Piece, PieceType, Rank, SideCastlingRights, Square,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format: {0}")]
    InvalidFormat(String),
    #[error("Invalid piece character: '{0}'")]
    InvalidPiece(char),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Invalid castling rights: {0}")]
    InvalidCastling(String),
    #[error("Invalid en passant square: {0}")]
    InvalidEnPassant(String),
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Expected exactly one {0} king")]
    InvalidKings(Color),
}

/// Letters for each colour in castling fields, kingside first.
const CASTLING_LETTERS: [(Color, char, char); 2] =
    [(Color::White, 'K', 'Q'), (Color::Black, 'k', 'q')];

impl GameState {
    /// Reads a FEN record. The two move counters may be left off, in
    /// which case they are taken as `0 1`. Castling rights whose king or
    /// rook has left its home square are dropped.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let (placement, turn, castling, en_passant, counters) = match fields.as_slice() {
            [p, t, c, e] => (*p, *t, *c, *e, None),
            [p, t, c, e, half, full] => (*p, *t, *c, *e, Some((*half, *full))),
            _ => {
                return Err(FenError::InvalidFormat(format!(
                    "Expected 6 fields, got {}",
                    fields.len()
                )))
            }
        };

        let board = parse_placement(placement)?;
        let turn = match turn {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidColor(other.to_string())),
        };
        let castling = keep_possible_castling(&board, parse_castling(castling)?);
        let en_passant = match en_passant {
            "-" => None,
            name => Some(
                name.parse::<Square>()
                    .map_err(|_| FenError::InvalidEnPassant(name.to_string()))?,
            ),
        };
        let (halfmove_clock, fullmove_number) = match counters {
            Some((half, full)) => (parse_counter(half)?, parse_counter(full)?),
            None => (0, 1),
        };

        Ok(GameState {
            board,
            turn,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    /// Writes the position as a full six-field FEN record.
    pub fn to_fen(&self) -> String {
        let en_passant = self
            .en_passant
            .map_or_else(|| "-".to_string(), |square| square.to_string());
        format!(
            "{} {} {} {} {} {}",
            placement(&self.board),
            self.turn.to_char(),
            castling_field(self.castling),
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

fn parse_counter(field: &str) -> Result<u16, FenError> {
    field
        .parse()
        .map_err(|_| FenError::InvalidNumber(field.to_string()))
}

fn parse_placement(field: &str) -> Result<Board, FenError> {
    let rows: Vec<&str> = field.split('/').collect();
    if rows.len() != 8 {
        return Err(FenError::InvalidFormat(format!(
            "Expected 8 ranks, got {}",
            rows.len()
        )));
    }

    let mut board = Board::empty();
    // Rows run from rank 8 down to rank 1
    for (row, rank) in rows.iter().zip(Rank::ALL.iter().rev()) {
        let mut file_index = 0u8;
        for ch in row.chars() {
            if let Some(gap) = ch.to_digit(10) {
                file_index += gap as u8;
                continue;
            }
            let file = File::new(file_index).ok_or_else(|| {
                FenError::InvalidFormat(format!("Too many squares in rank {}", rank.to_char()))
            })?;
            board.set_square(Square::new(file, *rank), Some(piece_from_char(ch)?));
            file_index += 1;
        }
        if file_index != 8 {
            return Err(FenError::InvalidFormat(format!(
                "Rank {} has {} squares, expected 8",
                rank.to_char(),
                file_index
            )));
        }
    }

    for color in [Color::White, Color::Black] {
        if board.count(Piece::new(PieceType::King, color)) != 1 {
            return Err(FenError::InvalidKings(color));
        }
    }
    Ok(board)
}

fn keep_possible_castling(board: &Board, claimed: CastlingRights) -> CastlingRights {
    let side = |color: Color| {
        let rights = claimed.get(color);
        let at_home = |file: File, kind: PieceType| {
            board.piece_at(Square::new(file, color.back_rank())) == Some(Piece::new(kind, color))
        };
        let king = at_home(File::E, PieceType::King);
        SideCastlingRights {
            kingside: rights.kingside && king && at_home(File::H, PieceType::Rook),
            queenside: rights.queenside && king && at_home(File::A, PieceType::Rook),
        }
    };
    CastlingRights {
        white: side(Color::White),
        black: side(Color::Black),
    }
}

fn placement(board: &Board) -> String {
    let rows: Vec<String> = Rank::ALL
        .iter()
        .rev()
        .map(|&rank| {
            let mut row = String::new();
            let mut gap = 0;
            for file in File::ALL {
                match board.piece_at(Square::new(file, rank)) {
                    Some(piece) => {
                        if gap > 0 {
                            row.push_str(&gap.to_string());
                            gap = 0;
                        }
                        row.push(piece_to_char(piece));
                    }
                    None => gap += 1,
                }
            }
            if gap > 0 {
                row.push_str(&gap.to_string());
            }
            row
        })
        .collect();
    rows.join("/")
}

/// Uppercase for White, lowercase for Black.
fn piece_to_char(piece: Piece) -> char {
    let letter = piece.piece_type.san_letter().unwrap_or('P');
    match piece.color {
        Color::White => letter,
        Color::Black => letter.to_ascii_lowercase(),
    }
}

fn piece_from_char(ch: char) -> Result<Piece, FenError> {
    let piece_type = PieceType::from_letter(ch).ok_or(FenError::InvalidPiece(ch))?;
    let color = if ch.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    Ok(Piece::new(piece_type, color))
}

fn parse_castling(field: &str) -> Result<CastlingRights, FenError> {
    let mut rights = CastlingRights::none();
    if field == "-" {
        return Ok(rights);
    }
    for ch in field.chars() {
        match ch {
            'K' => rights.white.kingside = true,
            'Q' => rights.white.queenside = true,
            'k' => rights.black.kingside = true,
            'q' => rights.black.queenside = true,
            _ => return Err(FenError::InvalidCastling(field.to_string())),
        }
    }
    Ok(rights)
}

fn castling_field(rights: CastlingRights) -> String {
    let field: String = CASTLING_LETTERS
        .iter()
        .flat_map(|&(color, king, queen)| {
            let side = rights.get(color);
            [(side.kingside, king), (side.queenside, queen)]
        })
        .filter_map(|(held, letter)| held.then_some(letter))
        .collect();
    if field.is_empty() {
        "-".to_string()
    } else {
        field
    }
}

/// Positions used across the workspace and its tests.
pub mod positions {
    pub const STARTING: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// A crowded middlegame with castling, pins and en passant chances.
    pub const KIWIPETE: &str =
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    /// 1.e4 e5
    pub const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";

    /// 1.f3 e5 2.g4 Qh4#, White mated.
    pub const FOOLS_MATE: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_position_matches_new() {
        assert_eq!(GameState::from_fen(positions::STARTING).unwrap(), GameState::new());
    }

    #[test]
    fn test_written_back_unchanged() {
        for fen in [
            positions::STARTING,
            positions::KIWIPETE,
            positions::AFTER_E4_E5,
            positions::FOOLS_MATE,
            "8/8/8/8/8/8/8/k6K b - - 49 120",
        ] {
            assert_eq!(GameState::from_fen(fen).unwrap().to_fen(), fen);
        }
    }

    #[test]
    fn test_fields_are_read() {
        let state = GameState::from_fen(positions::AFTER_E4_E5).unwrap();
        assert_eq!(state.turn, Color::White);
        assert_eq!(state.en_passant, Some(Square::new(File::E, Rank::new(5).unwrap())));
        assert_eq!(state.fullmove_number, 2);
        assert_eq!(
            state.board.piece_at(Square::new(File::E, Rank::FIRST)),
            Some(Piece::new(PieceType::King, Color::White))
        );
    }

    #[test]
    fn test_counters_default_when_omitted() {
        let state =
            GameState::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").unwrap();
        assert_eq!(state.halfmove_clock, 0);
        assert_eq!(state.fullmove_number, 1);
    }

    #[test]
    fn test_castling_rights_need_pieces_at_home() {
        // Claims KQkq but the h1 rook is gone
        let state = GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K3 w KQkq - 0 1").unwrap();
        assert!(!state.castling.white.kingside);
        assert!(state.castling.white.queenside);
        assert!(state.castling.black.kingside);
        assert!(state.to_fen().contains(" Qkq "));
    }

    #[test]
    fn test_rejected_records() {
        assert!(GameState::from_fen("invalid").is_err());
        assert!(GameState::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR").is_err());
        assert!(matches!(
            GameState::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
            Err(FenError::InvalidColor(_))
        ));
        assert!(matches!(
            GameState::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1"),
            Err(FenError::InvalidPiece('X'))
        ));
        assert!(matches!(
            GameState::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::InvalidKings(Color::Black))
        ));
        assert!(matches!(
            GameState::from_fen("rnbqkbnr/ppppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1"),
            Err(FenError::InvalidFormat(_))
        ));
        assert!(matches!(
            GameState::from_fen("4k3/8/8/8/8/8/8/4K3 w - e9 0 1"),
            Err(FenError::InvalidEnPassant(_))
        ));
    }
}
