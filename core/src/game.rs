//! A game in progress: the current position plus the history needed for
//! repetition detection. This is the rules-engine surface the coach talks to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fen::FenError;
use crate::game_state::GameState;
use crate::move_gen::{has_legal_move, is_checkmate, is_stalemate};
use crate::notation::{legal_moves_verbose, resolve_coords, resolve_san, MoveError, MoveInfo};
use crate::types::{Color, File, Piece, PieceType, Rank, Square};

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Checkmate { winner: Color },
    Stalemate,
    ThreefoldRepetition,
    FiftyMoveRule,
    InsufficientMaterial,
}

impl GameOutcome {
    pub fn is_draw(self) -> bool {
        !matches!(self, GameOutcome::Checkmate { .. })
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOutcome::Checkmate { winner } => write!(f, "Checkmate, {winner} wins"),
            GameOutcome::Stalemate => write!(f, "Draw by stalemate"),
            GameOutcome::ThreefoldRepetition => write!(f, "Draw by threefold repetition"),
            GameOutcome::FiftyMoveRule => write!(f, "Draw by the fifty-move rule"),
            GameOutcome::InsufficientMaterial => write!(f, "Draw by insufficient material"),
        }
    }
}

/// Position plus the hashes of every position reached so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    state: GameState,
    history: Vec<u64>,
}

impl Game {
    /// Starts a game from the standard position.
    pub fn new() -> Self {
        Self::from_state(GameState::new())
    }

    pub fn from_state(state: GameState) -> Self {
        let history = vec![state.zobrist_hash()];
        Self { state, history }
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        GameState::from_fen(fen).map(Self::from_state)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn fen(&self) -> String {
        self.state.to_fen()
    }

    pub fn turn(&self) -> Color {
        self.state.turn
    }

    /// Verbose legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<MoveInfo> {
        legal_moves_verbose(&self.state)
    }

    pub fn resolve_san(&self, san: &str) -> Result<MoveInfo, MoveError> {
        resolve_san(&self.state, san)
    }

    pub fn resolve_coords(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> Result<MoveInfo, MoveError> {
        resolve_coords(&self.state, from, to, promotion)
    }

    /// Applies a move obtained from [`Game::legal_moves`] or one of the
    /// resolvers for this same position.
    pub fn play(&mut self, info: &MoveInfo) {
        self.state = self.state.apply_move(info.mv);
        self.history.push(self.state.zobrist_hash());
    }

    /// Resolves and plays a SAN move.
    pub fn play_san(&mut self, san: &str) -> Result<MoveInfo, MoveError> {
        let info = self.resolve_san(san)?;
        self.play(&info);
        Ok(info)
    }

    /// Returns a copy of the game with `info` applied.
    pub fn after(&self, info: &MoveInfo) -> Self {
        let mut next = self.clone();
        next.play(info);
        next
    }

    pub fn is_attacked(&self, square: Square, by: Color) -> bool {
        self.state.is_attacked_by(square, by)
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.state.board.piece_at(square)
    }

    /// The board as rows from rank 8 down to rank 1, files a to h.
    pub fn board_grid(&self) -> [[Option<Piece>; 8]; 8] {
        let mut grid = [[None; 8]; 8];
        for (row, &rank) in Rank::ALL.iter().rev().enumerate() {
            for file in File::ALL {
                grid[row][file.index() as usize] = self.piece_at(Square::new(file, rank));
            }
        }
        grid
    }

    /// The king square of the side to move when it is in check.
    pub fn checked_king_square(&self) -> Option<Square> {
        if !self.is_check() {
            return None;
        }
        self.state.board.king_square(self.turn())
    }

    pub fn is_check(&self) -> bool {
        self.state.is_in_check()
    }

    pub fn is_checkmate(&self) -> bool {
        is_checkmate(&self.state)
    }

    pub fn is_stalemate(&self) -> bool {
        is_stalemate(&self.state)
    }

    /// True once the current position has occurred three times.
    pub fn is_threefold_repetition(&self) -> bool {
        let Some(&current) = self.history.last() else {
            return false;
        };
        self.history.iter().filter(|&&hash| hash == current).count() >= 3
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.state.is_insufficient_material()
    }

    pub fn is_fifty_moves(&self) -> bool {
        self.state.is_fifty_move_draw()
    }

    pub fn is_draw(&self) -> bool {
        self.is_stalemate()
            || self.is_threefold_repetition()
            || self.is_fifty_moves()
            || self.is_insufficient_material()
    }

    /// True if either king is missing from the board.
    pub fn is_king_missing(&self) -> bool {
        [Color::White, Color::Black]
            .iter()
            .any(|&color| self.state.board.king_square(color).is_none())
    }

    /// True when play cannot continue: a recognised result, or a board
    /// that has lost a king.
    pub fn is_game_over(&self) -> bool {
        self.is_king_missing() || !has_legal_move(&self.state) || self.is_draw()
    }

    /// The recognised result of a finished game, if any.
    pub fn outcome(&self) -> Option<GameOutcome> {
        if self.is_king_missing() {
            return None;
        }
        if self.is_checkmate() {
            return Some(GameOutcome::Checkmate {
                winner: self.turn().opponent(),
            });
        }
        if self.is_stalemate() {
            return Some(GameOutcome::Stalemate);
        }
        if self.is_insufficient_material() {
            return Some(GameOutcome::InsufficientMaterial);
        }
        if self.is_threefold_repetition() {
            return Some(GameOutcome::ThreefoldRepetition);
        }
        if self.is_fifty_moves() {
            return Some(GameOutcome::FiftyMoveRule);
        }
        None
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
