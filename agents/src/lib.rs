pub mod candidates;
pub mod evaluation;
pub mod lookahead;
pub mod opponent;
pub mod strategy;

use chess_core::{GameState, MoveInfo};

/// Core trait for move-choosing agents
pub trait Agent {
    /// Pick a move for the side to move, or `None` when there is none
    fn best_move(&mut self, state: &GameState) -> Option<MoveInfo>;

    /// Get the agent's name
    fn name(&self) -> &str;
}

pub use candidates::{select_candidates, Archetype, Candidate, CandidatePair};
pub use evaluation::{evaluate_material, piece_value, score_move, Evaluatable, MATE_SCORE};
pub use lookahead::{lookahead_score, score_legal_moves, ScoredMove};
pub use opponent::{OpponentPolicy, DEFAULT_BLUNDER_RATE};
pub use strategy::{analyze, PositionReport, StrategyGuide, VibeLevel};
