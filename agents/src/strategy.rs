//! Position-level annotation: the strategic theme of the moment, the
//! emotional "vibe" of the position and a one-line summary, bundled with
//! the current candidates into a report.

use chess_core::{Color, Game};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candidates::{select_candidates, CandidatePair};
use crate::evaluation::Evaluatable;
use crate::lookahead::score_legal_moves;

/// Material lead (in pawn tenths) at which White is told to simplify.
const DOMINATION_MARGIN: i32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyGuide {
    pub theme: String,
    pub concept: String,
    pub rule_of_thumb: String,
}

impl StrategyGuide {
    pub fn new(theme: &str, concept: &str, rule_of_thumb: &str) -> Self {
        Self {
            theme: theme.to_string(),
            concept: concept.to_string(),
            rule_of_thumb: rule_of_thumb.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VibeLevel {
    Panic,
    Tension,
    Flow,
    Domination,
}

/// Everything the coach shows about the position to move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionReport {
    pub fen: String,
    pub turn: Color,
    pub candidates: CandidatePair,
    pub strategy: StrategyGuide,
    pub vibe_label: VibeLevel,
    pub vibe_score: u8,
    pub summary: String,
}

/// Picks the strategic theme, checking the cheapest conditions first.
pub fn strategy_guide(game: &Game, candidates: &CandidatePair) -> StrategyGuide {
    if game.is_checkmate() {
        return StrategyGuide::new("Checkmate", "The game has ended decisively.", "Game Over.");
    }
    if game.is_stalemate() {
        return StrategyGuide::new(
            "Stalemate",
            "No legal moves available, but not in check.",
            "Draw secured.",
        );
    }
    if game.is_check() {
        return StrategyGuide::new(
            "King Under Siege",
            "The King is in immediate danger. Defense is the priority.",
            "When in check, consider: Capture, Block, or Run.",
        );
    }

    if game.material_balance() >= DOMINATION_MARGIN {
        return StrategyGuide::new(
            "Domination & Simplification",
            "You have a material advantage. Consolidate and trade pieces.",
            "When ahead, trade pieces but not pawns.",
        );
    }

    let artistic = &candidates.artistic.notation;
    if artistic.contains('x') {
        return StrategyGuide::new(
            "Material Advantage",
            "Removing enemy pieces reduces their attacking potential.",
            "Capture hanging pieces when safe.",
        );
    }
    if artistic.contains("O-O") {
        return StrategyGuide::new(
            "King Safety",
            "Connecting Rooks and protecting the King is vital.",
            "Castle early, castle often.",
        );
    }

    StrategyGuide::new(
        "Positional Maneuver",
        "Improve the position of your pieces to control key squares.",
        "Knights on the rim are dim; control the center.",
    )
}

/// Mood of the position with its 0-100 score.
pub fn vibe(game: &Game) -> (VibeLevel, u8) {
    if game.is_checkmate() {
        (VibeLevel::Domination, 100)
    } else if game.is_check() {
        (VibeLevel::Panic, 30)
    } else {
        (VibeLevel::Flow, 75)
    }
}

pub fn summary(game: &Game) -> &'static str {
    if game.is_checkmate() {
        "Checkmate! The game is yours."
    } else if game.is_check() {
        "The King is under fire! precise defense required."
    } else if game.is_stalemate() {
        "Stalemate. No legal moves."
    } else {
        "The position is fluid. Look for opportunities."
    }
}

/// Full analysis of the side to move: candidates, theme, vibe and summary.
pub fn analyze(game: &Game) -> PositionReport {
    let ranked = score_legal_moves(game.state());
    let candidates = select_candidates(&ranked);
    let strategy = strategy_guide(game, &candidates);
    let (vibe_label, vibe_score) = vibe(game);

    debug!(
        "Analysis: pragmatic {}, artistic {}, theme {}",
        candidates.pragmatic.notation, candidates.artistic.notation, strategy.theme
    );

    PositionReport {
        fen: game.fen(),
        turn: game.turn(),
        candidates,
        strategy,
        vibe_label,
        vibe_score,
        summary: summary(game).to_string(),
    }
}
