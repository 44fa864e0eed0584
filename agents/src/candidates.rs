//! Pragmatic and artistic move recommendations.
//!
//! Both are picked from the lookahead ranking: the artistic candidate
//! favours forcing, sharp play; the pragmatic one favours safe, quiet
//! moves. Each comes with a short tag and a one-sentence rationale.

use chess_core::{MoveInfo, PieceType, Square};
use serde::{Deserialize, Serialize};

use crate::lookahead::ScoredMove;

/// Lookahead score above which a capture still counts as pragmatic.
const PRAGMATIC_SCORE_FLOOR: f64 = 20.0;

/// The two recommendation styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    Pragmatic,
    Artistic,
}

/// A recommended move with its explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub notation: String,
    pub translation: String,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Square>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Square>,
}

impl Candidate {
    /// Placeholder offered when the side to move has no legal move.
    pub fn no_move() -> Self {
        Self {
            notation: "...".to_string(),
            translation: "No moves".to_string(),
            rationale: "Game over.".to_string(),
            from: None,
            to: None,
        }
    }

    /// Packages a legal move as a candidate of the given style.
    pub fn from_move(info: &MoveInfo, archetype: Archetype) -> Self {
        Self {
            notation: info.san.clone(),
            translation: translation_tag(info).to_string(),
            rationale: rationale(info, archetype),
            from: Some(info.from()),
            to: Some(info.to()),
        }
    }

    pub fn is_no_move(&self) -> bool {
        self.from.is_none() && self.notation == "..."
    }
}

/// One recommendation of each style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePair {
    pub pragmatic: Candidate,
    pub artistic: Candidate,
}

impl CandidatePair {
    pub fn no_moves() -> Self {
        Self {
            pragmatic: Candidate::no_move(),
            artistic: Candidate::no_move(),
        }
    }

    pub fn get(&self, archetype: Archetype) -> &Candidate {
        match archetype {
            Archetype::Pragmatic => &self.pragmatic,
            Archetype::Artistic => &self.artistic,
        }
    }
}

fn is_artistic(info: &MoveInfo) -> bool {
    info.is_check() || info.is_mate() || info.is_capture() || info.piece == PieceType::Queen
}

fn is_pragmatic(scored: &ScoredMove) -> bool {
    scored.info.is_castle() || !scored.info.is_capture() || scored.score > PRAGMATIC_SCORE_FLOOR
}

/// Picks the two candidates from moves ranked best first.
pub fn select_candidates(ranked: &[ScoredMove]) -> CandidatePair {
    let Some(top) = ranked.first() else {
        return CandidatePair::no_moves();
    };

    let artistic = ranked
        .iter()
        .find(|m| is_artistic(&m.info))
        .unwrap_or(top);
    let mut pragmatic = ranked.iter().find(|m| is_pragmatic(m)).unwrap_or(top);

    if pragmatic.info.san == artistic.info.san && !artistic.info.is_mate() {
        if let Some(alternative) = ranked.iter().find(|m| m.info.san != artistic.info.san) {
            pragmatic = alternative;
        }
    }

    CandidatePair {
        pragmatic: Candidate::from_move(&pragmatic.info, Archetype::Pragmatic),
        artistic: Candidate::from_move(&artistic.info, Archetype::Artistic),
    }
}

/// Short label describing what kind of move this is.
pub fn translation_tag(info: &MoveInfo) -> &'static str {
    if info.is_promotion() {
        "Promotion"
    } else if info.is_castle() {
        "Castling"
    } else if info.is_mate() {
        "Checkmate"
    } else if info.is_capture() {
        "Capture"
    } else if info.is_check() {
        "Check"
    } else {
        "Positional Move"
    }
}

/// One-sentence explanation of a move in the voice of its archetype.
pub fn rationale(info: &MoveInfo, archetype: Archetype) -> String {
    if info.is_mate() {
        return "Delivers Checkmate. The game is won immediately.".to_string();
    }
    if info.is_promotion() {
        return "Promotes the Pawn to a Queen, creating a decisive material advantage.".to_string();
    }

    let text = match archetype {
        Archetype::Artistic => {
            if info.is_check() {
                "Delivers a check, seizing the initiative and forcing the King to move."
            } else if let Some(victim) = info.captured {
                return format!(
                    "Captures the {} on {}, winning material aggressively.",
                    victim.name(),
                    info.to()
                );
            } else if info.piece == PieceType::Queen {
                "Activates the Queen to create dangerous attacking threats."
            } else {
                "Advances into enemy territory to create tactical complications."
            }
        }
        Archetype::Pragmatic => {
            if info.is_castle() {
                "Castles to safety, connecting the Rooks and protecting the King."
            } else if let Some(victim) = info.captured {
                return format!(
                    "Safely captures the {}, simplifying the position.",
                    victim.name()
                );
            } else if info.piece == PieceType::Pawn {
                "Strengthens the pawn structure and controls critical center squares."
            } else if info.piece == PieceType::King {
                "Moves the King to a safer square out of danger."
            } else {
                "Develops the piece to a solid square, improving coordination."
            }
        }
    };

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookahead::score_legal_moves;
    use chess_core::{Game, GameState};

    fn ranked(fen: &str) -> Vec<ScoredMove> {
        score_legal_moves(&GameState::from_fen(fen).unwrap())
    }

    #[test]
    fn test_opening_candidates_are_distinct() {
        let pair = select_candidates(&score_legal_moves(&GameState::new()));
        assert_eq!(pair.artistic.notation, "d4");
        assert_eq!(pair.pragmatic.notation, "e4");
        assert_eq!(pair.pragmatic.translation, "Positional Move");
        assert_eq!(
            pair.pragmatic.rationale,
            "Strengthens the pawn structure and controls critical center squares."
        );
        assert_eq!(pair.pragmatic.from, Some("e2".parse().unwrap()));
        assert_eq!(pair.pragmatic.to, Some("e4".parse().unwrap()));
    }

    #[test]
    fn test_mate_keeps_both_candidates() {
        let pair = select_candidates(&ranked(
            "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq g3 0 2",
        ));
        assert_eq!(pair.artistic.notation, "Qh4#");
        assert_eq!(pair.pragmatic.notation, "Qh4#");
        assert_eq!(pair.artistic.translation, "Checkmate");
        assert_eq!(
            pair.artistic.rationale,
            "Delivers Checkmate. The game is won immediately."
        );
    }

    #[test]
    fn test_no_moves_sentinel() {
        let pair = select_candidates(&ranked("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1"));
        assert_eq!(pair, CandidatePair::no_moves());
        assert_eq!(pair.artistic.notation, "...");
        assert_eq!(pair.pragmatic.translation, "No moves");
        assert_eq!(pair.pragmatic.rationale, "Game over.");
        assert!(pair.artistic.is_no_move());
    }

    #[test]
    fn test_single_legal_move_is_shared() {
        // The rook holds the g-file and the king covers g7, leaving only Kh7
        let moves = ranked("7k/8/5K2/8/8/8/8/6R1 b - - 0 1");
        assert_eq!(moves.len(), 1);
        let pair = select_candidates(&moves);
        assert_eq!(pair.artistic.notation, pair.pragmatic.notation);
    }

    #[test]
    fn test_translation_tags() {
        let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let castle = game.resolve_san("O-O").unwrap();
        assert_eq!(translation_tag(&castle), "Castling");
        let capture = game.resolve_san("Rxa8+").unwrap();
        assert_eq!(translation_tag(&capture), "Capture");

        let promo = Game::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let a8q = promo.resolve_san("a8=Q+").unwrap();
        assert_eq!(translation_tag(&a8q), "Promotion");
    }

    #[test]
    fn test_capture_rationales_name_the_victim() {
        let game = Game::from_fen("4k3/8/8/3n4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let exd5 = game.resolve_san("exd5").unwrap();
        assert_eq!(
            rationale(&exd5, Archetype::Artistic),
            "Captures the Knight on d5, winning material aggressively."
        );
        assert_eq!(
            rationale(&exd5, Archetype::Pragmatic),
            "Safely captures the Knight, simplifying the position."
        );
    }

    #[test]
    fn test_pragmatic_rationales() {
        let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let short = game.resolve_san("O-O").unwrap();
        assert_eq!(
            rationale(&short, Archetype::Pragmatic),
            "Castles to safety, connecting the Rooks and protecting the King."
        );
        let kf2 = game.resolve_san("Kf2").unwrap();
        assert_eq!(
            rationale(&kf2, Archetype::Pragmatic),
            "Moves the King to a safer square out of danger."
        );
        let start = Game::new();
        let nf3 = start.resolve_san("Nf3").unwrap();
        assert_eq!(
            rationale(&nf3, Archetype::Pragmatic),
            "Develops the piece to a solid square, improving coordination."
        );
        assert_eq!(
            rationale(&nf3, Archetype::Artistic),
            "Advances into enemy territory to create tactical complications."
        );
    }

    #[test]
    fn test_candidate_serializes_squares_as_names() {
        let pair = select_candidates(&score_legal_moves(&GameState::new()));
        let json = serde_json::to_value(&pair.pragmatic).unwrap();
        assert_eq!(json["notation"], "e4");
        assert_eq!(json["from"], "e2");
        let sentinel = serde_json::to_value(Candidate::no_move()).unwrap();
        assert!(sentinel.get("from").is_none());
    }
}
