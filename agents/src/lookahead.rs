use chess_core::{legal_moves_verbose, GameState, MoveInfo, PieceType};
use tracing::debug;

use crate::evaluation::{score_move, MATE_SCORE};

/// Extra risk charged when a reply wins the queen.
const QUEEN_LOSS_RISK: i32 = 500;
/// Share of the opponent's best reply subtracted from a move's own score.
const RISK_WEIGHT: f64 = 0.8;

/// A legal move with its lookahead score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMove {
    pub info: MoveInfo,
    pub score: f64,
}

/// One-ply adversarial score of `info`, a legal move in `state`.
///
/// Mates score [`MATE_SCORE`]; a move that allows a mating reply scores
/// `-MATE_SCORE`; otherwise the opponent's best reply is discounted from
/// the move's own score.
pub fn lookahead_score(state: &GameState, info: &MoveInfo) -> f64 {
    if info.is_mate() {
        return f64::from(MATE_SCORE);
    }

    let immediate = f64::from(score_move(info));
    let next = state.apply_move(info.mv);
    let replies = legal_moves_verbose(&next);
    if replies.is_empty() {
        return immediate;
    }

    let mut risk = i32::MIN;
    for reply in &replies {
        if reply.is_mate() {
            return -f64::from(MATE_SCORE);
        }
        let mut reply_score = score_move(reply);
        if reply.captured == Some(PieceType::Queen) {
            reply_score += QUEEN_LOSS_RISK;
        }
        risk = risk.max(reply_score);
    }

    immediate - RISK_WEIGHT * f64::from(risk)
}

/// Scores every legal move of the side to move, best first.
///
/// Equal scores keep move-generation order.
pub fn score_legal_moves(state: &GameState) -> Vec<ScoredMove> {
    let mut scored: Vec<ScoredMove> = legal_moves_verbose(state)
        .into_iter()
        .map(|info| {
            let score = lookahead_score(state, &info);
            ScoredMove { info, score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    if let Some(best) = scored.first() {
        debug!(
            "{} legal moves scored, best {} ({:.1})",
            scored.len(),
            best.info.san,
            best.score
        );
    }

    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::Game;

    fn state(fen: &str) -> GameState {
        GameState::from_fen(fen).unwrap()
    }

    fn find<'a>(scored: &'a [ScoredMove], san: &str) -> &'a ScoredMove {
        scored.iter().find(|m| m.info.san == san).unwrap()
    }

    #[test]
    fn test_opening_scores() {
        let scored = score_legal_moves(&GameState::new());
        assert_eq!(scored.len(), 20);

        // Central pushes: 25 - 0.8 * 25
        assert_eq!(find(&scored, "e4").score, 5.0);
        assert_eq!(find(&scored, "d4").score, 5.0);
        assert_eq!(find(&scored, "Nf3").score, -20.0);

        // Stable: d4 is generated before e4 and keeps that order on a tie
        assert_eq!(scored[0].info.san, "d4");
        assert_eq!(scored[1].info.san, "e4");
    }

    #[test]
    fn test_mate_ranks_first() {
        let before_mate =
            state("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq g3 0 2");
        let scored = score_legal_moves(&before_mate);
        assert_eq!(scored[0].info.san, "Qh4#");
        assert_eq!(scored[0].score, 100_000.0);
        assert!(scored[1..].iter().all(|m| m.score < scored[0].score));
    }

    #[test]
    fn test_allowing_mate_is_losing() {
        // After 1.f3 e5 White plays g4?? allowing Qh4#
        let before_blunder = state("rnbqkbnr/pppp1ppp/8/4p3/8/5P2/PPPPP1PP/RNBQKBNR w KQkq e6 0 2");
        let scored = score_legal_moves(&before_blunder);
        assert_eq!(find(&scored, "g4").score, -100_000.0);
        assert!(scored[0].score > -100_000.0);
        assert_eq!(scored.last().map(|m| m.score), Some(-100_000.0));
    }

    #[test]
    fn test_queen_hanging_reply_is_penalised() {
        let game = Game::from_fen("4k3/8/4p3/8/8/8/8/3QK3 w - - 0 1").unwrap();
        let qd5 = game.resolve_san("Qd5").unwrap();
        // exd5 wins the queen: 900 + 50 (cheaper attacker) + 25 (centre) + 500
        let expected = 25.0 - 0.8 * f64::from(900 + 50 + 25 + 500);
        assert_eq!(lookahead_score(game.state(), &qd5), expected);
    }

    #[test]
    fn test_no_replies_keeps_immediate_score() {
        // Qf7 leaves Black without a move
        let game = Game::from_fen("7k/8/5QK1/8/8/8/8/8 w - - 0 1").unwrap();
        let qf7 = game.resolve_san("Qf7").unwrap();
        assert!(game.after(&qf7).legal_moves().is_empty());
        assert_eq!(lookahead_score(game.state(), &qf7), 0.0);
    }
}
