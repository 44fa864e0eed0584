use chess_core::{legal_moves_verbose, GameState, MoveInfo, PieceType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::evaluation::score_move;
use crate::Agent;

/// Probability of playing the second-ranked move instead of the best one.
pub const DEFAULT_BLUNDER_RATE: f64 = 0.3;

/// A deliberately fallible sparring partner.
///
/// Ranks moves by their immediate score only and, with probability
/// `blunder_rate`, plays the runner-up.
pub struct OpponentPolicy<R: Rng> {
    rng: R,
    blunder_rate: f64,
    name: String,
}

impl<R: Rng> OpponentPolicy<R> {
    pub fn new(rng: R, blunder_rate: f64) -> Self {
        let blunder_rate = blunder_rate.clamp(0.0, 1.0);
        Self {
            rng,
            blunder_rate,
            name: format!("Opponent(blunder={blunder_rate:.2})"),
        }
    }

    pub fn blunder_rate(&self) -> f64 {
        self.blunder_rate
    }

    /// Picks a reply from verbose legal moves of the side to move.
    pub fn choose(&mut self, moves: &[MoveInfo]) -> Option<MoveInfo> {
        let mut ranked: Vec<(&MoveInfo, i32)> =
            moves.iter().map(|info| (info, score_move(info))).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let pick = match ranked.as_slice() {
            [] => return None,
            [(only, _)] => *only,
            [(best, _), (second, _), ..] => {
                if self.rng.gen_bool(self.blunder_rate) {
                    debug!("Opponent slips: {} instead of {}", second.san, best.san);
                    *second
                } else {
                    *best
                }
            }
        };

        Some(strongest_promotion(pick, moves))
    }
}

impl OpponentPolicy<StdRng> {
    /// Reproducible opponent for a fixed seed.
    pub fn seeded(seed: u64, blunder_rate: f64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), blunder_rate)
    }

    /// Opponent seeded from system entropy.
    pub fn from_entropy(blunder_rate: f64) -> Self {
        Self::new(StdRng::from_entropy(), blunder_rate)
    }
}

/// Swaps an under-promotion for the queen promotion on the same squares.
fn strongest_promotion(pick: &MoveInfo, moves: &[MoveInfo]) -> MoveInfo {
    if !pick.is_promotion() || pick.promotion() == Some(PieceType::Queen) {
        return pick.clone();
    }
    moves
        .iter()
        .find(|m| {
            m.from() == pick.from() && m.to() == pick.to() && m.promotion() == Some(PieceType::Queen)
        })
        .unwrap_or(pick)
        .clone()
}

impl<R: Rng> Agent for OpponentPolicy<R> {
    fn best_move(&mut self, state: &GameState) -> Option<MoveInfo> {
        self.choose(&legal_moves_verbose(state))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::Game;

    #[test]
    fn test_no_moves_yields_none() {
        let stalemate = GameState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let mut opponent = OpponentPolicy::seeded(1, DEFAULT_BLUNDER_RATE);
        assert!(opponent.best_move(&stalemate).is_none());
    }

    #[test]
    fn test_single_move_always_played() {
        let forced = GameState::from_fen("7k/8/5K2/8/8/8/8/6R1 b - - 0 1").unwrap();
        let mut opponent = OpponentPolicy::seeded(7, 1.0);
        for _ in 0..20 {
            assert_eq!(opponent.best_move(&forced).map(|m| m.san), Some("Kh7".to_string()));
        }
    }

    #[test]
    fn test_never_blunders_at_zero_rate() {
        let mut opponent = OpponentPolicy::seeded(3, 0.0);
        for _ in 0..50 {
            // d4 and e4 tie at 25; d4 is generated first
            let pick = opponent.best_move(&GameState::new()).unwrap();
            assert_eq!(pick.san, "d4");
        }
    }

    #[test]
    fn test_blunder_frequency() {
        // The white king is boxed in; only h7 and hxg7 remain, scored 0 and 370
        let game = Game::from_fen("1r2k3/6n1/7P/8/8/8/6r1/K7 w - - 0 1").unwrap();
        let moves = game.legal_moves();
        assert_eq!(moves.len(), 2);

        let mut opponent = OpponentPolicy::seeded(42, DEFAULT_BLUNDER_RATE);
        let trials = 1000;
        let seconds = (0..trials)
            .filter(|_| opponent.choose(&moves).is_some_and(|pick| pick.san == "h7"))
            .count();

        let rate = seconds as f64 / trials as f64;
        assert!((0.25..=0.35).contains(&rate), "blunder rate {rate}");
    }

    #[test]
    fn test_promotion_resolves_to_queen() {
        // Rook and bishop promotions tie on score with the queen; always queen
        let game = Game::from_fen("8/P6k/8/8/8/8/8/7K w - - 0 1").unwrap();
        let mut opponent = OpponentPolicy::seeded(5, 1.0);
        let pick = opponent.best_move(game.state()).unwrap();
        assert_eq!(pick.promotion(), Some(PieceType::Queen));
    }
}
