//! The game session: everything the coach knows about the game in
//! progress, held in one value owned by the orchestrator.

use std::time::{SystemTime, UNIX_EPOCH};

use chess_agents::{analyze, PositionReport};
use chess_core::{Game, GameOutcome, MoveError, MoveInfo, PieceType, Square};
use serde::Serialize;

use crate::attack_map::AttackMap;
use crate::narrative::{ChatMessage, HistoricalGame, InitialAnalysis, Role};
use crate::overlay::OverlayState;

/// Why a game was stopped outside the rules of chess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// A king was taken off the board.
    KingCaptured,
    /// Play cannot continue but no recognised result applies.
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the board image to be read.
    Loading,
    AwaitingHuman,
    HumanMoveApplied,
    OpponentThinking,
    OpponentMoveApplied,
    ReEvaluating,
    Terminated(TerminationReason),
    GameOver(GameOutcome),
}

impl Phase {
    pub fn is_finished(self) -> bool {
        matches!(self, Phase::Terminated(_) | Phase::GameOver(_))
    }

    /// The finished phase for a game that cannot continue, or `None` while
    /// play goes on.
    pub fn finished(game: &Game, last_move: Option<&MoveInfo>) -> Option<Phase> {
        let king_taken = last_move.is_some_and(|info| info.captured == Some(PieceType::King));
        if king_taken {
            return Some(Phase::Terminated(TerminationReason::KingCaptured));
        }
        if !game.is_game_over() {
            return None;
        }
        Some(match game.outcome() {
            Some(outcome) => Phase::GameOver(outcome),
            None => Phase::Terminated(TerminationReason::Unrecognized),
        })
    }
}

/// A request to play a move, either written out or given by its squares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveRequest {
    ByNotation(String),
    ByCoordinates { from: Square, to: Square },
}

impl MoveRequest {
    /// Reads "e2e4" as coordinates and anything else as notation.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.len() == 4 && input.is_ascii() {
            if let (Ok(from), Ok(to)) = (input[..2].parse(), input[2..].parse()) {
                return MoveRequest::ByCoordinates { from, to };
            }
        }
        MoveRequest::ByNotation(input.to_string())
    }

    pub fn resolve(&self, game: &Game) -> Result<MoveInfo, MoveError> {
        match self {
            MoveRequest::ByNotation(san) => game.resolve_san(san),
            MoveRequest::ByCoordinates { from, to } => game.resolve_coords(*from, *to, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    pub game: Game,
    pub phase: Phase,
    /// Completed turns since the start or the last checkpoint.
    pub ply: u32,
    /// Set once the ply cap is reached, until play is continued.
    pub checkpoint: bool,
    pub overlay: OverlayState,
    /// Present while the attack map is switched on.
    pub attack_map: Option<AttackMap>,
    pub report: PositionReport,
    pub base_analysis: Option<InitialAnalysis>,
    pub messages: Vec<ChatMessage>,
    pub chat_pending: bool,
    pub verdict: Option<String>,
    pub verdict_pending: bool,
    pub historical: Option<HistoricalGame>,
    pub historical_pending: bool,
    next_message_id: u64,
}

impl GameSession {
    pub fn new(game: Game) -> Self {
        let report = analyze(&game);
        Self {
            game,
            phase: Phase::AwaitingHuman,
            ply: 0,
            checkpoint: false,
            overlay: OverlayState::new(),
            attack_map: None,
            report,
            base_analysis: None,
            messages: Vec::new(),
            chat_pending: false,
            verdict: None,
            verdict_pending: false,
            historical: None,
            historical_pending: false,
            next_message_id: 0,
        }
    }

    /// A placeholder session while the board image is being read.
    pub fn loading() -> Self {
        Self {
            phase: Phase::Loading,
            ..Self::new(Game::new())
        }
    }

    pub fn fen(&self) -> String {
        self.game.fen()
    }

    /// The base analysis brought up to date with the latest report.
    pub fn current_analysis(&self) -> Option<InitialAnalysis> {
        self.base_analysis
            .as_ref()
            .map(|base| base.with_report(&self.report))
    }

    /// Recomputes the recommendations for the side to move.
    pub fn refresh_report(&mut self) {
        self.report = analyze(&self.game);
    }

    /// Rebuilds the attack map if it is switched on.
    pub fn refresh_attack_map(&mut self) {
        if self.attack_map.is_some() {
            self.attack_map = Some(AttackMap::build(&self.game));
        }
    }

    pub fn push_message(&mut self, role: Role, text: impl Into<String>) {
        self.next_message_id += 1;
        self.messages.push(ChatMessage {
            id: self.next_message_id.to_string(),
            role,
            text: text.into(),
            timestamp: now_millis(),
        });
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{positions, Color};

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_parse_move_request() {
        assert_eq!(
            MoveRequest::parse("e2e4"),
            MoveRequest::ByCoordinates {
                from: sq("e2"),
                to: sq("e4")
            }
        );
        assert_eq!(
            MoveRequest::parse(" Nf3 "),
            MoveRequest::ByNotation("Nf3".to_string())
        );
        // Four characters that are not two squares stay notation
        assert_eq!(
            MoveRequest::parse("O-O+"),
            MoveRequest::ByNotation("O-O+".to_string())
        );
    }

    #[test]
    fn test_resolve_both_ways() {
        let game = Game::new();
        let by_san = MoveRequest::ByNotation("e4".to_string()).resolve(&game).unwrap();
        let by_squares = MoveRequest::parse("e2e4").resolve(&game).unwrap();
        assert_eq!(by_san, by_squares);
        assert!(MoveRequest::parse("e2e5").resolve(&game).is_err());
        assert!(MoveRequest::parse("Qz9").resolve(&game).is_err());
    }

    #[test]
    fn test_finished_phases() {
        let mate = Game::from_fen(positions::FOOLS_MATE).unwrap();
        assert_eq!(
            Phase::finished(&mate, None),
            Some(Phase::GameOver(GameOutcome::Checkmate {
                winner: Color::Black
            }))
        );

        let stalemate = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(
            Phase::finished(&stalemate, None),
            Some(Phase::GameOver(GameOutcome::Stalemate))
        );

        assert_eq!(Phase::finished(&Game::new(), None), None);
        assert!(Phase::GameOver(GameOutcome::Stalemate).is_finished());
        assert!(!Phase::ReEvaluating.is_finished());
    }

    #[test]
    fn test_new_session() {
        let session = GameSession::new(Game::new());
        assert_eq!(session.phase, Phase::AwaitingHuman);
        assert_eq!(session.ply, 0);
        assert_eq!(session.report.candidates.pragmatic.notation, "e4");
        assert!(session.current_analysis().is_none());
        assert_eq!(GameSession::loading().phase, Phase::Loading);
    }

    #[test]
    fn test_messages_get_increasing_ids() {
        let mut session = GameSession::new(Game::new());
        session.push_message(Role::Model, "one");
        session.push_message(Role::User, "two");
        assert_eq!(session.messages[0].id, "1");
        assert_eq!(session.messages[1].id, "2");
        assert_eq!(session.messages[1].role, Role::User);
        assert!(session.messages[0].timestamp > 0);
        assert!(session.messages[0].timestamp <= session.messages[1].timestamp);
    }

    #[test]
    fn test_current_analysis_follows_the_report() {
        let mut session = GameSession::new(Game::new());
        session.base_analysis = Some(InitialAnalysis::recovery());
        let current = session.current_analysis().unwrap();
        assert_eq!(current.metrics.pragmatism.notation, "e4");
        assert_eq!(current.metrics.artistry.notation, "d4");
        assert_eq!(current.strategy.theme, "Positional Maneuver");
        assert_eq!(current.metrics.efficiency, 50);
    }
}
