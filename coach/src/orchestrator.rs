//! The turn loop.
//!
//! A turn runs human move, opponent reply, re-evaluation. The pauses
//! between those steps are handed out as [`Continuation`]s that the driver
//! resumes when it sees fit; the steps themselves never sleep or spawn
//! anything, and [`TurnOrchestrator::run_pending`] is only a blocking
//! driver for callers that want one. Every continuation and every service
//! request carries the epoch of the session that issued it; anything from
//! an older session is dropped on arrival.

use std::thread;
use std::time::Duration;

use chess_agents::{Agent, Archetype, Candidate};
use chess_core::{FenError, Game, MoveInfo, Square};
use tracing::{debug, info, warn};

use crate::attack_map::AttackMap;
use crate::config::CoachConfig;
use crate::narrative::{
    HistoricalGame, InitialAnalysis, Role, ServiceError, ServiceRequest, CHAT_FALLBACK,
    VERDICT_FALLBACK,
};
use crate::session::{GameSession, MoveRequest, Phase};

/// Shown when the board image could not be turned into a position.
pub const VISION_FALLBACK_MESSAGE: &str =
    "I couldn't quite see the board perfectly, so I set up a standard game. You can still play!";
pub const PROMOTION_MESSAGE: &str = "Pawn Promoted to Queen! A decisive advantage.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    OpponentReply,
    Reevaluate,
}

/// A step of the turn waiting for its pause to elapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation {
    pub epoch: u64,
    pub stage: Stage,
    pub delay: Duration,
}

pub struct TurnOrchestrator {
    config: CoachConfig,
    opponent: Box<dyn Agent>,
    epoch: u64,
    session: Option<GameSession>,
    pending: Option<Continuation>,
    outbox: Vec<ServiceRequest>,
}

impl TurnOrchestrator {
    pub fn new(config: CoachConfig) -> Self {
        let opponent = config.opponent();
        Self::with_opponent(config, opponent)
    }

    pub fn with_opponent(config: CoachConfig, opponent: Box<dyn Agent>) -> Self {
        Self {
            config,
            opponent,
            epoch: 0,
            session: None,
            pending: None,
            outbox: Vec::new(),
        }
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn pending(&self) -> Option<&Continuation> {
        self.pending.as_ref()
    }

    pub fn outbox(&self) -> &[ServiceRequest] {
        &self.outbox
    }

    /// Hands the queued service requests to the caller.
    pub fn take_requests(&mut self) -> Vec<ServiceRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Drops the session and everything still in flight for it.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.session = None;
        self.pending = None;
        self.outbox.clear();
        debug!("Session reset, epoch {}", self.epoch);
    }

    /// Starts a session on a known position without the narrative service.
    pub fn start_from_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let game = Game::from_fen(fen)?;
        self.reset();

        let mut session = GameSession::new(game);
        session.base_analysis = Some(InitialAnalysis::from_report(&session.report, None));
        let greeting = greeting(&session.game, &session.report.summary);
        session.push_message(Role::Model, greeting);
        self.session = Some(session);

        self.finish_if_over(None);
        Ok(())
    }

    /// Starts a new session from a board picture. The position arrives
    /// later through [`TurnOrchestrator::deliver_analysis`].
    pub fn begin_analysis(&mut self, image: Vec<u8>) {
        self.reset();
        self.session = Some(GameSession::loading());
        self.outbox.push(ServiceRequest::AnalyzeImage {
            epoch: self.epoch,
            image,
        });
    }

    pub fn deliver_analysis(
        &mut self,
        epoch: u64,
        result: Result<InitialAnalysis, ServiceError>,
    ) -> bool {
        let Some(session) = self.live_session(epoch) else {
            return false;
        };
        if session.phase != Phase::Loading {
            return false;
        }

        let (game, base, message) = match result {
            Ok(analysis) => match Game::from_fen(&analysis.fen) {
                Ok(game) => {
                    let message = greeting(&game, &analysis.summary);
                    (game, analysis, message)
                }
                Err(e) => {
                    warn!(
                        "Unusable position {:?} ({}), using the starting position",
                        analysis.fen, e
                    );
                    (Game::new(), analysis, VISION_FALLBACK_MESSAGE.to_string())
                }
            },
            Err(e) => {
                warn!("Board analysis failed: {}", e);
                (
                    Game::new(),
                    InitialAnalysis::recovery(),
                    VISION_FALLBACK_MESSAGE.to_string(),
                )
            }
        };

        let opening = base.opening_name.clone();
        let mut fresh = GameSession::new(game);
        fresh.base_analysis = Some(base);
        fresh.push_message(Role::Model, message);
        fresh.historical_pending = opening.is_some();
        *session = fresh;

        if let Some(opening) = opening {
            self.outbox.push(ServiceRequest::HistoricalMatch { epoch, opening });
        }
        self.finish_if_over(None);
        true
    }

    /// Plays a move for the human side. Returns `false`, changing nothing,
    /// when no move can be played.
    pub fn execute(&mut self, request: MoveRequest) -> bool {
        self.execute_first(&[request])
    }

    /// Plays one of the current recommendations.
    pub fn execute_candidate(&mut self, archetype: Archetype) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        let candidate = session.report.candidates.get(archetype).clone();
        self.play_candidate(&candidate)
    }

    /// Plays a candidate by its notation, falling back to its squares.
    pub fn play_candidate(&mut self, candidate: &Candidate) -> bool {
        let mut requests = vec![MoveRequest::ByNotation(candidate.notation.clone())];
        if let (Some(from), Some(to)) = (candidate.from, candidate.to) {
            requests.push(MoveRequest::ByCoordinates { from, to });
        }
        self.execute_first(&requests)
    }

    fn execute_first(&mut self, requests: &[MoveRequest]) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.phase != Phase::AwaitingHuman || self.pending.is_some() {
            debug!("Move ignored in phase {:?}", session.phase);
            return false;
        }

        let resolved = requests.iter().find_map(|request| match request.resolve(&session.game) {
            Ok(info) => Some(info),
            Err(e) => {
                debug!("Could not resolve {:?}: {}", request, e);
                None
            }
        });
        let Some(info) = resolved else {
            return false;
        };

        info!("Human plays {}", info.san);
        apply(session, &info);
        if info.is_promotion() {
            session.push_message(Role::Model, PROMOTION_MESSAGE);
        }
        session.phase = Phase::HumanMoveApplied;

        if !self.finish_if_over(Some(&info)) {
            self.schedule(Stage::OpponentReply, Phase::OpponentThinking);
        }
        true
    }

    /// Takes the step waiting to run, if any.
    pub fn take_continuation(&mut self) -> Option<Continuation> {
        self.pending.take()
    }

    /// Runs a step previously taken with
    /// [`TurnOrchestrator::take_continuation`]. Steps from an earlier
    /// session, or that no longer fit the phase, are dropped.
    pub fn resume(&mut self, continuation: Continuation) -> bool {
        if continuation.epoch != self.epoch {
            debug!(
                "Dropping continuation from epoch {} (now {})",
                continuation.epoch, self.epoch
            );
            return false;
        }
        let Some(phase) = self.session.as_ref().map(|s| s.phase) else {
            return false;
        };

        match (continuation.stage, phase) {
            (Stage::OpponentReply, Phase::OpponentThinking) => self.opponent_reply(),
            (Stage::Reevaluate, Phase::ReEvaluating) => self.reevaluate(),
            (stage, phase) => {
                debug!("Dropping {:?} in phase {:?}", stage, phase);
                return false;
            }
        }
        true
    }

    /// Runs every waiting step, sleeping through each pause.
    pub fn run_pending(&mut self) {
        while let Some(continuation) = self.take_continuation() {
            if !continuation.delay.is_zero() {
                thread::sleep(continuation.delay);
            }
            self.resume(continuation);
        }
    }

    fn opponent_reply(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let reply = self.opponent.best_move(session.game.state());
        if let Some(info) = &reply {
            info!("{} replies {}", self.opponent.name(), info.san);
            apply(session, info);
            session.push_message(Role::Model, format!("Opponent responded with {}.", info.san));
            session.phase = Phase::OpponentMoveApplied;
        }

        if !self.finish_if_over(reply.as_ref()) {
            self.schedule(Stage::Reevaluate, Phase::ReEvaluating);
        }
    }

    fn reevaluate(&mut self) {
        let cap = self.config.ply_cap;
        let Some(session) = self.session.as_mut() else {
            return;
        };

        session.refresh_report();
        session.ply += 1;
        session.phase = Phase::AwaitingHuman;
        debug!("Turn {} complete", session.ply);

        if session.ply >= cap && !session.checkpoint {
            info!("Reached {} turns, asking for a verdict", session.ply);
            session.checkpoint = true;
            self.request_verdict();
        }
    }

    /// Ends the game if it cannot continue, asking for a verdict.
    fn finish_if_over(&mut self, last_move: Option<&MoveInfo>) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(finished) = Phase::finished(&session.game, last_move) else {
            return false;
        };

        info!("Game finished: {:?}", finished);
        session.phase = finished;
        session.refresh_report();
        self.request_verdict();
        true
    }

    fn schedule(&mut self, stage: Stage, phase: Phase) {
        let delay = match stage {
            Stage::OpponentReply => self.config.opponent_delay(),
            Stage::Reevaluate => self.config.reevaluation_delay(),
        };
        if let Some(session) = self.session.as_mut() {
            session.phase = phase;
        }
        self.pending = Some(Continuation {
            epoch: self.epoch,
            stage,
            delay,
        });
    }

    /// Queues a verdict request unless one is in flight or already given.
    fn request_verdict(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.verdict_pending || session.verdict.is_some() {
            return;
        }
        session.verdict_pending = true;
        self.outbox.push(ServiceRequest::FinalVerdict {
            epoch: self.epoch,
            fen: session.fen(),
        });
    }

    pub fn deliver_verdict(&mut self, epoch: u64, result: Result<String, ServiceError>) -> bool {
        let Some(session) = self.live_session(epoch) else {
            return false;
        };
        session.verdict_pending = false;
        session.verdict = Some(result.unwrap_or_else(|e| {
            warn!("Verdict request failed: {}", e);
            VERDICT_FALLBACK.to_string()
        }));
        true
    }

    pub fn deliver_historical(
        &mut self,
        epoch: u64,
        result: Result<Option<HistoricalGame>, ServiceError>,
    ) -> bool {
        let Some(session) = self.live_session(epoch) else {
            return false;
        };
        session.historical_pending = false;
        session.historical = result.unwrap_or_else(|e| {
            warn!("Historical lookup failed: {}", e);
            None
        });
        true
    }

    /// Sends a chat message. Returns `false` if there is no session, the
    /// message is empty, or a reply is still outstanding.
    pub fn send_chat(&mut self, text: &str) -> bool {
        let epoch = self.epoch;
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let text = text.trim();
        if text.is_empty() || session.chat_pending || session.phase == Phase::Loading {
            return false;
        }

        let history = session.messages.clone();
        session.push_message(Role::User, text);
        session.chat_pending = true;
        self.outbox.push(ServiceRequest::Chat {
            epoch,
            history,
            fen: session.fen(),
            utterance: text.to_string(),
        });
        true
    }

    pub fn deliver_chat(&mut self, epoch: u64, result: Result<String, ServiceError>) -> bool {
        let Some(session) = self.live_session(epoch) else {
            return false;
        };
        session.chat_pending = false;
        let reply = result.unwrap_or_else(|e| {
            warn!("Chat request failed: {}", e);
            CHAT_FALLBACK.to_string()
        });
        session.push_message(Role::Model, reply);
        true
    }

    /// Switches the attack map off if it is on, otherwise builds it.
    /// Returns whether the map is now shown.
    pub fn toggle_attack_map(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.attack_map = match session.attack_map.take() {
            Some(_) => None,
            None => Some(AttackMap::build(&session.game)),
        };
        session.attack_map.is_some()
    }

    /// Clears the checkpoint so play can go on past the ply cap.
    pub fn continue_play(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.ply = 0;
            session.checkpoint = false;
            session.verdict = None;
        }
    }

    /// The square of the king in check, for highlighting.
    pub fn check_square(&self) -> Option<Square> {
        self.session
            .as_ref()
            .and_then(|session| session.game.checked_king_square())
    }

    fn live_session(&mut self, epoch: u64) -> Option<&mut GameSession> {
        if epoch != self.epoch {
            debug!("Dropping delivery from epoch {} (now {})", epoch, self.epoch);
            return None;
        }
        self.session.as_mut()
    }
}

/// Plays a move and updates everything that follows the board.
fn apply(session: &mut GameSession, info: &MoveInfo) {
    session.game.play(info);
    session.overlay.record_played(info);
    session.refresh_attack_map();
}

fn greeting(game: &Game, summary: &str) -> String {
    format!("The board is set. {} to move. {}", game.turn(), summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::positions;

    fn orchestrator() -> TurnOrchestrator {
        let config = CoachConfig {
            blunder_rate: 0.0,
            ..CoachConfig::instant().with_seed(11)
        };
        TurnOrchestrator::new(config)
    }

    fn session(orchestrator: &TurnOrchestrator) -> &GameSession {
        orchestrator.session().unwrap()
    }

    #[test]
    fn test_start_from_fen_greets() {
        let mut coach = orchestrator();
        coach.start_from_fen(positions::STARTING).unwrap();

        let session = session(&coach);
        assert_eq!(session.phase, Phase::AwaitingHuman);
        assert_eq!(session.messages.len(), 1);
        assert_eq!(
            session.messages[0].text,
            "The board is set. White to move. The position is fluid. Look for opportunities."
        );
        assert!(coach.outbox().is_empty());
    }

    #[test]
    fn test_start_rejects_bad_fen() {
        let mut coach = orchestrator();
        assert!(coach.start_from_fen("8/8/8 w").is_err());
        assert!(coach.session().is_none());
    }

    #[test]
    fn test_full_turn() {
        let mut coach = orchestrator();
        coach.start_from_fen(positions::STARTING).unwrap();

        assert!(coach.execute(MoveRequest::ByNotation("e4".to_string())));
        assert_eq!(session(&coach).phase, Phase::OpponentThinking);
        let pending = *coach.pending().unwrap();
        assert_eq!(pending.stage, Stage::OpponentReply);

        // No second move while the turn is running
        assert!(!coach.execute(MoveRequest::ByNotation("d4".to_string())));

        let reply = coach.take_continuation().unwrap();
        assert!(coach.resume(reply));
        assert_eq!(session(&coach).phase, Phase::ReEvaluating);
        assert_eq!(session(&coach).ply, 0);
        assert_eq!(
            session(&coach).messages.last().unwrap().text,
            "Opponent responded with d5."
        );

        coach.run_pending();
        let session = session(&coach);
        assert_eq!(session.phase, Phase::AwaitingHuman);
        assert_eq!(session.ply, 1);
        assert_eq!(session.game.turn(), chess_core::Color::White);
        assert_eq!(session.report.fen, session.fen());
    }

    #[test]
    fn test_continuation_must_match_phase() {
        let mut coach = orchestrator();
        coach.start_from_fen(positions::STARTING).unwrap();
        coach.execute(MoveRequest::ByNotation("e4".to_string()));

        let wrong = Continuation {
            epoch: coach.epoch(),
            stage: Stage::Reevaluate,
            delay: Duration::ZERO,
        };
        let before = session(&coach).clone();
        assert!(!coach.resume(wrong));
        assert_eq!(session(&coach), &before);
    }

    #[test]
    fn test_ply_cap_requests_one_verdict() {
        let config = CoachConfig {
            ply_cap: 1,
            blunder_rate: 0.0,
            ..CoachConfig::instant().with_seed(2)
        };
        let mut coach = TurnOrchestrator::new(config);
        coach.start_from_fen(positions::STARTING).unwrap();

        coach.execute_candidate(Archetype::Pragmatic);
        coach.run_pending();
        assert!(session(&coach).checkpoint);
        assert!(session(&coach).verdict_pending);
        assert_eq!(session(&coach).phase, Phase::AwaitingHuman);

        let requests = coach.take_requests();
        assert_eq!(requests.len(), 1);
        let epoch = requests[0].epoch();
        assert!(coach.deliver_verdict(epoch, Ok("Even game.".to_string())));
        assert_eq!(session(&coach).verdict.as_deref(), Some("Even game."));

        // Play is not blocked; continuing clears the checkpoint
        coach.continue_play();
        let session = session(&coach);
        assert_eq!(session.ply, 0);
        assert!(!session.checkpoint);
        assert_eq!(session.verdict, None);
    }

    #[test]
    fn test_verdict_failure_uses_fallback() {
        let mut coach = orchestrator();
        coach.start_from_fen(positions::FOOLS_MATE).unwrap();
        let epoch = coach.epoch();
        coach.deliver_verdict(epoch, Err(ServiceError::Unavailable("offline".to_string())));
        assert_eq!(session(&coach).verdict.as_deref(), Some(VERDICT_FALLBACK));
        assert!(!session(&coach).verdict_pending);
    }

    #[test]
    fn test_toggle_attack_map() {
        let mut coach = orchestrator();
        assert!(!coach.toggle_attack_map());

        coach.start_from_fen(positions::STARTING).unwrap();
        assert!(coach.toggle_attack_map());
        let d5: Square = "d5".parse().unwrap();
        assert_eq!(session(&coach).attack_map.as_ref().unwrap().get(d5), None);

        // The map follows the position while it is on
        coach.execute(MoveRequest::parse("e2e4"));
        assert_eq!(
            session(&coach).attack_map.as_ref().unwrap().get(d5),
            Some(crate::attack_map::Control::WhiteControlled)
        );

        assert!(!coach.toggle_attack_map());
        assert!(session(&coach).attack_map.is_none());
    }

    #[test]
    fn test_promotion_message() {
        let mut coach = orchestrator();
        coach.start_from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert!(coach.execute(MoveRequest::parse("a7a8")));

        let session = session(&coach);
        assert_eq!(session.messages.last().unwrap().text, PROMOTION_MESSAGE);
        assert_eq!(
            session.overlay.piece_at("a8".parse().unwrap()).map(|p| p.piece_type),
            Some(chess_core::PieceType::Queen)
        );
    }

    #[test]
    fn test_check_square() {
        let mut coach = orchestrator();
        assert_eq!(coach.check_square(), None);
        coach.start_from_fen("4k3/8/8/8/8/8/8/K3q3 w - - 0 1").unwrap();
        assert_eq!(coach.check_square(), Some("a1".parse().unwrap()));
    }

    #[test]
    fn test_chat_is_single_flight() {
        let mut coach = orchestrator();
        coach.start_from_fen(positions::STARTING).unwrap();

        assert!(!coach.send_chat("   "));
        assert!(coach.send_chat("What should I play?"));
        assert!(!coach.send_chat("Hello?"));

        let requests = coach.take_requests();
        let [ServiceRequest::Chat { epoch, history, utterance, .. }] = requests.as_slice() else {
            panic!("expected one chat request, got {requests:?}");
        };
        assert_eq!(history.len(), 1);
        assert_eq!(utterance, "What should I play?");

        assert!(coach.deliver_chat(*epoch, Err(ServiceError::Unavailable("down".to_string()))));
        let session = session(&coach);
        assert!(!session.chat_pending);
        assert_eq!(session.messages.last().unwrap().text, CHAT_FALLBACK);
        assert_eq!(session.messages.len(), 3);
    }
}
