//! The narrative collaborator: board-image reading, chat, final verdicts
//! and historical game lookup.
//!
//! The orchestrator never calls a service directly. It queues
//! [`ServiceRequest`]s tagged with the session epoch, and a driver hands
//! them to a [`NarrativeService`] and delivers the answers back with
//! [`fulfil_requests`]. Failures turn into canned text at delivery.

use chess_agents::strategy::summary;
use chess_agents::{analyze, Candidate, Evaluatable, PositionReport, StrategyGuide, VibeLevel};
use chess_core::{positions, Color, FenError, Game};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::orchestrator::TurnOrchestrator;

/// Reply used when a chat turn fails.
pub const CHAT_FALLBACK: &str = "I sensed a disturbance in the connection. Try again.";
/// Verdict used when the verdict request fails.
pub const VERDICT_FALLBACK: &str = "Unable to retrieve final evaluation.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Board image could not be read")]
    UnreadableImage,

    #[error("Empty chat message")]
    EmptyUtterance,

    #[error("Invalid position: {0}")]
    InvalidPosition(#[from] FenError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub efficiency: u8,
    pub roi: u8,
    pub pragmatism: Candidate,
    pub artistry: Candidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceState {
    pub tunnel_vision: u8,
    pub fear: u8,
    pub aggression: u8,
}

impl PerformanceState {
    pub fn neutral() -> Self {
        Self {
            tunnel_vision: 0,
            fear: 0,
            aggression: 50,
        }
    }
}

/// What the service reports about a photographed board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialAnalysis {
    pub fen: String,
    pub turn: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_name: Option<String>,
    pub vibe_score: u8,
    pub vibe_label: VibeLevel,
    pub metrics: Metrics,
    pub performance_state: PerformanceState,
    pub strategy: StrategyGuide,
    pub summary: String,
}

impl InitialAnalysis {
    /// Analysis shown when the board image could not be read at all.
    pub fn recovery() -> Self {
        Self {
            fen: positions::STARTING.to_string(),
            turn: Color::White,
            opening_name: None,
            vibe_score: 50,
            vibe_label: VibeLevel::Tension,
            metrics: Metrics {
                efficiency: 50,
                roi: 50,
                pragmatism: Candidate {
                    notation: "e4".to_string(),
                    translation: "King's Pawn Opening".to_string(),
                    rationale: "Standard control.".to_string(),
                    from: None,
                    to: None,
                },
                artistry: Candidate {
                    notation: "Nf3".to_string(),
                    translation: "Knight Development".to_string(),
                    rationale: "Flexible setup.".to_string(),
                    from: None,
                    to: None,
                },
            },
            performance_state: PerformanceState::neutral(),
            strategy: StrategyGuide::new(
                "Recovery Mode",
                "The visual engine couldn't lock on.",
                "Play standard chess principles.",
            ),
            summary: "Visual analysis failed. Loaded standard starting position.".to_string(),
        }
    }

    /// Base analysis built from a local report, for sessions started
    /// without the service.
    pub fn from_report(report: &PositionReport, opening_name: Option<String>) -> Self {
        Self {
            fen: report.fen.clone(),
            turn: report.turn,
            opening_name,
            vibe_score: report.vibe_score,
            vibe_label: report.vibe_label,
            metrics: Metrics {
                efficiency: 50,
                roi: 50,
                pragmatism: report.candidates.pragmatic.clone(),
                artistry: report.candidates.artistic.clone(),
            },
            performance_state: PerformanceState::neutral(),
            strategy: report.strategy.clone(),
            summary: report.summary.clone(),
        }
    }

    /// This analysis with everything position-dependent taken from `report`.
    pub fn with_report(&self, report: &PositionReport) -> Self {
        let mut merged = Self::from_report(report, self.opening_name.clone());
        merged.metrics.efficiency = self.metrics.efficiency;
        merged.metrics.roi = self.metrics.roi;
        merged.performance_state = self.performance_state;
        merged
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalGame {
    pub players: String,
    pub year: String,
    pub opening: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: u64,
}

pub trait NarrativeService {
    /// Reads a board picture into a position and first impressions.
    fn analyze_board_image(&self, image: &[u8]) -> Result<InitialAnalysis, ServiceError>;

    /// Answers the player, given the conversation so far and the position.
    fn chat_turn(
        &self,
        history: &[ChatMessage],
        fen: &str,
        utterance: &str,
    ) -> Result<String, ServiceError>;

    /// A short closing judgement of the position.
    fn final_verdict(&self, fen: &str) -> Result<String, ServiceError>;

    /// A famous game played with the named opening, if one is known.
    fn historical_match(&self, opening: &str) -> Result<Option<HistoricalGame>, ServiceError>;
}

/// Work queued by the orchestrator for the narrative service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceRequest {
    AnalyzeImage {
        epoch: u64,
        image: Vec<u8>,
    },
    Chat {
        epoch: u64,
        history: Vec<ChatMessage>,
        fen: String,
        utterance: String,
    },
    FinalVerdict {
        epoch: u64,
        fen: String,
    },
    HistoricalMatch {
        epoch: u64,
        opening: String,
    },
}

impl ServiceRequest {
    pub fn epoch(&self) -> u64 {
        match self {
            ServiceRequest::AnalyzeImage { epoch, .. }
            | ServiceRequest::Chat { epoch, .. }
            | ServiceRequest::FinalVerdict { epoch, .. }
            | ServiceRequest::HistoricalMatch { epoch, .. } => *epoch,
        }
    }
}

/// Answers every queued request, including ones queued by the answers
/// themselves. Returns how many requests were served.
pub fn fulfil_requests<S: NarrativeService + ?Sized>(
    orchestrator: &mut TurnOrchestrator,
    service: &S,
) -> usize {
    let mut served = 0;

    loop {
        let requests = orchestrator.take_requests();
        if requests.is_empty() {
            return served;
        }

        for request in requests {
            served += 1;
            match request {
                ServiceRequest::AnalyzeImage { epoch, image } => {
                    orchestrator.deliver_analysis(epoch, service.analyze_board_image(&image));
                }
                ServiceRequest::Chat {
                    epoch,
                    history,
                    fen,
                    utterance,
                } => {
                    orchestrator.deliver_chat(epoch, service.chat_turn(&history, &fen, &utterance));
                }
                ServiceRequest::FinalVerdict { epoch, fen } => {
                    orchestrator.deliver_verdict(epoch, service.final_verdict(&fen));
                }
                ServiceRequest::HistoricalMatch { epoch, opening } => {
                    orchestrator.deliver_historical(epoch, service.historical_match(&opening));
                }
            }
        }
    }
}

/// Openings recognised from the piece placement.
const OPENINGS: [(&str, &str); 4] = [
    (
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR",
        "Sicilian Defense",
    ),
    (
        "rnbqkbnr/pppp1ppp/8/4p3/4PP2/8/PPPP2PP/RNBQKBNR",
        "King's Gambit",
    ),
    (
        "rnbqkbnr/ppp1pppp/3p4/8/4P3/8/PPPP1PPP/RNBQKBNR",
        "Pirc Defense",
    ),
    (
        "rnbqkbnr/ppp2ppp/4p3/3p4/2PP4/8/PP2PPPP/RNBQKBNR",
        "Queen's Gambit Declined",
    ),
];

/// (opening, players, year, description)
const FAMOUS_GAMES: [(&str, &str, &str, &str); 3] = [
    (
        "King's Gambit",
        "Anderssen vs Kieseritzky",
        "1851",
        "The Immortal Game: White gave up both rooks and the queen to mate with the minor pieces.",
    ),
    (
        "Pirc Defense",
        "Kasparov vs Topalov",
        "1999",
        "Kasparov's rook sacrifice on d4 started a king hunt across the whole board.",
    ),
    (
        "Queen's Gambit Declined",
        "Fischer vs Spassky",
        "1972",
        "Game 6 of the World Championship, a positional masterpiece applauded by Spassky himself.",
    ),
];

/// A service that works without a network: the "image" is text holding a
/// FEN, and the narrative is assembled from the local analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNarrator;

impl OfflineNarrator {
    pub fn new() -> Self {
        Self
    }

    fn opening_name(fen: &str) -> Option<String> {
        let placement = fen.split_whitespace().next()?;
        OPENINGS
            .iter()
            .find(|(known, _)| *known == placement)
            .map(|(_, name)| name.to_string())
    }
}

impl NarrativeService for OfflineNarrator {
    fn analyze_board_image(&self, image: &[u8]) -> Result<InitialAnalysis, ServiceError> {
        let text = std::str::from_utf8(image).map_err(|_| ServiceError::UnreadableImage)?;
        let fen = text.trim();
        if fen.is_empty() {
            return Err(ServiceError::UnreadableImage);
        }

        let opening = Self::opening_name(fen);
        let analysis = match Game::from_fen(fen) {
            Ok(game) => InitialAnalysis::from_report(&analyze(&game), opening),
            // Pass the text through; the orchestrator decides what to do with it
            Err(e) => {
                debug!("Image text is not a position: {}", e);
                InitialAnalysis {
                    fen: fen.to_string(),
                    ..InitialAnalysis::recovery()
                }
            }
        };
        Ok(analysis)
    }

    fn chat_turn(
        &self,
        _history: &[ChatMessage],
        fen: &str,
        utterance: &str,
    ) -> Result<String, ServiceError> {
        if utterance.trim().is_empty() {
            return Err(ServiceError::EmptyUtterance);
        }

        let game = Game::from_fen(fen)?;
        let report = analyze(&game);
        if game.is_game_over() {
            return Ok(report.summary);
        }

        let pragmatic = &report.candidates.pragmatic;
        Ok(format!(
            "{} Consider {}: {}",
            report.strategy.rule_of_thumb, pragmatic.notation, pragmatic.rationale
        ))
    }

    fn final_verdict(&self, fen: &str) -> Result<String, ServiceError> {
        let game = Game::from_fen(fen)?;

        if let Some(outcome) = game.outcome() {
            return Ok(format!("{outcome}. {}", summary(&game)));
        }

        let balance = game.material_balance();
        let verdict = match balance {
            b if b > 0 => format!("White is ahead by {} in material.", b),
            b if b < 0 => format!("Black is ahead by {} in material.", -b),
            _ => "Material is level.".to_string(),
        };
        Ok(format!(
            "{verdict} The position is complex and requires further study."
        ))
    }

    fn historical_match(&self, opening: &str) -> Result<Option<HistoricalGame>, ServiceError> {
        Ok(FAMOUS_GAMES
            .iter()
            .find(|(name, ..)| name.eq_ignore_ascii_case(opening))
            .map(|(name, players, year, description)| HistoricalGame {
                players: players.to_string(),
                year: year.to_string(),
                opening: name.to_string(),
                description: description.to_string(),
                source_title: None,
                source_url: None,
            }))
    }
}
