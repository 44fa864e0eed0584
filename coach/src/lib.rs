//! Turn orchestration for the chess coach: the game session, the board
//! overlay, the attack map and the seam to the narrative service.

pub mod attack_map;
pub mod config;
pub mod display;
pub mod error;
pub mod narrative;
pub mod orchestrator;
pub mod overlay;
pub mod session;

pub use attack_map::{AttackMap, AttackOracle, Control};
pub use config::CoachConfig;
pub use error::{CoachError, CoachResult};
pub use narrative::{
    fulfil_requests, ChatMessage, HistoricalGame, InitialAnalysis, Metrics, NarrativeService,
    OfflineNarrator, PerformanceState, Role, ServiceError, ServiceRequest,
};
pub use orchestrator::{Continuation, Stage, TurnOrchestrator};
pub use overlay::OverlayState;
pub use session::{GameSession, MoveRequest, Phase, TerminationReason};
