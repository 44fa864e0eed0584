use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chess_agents::{analyze, Archetype};
use chess_coach::display::{
    draw_board, print_help, print_historical, print_messages, print_report,
};
use chess_coach::{
    fulfil_requests, AttackMap, CoachConfig, CoachError, CoachResult, Control, MoveRequest,
    OfflineNarrator, TurnOrchestrator,
};
use chess_core::{positions, Game};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chess-coach", about = "Heuristic chess coach with a fallible sparring partner")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, default_value = "coach.json")]
    config: PathBuf,

    /// Seed for the opponent's random choices
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Skip the opponent's thinking pauses
    #[arg(long, global = true)]
    no_delay: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Play against the opponent with the coach's recommendations
    Play {
        /// Starting position
        #[arg(long, conflicts_with = "image")]
        fen: Option<String>,
        /// Board "image": a text file holding the position
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Show the recommendations for a position
    Analyze {
        #[arg(default_value = positions::STARTING)]
        fen: String,
    },
    /// Show which side controls each square
    Heatmap {
        #[arg(default_value = positions::STARTING)]
        fen: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CoachResult<()> {
    let mut config = CoachConfig::load(&cli.config);
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if cli.no_delay {
        config.opponent_delay_ms = 0;
        config.reevaluation_delay_ms = 0;
    }
    debug!("Configuration: {:?}", config);

    match cli.command {
        Some(Command::Analyze { fen }) => {
            let game = Game::from_fen(&fen)?;
            print_report(&analyze(&game));
            Ok(())
        }
        Some(Command::Heatmap { fen }) => heatmap(&fen),
        Some(Command::Play { fen, image }) => play(config, fen, image),
        None => play(config, None, None),
    }
}

fn heatmap(fen: &str) -> CoachResult<()> {
    let mut coach = TurnOrchestrator::new(CoachConfig::instant());
    coach.start_from_fen(fen)?;
    coach.toggle_attack_map();

    if let Some(session) = coach.session() {
        draw_board(session, coach.check_square())?;
        if let Some(map) = &session.attack_map {
            print_control_counts(map);
        }
    }
    Ok(())
}

fn print_control_counts(map: &AttackMap) {
    println!(
        "White controls {}, Black controls {}, contested {}",
        map.count(Control::WhiteControlled),
        map.count(Control::BlackControlled),
        map.count(Control::Contested)
    );
}

fn play(config: CoachConfig, fen: Option<String>, image: Option<PathBuf>) -> CoachResult<()> {
    let narrator = OfflineNarrator::new();
    let mut coach = TurnOrchestrator::new(config);

    // Kept so "new" can start the same game again
    let image = match image {
        Some(path) => Some(fs::read(&path).map_err(|source| CoachError::Io { path, source })?),
        None => None,
    };
    let fen = fen.unwrap_or_else(|| positions::STARTING.to_string());
    start(&mut coach, &narrator, &fen, image.as_deref())?;

    println!("Chess coach. Type 'help' for commands.");
    let mut shown = refresh(&coach, 0)?;

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        let acted = match input {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                print_help();
                continue;
            }
            "p" | "pragmatic" => coach.execute_candidate(Archetype::Pragmatic),
            "a" | "artistic" => coach.execute_candidate(Archetype::Artistic),
            "map" => {
                let on = coach.toggle_attack_map();
                println!("Attack map {}", if on { "on" } else { "off" });
                true
            }
            "continue" => {
                coach.continue_play();
                true
            }
            "new" => {
                start(&mut coach, &narrator, &fen, image.as_deref())?;
                shown = 0;
                true
            }
            _ => match input.strip_prefix("chat ") {
                Some(text) => coach.send_chat(text),
                None => coach.execute(MoveRequest::parse(input)),
            },
        };

        if !acted {
            println!("Nothing to do for {input:?}.");
            continue;
        }

        coach.run_pending();
        fulfil_requests(&mut coach, &narrator);
        shown = refresh(&coach, shown)?;

        if let Some(session) = coach.session() {
            if session.phase.is_finished() {
                println!("Game over ({:?}). Type 'new' to play again or 'quit'.", session.phase);
            } else if session.checkpoint {
                println!("Turn checkpoint reached. Type 'continue' to keep going.");
            }
        }
    }

    Ok(())
}

fn start(
    coach: &mut TurnOrchestrator,
    narrator: &OfflineNarrator,
    fen: &str,
    image: Option<&[u8]>,
) -> CoachResult<()> {
    match image {
        Some(bytes) => coach.begin_analysis(bytes.to_vec()),
        None => coach.start_from_fen(fen)?,
    }
    fulfil_requests(coach, narrator);
    Ok(())
}

/// Prints the board and anything new since the last refresh. Returns the
/// number of messages shown so far.
fn refresh(coach: &TurnOrchestrator, shown: usize) -> io::Result<usize> {
    let Some(session) = coach.session() else {
        return Ok(shown);
    };

    draw_board(session, coach.check_square())?;
    if let Some(map) = &session.attack_map {
        print_control_counts(map);
    }
    print_report(&session.report);
    if let Some(game) = &session.historical {
        print_historical(game);
    }
    print_messages(&session.messages, shown);
    if let Some(verdict) = &session.verdict {
        println!("Verdict: {verdict}");
    }
    Ok(session.messages.len())
}
