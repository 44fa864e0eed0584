//! Terminal rendering of the session.

use std::io::{self, Write};

use chess_agents::{Candidate, PositionReport};
use chess_core::{Color, File, Rank, Square};
use crossterm::style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::ExecutableCommand;

use crate::attack_map::Control;
use crate::narrative::{ChatMessage, HistoricalGame, Role};
use crate::session::GameSession;

fn square_background(session: &GameSession, square: Square, check: Option<Square>) -> TermColor {
    if check == Some(square) {
        return TermColor::Red;
    }
    if let Some(map) = &session.attack_map {
        match map.get(square) {
            Some(Control::WhiteControlled) => return TermColor::DarkBlue,
            Some(Control::BlackControlled) => return TermColor::DarkMagenta,
            Some(Control::Contested) => return TermColor::DarkYellow,
            None => {}
        }
    }
    if session.overlay.is_hidden(square) {
        TermColor::DarkGreen
    } else if square.is_light() {
        TermColor::Grey
    } else {
        TermColor::DarkGrey
    }
}

/// Prints the board, highlighting the king in check, the attack map when
/// it is on and every square a move has touched.
pub fn draw_board(session: &GameSession, check: Option<Square>) -> io::Result<()> {
    let mut stdout = io::stdout();

    println!();
    println!("  a b c d e f g h");
    for &rank in Rank::ALL.iter().rev() {
        print!("{} ", rank.to_char());

        for file in File::ALL {
            let square = Square::new(file, rank);
            stdout.execute(SetBackgroundColor(square_background(session, square, check)))?;

            match session.game.piece_at(square) {
                Some(piece) => {
                    let fg = match piece.color {
                        Color::White => TermColor::White,
                        Color::Black => TermColor::Black,
                    };
                    stdout.execute(SetForegroundColor(fg))?;
                    stdout.execute(Print(format!("{} ", piece.glyph())))?;
                }
                None => {
                    stdout.execute(Print("  "))?;
                }
            }
            stdout.execute(ResetColor)?;
        }

        println!(" {}", rank.to_char());
    }
    println!("  a b c d e f g h");

    stdout.flush()
}

fn print_candidate(label: &str, candidate: &Candidate) {
    println!(
        "  {:<10} {:<8} [{}] {}",
        label, candidate.notation, candidate.translation, candidate.rationale
    );
}

pub fn print_report(report: &PositionReport) {
    println!();
    println!("{} to move | {:?} ({})", report.turn, report.vibe_label, report.vibe_score);
    println!("{}", report.summary);
    println!(
        "Theme: {}. {} ({})",
        report.strategy.theme, report.strategy.concept, report.strategy.rule_of_thumb
    );
    print_candidate("Pragmatic", &report.candidates.pragmatic);
    print_candidate("Artistic", &report.candidates.artistic);
}

/// Prints the messages from `start` onwards.
pub fn print_messages(messages: &[ChatMessage], start: usize) {
    for message in messages.iter().skip(start) {
        let speaker = match message.role {
            Role::User => "You",
            Role::Model => "Coach",
        };
        println!("{speaker}: {}", message.text);
    }
}

pub fn print_historical(game: &HistoricalGame) {
    println!(
        "Famous {} game: {} ({}). {}",
        game.opening, game.players, game.year, game.description
    );
}

pub fn print_help() {
    println!("Commands:");
    println!("  p | pragmatic      play the pragmatic candidate");
    println!("  a | artistic       play the artistic candidate");
    println!("  <san> | <e2e4>     play a move by notation or squares");
    println!("  map                toggle the attack map");
    println!("  chat <text>        talk to the coach");
    println!("  continue           keep playing after the turn checkpoint");
    println!("  new                start over from the initial position");
    println!("  help, quit");
}
