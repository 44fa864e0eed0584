//! Square control map ("vision mode").

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;

use chess_core::{Color, Game, Square};
use serde::Serialize;
use tracing::warn;

/// Who controls a square. Squares neither side attacks are left out of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Control {
    WhiteControlled,
    BlackControlled,
    Contested,
}

impl Control {
    fn classify(white: bool, black: bool) -> Option<Self> {
        match (white, black) {
            (true, true) => Some(Control::Contested),
            (true, false) => Some(Control::WhiteControlled),
            (false, true) => Some(Control::BlackControlled),
            (false, false) => None,
        }
    }
}

/// Answers "is this square attacked by that colour".
pub trait AttackOracle {
    type Error: fmt::Display;

    fn is_attacked(&self, square: Square, by: Color) -> Result<bool, Self::Error>;
}

impl AttackOracle for Game {
    type Error = Infallible;

    fn is_attacked(&self, square: Square, by: Color) -> Result<bool, Infallible> {
        Ok(Game::is_attacked(self, square, by))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttackMap {
    squares: BTreeMap<Square, Control>,
}

impl AttackMap {
    /// Classifies every square of the board. A square whose query fails is
    /// left out and the rest of the map is still built.
    pub fn build<O: AttackOracle + ?Sized>(oracle: &O) -> Self {
        let mut squares = BTreeMap::new();

        for square in Square::all() {
            let query = oracle
                .is_attacked(square, Color::White)
                .and_then(|white| Ok((white, oracle.is_attacked(square, Color::Black)?)));

            match query {
                Ok((white, black)) => {
                    if let Some(control) = Control::classify(white, black) {
                        squares.insert(square, control);
                    }
                }
                Err(e) => warn!("Attack query failed on {}: {}", square, e),
            }
        }

        Self { squares }
    }

    pub fn get(&self, square: Square) -> Option<Control> {
        self.squares.get(&square).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Square, Control)> + '_ {
        self.squares.iter().map(|(&square, &control)| (square, control))
    }

    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    pub fn count(&self, control: Control) -> usize {
        self.squares.values().filter(|&&c| c == control).count()
    }
}
