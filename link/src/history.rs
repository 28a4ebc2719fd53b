use serde::Serialize;
use std::fmt;

use crate::uci::{Move, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("white"),
            Side::Black => f.write_str("black"),
        }
    }
}

/// Moves played so far, kept per side. Append-only until [`clear`](Self::clear).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MoveHistory {
    white: Vec<Move>,
    black: Vec<Move>,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// White moves first, so sides alternate from there.
    pub fn side_to_move(&self) -> Side {
        if self.white.len() > self.black.len() {
            Side::Black
        } else {
            Side::White
        }
    }

    /// Append `mv` for the side to move and return that side.
    pub fn record(&mut self, mv: Move) -> Side {
        let side = self.side_to_move();
        match side {
            Side::White => self.white.push(mv),
            Side::Black => self.black.push(mv),
        }
        side
    }

    pub fn moves(&self, side: Side) -> &[Move] {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    /// All plies in the order they were played.
    pub fn plies(&self) -> impl Iterator<Item = &Move> + '_ {
        let mut black = self.black.iter();
        self.white
            .iter()
            .flat_map(move |w| std::iter::once(w).chain(black.next()))
    }

    pub fn len(&self) -> usize {
        self.white.len() + self.black.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<&Move> {
        match self.side_to_move() {
            Side::White => self.black.last(),
            Side::Black => self.white.last(),
        }
    }

    /// The `position startpos moves ...` argument for the current game.
    pub fn position(&self) -> Position {
        Position::startpos(self.plies().cloned().collect())
    }

    pub fn clear(&mut self) {
        self.white.clear();
        self.black.clear();
    }
}
