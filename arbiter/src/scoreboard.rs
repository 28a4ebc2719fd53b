use rollerball_link::{LinkEvent, Move, SessionId, Side};
use serde::Serialize;

/// Front-end view of a match: whether both engines are up and the moves
/// each side has played.
///
/// Updated only from [`LinkEvent`]s, never by querying sessions, so any
/// subscriber can rebuild it from the event stream alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
    pub connected: bool,
    pub white_moves: Vec<Move>,
    pub black_moves: Vec<Move>,
    #[serde(skip)]
    white: SessionId,
    #[serde(skip)]
    black: SessionId,
    #[serde(skip)]
    ready: [bool; 2],
}

impl Scoreboard {
    pub fn new(white: SessionId, black: SessionId) -> Self {
        Self {
            connected: false,
            white_moves: Vec::new(),
            black_moves: Vec::new(),
            white,
            black,
            ready: [false; 2],
        }
    }

    fn side_of(&self, id: SessionId) -> Option<Side> {
        if id == self.white {
            Some(Side::White)
        } else if id == self.black {
            Some(Side::Black)
        } else {
            None
        }
    }

    fn slot(side: Side) -> usize {
        match side {
            Side::White => 0,
            Side::Black => 1,
        }
    }

    /// Apply one event. Events of sessions outside this match are ignored.
    pub fn apply(&mut self, event: &LinkEvent) {
        let Some(side) = self.side_of(event.session_id()) else {
            return;
        };

        match event {
            LinkEvent::SessionReady { .. } => {
                self.ready[Self::slot(side)] = true;
                self.connected = self.ready.iter().all(|r| *r);
            }
            LinkEvent::SessionClosed { .. } => {
                self.ready[Self::slot(side)] = false;
                self.connected = false;
            }
            LinkEvent::NewGameAcknowledged { .. } if side == Side::White => {
                self.white_moves.clear();
                self.black_moves.clear();
            }
            LinkEvent::BestMoveReceived { best, .. } if !best.is_null() => match side {
                Side::White => self.white_moves.push(best.clone()),
                Side::Black => self.black_moves.push(best.clone()),
            },
            _ => {}
        }
    }
}
