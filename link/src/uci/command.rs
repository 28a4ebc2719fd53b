use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::parser::MalformedCommand;

const MAX_MOVE_LEN: usize = 10;

/// A single ply in coordinate notation ("e2e4", "a1b2r", "0000").
///
/// Only the shape is checked here. Whether the move is legal is up to the
/// engine and the game it plays. Every move names a square, so it carries at
/// least one digit; that keeps moves apart from protocol keywords.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Move(String);

impl Move {
    /// The null move, also used when an engine answers `bestmove (none)`.
    pub fn null() -> Self {
        Self("0000".to_string())
    }

    pub fn parse(s: &str) -> Result<Self, MalformedCommand> {
        if s.is_empty() {
            return Err(MalformedCommand::new(s, "empty move"));
        }
        if s.len() > MAX_MOVE_LEN {
            return Err(MalformedCommand::new(s, "move too long"));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '@' || c == '=')
        {
            return Err(MalformedCommand::new(s, "invalid character in move"));
        }
        if !s.bytes().any(|b| b.is_ascii_digit()) {
            return Err(MalformedCommand::new(s, "move names no square"));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == "0000"
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Move {
    type Err = MalformedCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Move::parse(s)
    }
}

/// Where a `position` command starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStart {
    StartPos,
    Fen(String),
}

/// Arguments of a `position` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub start: PositionStart,
    pub moves: Vec<Move>,
}

impl Position {
    pub fn startpos(moves: Vec<Move>) -> Self {
        Self {
            start: PositionStart::StartPos,
            moves,
        }
    }
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GoParams {
    /// Bare time budget, `go <ms>`, as rollerball engines expect it.
    pub budget_ms: Option<u64>,
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub movetime: Option<u64>, // Move time in milliseconds
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u32>,
    pub infinite: bool, // Search until "stop"
}

impl GoParams {
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            ..Default::default()
        }
    }

    pub fn budget(ms: u64) -> Self {
        Self {
            budget_ms: Some(ms),
            ..Default::default()
        }
    }

    pub fn movetime(ms: u64) -> Self {
        Self {
            movetime: Some(ms),
            ..Default::default()
        }
    }

    pub fn infinite() -> Self {
        Self {
            infinite: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    Centipawns(i32),
    Mate(i32), // Negative for being mated
}

/// Engine analysis information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Info {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub tbhits: Option<u64>,
    pub hashfull: Option<u32>,
    pub multipv: Option<u32>,
    pub currmove: Option<Move>,
    pub currmovenumber: Option<u32>,
    pub score: Option<Score>,
    pub pv: Vec<Move>, // Principal variation
    pub string: Option<String>,
}

/// One protocol line, in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    // controller -> engine
    Uci,
    IsReady,
    UciNewGame {
        variant: Option<String>,
        time_ms: Option<u64>,
    },
    SetOption {
        name: String,
        value: Option<String>,
    },
    Position(Position),
    Go(GoParams),
    Stop,
    Quit,

    // engine -> controller
    Id {
        field: String,
        value: String,
    },
    UciOk,
    ReadyOk,
    NewGameOk,
    BestMove {
        best: Move,
        ponder: Option<Move>,
    },
    Info(Info),

    /// Anything with an unrecognized first token, kept verbatim.
    Unknown {
        raw: String,
    },
}

/// Which side of the link a command is meant to originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Controller,
    Engine,
    Either,
}

impl Command {
    /// Keyword used on the wire, for logs and error messages.
    pub fn keyword(&self) -> &str {
        match self {
            Command::Uci => "uci",
            Command::IsReady => "isready",
            Command::UciNewGame { .. } => "ucinewgame",
            Command::SetOption { .. } => "setoption",
            Command::Position(_) => "position",
            Command::Go(_) => "go",
            Command::Stop => "stop",
            Command::Quit => "quit",
            Command::Id { .. } => "id",
            Command::UciOk => "uciok",
            Command::ReadyOk => "readyok",
            Command::NewGameOk => "newgameok",
            Command::BestMove { .. } => "bestmove",
            Command::Info(_) => "info",
            Command::Unknown { raw } => raw.split_whitespace().next().unwrap_or(""),
        }
    }

    pub fn origin(&self) -> Origin {
        match self {
            Command::Uci
            | Command::IsReady
            | Command::UciNewGame { .. }
            | Command::SetOption { .. }
            | Command::Position(_)
            | Command::Go(_)
            | Command::Stop
            | Command::Quit => Origin::Controller,
            Command::Id { .. }
            | Command::UciOk
            | Command::ReadyOk
            | Command::NewGameOk
            | Command::BestMove { .. }
            | Command::Info(_) => Origin::Engine,
            Command::Unknown { .. } => Origin::Either,
        }
    }
}

impl FromStr for Command {
    type Err = MalformedCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        super::parser::parse_command(s)
    }
}
