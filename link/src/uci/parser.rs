use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::command::{Command, GoParams, Info, Move, Position, PositionStart, Score};

/// A line that selected a known command but whose arguments don't fit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("malformed command {raw:?}: {reason}")]
pub struct MalformedCommand {
    pub raw: String,
    pub reason: String,
}

impl MalformedCommand {
    pub fn new(raw: &str, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

/// Walks the argument tokens of one line.
struct Cursor<'a> {
    line: &'a str,
    tokens: &'a [&'a str],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str, tokens: &'a [&'a str]) -> Self {
        Self {
            line,
            tokens,
            pos: 0,
        }
    }

    fn next(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn rest(&mut self) -> &'a [&'a str] {
        let rest = &self.tokens[self.pos..];
        self.pos = self.tokens.len();
        rest
    }

    fn malformed(&self, reason: impl Into<String>) -> MalformedCommand {
        MalformedCommand::new(self.line, reason)
    }

    fn value(&mut self, key: &str) -> Result<&'a str, MalformedCommand> {
        self.next()
            .ok_or_else(|| self.malformed(format!("missing value for {}", key)))
    }

    fn number<T: FromStr>(&mut self, key: &str) -> Result<T, MalformedCommand> {
        let token = self.value(key)?;
        token
            .parse()
            .map_err(|_| self.malformed(format!("{} expects an integer, got {:?}", key, token)))
    }

    fn mv(&mut self, key: &str) -> Result<Move, MalformedCommand> {
        let token = self.value(key)?;
        parse_move(self.line, token)
    }
}

fn parse_move(line: &str, token: &str) -> Result<Move, MalformedCommand> {
    Move::parse(token).map_err(|e| MalformedCommand::new(line, format!("{} ({:?})", e.reason, token)))
}

/// Parse one protocol line into a [`Command`].
///
/// An unrecognized first token is not an error: it yields
/// [`Command::Unknown`] so engine-specific extensions pass through.
pub fn parse_command(line: &str) -> Result<Command, MalformedCommand> {
    let line = line.trim();
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = tokens.split_first() else {
        return Err(MalformedCommand::new(line, "empty command"));
    };
    let mut cursor = Cursor::new(line, args);

    match head {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "uciok" => Ok(Command::UciOk),
        "readyok" => Ok(Command::ReadyOk),
        "newgameok" => Ok(Command::NewGameOk),
        "ucinewgame" => parse_new_game(&mut cursor),
        "setoption" => parse_setoption(&mut cursor),
        "position" => parse_position(&mut cursor),
        "go" => parse_go(&mut cursor).map(Command::Go),
        "id" => {
            if args.len() < 2 {
                return Err(cursor.malformed("id needs a field and a value"));
            }
            Ok(Command::Id {
                field: args[0].to_string(),
                value: args[1..].join(" "),
            })
        }
        "bestmove" => parse_bestmove(&mut cursor),
        "info" => parse_info(&mut cursor).map(Command::Info),
        _ => Ok(Command::Unknown {
            raw: line.to_string(),
        }),
    }
}

/// `ucinewgame [variant] [time]`. Arguments are positional; a lone numeric
/// argument is the time.
fn parse_new_game(cursor: &mut Cursor<'_>) -> Result<Command, MalformedCommand> {
    let (variant, time) = match cursor.rest() {
        [] => (None, None),
        [only] if is_number(only) => (None, Some(*only)),
        [only] => (Some(*only), None),
        [variant, time] => (Some(*variant), Some(*time)),
        [_, _, extra, ..] => {
            return Err(cursor.malformed(format!("unexpected argument {:?}", extra)))
        }
    };
    let time_ms = time
        .map(|token| {
            token
                .parse()
                .map_err(|_| cursor.malformed(format!("time expects an integer, got {:?}", token)))
        })
        .transpose()?;
    Ok(Command::UciNewGame {
        variant: variant.map(str::to_string),
        time_ms,
    })
}

fn is_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn parse_setoption(cursor: &mut Cursor<'_>) -> Result<Command, MalformedCommand> {
    if cursor.next() != Some("name") {
        return Err(cursor.malformed("setoption expects 'name'"));
    }
    let rest = cursor.rest();
    let split = rest.iter().position(|t| *t == "value");
    let (name, value) = match split {
        Some(idx) => (rest[..idx].join(" "), Some(rest[idx + 1..].join(" "))),
        None => (rest.join(" "), None),
    };
    if name.is_empty() {
        return Err(cursor.malformed("setoption has an empty name"));
    }
    Ok(Command::SetOption { name, value })
}

fn parse_position(cursor: &mut Cursor<'_>) -> Result<Command, MalformedCommand> {
    let start = match cursor.next() {
        Some("startpos") => PositionStart::StartPos,
        Some("fen") => {
            let mut fen = Vec::new();
            while let Some(token) = cursor.peek() {
                if token == "moves" {
                    break;
                }
                fen.push(token);
                cursor.next();
            }
            if fen.is_empty() {
                return Err(cursor.malformed("position fen is missing the fen"));
            }
            PositionStart::Fen(fen.join(" "))
        }
        _ => return Err(cursor.malformed("position expects 'startpos' or 'fen'")),
    };

    let moves = match cursor.next() {
        None => Vec::new(),
        Some("moves") => {
            let line = cursor.line;
            cursor
                .rest()
                .iter()
                .map(|token| parse_move(line, token))
                .collect::<Result<_, _>>()?
        }
        Some(other) => return Err(cursor.malformed(format!("unexpected token {:?}", other))),
    };

    Ok(Command::Position(Position { start, moves }))
}

fn parse_go(cursor: &mut Cursor<'_>) -> Result<GoParams, MalformedCommand> {
    let mut params = GoParams::default();
    if cursor.peek().is_some_and(is_number) {
        params.budget_ms = Some(cursor.number("go")?);
    }
    while let Some(key) = cursor.next() {
        match key {
            "depth" => params.depth = Some(cursor.number(key)?),
            "nodes" => params.nodes = Some(cursor.number(key)?),
            "movetime" => params.movetime = Some(cursor.number(key)?),
            "wtime" => params.wtime = Some(cursor.number(key)?),
            "btime" => params.btime = Some(cursor.number(key)?),
            "winc" => params.winc = Some(cursor.number(key)?),
            "binc" => params.binc = Some(cursor.number(key)?),
            "movestogo" => params.movestogo = Some(cursor.number(key)?),
            "infinite" => params.infinite = true,
            _ => {
                // Unsupported token (ponder, mate, searchmoves...), skip
            }
        }
    }
    Ok(params)
}

fn parse_bestmove(cursor: &mut Cursor<'_>) -> Result<Command, MalformedCommand> {
    let best = match cursor.next() {
        None => return Err(cursor.malformed("bestmove needs a move")),
        Some("(none)") => Move::null(),
        Some(token) => parse_move(cursor.line, token)?,
    };
    let ponder = match cursor.next() {
        Some("ponder") => match cursor.peek() {
            Some("(none)") => None,
            _ => Some(cursor.mv("ponder")?),
        },
        _ => None,
    };
    Ok(Command::BestMove { best, ponder })
}

/// Parse the arguments of an "info" line from the engine
fn parse_info(cursor: &mut Cursor<'_>) -> Result<Info, MalformedCommand> {
    let mut info = Info::default();

    while let Some(key) = cursor.next() {
        match key {
            "depth" => info.depth = Some(cursor.number(key)?),
            "seldepth" => info.seldepth = Some(cursor.number(key)?),
            "time" => info.time_ms = Some(cursor.number(key)?),
            "nodes" => info.nodes = Some(cursor.number(key)?),
            "nps" => info.nps = Some(cursor.number(key)?),
            "tbhits" => info.tbhits = Some(cursor.number(key)?),
            "hashfull" => info.hashfull = Some(cursor.number(key)?),
            "multipv" => info.multipv = Some(cursor.number(key)?),
            "currmovenumber" => info.currmovenumber = Some(cursor.number(key)?),
            "currmove" => info.currmove = Some(cursor.mv(key)?),
            "score" => {
                info.score = Some(match cursor.value(key)? {
                    "cp" => Score::Centipawns(cursor.number("score cp")?),
                    "mate" => Score::Mate(cursor.number("score mate")?),
                    other => {
                        return Err(cursor.malformed(format!("unknown score type {:?}", other)))
                    }
                });
            }
            "pv" => {
                // Collect all moves until next keyword
                while let Some(token) = cursor.peek() {
                    if is_info_keyword(token) {
                        break;
                    }
                    info.pv.push(parse_move(cursor.line, token)?);
                    cursor.next();
                }
            }
            "string" => {
                info.string = Some(cursor.rest().join(" "));
            }
            _ => {
                // Unknown keyword (lowerbound, cpuload, refutation...), skip
            }
        }
    }

    Ok(info)
}

fn is_info_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "cpuload"
            | "string"
            | "refutation"
            | "currline"
    )
}

impl Command {
    /// Check that the command fits on one wire line and reads back as itself.
    ///
    /// Free-text fields must be single-space separated words, and must not
    /// contain the keyword that ends them on the wire (`value` in an option
    /// name, `moves` in a FEN). An `Unknown` command must not start with a
    /// known keyword.
    pub fn check_wire(&self) -> Result<(), MalformedCommand> {
        let line = self.to_string();
        if line.contains(['\n', '\r']) {
            return Err(MalformedCommand::new(&line, "line terminator inside a command"));
        }
        let reject = |reason: &str| -> Result<(), MalformedCommand> {
            Err(MalformedCommand::new(&line, reason))
        };

        match self {
            Command::UciNewGame {
                variant: Some(variant),
                ..
            } if !is_word(variant) => reject("variant must be a single word"),
            Command::SetOption { name, .. } if !is_words(name) || has_word(name, "value") => {
                reject("option name must be words other than 'value'")
            }
            Command::SetOption {
                value: Some(value), ..
            } if !value.is_empty() && !is_words(value) => reject("option value must be words"),
            Command::Position(Position {
                start: PositionStart::Fen(fen),
                ..
            }) if !is_words(fen) || has_word(fen, "moves") => {
                reject("fen must be words other than 'moves'")
            }
            Command::Id { field, value } if !is_word(field) || !is_words(value) => {
                reject("id needs a one-word field and a value")
            }
            Command::Info(Info {
                string: Some(text), ..
            }) if !text.is_empty() && !is_words(text) => reject("info string must be words"),
            Command::Unknown { raw } if !is_words(raw) => reject("unknown command must be words"),
            Command::Unknown { raw } => match parse_command(raw) {
                Ok(Command::Unknown { .. }) => Ok(()),
                _ => reject("unknown command starts with a known keyword"),
            },
            _ => Ok(()),
        }
    }
}

/// Non-empty words separated by single spaces.
fn is_words(text: &str) -> bool {
    !text.is_empty() && text.split(' ').eq(text.split_whitespace())
}

fn is_word(text: &str) -> bool {
    is_words(text) && !text.contains(' ')
}

fn has_word(text: &str, word: &str) -> bool {
    text.split(' ').any(|w| w == word)
}

/// Serializes a command back into its wire form, without the terminator.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Uci => f.write_str("uci"),
            Command::IsReady => f.write_str("isready"),
            Command::Stop => f.write_str("stop"),
            Command::Quit => f.write_str("quit"),
            Command::UciOk => f.write_str("uciok"),
            Command::ReadyOk => f.write_str("readyok"),
            Command::NewGameOk => f.write_str("newgameok"),
            Command::UciNewGame { variant, time_ms } => {
                f.write_str("ucinewgame")?;
                if let Some(variant) = variant {
                    write!(f, " {}", variant)?;
                }
                if let Some(time_ms) = time_ms {
                    write!(f, " {}", time_ms)?;
                }
                Ok(())
            }
            Command::SetOption { name, value } => {
                write!(f, "setoption name {}", name)?;
                if let Some(value) = value {
                    write!(f, " value {}", value)?;
                }
                Ok(())
            }
            Command::Position(position) => write_position(f, position),
            Command::Go(params) => write_go(f, params),
            Command::Id { field, value } => write!(f, "id {} {}", field, value),
            Command::BestMove { best, ponder } => {
                write!(f, "bestmove {}", best)?;
                if let Some(ponder) = ponder {
                    write!(f, " ponder {}", ponder)?;
                }
                Ok(())
            }
            Command::Info(info) => write_info(f, info),
            Command::Unknown { raw } => f.write_str(raw),
        }
    }
}

fn write_position(f: &mut fmt::Formatter<'_>, position: &Position) -> fmt::Result {
    match &position.start {
        PositionStart::StartPos => f.write_str("position startpos")?,
        PositionStart::Fen(fen) => write!(f, "position fen {}", fen)?,
    }
    if !position.moves.is_empty() {
        f.write_str(" moves")?;
        for mv in &position.moves {
            write!(f, " {}", mv)?;
        }
    }
    Ok(())
}

fn write_go(f: &mut fmt::Formatter<'_>, params: &GoParams) -> fmt::Result {
    f.write_str("go")?;
    if let Some(budget) = params.budget_ms {
        write!(f, " {}", budget)?;
    }
    let numbers = [
        ("depth", params.depth.map(u64::from)),
        ("nodes", params.nodes),
        ("movetime", params.movetime),
        ("wtime", params.wtime),
        ("btime", params.btime),
        ("winc", params.winc),
        ("binc", params.binc),
        ("movestogo", params.movestogo.map(u64::from)),
    ];
    for (key, value) in numbers {
        if let Some(value) = value {
            write!(f, " {} {}", key, value)?;
        }
    }
    if params.infinite {
        f.write_str(" infinite")?;
    }
    Ok(())
}

fn write_info(f: &mut fmt::Formatter<'_>, info: &Info) -> fmt::Result {
    f.write_str("info")?;
    if let Some(depth) = info.depth {
        write!(f, " depth {}", depth)?;
    }
    if let Some(seldepth) = info.seldepth {
        write!(f, " seldepth {}", seldepth)?;
    }
    if let Some(multipv) = info.multipv {
        write!(f, " multipv {}", multipv)?;
    }
    match info.score {
        Some(Score::Centipawns(cp)) => write!(f, " score cp {}", cp)?,
        Some(Score::Mate(moves)) => write!(f, " score mate {}", moves)?,
        None => {}
    }
    if let Some(nodes) = info.nodes {
        write!(f, " nodes {}", nodes)?;
    }
    if let Some(nps) = info.nps {
        write!(f, " nps {}", nps)?;
    }
    if let Some(tbhits) = info.tbhits {
        write!(f, " tbhits {}", tbhits)?;
    }
    if let Some(hashfull) = info.hashfull {
        write!(f, " hashfull {}", hashfull)?;
    }
    if let Some(time_ms) = info.time_ms {
        write!(f, " time {}", time_ms)?;
    }
    if let Some(currmove) = &info.currmove {
        write!(f, " currmove {}", currmove)?;
    }
    if let Some(number) = info.currmovenumber {
        write!(f, " currmovenumber {}", number)?;
    }
    if !info.pv.is_empty() {
        f.write_str(" pv")?;
        for mv in &info.pv {
            write!(f, " {}", mv)?;
        }
    }
    // "string" swallows the rest of the line, so it goes last
    if let Some(text) = &info.string {
        write!(f, " string {}", text)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mv(s: &str) -> Move {
        Move::parse(s).unwrap()
    }

    #[test]
    fn test_parse_bestmove() {
        let msg = parse_command("bestmove e2e4 ponder e7e5").unwrap();
        match msg {
            Command::BestMove { best, ponder } => {
                assert_eq!(best.as_str(), "e2e4");
                assert_eq!(ponder.unwrap().as_str(), "e7e5");
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_bestmove_none() {
        let msg = parse_command("bestmove (none)").unwrap();
        assert!(matches!(msg, Command::BestMove { ref best, ponder: None } if best.is_null()));
    }

    #[test]
    fn test_parse_info() {
        let msg = parse_command("info depth 12 score cp 35 nodes 15234 pv e2e4 e7e5").unwrap();
        match msg {
            Command::Info(info) => {
                assert_eq!(info.depth, Some(12));
                assert_eq!(info.score, Some(Score::Centipawns(35)));
                assert_eq!(info.nodes, Some(15234));
                assert_eq!(info.pv.len(), 2);
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_info_skips_unknown_keywords() {
        let msg = parse_command("info depth 3 score cp 10 lowerbound cpuload 250 string hi there")
            .unwrap();
        match msg {
            Command::Info(info) => {
                assert_eq!(info.depth, Some(3));
                assert_eq!(info.string.as_deref(), Some("hi there"));
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_position_startpos_with_moves() {
        let cmd = parse_command("position startpos moves e2e4 e7e5").unwrap();
        assert_eq!(
            cmd,
            Command::Position(Position::startpos(vec![mv("e2e4"), mv("e7e5")]))
        );
    }

    #[test]
    fn test_parse_position_fen() {
        let cmd = parse_command("position fen 8/8/8/8/8/8/8/8 w - - 0 1 moves a1a2").unwrap();
        match cmd {
            Command::Position(Position {
                start: PositionStart::Fen(fen),
                moves,
            }) => {
                assert_eq!(fen, "8/8/8/8/8/8/8/8 w - - 0 1");
                assert_eq!(moves, vec![mv("a1a2")]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_position_errors() {
        assert!(parse_command("position").is_err());
        assert!(parse_command("position fen moves e2e4").is_err());
        assert!(parse_command("position startpos e2e4").is_err());
        assert!(parse_command("position startpos moves e2-e4").is_err());
    }

    #[test]
    fn test_parse_go() {
        assert_eq!(
            parse_command("go depth 10").unwrap(),
            Command::Go(GoParams::depth(10))
        );
        assert_eq!(
            parse_command("go movetime 500").unwrap(),
            Command::Go(GoParams::movetime(500))
        );
        assert_eq!(
            parse_command("go infinite").unwrap(),
            Command::Go(GoParams::infinite())
        );
        assert_eq!(
            parse_command("go").unwrap(),
            Command::Go(GoParams::default())
        );
    }

    #[test]
    fn test_bad_number_fails_whole_command() {
        let err = parse_command("go depth ten").unwrap_err();
        assert_eq!(err.raw, "go depth ten");
        assert!(err.reason.contains("depth"));
        assert!(parse_command("go movetime").is_err());
        assert!(parse_command("info depth -3").is_err());
        assert!(parse_command("info score cp x").is_err());
    }

    #[test]
    fn test_unknown_is_not_an_error() {
        let cmd = parse_command("option name Hash type spin default 16").unwrap();
        assert_eq!(
            cmd,
            Command::Unknown {
                raw: "option name Hash type spin default 16".to_string()
            }
        );
    }

    #[test]
    fn test_empty_line_is_malformed() {
        assert!(parse_command("   ").is_err());
    }

    #[test]
    fn test_parse_setoption() {
        assert_eq!(
            parse_command("setoption name Skill Level value 5").unwrap(),
            Command::SetOption {
                name: "Skill Level".to_string(),
                value: Some("5".to_string())
            }
        );
        assert_eq!(
            parse_command("setoption name Clear Hash").unwrap(),
            Command::SetOption {
                name: "Clear Hash".to_string(),
                value: None
            }
        );
        assert!(parse_command("setoption Hash").is_err());
    }

    #[test]
    fn test_parse_new_game_variants() {
        assert_eq!(
            parse_command("ucinewgame").unwrap(),
            Command::UciNewGame {
                variant: None,
                time_ms: None
            }
        );
        assert_eq!(
            parse_command("ucinewgame board-7-3 60000").unwrap(),
            Command::UciNewGame {
                variant: Some("board-7-3".to_string()),
                time_ms: Some(60000)
            }
        );
        assert!(parse_command("ucinewgame 100 board-7-3").is_err());
        assert!(parse_command("ucinewgame board-7-3 100 extra").is_err());
    }

    #[test]
    fn test_new_game_arguments_are_positional() {
        assert_eq!(
            parse_command("ucinewgame 123 5").unwrap(),
            Command::UciNewGame {
                variant: Some("123".to_string()),
                time_ms: Some(5)
            }
        );
        assert_eq!(
            parse_command("ucinewgame 60000").unwrap(),
            Command::UciNewGame {
                variant: None,
                time_ms: Some(60000)
            }
        );
    }

    #[test]
    fn test_parse_go_bare_budget() {
        assert_eq!(
            parse_command("go 5000").unwrap(),
            Command::Go(GoParams::budget(5000))
        );
        assert_eq!(Command::Go(GoParams::budget(5000)).to_string(), "go 5000");
        let params = match parse_command("go 250 depth 4").unwrap() {
            Command::Go(params) => params,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(params.budget_ms, Some(250));
        assert_eq!(params.depth, Some(4));
        assert!(parse_command("go 99999999999999999999").is_err());
    }

    #[test]
    fn test_pv_stops_at_keyword() {
        let msg = parse_command("info pv e2e4 depth 3").unwrap();
        match msg {
            Command::Info(info) => {
                assert_eq!(info.pv, vec![mv("e2e4")]);
                assert_eq!(info.depth, Some(3));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_command("info currmove depth").is_err());
    }

    #[test]
    fn test_check_wire_rejects_multi_line_commands() {
        let injected = Command::Unknown {
            raw: "debug on\ngo infinite".to_string(),
        };
        assert!(injected.check_wire().is_err());
        let option = Command::SetOption {
            name: "Hash".to_string(),
            value: Some("16\r\ngo".to_string()),
        };
        assert!(option.check_wire().is_err());
        let new_game = Command::UciNewGame {
            variant: Some("board\n".to_string()),
            time_ms: None,
        };
        assert!(new_game.check_wire().is_err());
    }

    #[test]
    fn test_check_wire_rejects_ambiguous_fields() {
        let rejected = [
            Command::UciNewGame {
                variant: Some("board 7".to_string()),
                time_ms: None,
            },
            Command::SetOption {
                name: "Use value".to_string(),
                value: None,
            },
            Command::SetOption {
                name: String::new(),
                value: None,
            },
            Command::Position(Position {
                start: PositionStart::Fen("8/8 moves".to_string()),
                moves: Vec::new(),
            }),
            Command::Unknown {
                raw: "go infinite".to_string(),
            },
            Command::Unknown {
                raw: "debug  on".to_string(),
            },
        ];
        for cmd in rejected {
            assert!(cmd.check_wire().is_err(), "{:?}", cmd);
        }

        let accepted = [
            Command::UciNewGame {
                variant: Some("123".to_string()),
                time_ms: Some(5),
            },
            Command::SetOption {
                name: "Skill Level".to_string(),
                value: Some("5".to_string()),
            },
            Command::Unknown {
                raw: "debug on".to_string(),
            },
        ];
        for cmd in accepted {
            assert!(cmd.check_wire().is_ok(), "{:?}", cmd);
        }
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(
            parse_command("id name Rollerball 1.0").unwrap(),
            Command::Id {
                field: "name".to_string(),
                value: "Rollerball 1.0".to_string()
            }
        );
        assert!(parse_command("id name").is_err());
    }

    #[test]
    fn test_serialize() {
        let cmd = Command::Position(Position::startpos(vec![mv("e2e4"), mv("e7e5")]));
        assert_eq!(cmd.to_string(), "position startpos moves e2e4 e7e5");
        assert_eq!(Command::Go(GoParams::depth(10)).to_string(), "go depth 10");
        assert_eq!(
            Command::BestMove {
                best: mv("e7e5"),
                ponder: None
            }
            .to_string(),
            "bestmove e7e5"
        );
    }

    fn word() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9]{0,7}"
    }

    fn phrase() -> impl Strategy<Value = String> {
        prop::collection::vec(word(), 1..4).prop_map(|words| words.join(" "))
    }

    fn arb_move() -> impl Strategy<Value = Move> {
        "[A-Za-z0-9@=]{1,10}".prop_filter_map("not a move", |s| Move::parse(&s).ok())
    }

    fn arb_go() -> impl Strategy<Value = GoParams> {
        (
            (
                prop::option::of(any::<u64>()),
                prop::option::of(1u32..64),
                prop::option::of(any::<u64>()),
                prop::option::of(any::<u64>()),
                prop::option::of(any::<u64>()),
            ),
            (
                prop::option::of(any::<u64>()),
                prop::option::of(any::<u64>()),
                prop::option::of(any::<u64>()),
                prop::option::of(any::<u32>()),
                any::<bool>(),
            ),
        )
            .prop_map(
                |(
                    (budget_ms, depth, nodes, movetime, wtime),
                    (btime, winc, binc, movestogo, infinite),
                )| {
                    GoParams {
                        budget_ms,
                        depth,
                        nodes,
                        movetime,
                        wtime,
                        btime,
                        winc,
                        binc,
                        movestogo,
                        infinite,
                    }
                },
            )
    }

    fn arb_info() -> impl Strategy<Value = Info> {
        (
            (
                prop::option::of(any::<u32>()),
                prop::option::of(any::<u32>()),
                prop::option::of(any::<u64>()),
                prop::option::of(any::<u64>()),
                prop::option::of(any::<u64>()),
            ),
            (
                prop::option::of(prop_oneof![
                    any::<i32>().prop_map(Score::Centipawns),
                    any::<i32>().prop_map(Score::Mate),
                ]),
                prop::option::of(arb_move()),
                prop::collection::vec(arb_move(), 0..6),
                prop::option::of(phrase()),
            ),
        )
            .prop_map(
                |((depth, seldepth, time_ms, nodes, nps), (score, currmove, pv, string))| Info {
                    depth,
                    seldepth,
                    time_ms,
                    nodes,
                    nps,
                    score,
                    currmove,
                    pv,
                    string,
                    ..Default::default()
                },
            )
    }

    fn arb_command() -> impl Strategy<Value = Command> {
        prop_oneof![
            Just(Command::Uci),
            Just(Command::IsReady),
            Just(Command::Stop),
            Just(Command::Quit),
            Just(Command::UciOk),
            Just(Command::ReadyOk),
            Just(Command::NewGameOk),
            (
                prop::option::of("[A-Za-z0-9-]{1,12}"),
                prop::option::of(any::<u64>())
            )
                .prop_map(|(variant, time_ms)| Command::UciNewGame { variant, time_ms }),
            (phrase(), prop::option::of(phrase()))
                .prop_map(|(name, value)| Command::SetOption { name, value }),
            (
                prop_oneof![
                    Just(PositionStart::StartPos),
                    phrase().prop_map(PositionStart::Fen)
                ],
                prop::collection::vec(arb_move(), 0..8)
            )
                .prop_map(|(start, moves)| Command::Position(Position { start, moves })),
            arb_go().prop_map(Command::Go),
            (word(), phrase()).prop_map(|(field, value)| Command::Id { field, value }),
            (arb_move(), prop::option::of(arb_move()))
                .prop_map(|(best, ponder)| Command::BestMove { best, ponder }),
            arb_info().prop_map(Command::Info),
            (word(), prop::collection::vec(word(), 0..3))
                .prop_map(|(head, tail)| {
                    let mut raw = head;
                    for w in tail {
                        raw.push(' ');
                        raw.push_str(&w);
                    }
                    Command::Unknown { raw }
                }),
        ]
    }

    proptest! {
        /// Property: serializing a parsed serialization reproduces the same line
        #[test]
        fn prop_serialize_parse_round_trip(
            cmd in arb_command().prop_filter("not one wire line", |c| c.check_wire().is_ok())
        ) {
            let line = cmd.to_string();
            let parsed = parse_command(&line).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(parsed.to_string(), line);
        }
    }
}
