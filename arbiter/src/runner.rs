use std::time::Duration;

use rollerball_link::{
    Command, EngineLink, GoParams, LinkError, Move, MoveHistory, SessionId, Side,
};
use serde::Serialize;

use crate::config::SEARCH_GRACE_MS;

#[derive(Debug, thiserror::Error)]
pub enum ArbiterError {
    #[error("{side} engine never became ready: {source}")]
    NotReady {
        side: Side,
        #[source]
        source: LinkError,
    },
    #[error("{side} engine rejected '{command}': {source}")]
    Rejected {
        side: Side,
        command: String,
        #[source]
        source: LinkError,
    },
}

#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub movetime_ms: u64,
    pub max_plies: usize,
    pub variant: Option<String>,
    pub game_time_ms: Option<u64>,
    /// Send `go <ms>` instead of `go movetime <ms>`.
    pub bare_go: bool,
}

impl MatchSettings {
    fn go_params(&self) -> GoParams {
        if self.bare_go {
            GoParams::budget(self.movetime_ms)
        } else {
            GoParams::movetime(self.movetime_ms)
        }
    }
}

/// Why a match stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchEnd {
    /// The side to move reported the null move: it has no legal move.
    NoMove { side: Side },
    /// The side to move went away or failed to answer in time.
    Forfeit { side: Side, reason: String },
    PlyLimit { plies: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    pub end: MatchEnd,
    pub history: MoveHistory,
}

struct Players {
    white: SessionId,
    black: SessionId,
}

impl Players {
    fn session(&self, side: Side) -> SessionId {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }
}

/// Play one game between two connected sessions.
///
/// Waits for both handshakes, announces the new game to both engines, then
/// asks the side to move for a move until one side has none, drops out, or
/// the ply limit is reached.
pub async fn run_match(
    link: &EngineLink,
    white: SessionId,
    black: SessionId,
    settings: &MatchSettings,
) -> Result<MatchOutcome, ArbiterError> {
    let players = Players { white, black };

    for side in [Side::White, Side::Black] {
        link.wait_ready(players.session(side))
            .await
            .map_err(|source| ArbiterError::NotReady { side, source })?;
    }

    let new_game = Command::UciNewGame {
        variant: settings.variant.clone(),
        time_ms: settings.game_time_ms,
    };
    for side in [Side::White, Side::Black] {
        send(link, &players, side, new_game.clone()).await?;
    }
    tracing::info!("New game started (variant: {:?})", settings.variant);

    let mut history = MoveHistory::new();
    let end = loop {
        if history.len() >= settings.max_plies {
            break MatchEnd::PlyLimit {
                plies: history.len(),
            };
        }

        let side = history.side_to_move();
        send(link, &players, side, Command::Position(history.position())).await?;

        match request_move(link, players.session(side), settings).await {
            Ok(mv) if mv.is_null() => break MatchEnd::NoMove { side },
            Ok(mv) => {
                tracing::info!("Ply {}: {} plays {}", history.len() + 1, side, mv);
                history.record(mv);
            }
            Err(reason) => {
                tracing::warn!("{} forfeits: {}", side, reason);
                break MatchEnd::Forfeit { side, reason };
            }
        }
    };

    tracing::info!("Match over after {} plies: {:?}", history.len(), end);
    Ok(MatchOutcome { end, history })
}

async fn send(
    link: &EngineLink,
    players: &Players,
    side: Side,
    command: Command,
) -> Result<(), ArbiterError> {
    link.send(players.session(side), command.clone())
        .await
        .map_err(|source| ArbiterError::Rejected {
            side,
            command: command.to_string(),
            source,
        })
}

/// Ask one engine for a move. `Err` carries the forfeit reason.
async fn request_move(
    link: &EngineLink,
    id: SessionId,
    settings: &MatchSettings,
) -> Result<Move, String> {
    let limit = Duration::from_millis(settings.movetime_ms.saturating_add(SEARCH_GRACE_MS));
    match tokio::time::timeout(limit, link.search(id, settings.go_params())).await {
        Ok(Ok(best)) => Ok(best.best),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => {
            let _ = link.stop(id).await;
            Err(format!("no bestmove within {:?}", limit))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollerball_link::Transport;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    /// Minimal engine: answers the handshake and plays `moves` in order,
    /// then the null move. A `"!"` entry hangs up instead of answering.
    fn scripted_engine(moves: &'static [&'static str]) -> Transport {
        let (ours, theirs) = tokio::io::duplex(4096);
        tokio::spawn(async move {
            let (reader, mut writer) = tokio::io::split(theirs);
            let mut lines = BufReader::new(reader).lines();
            let mut moves = moves.iter();
            while let Ok(Some(line)) = lines.next_line().await {
                let reply = match line.split_whitespace().next() {
                    Some("uci") => "id name Scripted\nuciok".to_string(),
                    Some("isready") => "readyok".to_string(),
                    Some("ucinewgame") => "newgameok".to_string(),
                    Some("go") => match moves.next() {
                        Some(&"!") => break,
                        mv => format!("bestmove {}", mv.unwrap_or(&"0000")),
                    },
                    Some("quit") => break,
                    _ => continue,
                };
                let reply = format!("{}\n", reply);
                if writer.write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
            }
        });
        Transport::from_stream(ours, "scripted")
    }

    fn settings(max_plies: usize) -> MatchSettings {
        MatchSettings {
            movetime_ms: 10,
            max_plies,
            variant: Some("board-7-3".to_string()),
            game_time_ms: Some(60_000),
            bare_go: false,
        }
    }

    #[test]
    fn test_go_form_follows_settings() {
        let mut settings = settings(10);
        assert_eq!(
            Command::Go(settings.go_params()).to_string(),
            "go movetime 10"
        );
        settings.bare_go = true;
        assert_eq!(Command::Go(settings.go_params()).to_string(), "go 10");
    }

    #[tokio::test]
    async fn test_match_with_bare_go() {
        let link = EngineLink::default();
        let white = link.attach(scripted_engine(&["a1a2"])).await.unwrap();
        let black = link.attach(scripted_engine(&[])).await.unwrap();

        let mut settings = settings(10);
        settings.bare_go = true;
        let outcome = run_match(&link, white, black, &settings).await.unwrap();
        assert_eq!(outcome.end, MatchEnd::NoMove { side: Side::Black });
        assert_eq!(outcome.history.len(), 1);
    }

    #[tokio::test]
    async fn test_match_ends_on_null_move() {
        let link = EngineLink::default();
        let white = link.attach(scripted_engine(&["e2e4", "g1f3"])).await.unwrap();
        let black = link.attach(scripted_engine(&["e7e5"])).await.unwrap();

        let outcome = run_match(&link, white, black, &settings(10)).await.unwrap();
        assert_eq!(outcome.end, MatchEnd::NoMove { side: Side::Black });
        let plies: Vec<&str> = outcome.history.plies().map(Move::as_str).collect();
        assert_eq!(plies, vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[tokio::test]
    async fn test_match_stops_at_ply_limit() {
        let link = EngineLink::default();
        let white = link.attach(scripted_engine(&["a1a2", "a2a3"])).await.unwrap();
        let black = link.attach(scripted_engine(&["h8h7", "h7h6"])).await.unwrap();

        let outcome = run_match(&link, white, black, &settings(3)).await.unwrap();
        assert_eq!(outcome.end, MatchEnd::PlyLimit { plies: 3 });
        assert_eq!(outcome.history.len(), 3);
    }

    #[tokio::test]
    async fn test_engine_hanging_up_forfeits() {
        let link = EngineLink::default();
        let white = link.attach(scripted_engine(&["e2e4"])).await.unwrap();
        let black = link.attach(scripted_engine(&["!"])).await.unwrap();

        let outcome = run_match(&link, white, black, &settings(10)).await.unwrap();
        assert!(matches!(
            outcome.end,
            MatchEnd::Forfeit {
                side: Side::Black,
                ..
            }
        ));
        assert_eq!(outcome.history.len(), 1);
    }

    #[tokio::test]
    async fn test_disconnected_engine_is_not_ready() {
        let link = EngineLink::default();
        let white = link.attach(scripted_engine(&["e2e4"])).await.unwrap();
        let black = link.attach(scripted_engine(&[])).await.unwrap();
        link.wait_ready(black).await.unwrap();
        link.disconnect(black).await.unwrap();

        let err = run_match(&link, white, black, &settings(10)).await.unwrap_err();
        assert!(matches!(
            err,
            ArbiterError::NotReady {
                side: Side::Black,
                source: LinkError::UnknownSession(_)
            }
        ));
    }
}
