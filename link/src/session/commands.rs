use tokio::sync::oneshot;

use super::state::SessionSnapshot;
use super::BestMove;
use crate::error::LinkError;
use crate::events::LinkEvent;
use crate::uci::{Command, GoParams};

pub(crate) type Reply<T> = oneshot::Sender<Result<T, LinkError>>;

/// Commands sent to the session actor. Each embeds a oneshot for the reply.
pub(crate) enum SessionCommand {
    /// Gate, serialize and write one command.
    Send { command: Command, reply: Reply<()> },
    /// Treat `line` as if the engine had sent it.
    Route {
        line: String,
        reply: Reply<Option<LinkEvent>>,
    },
    /// Send `go`; `reply` answers once the line is written, `best_move` once
    /// the engine reports.
    Search {
        params: GoParams,
        reply: Reply<()>,
        best_move: Reply<BestMove>,
    },
    AwaitBestMove { reply: Reply<BestMove> },
    AwaitReady { reply: Reply<()> },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Disconnect { reply: oneshot::Sender<()> },
}
