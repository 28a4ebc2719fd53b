use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::Decoder;
use tracing::Instrument;

use super::transport::BoxedReader;
use crate::uci::{CodecError, LineCodec};

/// What the reader task hands to its session actor.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Inbound {
    Line(String),
    TooLong { limit: usize },
    /// End of stream; carries the I/O error if the read failed.
    Closed(Option<String>),
}

/// Spawn the task that frames `reader` into lines and forwards them.
///
/// Exits after sending [`Inbound::Closed`], or as soon as the actor drops
/// its receiver.
pub(crate) fn spawn_reader(
    reader: BoxedReader,
    max_line_length: usize,
    tx: mpsc::Sender<Inbound>,
) -> JoinHandle<()> {
    tokio::spawn(read_lines(reader, LineCodec::new(max_line_length), tx).in_current_span())
}

async fn read_lines(mut reader: BoxedReader, mut codec: LineCodec, tx: mpsc::Sender<Inbound>) {
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        loop {
            let item = match codec.decode(&mut buf) {
                Ok(Some(line)) => Inbound::Line(line),
                Ok(None) => break,
                Err(CodecError::LineTooLong { limit }) => Inbound::TooLong { limit },
                Err(CodecError::Io(e)) => Inbound::Closed(Some(e.to_string())),
            };
            if !forward(&tx, item).await {
                return;
            }
        }

        match reader.read_buf(&mut buf).await {
            Ok(0) => {
                tracing::debug!("Engine stdout closed (EOF)");
                flush_tail(&mut codec, &mut buf, &tx).await;
                let _ = tx.send(Inbound::Closed(None)).await;
                return;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Error reading from engine: {}", e);
                let _ = tx.send(Inbound::Closed(Some(e.to_string()))).await;
                return;
            }
        }
    }
}

async fn flush_tail(codec: &mut LineCodec, buf: &mut BytesMut, tx: &mpsc::Sender<Inbound>) {
    loop {
        let item = match codec.decode_eof(buf) {
            Ok(Some(line)) => Inbound::Line(line),
            Ok(None) => return,
            Err(CodecError::LineTooLong { limit }) => Inbound::TooLong { limit },
            Err(CodecError::Io(_)) => return,
        };
        if !forward(tx, item).await {
            return;
        }
    }
}

/// Returns false once the receiving actor is gone or the stream ended.
async fn forward(tx: &mpsc::Sender<Inbound>, item: Inbound) -> bool {
    match &item {
        Inbound::Line(line) => tracing::trace!("UCI << {}", line),
        Inbound::TooLong { limit } => tracing::warn!("Dropping engine line over {} bytes", limit),
        Inbound::Closed(_) => {}
    }
    let closed = matches!(item, Inbound::Closed(_));
    tx.send(item).await.is_ok() && !closed
}
