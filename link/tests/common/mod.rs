#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use rollerball_link::{LinkEvent, Transport};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::broadcast;
use tokio::time::timeout;

pub const STEP: Duration = Duration::from_secs(5);

/// Scripted engine on the far end of a transport.
pub struct FakeEngine {
    lines: Lines<BufReader<Box<dyn AsyncRead + Send + Unpin>>>,
    writer: Box<dyn AsyncWrite + Send + Unpin>,
}

impl FakeEngine {
    pub fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(reader);
        Self {
            lines: BufReader::new(reader).lines(),
            writer: Box::new(writer),
        }
    }

    /// An in-memory transport for the link plus the engine driving its far end.
    pub fn pair() -> (Transport, FakeEngine) {
        let (ours, theirs) = tokio::io::duplex(16 * 1024);
        (Transport::from_stream(ours, "duplex"), FakeEngine::new(theirs))
    }

    pub async fn next_line(&mut self) -> Option<String> {
        timeout(STEP, self.lines.next_line())
            .await
            .expect("timed out waiting for a line from the link")
            .expect("read from link failed")
    }

    pub async fn expect(&mut self, expected: &str) {
        let line = self.next_line().await;
        assert_eq!(line.as_deref(), Some(expected));
    }

    pub async fn say(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    pub async fn say_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Answer the `uci` / `isready` exchange.
    pub async fn handshake(&mut self) {
        self.expect("uci").await;
        self.say("id name Fake").await;
        self.say("id author Tests").await;
        self.say("uciok").await;
        self.expect("isready").await;
        self.say("readyok").await;
    }
}

pub async fn next_event(rx: &mut broadcast::Receiver<LinkEvent>) -> LinkEvent {
    timeout(STEP, rx.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

/// Skip events until one matches.
pub async fn wait_for(
    rx: &mut broadcast::Receiver<LinkEvent>,
    pred: impl Fn(&LinkEvent) -> bool,
) -> LinkEvent {
    loop {
        let event = next_event(rx).await;
        if pred(&event) {
            return event;
        }
    }
}

/// Writer that accepts `writes` writes and fails every one after that.
pub struct FailingWriter {
    writes: usize,
}

impl FailingWriter {
    pub fn after(writes: usize) -> Self {
        Self { writes }
    }
}

impl AsyncWrite for FailingWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.writes == 0 {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "engine gone")));
        }
        self.writes -= 1;
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
