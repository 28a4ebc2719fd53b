use std::io;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};

use super::endpoint::Endpoint;

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// An open duplex byte channel to one engine.
pub struct Transport {
    reader: BoxedReader,
    writer: BoxedWriter,
    child: Option<Child>,
    label: String,
}

impl Transport {
    pub fn new<R, W>(reader: R, writer: W, label: impl Into<String>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            child: None,
            label: label.into(),
        }
    }

    /// Wrap a single bidirectional stream, e.g. one end of `tokio::io::duplex`.
    pub fn from_stream<S>(stream: S, label: impl Into<String>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self::new(reader, writer, label)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn into_parts(self) -> (BoxedReader, BoxedWriter, Option<Child>) {
        (self.reader, self.writer, self.child)
    }

    pub async fn open(endpoint: &Endpoint) -> io::Result<Self> {
        match endpoint {
            Endpoint::Tcp { host, port } => {
                tracing::info!("Connecting to engine at {}:{}", host, port);
                let stream = TcpStream::connect((host.as_str(), *port)).await?;
                stream.set_nodelay(true)?;
                let (reader, writer) = stream.into_split();
                Ok(Self::new(reader, writer, endpoint.to_string()))
            }
            Endpoint::Process { program, args } => {
                tracing::info!("Spawning engine process {} {:?}", program, args);
                let mut child = Command::new(program)
                    .args(args)
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::null())
                    .kill_on_drop(true)
                    .spawn()
                    .map_err(|e| {
                        tracing::error!("Failed to spawn engine {}: {}", program, e);
                        e
                    })?;

                let stdin = child
                    .stdin
                    .take()
                    .ok_or_else(|| io::Error::other("engine stdin not captured"))?;
                let stdout = child
                    .stdout
                    .take()
                    .ok_or_else(|| io::Error::other("engine stdout not captured"))?;

                let mut transport = Self::new(stdout, stdin, endpoint.to_string());
                transport.child = Some(child);
                Ok(transport)
            }
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("label", &self.label)
            .field("child", &self.child.as_ref().and_then(Child::id))
            .finish()
    }
}
