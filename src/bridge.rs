//! Sensor bridge
//!
//! Runs next to the bedside sensor. Reads CRLF-delimited telemetry lines
//! from a serial device (or stdin) and forwards each one to the server's
//! `/ws` endpoint as a `vitals-data` envelope. The server does all decoding;
//! the bridge only frames lines.

use std::fmt;
use std::path::PathBuf;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio_tungstenite::tungstenite::{self, Message};

use crate::realtime::ClientMessage;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("telemetry source failed: {0}")]
    Source(#[from] std::io::Error),
    #[error("websocket error: {0}")]
    Socket(#[from] tungstenite::Error),
    #[error("failed to encode line: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("server closed the connection")]
    Disconnected,
}

pub type SourceLines = Lines<BufReader<Box<dyn AsyncRead + Unpin + Send>>>;

/// Where raw telemetry lines are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSource {
    Stdin,
    /// A serial device or any readable file. Line settings such as the baud
    /// rate are configured on the device beforehand (`stty`).
    Device(PathBuf),
}

impl LineSource {
    /// `-` means stdin, anything else is a path.
    pub fn parse(raw: &str) -> LineSource {
        match raw.trim() {
            "-" => LineSource::Stdin,
            path => LineSource::Device(PathBuf::from(path)),
        }
    }

    pub async fn open(&self) -> Result<SourceLines, BridgeError> {
        let reader: Box<dyn AsyncRead + Unpin + Send> = match self {
            LineSource::Stdin => Box::new(tokio::io::stdin()),
            LineSource::Device(path) => Box::new(tokio::fs::File::open(path).await?),
        };
        Ok(BufReader::new(reader).lines())
    }
}

impl fmt::Display for LineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSource::Stdin => write!(f, "stdin"),
            LineSource::Device(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Wrap one raw line for the server. Blank lines are not sent.
pub fn frame(line: &str) -> Result<Option<Message>, BridgeError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Ok(None);
    }

    let text = serde_json::to_string(&ClientMessage::VitalsData(line.to_string()))?;
    Ok(Some(Message::text(text)))
}

/// Forward lines over one connection until the source is exhausted.
///
/// Returns how many lines were sent. Server frames are read and ignored so
/// pings get answered and this client never falls behind on its queue. A
/// line that fails to send is lost; the caller reconnects and carries on
/// with the next one.
pub async fn forward<R, S>(lines: &mut Lines<R>, socket: S) -> Result<u64, BridgeError>
where
    R: AsyncBufRead + Unpin,
    S: Stream<Item = Result<Message, tungstenite::Error>> + Sink<Message, Error = tungstenite::Error>,
{
    let (mut outbound, mut inbound) = socket.split();
    let mut sent = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    if let Err(err) = outbound.close().await {
                        tracing::debug!(error = %err, "close after end of source failed");
                    }
                    return Ok(sent);
                };
                tracing::trace!(line = %line, "sensor line");
                if let Some(message) = frame(&line)? {
                    outbound.send(message).await?;
                    sent += 1;
                }
            }
            message = inbound.next() => match message {
                Some(Ok(Message::Close(_))) | None => return Err(BridgeError::Disconnected),
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(line: &str) -> serde_json::Value {
        let message = frame(line).unwrap().expect("line should be framed");
        serde_json::from_str(message.to_text().unwrap()).unwrap()
    }

    #[test]
    fn test_frame_wraps_line_as_vitals_data() {
        assert_eq!(
            framed("D:HR:72,SpO2:98\r\n"),
            serde_json::json!({ "event": "vitals-data", "data": "D:HR:72,SpO2:98" })
        );
        assert_eq!(
            framed("G:512"),
            serde_json::json!({ "event": "vitals-data", "data": "G:512" })
        );
    }

    #[test]
    fn test_framed_line_decodes_as_client_message() {
        let message = frame("G:600\r").unwrap().unwrap();
        assert_eq!(
            ClientMessage::from_text(message.to_text().unwrap()),
            ClientMessage::VitalsData("G:600".to_string())
        );
    }

    #[test]
    fn test_blank_lines_are_not_framed() {
        assert!(frame("").unwrap().is_none());
        assert!(frame("\r\n").unwrap().is_none());
    }

    #[test]
    fn test_line_source_parsing() {
        assert_eq!(LineSource::parse("-"), LineSource::Stdin);
        assert_eq!(
            LineSource::parse("/dev/ttyUSB0"),
            LineSource::Device(PathBuf::from("/dev/ttyUSB0"))
        );
        assert_eq!(LineSource::parse("-").to_string(), "stdin");
    }

    #[tokio::test]
    async fn test_missing_device_is_a_source_error() {
        let source = LineSource::Device(PathBuf::from("/nonexistent/ttyACM9"));
        assert!(matches!(source.open().await, Err(BridgeError::Source(_))));
    }
}
