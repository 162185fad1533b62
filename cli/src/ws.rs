//! Device WebSocket.
//!
//! The board serves plain `ws://` on its own port and only accepts clients
//! that ask for the `arduino` subprotocol. [`connect`] performs that
//! handshake and splits the stream so a connection task can wait on reads
//! and on its close signal in one `tokio::select!`.
//!
//! Control frames never reach the link: [`DeviceReader::next_chunk`] yields
//! payload chunks and the peer's close, nothing else.

use anyhow::{Context, Result};
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::SEC_WEBSOCKET_PROTOCOL, HeaderValue};
use tokio_tungstenite::tungstenite::Message;

type DeviceStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// What the device sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text or binary payload, unmodified.
    Chunk(Bytes),
    /// The device closed the socket.
    Closed {
        /// Close code (1005 when the frame carried none).
        code: u16,
        /// Close reason.
        reason: String,
    },
}

/// Sending half. The device takes commands over HTTP, so the only thing
/// ever written here is the close handshake.
#[derive(Debug)]
pub struct DeviceWriter {
    sink: SplitSink<DeviceStream, Message>,
}

impl DeviceWriter {
    /// Start the close handshake.
    pub async fn send_close(&mut self) -> Result<()> {
        self.sink
            .send(Message::Close(None))
            .await
            .context("failed to send close frame")
    }

    /// Flush and shut the sending half.
    pub async fn finish(&mut self) -> Result<()> {
        self.sink.close().await.context("failed to close socket")
    }
}

/// Receiving half.
#[derive(Debug)]
pub struct DeviceReader {
    stream: SplitStream<DeviceStream>,
}

impl DeviceReader {
    /// Next payload or close. `None` once the stream has ended.
    pub async fn next_chunk(&mut self) -> Option<Result<Inbound>> {
        loop {
            let msg = match self.stream.next().await? {
                Ok(msg) => msg,
                Err(e) => return Some(Err(anyhow::Error::new(e).context("socket read failed"))),
            };

            return Some(Ok(match msg {
                Message::Text(text) => Inbound::Chunk(Bytes::from(text)),
                Message::Binary(data) => Inbound::Chunk(Bytes::from(data)),
                Message::Close(frame) => {
                    let (code, reason) = frame
                        .map_or((1005, String::new()), |f| (f.code.into(), f.reason.to_string()));
                    Inbound::Closed { code, reason }
                }
                // tungstenite answers pings itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }));
        }
    }
}

/// Open the device socket, requesting `subprotocol`.
pub async fn connect(url: &str, subprotocol: &str) -> Result<(DeviceWriter, DeviceReader)> {
    let mut request = url
        .into_client_request()
        .with_context(|| format!("invalid device URL: {url}"))?;
    let protocol = HeaderValue::from_str(subprotocol)
        .with_context(|| format!("invalid subprotocol: {subprotocol}"))?;
    request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, protocol);

    let (stream, response) = tokio_tungstenite::connect_async(request)
        .await
        .with_context(|| format!("handshake with {url} failed"))?;
    log::debug!(
        "[Link] Handshake with {} accepted ({:?})",
        url,
        response.headers().get(SEC_WEBSOCKET_PROTOCOL)
    );

    let (sink, stream) = stream.split();
    Ok((DeviceWriter { sink }, DeviceReader { stream }))
}

/// Link URL for a device host and port.
#[must_use]
pub fn device_ws_url(host: &str, port: u16) -> String {
    format!("ws://{host}:{port}/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_ws_url() {
        assert_eq!(device_ws_url("192.168.4.1", 81), "ws://192.168.4.1:81/");
        assert_eq!(
            device_ws_url("gbscontrol.local", 81),
            "ws://gbscontrol.local:81/"
        );
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        assert!(connect("not-a-url", "arduino").await.is_err());
    }

    #[tokio::test]
    async fn test_connect_unreachable_device() {
        assert!(connect("ws://127.0.0.1:1/", "arduino").await.is_err());
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_subprotocol() {
        assert!(connect("ws://127.0.0.1:1/", "bad\nprotocol").await.is_err());
    }
}
