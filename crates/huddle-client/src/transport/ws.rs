//! WebSocket reader/writer halves over `tokio-tungstenite`.

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use thiserror::Error;
use tokio_tungstenite::tungstenite::{self, client::IntoClientRequest};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint is not a usable WebSocket URL.
    #[error("invalid endpoint {url}: {reason}")]
    InvalidUrl {
        /// Rejected endpoint
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// Handshake or TCP connect failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Read or write on an open connection failed.
    #[error("stream error: {0}")]
    Stream(String),
}

/// Received WebSocket message.
#[derive(Debug, PartialEq, Eq)]
pub enum WsMessage {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame. The protocol never uses these.
    Binary(Vec<u8>),
    /// Ping with payload.
    Ping(Vec<u8>),
    /// Close with status code and reason.
    Close {
        /// Close code (1005 when the peer sent none)
        code: u16,
        /// Close reason
        reason: String,
    },
}

/// Write half of a WebSocket connection.
#[derive(Debug)]
pub struct WsWriter {
    sink: SplitSink<WsStream, tungstenite::Message>,
}

impl WsWriter {
    /// Send one text frame.
    pub async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sink
            .send(tungstenite::Message::Text(text))
            .await
            .map_err(|e| TransportError::Stream(format!("write failed: {e}")))
    }

    /// Answer a ping.
    pub async fn send_pong(&mut self, data: Vec<u8>) -> Result<(), TransportError> {
        self.sink
            .send(tungstenite::Message::Pong(data))
            .await
            .map_err(|e| TransportError::Stream(format!("pong failed: {e}")))
    }

    /// Send a close frame and flush.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.sink.close().await.map_err(|e| TransportError::Stream(format!("close failed: {e}")))
    }
}

/// Read half of a WebSocket connection.
#[derive(Debug)]
pub struct WsReader {
    stream: SplitStream<WsStream>,
}

impl WsReader {
    /// Next message, or `None` when the stream ends. Pongs and raw frames
    /// are skipped.
    pub async fn recv(&mut self) -> Option<Result<WsMessage, TransportError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(TransportError::Stream(format!("read failed: {e}")))),
            };
            return Some(Ok(match message {
                tungstenite::Message::Text(text) => WsMessage::Text(text),
                tungstenite::Message::Binary(data) => WsMessage::Binary(data),
                tungstenite::Message::Ping(data) => WsMessage::Ping(data),
                tungstenite::Message::Close(frame) => {
                    let (code, reason) = frame
                        .map_or((1005, String::new()), |f| (f.code.into(), f.reason.into_owned()));
                    WsMessage::Close { code, reason }
                },
                tungstenite::Message::Pong(_) | tungstenite::Message::Frame(_) => continue,
            }));
        }
    }
}

/// Connect to `url` and split the stream into writer and reader halves.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader), TransportError> {
    let request = url.into_client_request().map_err(|e| TransportError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;

    let (stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| TransportError::Connection(e.to_string()))?;

    let (sink, stream) = stream.split();
    Ok((WsWriter { sink }, WsReader { stream }))
}
