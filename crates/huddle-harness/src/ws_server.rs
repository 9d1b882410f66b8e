//! WebSocket front for a [`SimHub`].
//!
//! Serves the hub on a local TCP port so the real WebSocket connection
//! worker can be tested end to end. Each accepted socket becomes one hub
//! client.

use std::{io, net::SocketAddr};

use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_tungstenite::tungstenite::Message;

use crate::SimHub;

/// Local WebSocket server backed by a [`SimHub`].
pub struct WsTestServer {
    hub: SimHub,
    addr: SocketAddr,
    accept: Option<JoinHandle<()>>,
}

impl WsTestServer {
    /// Serve `hub` on an ephemeral loopback port.
    ///
    /// # Errors
    ///
    /// Returns the bind error if no port is available.
    pub async fn start(hub: SimHub) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        hub.set_online(true);
        let accept = tokio::spawn(accept_loop(listener, hub.clone()));
        Ok(Self { hub, addr, accept: Some(accept) })
    }

    /// Endpoint for [`huddle_client::ConnectionConfig`].
    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// The hub behind this server.
    pub fn hub(&self) -> &SimHub {
        &self.hub
    }

    /// Stop accepting and drop every open connection.
    pub fn stop(&mut self) {
        if let Some(accept) = self.accept.take() {
            accept.abort();
        }
        self.hub.set_online(false);
    }

    /// Accept connections again on the same port.
    ///
    /// # Errors
    ///
    /// Returns the bind error if the port was taken in the meantime.
    pub async fn restart(&mut self) -> io::Result<()> {
        if let Some(accept) = self.accept.take() {
            accept.abort();
            // the listener is released once the aborted task is dropped
            if let Err(error) = accept.await
                && !error.is_cancelled()
            {
                tracing::warn!(%error, "accept loop failed");
            }
        }
        self.stop();
        let listener = TcpListener::bind(self.addr).await?;
        self.hub.set_online(true);
        self.accept = Some(tokio::spawn(accept_loop(listener, self.hub.clone())));
        Ok(())
    }
}

impl Drop for WsTestServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn accept_loop(listener: TcpListener, hub: SimHub) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                tracing::warn!(%error, "accept failed");
                continue;
            },
        };
        tokio::spawn(serve(stream, peer, hub.clone()));
    }
}

async fn serve(stream: tokio::net::TcpStream, peer: SocketAddr, hub: SimHub) {
    let socket = match tokio_tungstenite::accept_async(stream).await {
        Ok(socket) => socket,
        Err(error) => {
            tracing::debug!(%peer, %error, "handshake failed");
            return;
        },
    };
    let Ok((id, mut frames)) = hub.connect() else {
        tracing::debug!(%peer, "hub offline, refusing");
        return;
    };
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            frame = frames.recv() => {
                let Some(text) = frame else {
                    // dropped by the hub
                    if let Err(error) = sink.close().await {
                        tracing::debug!(%peer, %error, "close failed");
                    }
                    break;
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            },
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if hub.submit(id, &text).is_err() {
                        break;
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                },
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {},
            },
        }
    }

    hub.disconnect(id);
    tracing::debug!(%peer, client = id, "ws client gone");
}
