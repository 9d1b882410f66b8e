//! Integration tests for the WebSocket connection worker.
//!
//! These run the real worker against a real local WebSocket server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use huddle_client::{
    ConnectionConfig, ConnectionError, ConnectionEvent, ConnectionHandle, ConnectionState,
    transport,
};
use tokio::{net::TcpListener, sync::mpsc, time::timeout};
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

/// Echo server. Every text frame is also reported on `seen`. Dropping the
/// returned sender stops accepting new connections.
async fn start_echo_server() -> (String, mpsc::UnboundedReceiver<String>, mpsc::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    let (kill_tx, mut kill_rx) = mpsc::channel::<()>(1);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let Ok((stream, _)) = accepted else { break };
                    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                        continue;
                    };
                    let seen = seen_tx.clone();
                    tokio::spawn(async move {
                        while let Some(Ok(message)) = ws.next().await {
                            if let Message::Text(text) = message {
                                let _ = seen.send(text.clone());
                                if ws.send(Message::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                        }
                    });
                },
                _ = kill_rx.recv() => break,
            }
        }
    });

    (url, seen_rx, kill_tx)
}

fn config(url: &str) -> ConnectionConfig {
    ConnectionConfig {
        url: url.to_owned(),
        reconnect_interval: Duration::from_millis(200),
        tick_interval: Duration::from_millis(20),
    }
}

async fn wait_for_state(handle: &mut ConnectionHandle, wanted: ConnectionState) {
    timeout(WAIT, async {
        loop {
            match handle.next_event().await {
                Some(ConnectionEvent::StateChanged(state)) if state == wanted => return,
                Some(_) => {},
                None => panic!("worker exited while waiting for {wanted:?}"),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {wanted:?}"));
}

#[tokio::test]
async fn connects_and_echoes_in_order() {
    let (url, mut seen, _kill) = start_echo_server().await;
    let mut handle = transport::spawn(config(&url));

    handle.start().unwrap();
    wait_for_state(&mut handle, ConnectionState::Connected).await;

    for n in 0..5 {
        handle.send(format!("frame-{n}")).unwrap();
    }

    for n in 0..5 {
        let event = timeout(WAIT, handle.next_event()).await.unwrap();
        assert_eq!(event, Some(ConnectionEvent::Received(format!("frame-{n}"))));
        assert_eq!(seen.recv().await, Some(format!("frame-{n}")));
    }

    handle.shutdown().unwrap();
}

#[tokio::test]
async fn send_while_disconnected_is_rejected() {
    let mut handle = transport::spawn(config("ws://127.0.0.1:9/ws"));

    handle.send("dropped".into()).unwrap();

    let event = timeout(WAIT, handle.next_event()).await.unwrap();
    assert_eq!(
        event,
        Some(ConnectionEvent::SendRejected {
            text: "dropped".into(),
            error: ConnectionError::NotConnected,
        })
    );
    handle.shutdown().unwrap();
}

#[tokio::test]
async fn refused_connection_is_retried_on_timer() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut handle = transport::spawn(config(&format!("ws://{addr}/ws")));
    handle.start().unwrap();

    let mut attempts = 0;
    let mut errors = 0;
    timeout(WAIT, async {
        while attempts < 3 {
            match handle.next_event().await {
                Some(ConnectionEvent::StateChanged(ConnectionState::Connecting)) => attempts += 1,
                Some(ConnectionEvent::TransportError(_)) => errors += 1,
                Some(_) => {},
                None => panic!("worker exited"),
            }
        }
    })
    .await
    .unwrap();

    assert!(errors >= 2);
    handle.shutdown().unwrap();
}

#[tokio::test]
async fn reconnects_after_server_restart() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("ws://{addr}/ws");

    let first = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();
        listener
    });

    let mut handle = transport::spawn(config(&url));
    handle.start().unwrap();
    wait_for_state(&mut handle, ConnectionState::Connected).await;
    wait_for_state(&mut handle, ConnectionState::Disconnected).await;

    // Same port, fresh accept loop picks up the reconnection.
    let listener = first.await.unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while ws.next().await.is_some() {}
    });

    wait_for_state(&mut handle, ConnectionState::Connected).await;
    handle.shutdown().unwrap();
}

#[tokio::test]
async fn stop_does_not_reconnect() {
    let (url, _seen, _kill) = start_echo_server().await;
    let mut handle = transport::spawn(config(&url));

    handle.start().unwrap();
    wait_for_state(&mut handle, ConnectionState::Connected).await;
    handle.stop().unwrap();
    wait_for_state(&mut handle, ConnectionState::Disconnected).await;

    // Several reconnect periods pass with no new attempt.
    let quiet = timeout(Duration::from_millis(800), handle.next_event()).await;
    assert!(quiet.is_err(), "unexpected event after stop: {quiet:?}");
    handle.shutdown().unwrap();
}

#[tokio::test]
async fn shutdown_ends_event_stream() {
    let mut handle = transport::spawn(config("ws://127.0.0.1:9/ws"));

    handle.shutdown().unwrap();

    let end = timeout(WAIT, handle.next_event()).await.unwrap();
    assert_eq!(end, None);
    assert_eq!(handle.start(), Err(ConnectionError::WorkerStopped));
}
