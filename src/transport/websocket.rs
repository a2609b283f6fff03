//! WebSocket transport
//!
//! One task pair per connection:
//! - the read loop decodes text frames and hands them to the broker
//! - the write loop drains the connection's outbound queue into the socket
//!
//! The read loop also races a heartbeat that pings the peer and gives up on
//! it after `broker.heartbeat_timeout_secs` of silence.
//!
//! Whichever side fails first releases the session; an `AtomicBool` makes
//! sure that happens once. The broker lock is only ever taken between
//! awaits, never across one.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tracing::{debug, info, warn};
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::{SharedBroker, lock_broker};
use crate::client::{Connection, DisconnectReason};
use crate::config::Settings;
use crate::transport::handshake;
use crate::transport::heartbeat::{self, HeartbeatResult, Liveness};
use crate::utils::BrokerError;

pub async fn start_websocket_server(
    addr: &str,
    broker: SharedBroker,
    settings: Settings,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("WebSocket server listening on ws://{addr}");
    serve(listener, broker, settings).await;
    Ok(())
}

/// Accept connections on an already-bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, broker: SharedBroker, settings: Settings) {
    let settings = Arc::new(settings);
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                continue;
            }
        };
        tokio::spawn(handle_connection(
            stream,
            peer,
            broker.clone(),
            settings.clone(),
        ));
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    broker: SharedBroker,
    settings: Arc<Settings>,
) {
    let mut query = None;
    let capture_query = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        query = req.uri().query().map(str::to_owned);
        Ok(resp)
    };
    let ws_stream = match accept_hdr_async(stream, capture_query).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "WebSocket handshake error");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let identity = match handshake::authorize(query.as_deref(), &settings.users) {
        Ok(identity) => identity,
        Err(reason) => {
            warn!(%peer, %reason, "rejecting connection");
            let _ = ws_sender.send(reason.close_message()).await;
            return;
        }
    };
    let user = identity.user;

    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let pinger = tx.clone();
    let connection = Connection::new(tx);
    let session_id = connection.id.clone();

    // Reconnects replace an existing session, so they never count against the cap.
    let admitted = {
        let mut broker = lock_broker(&broker);
        let sessions = broker.sessions();
        let full = !sessions.contains(&user) && sessions.len() >= settings.broker.max_connections;
        if !full {
            broker.connect(&user, identity.moderator, connection);
        }
        !full
    };
    if !admitted {
        warn!(%peer, user = %user, "connection limit reached");
        let _ = ws_sender
            .send(DisconnectReason::CapacityReached.close_message())
            .await;
        return;
    }
    debug!(%peer, user = %user, session = %session_id, "connection accepted");

    let released = Arc::new(AtomicBool::new(false));
    let release = {
        let broker = broker.clone();
        let user = user.clone();
        let session_id = session_id.clone();

        move |reason: DisconnectReason| {
            if !released.swap(true, Ordering::SeqCst) {
                lock_broker(&broker).disconnect(&user, &session_id, reason);
            }
        }
    };

    {
        let release = release.clone();
        let user = user.clone();

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let closing = msg.is_close();
                if let Err(e) = ws_sender.send(msg).await {
                    debug!(user = %user, error = %e, "failed to write frame");
                    release(DisconnectReason::WriteFailed);
                    return;
                }
                if closing {
                    break;
                }
            }
            let _ = ws_sender.close().await;
            debug!(user = %user, "send loop closed");
        });
    }

    let liveness = Liveness::new();
    let heartbeat = heartbeat::run_heartbeat(
        liveness.clone(),
        pinger.clone(),
        Duration::from_secs(settings.broker.heartbeat_interval_secs),
        Duration::from_secs(settings.broker.heartbeat_timeout_secs),
    );
    tokio::pin!(heartbeat);

    let reason = loop {
        tokio::select! {
            frame = ws_receiver.next() => {
                if let Some(Ok(_)) = &frame {
                    liveness.mark_alive();
                }
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        lock_broker(&broker).handle_message(&user, &session_id, text.as_str());
                    }
                    Some(Ok(WsMessage::Binary(_))) => {
                        let err =
                            BrokerError::MalformedFrame("binary frames are not supported".to_string());
                        lock_broker(&broker).reject(&user, &session_id, &err);
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break DisconnectReason::ClientClosed,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let err = BrokerError::ConnectionLost(e.to_string());
                        debug!(user = %user, %err, "read loop ended");
                        break DisconnectReason::TransportError;
                    }
                }
            }
            result = &mut heartbeat => match result {
                HeartbeatResult::TimedOut => {
                    warn!(user = %user, session = %session_id, "peer stopped answering pings");
                    let _ = pinger.send(DisconnectReason::Unresponsive.close_message());
                    break DisconnectReason::Unresponsive;
                }
                HeartbeatResult::WriterClosed => break DisconnectReason::WriteFailed,
            },
        }
    };

    release(reason);
}
