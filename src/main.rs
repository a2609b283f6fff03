//! CLI for modrelay
//!
//! Subcommands:
//! - `server`: run the relay
//! - `client`: connect as a user, request a topic, and chat from stdin

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use modrelay::broker::Broker;
use modrelay::config::load_config;
use modrelay::transport::start_websocket_server;
use modrelay::utils::logging;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{error, info};
use url::Url;

#[derive(Parser)]
#[command(name = "modrelay")]
enum Command {
    /// Start the relay
    Server,
    /// Connect as a user, request a topic, and send stdin lines to it
    Client {
        /// Relay URL
        #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
        url: String,
        /// Identity to connect as
        #[arg(long)]
        user: String,
        /// Topic to request and chat in
        #[arg(long, default_value = "General")]
        topic: String,
        /// Claim the moderator role (ignored when the server has a user list)
        #[arg(long)]
        moderator: bool,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cmd = Command::parse();

    match cmd {
        Command::Server => {
            if let Err(e) = run_server().await {
                logging::init("info");
                error!("Server failed: {}", e);
            }
        }
        Command::Client {
            url,
            user,
            topic,
            moderator,
        } => {
            logging::init("info");
            if let Err(e) = run_client(&url, &user, &topic, moderator).await {
                error!("Client failed: {}", e);
            }
        }
    }
}

async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init(&config.log.level);

    let addr = config.addr();
    let broker = Broker::shared();

    tokio::select! {
        res = start_websocket_server(&addr, broker, config) => {
            res?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_client(
    url: &str,
    user: &str,
    topic: &str,
    moderator: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut url = Url::parse(url)?;
    url.query_pairs_mut().append_pair("user_id", user);
    if moderator {
        url.query_pairs_mut().append_pair("moderator", "true");
    }

    let (ws_stream, _response) = connect_async(url.as_str()).await?;
    let (mut sink, mut stream) = ws_stream.split();

    let request = json!({ "type": "subscribe_request", "topic": topic });
    sink.send(WsMessage::Text(request.to_string().into())).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(WsMessage::Text(frame))) => println!("{frame}"),
                Some(Ok(WsMessage::Close(frame))) => {
                    println!("Closed: {frame:?}");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            line = lines.next_line() => match line? {
                Some(line) if !line.trim().is_empty() => {
                    let chat = json!({ "type": "chat_message", "topic": topic, "message": line });
                    sink.send(WsMessage::Text(chat.to_string().into())).await?;
                }
                Some(_) => {}
                None => break,
            },
        }
    }

    Ok(())
}
