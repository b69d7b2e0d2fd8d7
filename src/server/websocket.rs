use crate::cli::Args;
use crate::models::websocket::{ ClientMessage, ServerMessage };
use crate::server::auth;
use crate::server::tls;
use crate::server::AppContext;
use crate::voice;

use std::error::Error;
use std::net::SocketAddr;
use std::num::NonZeroU32;

use tokio::net::TcpListener;
use tokio::io::{ AsyncRead, AsyncWrite };
use tokio_rustls::TlsAcceptor;

use tokio_tungstenite::{ accept_hdr_async, WebSocketStream };
use tokio_tungstenite::tungstenite::handshake::server::{ Request, Response, ErrorResponse };
use tokio_tungstenite::tungstenite::protocol::Message;

use lazy_static::lazy_static;
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };

use chrono::Utc;
use futures::{ Sink, SinkExt, StreamExt };
use log::{ info, warn, error, debug };
use uuid::Uuid;

const MAX_MESSAGE_SIZE: usize = 1024 * 1024;
const CONNECTIONS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => panic!("connection rate must be non-zero"),
};

lazy_static! {
    static ref CONNECTION_LIMITER: RateLimiter<NotKeyed, InMemoryState, DefaultClock> =
        RateLimiter::direct(Quota::per_second(CONNECTIONS_PER_SECOND));
}

pub async fn start_ws_server(
    addr: &str,
    context: AppContext,
    api_key: Option<String>,
    args: Args
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    let protocol = if args.tls_enabled() { "wss" } else { "ws" };
    info!("{} server listening on: {}", protocol.to_uppercase(), addr);

    let tls_acceptor = tls::acceptor_from_args(&args)?;
    serve(listener, context, api_key, tls_acceptor).await
}

/// Accept loop over an already bound listener.
pub async fn serve(
    listener: TcpListener,
    context: AppContext,
    api_key: Option<String>,
    tls_acceptor: Option<TlsAcceptor>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let api_key = api_key.filter(|k| !k.trim().is_empty());
    if api_key.is_some() {
        info!("WebSocket server requires signed handshakes.");
    } else {
        warn!("WebSocket server configured WITHOUT authentication. Connections are open.");
    }

    loop {
        let (stream, peer) = listener.accept().await?;

        if CONNECTION_LIMITER.check().is_err() {
            warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
            continue;
        }

        info!("Incoming connection from: {}", peer);
        let context = context.clone();
        let required_api_key = api_key.clone();
        let tls_acceptor = tls_acceptor.clone();

        tokio::spawn(async move {
            let process_result = if let Some(acceptor) = tls_acceptor {
                match acceptor.accept(stream).await {
                    Ok(tls_stream) => {
                        info!("TLS handshake successful for {}", peer);
                        process_connection(peer, tls_stream, context, required_api_key).await
                    }
                    Err(e) => {
                        error!("TLS handshake error for {}: {}", peer, e);
                        Err(Box::new(e) as Box<dyn Error + Send + Sync>)
                    }
                }
            } else {
                process_connection(peer, stream, context, required_api_key).await
            };

            if let Err(e) = process_result {
                error!("Failed to process connection for {}: {}", peer, e);
            }
        });
    }
}

fn unauthorized(reason: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason.to_string()));
    *response.status_mut() = tokio_tungstenite::tungstenite::http::StatusCode::UNAUTHORIZED;
    response
}

async fn process_connection<S>(
    peer: SocketAddr,
    stream: S,
    context: AppContext,
    required_api_key: Option<String>
) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    let auth_callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let Some(secret) = &required_api_key else {
            return Ok(response);
        };

        let query = req.uri().query().unwrap_or("");
        match auth::verify_query(secret, query, Utc::now().timestamp()) {
            Ok(()) => {
                info!("{} authenticated", peer);
                Ok(response)
            }
            Err(e) => {
                warn!("{}: handshake rejected ({})", peer, e);
                Err(unauthorized(&e.to_string()))
            }
        }
    };

    match accept_hdr_async(stream, auth_callback).await {
        Ok(ws) => {
            handle_connection(peer, ws, context).await;
            Ok(())
        }
        Err(e) => {
            error!("Handshake failed for {}: {}", peer, e);
            Err(Box::new(e) as _)
        }
    }
}

async fn send_frame<T>(tx: &mut T, peer: SocketAddr, frame: &ServerMessage) -> bool
    where T: Sink<Message> + Unpin, T::Error: std::fmt::Display
{
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to encode frame for {}: {}", peer, e);
            return false;
        }
    };
    match tx.send(Message::Text(json)).await {
        Ok(()) => true,
        Err(e) => {
            error!("Error sending frame to {}: {}", peer, e);
            false
        }
    }
}

pub async fn handle_connection<S>(peer: SocketAddr, websocket: WebSocketStream<S>, context: AppContext)
    where S: AsyncRead + AsyncWrite + Unpin
{
    info!("New WebSocket connection: {}", peer);

    if let Err(e) = context.assistant.reload_rules_if_changed().await {
        error!("Failed to reload intent rules: {}", e);
    }

    let (mut tx, mut rx) = websocket.split();
    let conversation_id = Uuid::new_v4().to_string();
    info!("Assigned conversation ID {} to {}", conversation_id, peer);

    while let Some(msg) = rx.next().await {
        let message = match msg {
            Ok(message) => message,
            Err(e) => {
                match e {
                    | tokio_tungstenite::tungstenite::Error::ConnectionClosed
                    | tokio_tungstenite::tungstenite::Error::Protocol(_)
                    | tokio_tungstenite::tungstenite::Error::Utf8 => {
                        info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                    }
                    tokio_tungstenite::tungstenite::Error::Io(ref io_err) if
                        io_err.kind() == std::io::ErrorKind::ConnectionReset
                    => {
                        info!("WebSocket connection reset by peer {}", peer);
                    }
                    tokio_tungstenite::tungstenite::Error::Capacity(ref cap_err) => {
                        error!("WebSocket capacity error for {}: {}", peer, cap_err);
                        let frame = ServerMessage::Error {
                            message: "Server capacity error".to_string(),
                        };
                        send_frame(&mut tx, peer, &frame).await;
                    }
                    _ => {
                        error!("Error receiving message from {}: {}", peer, e);
                    }
                }
                break;
            }
        };

        if message.len() > MAX_MESSAGE_SIZE {
            warn!(
                "Message from {} exceeds size limit ({} > {})",
                peer,
                message.len(),
                MAX_MESSAGE_SIZE
            );
            let frame = ServerMessage::Error {
                message: "Message too large".to_string(),
            };
            send_frame(&mut tx, peer, &frame).await;
            break;
        }

        match message {
            Message::Text(text) => {
                let keep_going = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Chat { content }) => {
                        if !send_frame(&mut tx, peer, &ServerMessage::Typing).await {
                            break;
                        }
                        tokio::time::sleep(context.assistant.typing_delay()).await;

                        let frame = match context.assistant.reply(&conversation_id, &content).await {
                            Ok(reply) =>
                                ServerMessage::Response {
                                    id: reply.message.id,
                                    content: reply.message.text,
                                    suggestions: reply.message.suggestions.unwrap_or_default(),
                                    intent: reply.intent,
                                    timestamp: reply.message.timestamp.timestamp(),
                                },
                            Err(e) => {
                                error!("Assistant error for {}: {}", peer, e);
                                ServerMessage::Error {
                                    message: format!("Error processing message: {}", e),
                                }
                            }
                        };
                        send_frame(&mut tx, peer, &frame).await
                    }
                    Ok(ClientMessage::Voice { transcript }) => {
                        let frame = match voice::match_command(&transcript) {
                            Some(hit) => {
                                debug!("Voice command from {}: {:?}", peer, hit.command);
                                ServerMessage::Command {
                                    command: hit.command.as_str().to_string(),
                                    phrase: hit.phrase,
                                    score: hit.score,
                                }
                            }
                            None =>
                                ServerMessage::Error {
                                    message: format!("Unrecognized voice command: '{}'", transcript),
                                },
                        };
                        send_frame(&mut tx, peer, &frame).await
                    }
                    Err(e) => {
                        error!("Failed to parse message from {}: {}", peer, e);
                        let frame = ServerMessage::Error {
                            message: format!("Failed to parse message: {}", e),
                        };
                        send_frame(&mut tx, peer, &frame).await
                    }
                };
                if !keep_going {
                    break;
                }
            }
            Message::Close(_) => {
                info!("Received close frame from {}", peer);
                break;
            }
            Message::Ping(ping_data) => {
                if tx.send(Message::Pong(ping_data)).await.is_err() {
                    error!("Failed to send pong to {}", peer);
                    break;
                }
            }
            Message::Pong(_) => {}
            Message::Binary(_) => {
                warn!("Ignoring binary message from {}", peer);
            }
            Message::Frame(_) => {}
        }
    }
    info!("WebSocket connection closed for {} (Conv ID: {})", peer, conversation_id);
}
