use futures_util::{SinkExt, StreamExt};
use warp::ws::{Message, WebSocket, Ws};
use warp::{Filter, Rejection, Reply};

use crate::realtime::{ClientMessage, RealtimeCoordinator};

/// `GET /ws`: one bidirectional event channel per client.
pub fn routes(coordinator: RealtimeCoordinator) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("ws").and(warp::ws()).map(move |ws: Ws| {
        let coordinator = coordinator.clone();
        ws.on_upgrade(move |socket| client_session(socket, coordinator))
    })
}

async fn client_session(socket: WebSocket, coordinator: RealtimeCoordinator) {
    let (client, mut events) = coordinator.connect();
    let (mut outbound, mut inbound) = socket.split();

    loop {
        tokio::select! {
            frame = inbound.next() => match frame {
                Some(Ok(message)) => {
                    if message.is_close() {
                        break;
                    }
                    // Binary and ping frames carry nothing for us
                    let Ok(text) = message.to_str() else {
                        continue;
                    };
                    if let Err(err) = coordinator.on_message(client, ClientMessage::from_text(text)) {
                        tracing::error!(client = %client, error = %err, "failed to route client message");
                    }
                }
                Some(Err(err)) => {
                    tracing::debug!(client = %client, error = %err, "websocket error");
                    break;
                }
                None => break,
            },
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                let text = match serde_json::to_string(&*event) {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::warn!(client = %client, event = event.name(), error = %err, "failed to encode event");
                        continue;
                    }
                };
                if outbound.send(Message::text(text)).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Err(err) = coordinator.on_disconnect(client) {
        tracing::error!(client = %client, error = %err, "failed to release client");
    }
}
