// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! WebSocket transport for the event broker.
//!
//! Each socket is registered with the broker on upgrade. A writer task drains
//! the connection's outbound queue into the socket while the reader loop
//! dispatches inbound `{event, payload}` frames to the broker's handlers.

use std::time::Duration;

use axum::{
	body::Bytes,
	extract::{
		ws::{close_code, CloseFrame, Message, WebSocket},
		State, WebSocketUpgrade,
	},
	response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use pulse_server_events::{ConnectionId, EventBroker, EventMessage};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::AppState;

/// Capacity for control frames (pings, pongs) queued alongside events.
const CONTROL_QUEUE_SIZE: usize = 16;

/// Event sent back to a client whose frame could not be parsed.
pub const ERROR_EVENT: &str = "error";

#[utoipa::path(
	get,
	path = "/ws",
	tag = "realtime",
	responses(
		(status = 101, description = "WebSocket connection established"),
		(status = 400, description = "Bad request - invalid upgrade request"),
	)
)]
pub async fn ws_upgrade_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
	debug!("WebSocket upgrade request received");
	ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
	let link = match state.broker.on_connect().await {
		Ok(link) => link,
		Err(e) => {
			warn!(error = %e, "Refusing WebSocket connection");
			let close_frame = CloseFrame {
				code: close_code::AGAIN,
				reason: e.to_string().into(),
			};
			let _ = socket.send(Message::Close(Some(close_frame))).await;
			return;
		}
	};

	let connection_id = link.id;
	let mut outbound = link.outbound;
	let mut shutdown = link.shutdown;
	let (mut sender, mut receiver) = socket.split();
	let (control_tx, mut control_rx) = mpsc::channel::<Message>(CONTROL_QUEUE_SIZE);

	let mut send_task = tokio::spawn(async move {
		loop {
			tokio::select! {
				event = outbound.recv() => {
					let Some(event) = event else {
						let _ = sender.send(Message::Close(None)).await;
						break;
					};
					match event.to_json() {
						Ok(json) => {
							if let Err(e) = sender.send(Message::Text(json.into())).await {
								debug!(error = %e, "Failed to send WebSocket message");
								break;
							}
						}
						Err(e) => warn!(event = %event.event, error = %e, "Failed to encode event"),
					}
				}
				control = control_rx.recv() => {
					let Some(msg) = control else { break };
					if let Err(e) = sender.send(msg).await {
						debug!(error = %e, "Failed to send WebSocket control frame");
						break;
					}
				}
			}
		}
	});

	let broker = state.broker.clone();
	let ping_secs = state.realtime.ping_interval_secs;
	let mut recv_task = tokio::spawn(async move {
		let period = Duration::from_secs(ping_secs.max(1));
		let mut ping_interval = interval_at(Instant::now() + period, period);
		ping_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

		loop {
			tokio::select! {
				_ = shutdown.recv() => {
					info!(connection_id = %connection_id, "Closing WebSocket for shutdown");
					break;
				}
				_ = ping_interval.tick(), if ping_secs > 0 => {
					let _ = control_tx.send(Message::Ping(Bytes::new())).await;
				}
				msg = receiver.next() => {
					match msg {
						Some(Ok(Message::Text(text))) => {
							let text_str: &str = &text;
							handle_frame(&broker, connection_id, text_str).await;
						}
						Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
							Ok(text) => handle_frame(&broker, connection_id, text).await,
							Err(_) => debug!(connection_id = %connection_id, "Ignoring non-UTF-8 binary frame"),
						},
						Some(Ok(Message::Ping(data))) => {
							let _ = control_tx.send(Message::Pong(data)).await;
						}
						Some(Ok(Message::Pong(_))) => {}
						Some(Ok(Message::Close(_))) | None => {
							debug!(connection_id = %connection_id, "WebSocket closed by client");
							break;
						}
						Some(Err(e)) => {
							debug!(connection_id = %connection_id, error = %e, "WebSocket error");
							break;
						}
					}
				}
			}
		}
	});

	tokio::select! {
		_ = &mut send_task => recv_task.abort(),
		_ = &mut recv_task => send_task.abort(),
	}

	state.broker.on_disconnect(connection_id).await;
}

async fn handle_frame(broker: &EventBroker, connection_id: ConnectionId, text: &str) {
	match EventMessage::from_json(text) {
		Ok(message) => {
			broker
				.dispatch(connection_id, &message.event, message.payload)
				.await;
		}
		Err(e) => {
			debug!(connection_id = %connection_id, error = %e, "Malformed event frame");
			broker
				.emit_to(
					connection_id,
					ERROR_EVENT,
					json!({ "message": format!("malformed event frame: {e}") }),
				)
				.await;
		}
	}
}
