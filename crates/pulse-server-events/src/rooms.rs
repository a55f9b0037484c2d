// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Built-in handlers that let clients join and leave rooms.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::broker::EventBroker;
use crate::error::HandlerError;
use crate::handler::EventContext;

pub const JOIN_ROOM_EVENT: &str = "room:join";
pub const LEAVE_ROOM_EVENT: &str = "room:leave";

const ROOM_JOINED_EVENT: &str = "room:joined";
const ROOM_LEFT_EVENT: &str = "room:left";

#[derive(Debug, Deserialize)]
struct RoomPayload {
	room: String,
}

fn parse_room(payload: Value) -> Result<String, HandlerError> {
	let RoomPayload { room } = serde_json::from_value(payload)?;
	let room = room.trim().to_string();
	if room.is_empty() {
		return Err(HandlerError::InvalidPayload("room must not be empty".to_string()));
	}
	Ok(room)
}

async fn join_room(ctx: EventContext, payload: Value) -> Result<(), HandlerError> {
	let room = parse_room(payload)?;
	ctx.join(&room).await?;
	debug!(connection_id = %ctx.connection_id(), room = %room, "Client joined room");
	ctx.reply(ROOM_JOINED_EVENT, json!({ "room": room })).await;
	Ok(())
}

async fn leave_room(ctx: EventContext, payload: Value) -> Result<(), HandlerError> {
	let room = parse_room(payload)?;
	ctx.leave(&room).await?;
	debug!(connection_id = %ctx.connection_id(), room = %room, "Client left room");
	ctx.reply(ROOM_LEFT_EVENT, json!({ "room": room })).await;
	Ok(())
}

/// Bind `room:join` and `room:leave` on the broker.
pub async fn register_room_handlers(broker: &EventBroker) {
	broker.register_handler(JOIN_ROOM_EVENT, join_room).await;
	broker.register_handler(LEAVE_ROOM_EVENT, leave_room).await;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::broker::DispatchReport;

	#[tokio::test]
	async fn join_then_leave_updates_membership_and_replies() {
		let broker = EventBroker::with_defaults();
		register_room_handlers(&broker).await;
		let mut link = broker.on_connect().await.unwrap();

		let report = broker
			.dispatch(link.id, JOIN_ROOM_EVENT, json!({"room": "lesson-42"}))
			.await;
		assert_eq!(report, DispatchReport { invoked: 1, failed: 0 });
		assert_eq!(broker.group_members("lesson-42").await, vec![link.id]);

		let reply = link.outbound.recv().await.unwrap();
		assert_eq!(reply.event, ROOM_JOINED_EVENT);
		assert_eq!(reply.payload, json!({"room": "lesson-42"}));

		broker
			.dispatch(link.id, LEAVE_ROOM_EVENT, json!({"room": "lesson-42"}))
			.await;
		assert!(broker.group_members("lesson-42").await.is_empty());
		assert_eq!(link.outbound.recv().await.unwrap().event, ROOM_LEFT_EVENT);
	}

	#[tokio::test]
	async fn malformed_room_payload_counts_as_failure() {
		let broker = EventBroker::with_defaults();
		register_room_handlers(&broker).await;
		let link = broker.on_connect().await.unwrap();

		let missing = broker.dispatch(link.id, JOIN_ROOM_EVENT, json!({})).await;
		assert_eq!(missing.failed, 1);

		let blank = broker
			.dispatch(link.id, JOIN_ROOM_EVENT, json!({"room": "  "}))
			.await;
		assert_eq!(blank.failed, 1);
		assert_eq!(broker.groups_of(link.id).await, Some(Vec::new()));
	}

	#[test]
	fn room_names_are_trimmed() {
		assert_eq!(parse_room(json!({"room": " a "})).unwrap(), "a");
	}
}
