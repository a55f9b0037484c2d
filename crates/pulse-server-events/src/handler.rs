// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event handler trait and the context handed to each invocation.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;

use crate::broker::EventBroker;
use crate::error::{HandlerError, Result};
use crate::message::ConnectionId;

/// Reacts to a named event sent by a client.
///
/// Implemented for any `Fn(EventContext, Value) -> impl Future` closure or
/// async fn, so subsystems can register plain functions.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
	async fn handle(&self, ctx: EventContext, payload: Value) -> std::result::Result<(), HandlerError>;
}

#[async_trait]
impl<F, Fut> EventHandler for F
where
	F: Fn(EventContext, Value) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = std::result::Result<(), HandlerError>> + Send + 'static,
{
	async fn handle(&self, ctx: EventContext, payload: Value) -> std::result::Result<(), HandlerError> {
		(self)(ctx, payload).await
	}
}

/// The connection an event came from plus a handle back into the broker.
#[derive(Clone)]
pub struct EventContext {
	connection_id: ConnectionId,
	event: String,
	broker: EventBroker,
}

impl EventContext {
	pub(crate) fn new(connection_id: ConnectionId, event: String, broker: EventBroker) -> Self {
		Self {
			connection_id,
			event,
			broker,
		}
	}

	pub fn connection_id(&self) -> ConnectionId {
		self.connection_id
	}

	pub fn event(&self) -> &str {
		&self.event
	}

	pub fn broker(&self) -> &EventBroker {
		&self.broker
	}

	/// Send an event back to the originating connection.
	pub async fn reply(&self, event: &str, payload: Value) -> bool {
		self.broker.emit_to(self.connection_id, event, payload).await
	}

	pub async fn join(&self, group: &str) -> Result<bool> {
		self.broker.join_group(self.connection_id, group).await
	}

	pub async fn leave(&self, group: &str) -> Result<bool> {
		self.broker.leave_group(self.connection_id, group).await
	}
}
