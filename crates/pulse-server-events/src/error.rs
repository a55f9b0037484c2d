// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the event broker.

use thiserror::Error;

use crate::message::ConnectionId;

/// Result type for broker operations.
pub type Result<T> = std::result::Result<T, EventsError>;

/// Errors returned by broker operations.
#[derive(Debug, Error)]
pub enum EventsError {
	#[error("connection not found: {0}")]
	ConnectionNotFound(ConnectionId),

	#[error("event broker is shutting down")]
	ShuttingDown,

	#[error("connection limit reached ({0})")]
	TooManyConnections(usize),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Error returned by an event handler. Logged by the broker and never
/// propagated to other handlers or connections.
#[derive(Debug, Error)]
pub enum HandlerError {
	#[error("invalid payload: {0}")]
	InvalidPayload(String),

	#[error(transparent)]
	Events(#[from] EventsError),

	#[error("{0}")]
	Failed(String),
}

impl HandlerError {
	pub fn failed(message: impl Into<String>) -> Self {
		Self::Failed(message.into())
	}
}

impl From<serde_json::Error> for HandlerError {
	fn from(err: serde_json::Error) -> Self {
		Self::InvalidPayload(err.to_string())
	}
}
