// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connection registry and event router.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           EventBroker                            │
//! │  connections: HashMap<ConnectionId, ConnectionHandle>            │
//! │     └─ groups: HashSet<String>, sender: mpsc::Sender             │
//! │  handlers:    HashMap<event name, Vec<Arc<dyn EventHandler>>>    │
//! │  shutdown:    broadcast::Sender<()>                              │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Outbound delivery never waits on a consumer. Each connection owns a
//! bounded queue and events that do not fit are dropped for that connection
//! only. Handlers are looked up when an event arrives, so a handler
//! registered after a client connected still sees that client's events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{EventsError, Result};
use crate::handler::{EventContext, EventHandler};
use crate::message::{ConnectionId, EventMessage};

/// Default outbound queue capacity per connection.
const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Default maximum number of live connections.
const DEFAULT_MAX_CONNECTIONS: usize = 10_000;

/// Configuration for the event broker.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
	/// Capacity of each connection's outbound queue.
	pub outbound_capacity: usize,
	/// Maximum number of live connections.
	pub max_connections: usize,
}

impl Default for BrokerConfig {
	fn default() -> Self {
		Self {
			outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
			max_connections: DEFAULT_MAX_CONNECTIONS,
		}
	}
}

/// Transport side of a newly registered connection.
///
/// The transport forwards everything from `outbound` to the client and
/// tears the connection down when `shutdown` fires or `outbound` closes.
pub struct ConnectionLink {
	pub id: ConnectionId,
	pub outbound: mpsc::Receiver<EventMessage>,
	pub shutdown: broadcast::Receiver<()>,
}

/// Result of dispatching one inbound event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
	pub invoked: usize,
	pub failed: usize,
}

/// Broker-wide counters for monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerStats {
	pub live_connections: usize,
	pub total_connections: u64,
	pub events_delivered: u64,
	pub events_dropped: u64,
	pub handler_failures: u64,
}

struct ConnectionHandle {
	groups: HashSet<String>,
	sender: mpsc::Sender<EventMessage>,
	connected_at: DateTime<Utc>,
}

struct BrokerInner {
	config: BrokerConfig,
	connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
	handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
	shutdown_tx: broadcast::Sender<()>,
	closed: AtomicBool,
	total_connections: AtomicU64,
	events_delivered: AtomicU64,
	events_dropped: AtomicU64,
	handler_failures: AtomicU64,
}

/// Process-wide connection registry and event router.
///
/// Construct one at startup and pass clones to whatever needs to emit
/// events; all clones share the same state. Call [`EventBroker::shutdown`]
/// at teardown.
#[derive(Clone)]
pub struct EventBroker {
	inner: Arc<BrokerInner>,
}

impl EventBroker {
	/// Create a broker. An `outbound_capacity` of zero is raised to one.
	pub fn new(mut config: BrokerConfig) -> Self {
		config.outbound_capacity = config.outbound_capacity.max(1);
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			inner: Arc::new(BrokerInner {
				config,
				connections: RwLock::new(HashMap::new()),
				handlers: RwLock::new(HashMap::new()),
				shutdown_tx,
				closed: AtomicBool::new(false),
				total_connections: AtomicU64::new(0),
				events_delivered: AtomicU64::new(0),
				events_dropped: AtomicU64::new(0),
				handler_failures: AtomicU64::new(0),
			}),
		}
	}

	pub fn with_defaults() -> Self {
		Self::new(BrokerConfig::default())
	}

	/// Append a handler for `event`. Earlier handlers for the same event are
	/// kept and run first.
	pub async fn register_handler<H: EventHandler>(&self, event: impl Into<String>, handler: H) {
		let event = event.into();
		let mut handlers = self.inner.handlers.write().await;
		let bound = handlers.entry(event.clone()).or_default();
		bound.push(Arc::new(handler));
		debug!(event = %event, handler_count = bound.len(), "Registered event handler");
	}

	pub async fn handler_count(&self, event: &str) -> usize {
		self.inner
			.handlers
			.read()
			.await
			.get(event)
			.map_or(0, Vec::len)
	}

	/// Register a new live connection.
	pub async fn on_connect(&self) -> Result<ConnectionLink> {
		let mut connections = self.inner.connections.write().await;

		if self.is_shut_down() {
			return Err(EventsError::ShuttingDown);
		}
		if connections.len() >= self.inner.config.max_connections {
			warn!(
				max_connections = self.inner.config.max_connections,
				"Rejecting connection, limit reached"
			);
			return Err(EventsError::TooManyConnections(self.inner.config.max_connections));
		}

		let id = ConnectionId::new();
		let (sender, outbound) = mpsc::channel(self.inner.config.outbound_capacity);
		connections.insert(
			id,
			ConnectionHandle {
				groups: HashSet::new(),
				sender,
				connected_at: Utc::now(),
			},
		);
		self.inner.total_connections.fetch_add(1, Ordering::Relaxed);

		info!(
			connection_id = %id,
			live_connections = connections.len(),
			"Client connected"
		);

		Ok(ConnectionLink {
			id,
			outbound,
			shutdown: self.inner.shutdown_tx.subscribe(),
		})
	}

	/// Drop a connection and its group memberships. Unknown ids are ignored.
	pub async fn on_disconnect(&self, connection_id: ConnectionId) {
		let removed = self.inner.connections.write().await.remove(&connection_id);

		if let Some(handle) = removed {
			let connected_for = Utc::now() - handle.connected_at;
			info!(
				connection_id = %connection_id,
				groups = handle.groups.len(),
				connected_secs = connected_for.num_seconds(),
				"Client disconnected"
			);
		}
	}

	pub async fn is_connected(&self, connection_id: ConnectionId) -> bool {
		self.inner.connections.read().await.contains_key(&connection_id)
	}

	pub async fn connection_count(&self) -> usize {
		self.inner.connections.read().await.len()
	}

	/// Run every handler bound to `event`, in registration order.
	///
	/// Each handler runs on its own task; an error or panic is logged and
	/// counted, and the remaining handlers still run.
	#[instrument(skip(self, payload))]
	pub async fn dispatch(&self, connection_id: ConnectionId, event: &str, payload: Value) -> DispatchReport {
		let handlers: Vec<Arc<dyn EventHandler>> = {
			let handlers = self.inner.handlers.read().await;
			handlers.get(event).cloned().unwrap_or_default()
		};

		let mut report = DispatchReport::default();
		if handlers.is_empty() {
			debug!(event, "No handlers registered for event");
			return report;
		}

		for (index, handler) in handlers.into_iter().enumerate() {
			let ctx = EventContext::new(connection_id, event.to_string(), self.clone());
			let payload = payload.clone();
			let outcome = tokio::spawn(async move { handler.handle(ctx, payload).await }).await;

			report.invoked += 1;
			match outcome {
				Ok(Ok(())) => {}
				Ok(Err(e)) => {
					report.failed += 1;
					self.inner.handler_failures.fetch_add(1, Ordering::Relaxed);
					warn!(event, handler_index = index, error = %e, "Event handler failed");
				}
				Err(e) => {
					report.failed += 1;
					self.inner.handler_failures.fetch_add(1, Ordering::Relaxed);
					error!(event, handler_index = index, error = %e, "Event handler panicked");
				}
			}
		}

		report
	}

	/// Queue an event for every live connection. Returns how many
	/// connections accepted it.
	pub async fn broadcast(&self, event: &str, payload: Value) -> usize {
		let message = EventMessage::new(event, payload);
		let connections = self.inner.connections.read().await;

		let delivered = connections
			.iter()
			.filter(|(id, handle)| self.deliver(**id, handle, &message))
			.count();

		debug!(
			event,
			delivered,
			live_connections = connections.len(),
			"Broadcast event"
		);
		delivered
	}

	/// Queue an event for a single connection.
	pub async fn emit_to(&self, connection_id: ConnectionId, event: &str, payload: Value) -> bool {
		let message = EventMessage::new(event, payload);
		let connections = self.inner.connections.read().await;

		match connections.get(&connection_id) {
			Some(handle) => self.deliver(connection_id, handle, &message),
			None => {
				debug!(connection_id = %connection_id, event, "Emit to unknown connection");
				false
			}
		}
	}

	/// Queue an event for every connection that joined `group`.
	pub async fn emit_to_group(&self, group: &str, event: &str, payload: Value) -> usize {
		let message = EventMessage::new(event, payload);
		let connections = self.inner.connections.read().await;

		let delivered = connections
			.iter()
			.filter(|(_, handle)| handle.groups.contains(group))
			.filter(|(id, handle)| self.deliver(**id, handle, &message))
			.count();

		debug!(group, event, delivered, "Emitted event to group");
		delivered
	}

	/// Add a connection to a group. Returns false if it was already a member.
	pub async fn join_group(&self, connection_id: ConnectionId, group: &str) -> Result<bool> {
		let mut connections = self.inner.connections.write().await;
		let handle = connections
			.get_mut(&connection_id)
			.ok_or(EventsError::ConnectionNotFound(connection_id))?;

		let joined = handle.groups.insert(group.to_string());
		if joined {
			debug!(connection_id = %connection_id, group, "Joined group");
		}
		Ok(joined)
	}

	/// Remove a connection from a group. Returns false if it was not a member.
	pub async fn leave_group(&self, connection_id: ConnectionId, group: &str) -> Result<bool> {
		let mut connections = self.inner.connections.write().await;
		let handle = connections
			.get_mut(&connection_id)
			.ok_or(EventsError::ConnectionNotFound(connection_id))?;

		let left = handle.groups.remove(group);
		if left {
			debug!(connection_id = %connection_id, group, "Left group");
		}
		Ok(left)
	}

	pub async fn group_members(&self, group: &str) -> Vec<ConnectionId> {
		self.inner
			.connections
			.read()
			.await
			.iter()
			.filter(|(_, handle)| handle.groups.contains(group))
			.map(|(id, _)| *id)
			.collect()
	}

	pub async fn groups_of(&self, connection_id: ConnectionId) -> Option<Vec<String>> {
		self.inner
			.connections
			.read()
			.await
			.get(&connection_id)
			.map(|handle| {
				let mut groups: Vec<String> = handle.groups.iter().cloned().collect();
				groups.sort();
				groups
			})
	}

	/// Close every live connection and release all registry state.
	///
	/// Safe to call more than once and while events are being dispatched;
	/// in-flight deliveries are dropped.
	pub async fn shutdown(&self) {
		if self.inner.closed.swap(true, Ordering::SeqCst) {
			debug!("Event broker already shut down");
			return;
		}

		let _ = self.inner.shutdown_tx.send(());

		// Dropping each handle's sender closes its outbound queue.
		let closed = {
			let mut connections = self.inner.connections.write().await;
			connections.drain().count()
		};
		self.inner.handlers.write().await.clear();

		info!(closed_connections = closed, "Event broker shut down");
	}

	pub fn is_shut_down(&self) -> bool {
		self.inner.closed.load(Ordering::SeqCst)
	}

	pub async fn stats(&self) -> BrokerStats {
		BrokerStats {
			live_connections: self.connection_count().await,
			total_connections: self.inner.total_connections.load(Ordering::Relaxed),
			events_delivered: self.inner.events_delivered.load(Ordering::Relaxed),
			events_dropped: self.inner.events_dropped.load(Ordering::Relaxed),
			handler_failures: self.inner.handler_failures.load(Ordering::Relaxed),
		}
	}

	fn deliver(&self, connection_id: ConnectionId, handle: &ConnectionHandle, message: &EventMessage) -> bool {
		match handle.sender.try_send(message.clone()) {
			Ok(()) => {
				self.inner.events_delivered.fetch_add(1, Ordering::Relaxed);
				true
			}
			Err(TrySendError::Full(_)) => {
				self.inner.events_dropped.fetch_add(1, Ordering::Relaxed);
				debug!(
					connection_id = %connection_id,
					event = %message.event,
					"Outbound queue full, dropping event"
				);
				false
			}
			Err(TrySendError::Closed(_)) => {
				self.inner.events_dropped.fetch_add(1, Ordering::Relaxed);
				debug!(
					connection_id = %connection_id,
					event = %message.event,
					"Outbound queue closed, dropping event"
				);
				false
			}
		}
	}
}

impl Default for EventBroker {
	fn default() -> Self {
		Self::with_defaults()
	}
}
