// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Real-time event broker for Pulse server.
//!
//! The broker tracks live client connections, lets any subsystem attach
//! handlers to named events, and fans events out to one connection, to a
//! group ("room"), or to everyone. It is transport-agnostic: the WebSocket
//! layer turns each [`ConnectionLink`] into socket reads and writes.
//!
//! ```text
//! client frame ──> dispatch(event) ──> handler 1, handler 2, ... (in order)
//!
//! emit_to / emit_to_group / broadcast ──> per-connection bounded queue ──> writer task
//! ```

pub mod broker;
pub mod error;
pub mod handler;
pub mod message;
pub mod rooms;

pub use broker::{BrokerConfig, BrokerStats, ConnectionLink, DispatchReport, EventBroker};
pub use error::{EventsError, HandlerError, Result};
pub use handler::{EventContext, EventHandler};
pub use message::{ConnectionId, EventMessage};
pub use rooms::{register_room_handlers, JOIN_ROOM_EVENT, LEAVE_ROOM_EVENT};
