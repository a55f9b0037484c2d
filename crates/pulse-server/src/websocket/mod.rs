// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod handler;

pub use handler::{ws_upgrade_handler, ERROR_EVENT};
