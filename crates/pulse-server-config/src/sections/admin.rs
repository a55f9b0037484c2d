// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admin API credentials.

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Admin routes reject every request while `token` is unset.
#[derive(Clone, Default)]
pub struct AdminConfig {
	pub token: Option<SecretString>,
}

impl AdminConfig {
	pub fn is_configured(&self) -> bool {
		self.token.is_some()
	}
}

impl fmt::Debug for AdminConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AdminConfig")
			.field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
			.finish()
	}
}

#[derive(Clone, Default, Deserialize)]
pub struct AdminConfigLayer {
	#[serde(default, deserialize_with = "deserialize_secret")]
	pub token: Option<SecretString>,
}

impl fmt::Debug for AdminConfigLayer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AdminConfigLayer")
			.field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
			.finish()
	}
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<String>::deserialize(deserializer)?;
	Ok(value.filter(|v| !v.is_empty()).map(SecretString::from))
}

impl AdminConfigLayer {
	pub fn merge(&mut self, other: AdminConfigLayer) {
		if other.token.is_some() {
			self.token = other.token;
		}
	}

	pub fn finalize(self) -> AdminConfig {
		AdminConfig { token: self.token }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use secrecy::ExposeSecret;

	#[test]
	fn test_token_is_redacted_in_debug() {
		let config = AdminConfigLayer {
			token: Some(SecretString::from("super-secret")),
		}
		.finalize();
		let debug = format!("{config:?}");
		assert!(!debug.contains("super-secret"));
		assert!(debug.contains("REDACTED"));
	}

	#[test]
	fn test_deserialize_token() {
		let layer: AdminConfigLayer = toml::from_str(r#"token = "abc""#).unwrap();
		let token = layer.finalize().token.unwrap();
		assert_eq!(token.expose_secret(), "abc");
	}

	#[test]
	fn test_empty_token_is_unset() {
		let layer: AdminConfigLayer = toml::from_str(r#"token = """#).unwrap();
		assert!(!layer.finalize().is_configured());
	}
}
