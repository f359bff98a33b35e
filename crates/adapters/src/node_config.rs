//! Reader for the node's ini-style config file
//!
//! Only the parts needed to find the WebSocket port are interpreted:
//! `[section]` headers and `key = value` lines. Other stanzas, such as bare
//! value lists, are kept as-is and ignored.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors reading the node config
#[derive(Debug, Error)]
pub enum NodeConfigError {
	#[error("Failed to read node config {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Node config has no port section with a websocket protocol")]
	NoWebsocketPort,

	#[error("Port section [{section}] has no valid port")]
	InvalidPort { section: String },
}

/// One `[section]` of the config file, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSection {
	pub name: String,
	pub entries: Vec<(String, String)>,
}

impl ConfigSection {
	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries
			.iter()
			.find(|(name, _)| name == key)
			.map(|(_, value)| value.as_str())
	}
}

/// Parsed node config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConfigFile {
	sections: Vec<ConfigSection>,
}

impl NodeConfigFile {
	pub fn load(path: &Path) -> Result<Self, NodeConfigError> {
		let raw = fs::read_to_string(path).map_err(|source| NodeConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Ok(Self::parse(&raw))
	}

	pub fn parse(raw: &str) -> Self {
		let mut sections: Vec<ConfigSection> = Vec::new();
		for line in raw.lines() {
			let line = line.trim();
			if line.is_empty() || line.starts_with('#') {
				continue;
			}
			if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
				sections.push(ConfigSection {
					name: name.trim().to_string(),
					entries: Vec::new(),
				});
				continue;
			}
			let (Some(section), Some((key, value))) = (sections.last_mut(), line.split_once('='))
			else {
				continue;
			};
			section
				.entries
				.push((key.trim().to_string(), value.trim().to_string()));
		}
		Self { sections }
	}

	pub fn section(&self, name: &str) -> Option<&ConfigSection> {
		self.sections.iter().find(|section| section.name == name)
	}

	/// URL of the first section serving a websocket protocol
	///
	/// Wildcard listen addresses are mapped to loopback.
	pub fn websocket_url(&self) -> Result<String, NodeConfigError> {
		for section in &self.sections {
			let Some(scheme) = section.get("protocol").and_then(websocket_scheme) else {
				continue;
			};
			let port: u16 = section
				.get("port")
				.and_then(|port| port.parse().ok())
				.ok_or_else(|| NodeConfigError::InvalidPort {
					section: section.name.clone(),
				})?;
			let ip = match section.get("ip").unwrap_or("127.0.0.1") {
				"0.0.0.0" => "127.0.0.1",
				"::" => "::1",
				ip => ip,
			};
			let host = if ip.contains(':') {
				format!("[{}]", ip)
			} else {
				ip.to_string()
			};
			return Ok(format!("{}://{}:{}", scheme, host, port));
		}
		Err(NodeConfigError::NoWebsocketPort)
	}
}

/// `ws` when offered, `wss` otherwise
fn websocket_scheme(protocols: &str) -> Option<&'static str> {
	let offered: Vec<&str> = protocols.split(',').map(str::trim).collect();
	if offered.contains(&"ws") {
		Some("ws")
	} else if offered.contains(&"wss") {
		Some("wss")
	} else {
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const NODE_CONFIG: &str = r#"
[server]
port_rpc_admin_local
port_ws_admin_local

# admin RPC
[port_rpc_admin_local]
port = 5005
ip = 127.0.0.1
protocol = http

[port_ws_admin_local]
port = 6006
ip = 0.0.0.0
admin = 127.0.0.1
protocol = ws

[port_wss_public]
port = 6007
ip = 10.0.0.1
protocol = wss
"#;

	#[test]
	fn test_first_websocket_port_wins() {
		let config = NodeConfigFile::parse(NODE_CONFIG);
		assert_eq!(config.websocket_url().unwrap(), "ws://127.0.0.1:6006");
		assert_eq!(
			config.section("port_rpc_admin_local").and_then(|s| s.get("port")),
			Some("5005")
		);
	}

	#[test]
	fn test_secure_and_ipv6_ports() {
		let config = NodeConfigFile::parse("[port_ws]\nport=51233\nip=::\nprotocol=wss, peer\n");
		assert_eq!(config.websocket_url().unwrap(), "wss://[::1]:51233");
	}

	#[test]
	fn test_missing_websocket_port() {
		let config = NodeConfigFile::parse("[port_rpc]\nport = 5005\nprotocol = http\n");
		assert!(matches!(
			config.websocket_url(),
			Err(NodeConfigError::NoWebsocketPort)
		));

		let config = NodeConfigFile::parse("[port_ws]\nport = many\nprotocol = ws\n");
		assert!(matches!(
			config.websocket_url(),
			Err(NodeConfigError::InvalidPort { .. })
		));
	}

	#[test]
	fn test_load_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("node.cfg");
		fs::write(&path, NODE_CONFIG).unwrap();
		assert_eq!(
			NodeConfigFile::load(&path).unwrap().websocket_url().unwrap(),
			"ws://127.0.0.1:6006"
		);
		assert!(matches!(
			NodeConfigFile::load(&dir.path().join("missing.cfg")),
			Err(NodeConfigError::Io { .. })
		));
	}
}
