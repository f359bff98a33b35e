//! Resolution of a running node process into its config file
//!
//! The node is located through procfs: the process must exist, expose its
//! executable, and have been started with `--conf <path>` pointing at an
//! existing file.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::node_config::{NodeConfigError, NodeConfigFile};

const PROC_ROOT: &str = "/proc";
const CONF_FLAG: &str = "--conf";

/// Errors resolving the target process
#[derive(Debug, Error)]
pub enum TargetError {
	#[error("No process with pid {pid}")]
	NoProcess { pid: u32 },

	#[error("Process {pid} has no executable")]
	NoExecutable { pid: u32 },

	#[error("Could not read command line of process {pid}: {source}")]
	NoCmdline {
		pid: u32,
		#[source]
		source: std::io::Error,
	},

	#[error("Process {pid} was not started with --conf <path>")]
	ConfigNotInCmdline { pid: u32 },

	#[error("Config file {path} of process {pid} does not exist")]
	ConfigMissing { pid: u32, path: PathBuf },

	#[error(transparent)]
	NodeConfig(#[from] NodeConfigError),
}

/// A running node and the config file it was started with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
	pub pid: u32,
	pub executable: PathBuf,
	pub config_file: PathBuf,
}

impl ServerTarget {
	/// Resolve a process through `/proc`
	pub fn from_pid(pid: u32) -> Result<Self, TargetError> {
		Self::from_proc_root(Path::new(PROC_ROOT), pid)
	}

	/// Resolve a process through a procfs-like directory tree
	pub fn from_proc_root(root: &Path, pid: u32) -> Result<Self, TargetError> {
		let process_dir = root.join(pid.to_string());
		if !process_dir.is_dir() {
			return Err(TargetError::NoProcess { pid });
		}

		let exe = process_dir.join("exe");
		if !exe.exists() {
			return Err(TargetError::NoExecutable { pid });
		}
		let executable = fs::read_link(&exe).unwrap_or(exe);

		let cmdline = fs::read(process_dir.join("cmdline"))
			.map_err(|source| TargetError::NoCmdline { pid, source })?;
		let arguments = split_cmdline(&cmdline);
		let conf = conf_argument(&arguments).ok_or(TargetError::ConfigNotInCmdline { pid })?;

		let mut config_file = PathBuf::from(conf);
		if config_file.is_relative() {
			let cwd = process_dir.join("cwd");
			let cwd = fs::read_link(&cwd).unwrap_or(cwd);
			config_file = cwd.join(config_file);
		}
		if !config_file.is_file() {
			return Err(TargetError::ConfigMissing {
				pid,
				path: config_file,
			});
		}

		debug!(
			"Resolved process {} ({}) with config {}",
			pid,
			executable.display(),
			config_file.display()
		);
		Ok(Self {
			pid,
			executable,
			config_file,
		})
	}

	/// Read the node's config and return its WebSocket endpoint
	pub fn websocket_url(&self) -> Result<String, TargetError> {
		Ok(NodeConfigFile::load(&self.config_file)?.websocket_url()?)
	}
}

/// NUL-separated argv as stored in `/proc/<pid>/cmdline`
fn split_cmdline(raw: &[u8]) -> Vec<String> {
	raw.split(|byte| *byte == 0)
		.filter(|argument| !argument.is_empty())
		.map(|argument| String::from_utf8_lossy(argument).into_owned())
		.collect()
}

/// Value of `--conf <path>` or `--conf=<path>`
fn conf_argument(arguments: &[String]) -> Option<&str> {
	let mut iter = arguments.iter();
	while let Some(argument) = iter.next() {
		if argument == CONF_FLAG {
			return iter.next().map(String::as_str);
		}
		if let Some(value) = argument
			.strip_prefix(CONF_FLAG)
			.and_then(|rest| rest.strip_prefix('='))
		{
			return Some(value);
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	struct FakeProc {
		root: TempDir,
	}

	impl FakeProc {
		fn new() -> Self {
			Self {
				root: TempDir::new().unwrap(),
			}
		}

		fn process(&self, pid: u32) -> PathBuf {
			let dir = self.root.path().join(pid.to_string());
			fs::create_dir_all(&dir).unwrap();
			dir
		}

		fn with_exe(&self, pid: u32) -> PathBuf {
			let dir = self.process(pid);
			fs::write(dir.join("exe"), b"").unwrap();
			dir
		}

		fn with_cmdline(&self, pid: u32, args: &[&str]) -> PathBuf {
			let dir = self.with_exe(pid);
			let mut raw = Vec::new();
			for arg in args {
				raw.extend_from_slice(arg.as_bytes());
				raw.push(0);
			}
			fs::write(dir.join("cmdline"), raw).unwrap();
			dir
		}

		fn resolve(&self, pid: u32) -> Result<ServerTarget, TargetError> {
			ServerTarget::from_proc_root(self.root.path(), pid)
		}
	}

	#[test]
	fn test_missing_process() {
		let proc = FakeProc::new();
		assert!(matches!(proc.resolve(42), Err(TargetError::NoProcess { pid: 42 })));
	}

	#[test]
	fn test_missing_executable() {
		let proc = FakeProc::new();
		proc.process(42);
		assert!(matches!(proc.resolve(42), Err(TargetError::NoExecutable { .. })));
	}

	#[test]
	fn test_missing_cmdline() {
		let proc = FakeProc::new();
		proc.with_exe(42);
		assert!(matches!(proc.resolve(42), Err(TargetError::NoCmdline { .. })));
	}

	#[test]
	fn test_cmdline_without_conf() {
		let proc = FakeProc::new();
		proc.with_cmdline(42, &["rippled", "--net"]);
		assert!(matches!(
			proc.resolve(42),
			Err(TargetError::ConfigNotInCmdline { .. })
		));
	}

	#[test]
	fn test_conf_file_must_exist() {
		let proc = FakeProc::new();
		let missing = proc.root.path().join("nope.cfg");
		proc.with_cmdline(42, &["rippled", "--conf", missing.to_str().unwrap()]);
		match proc.resolve(42) {
			Err(TargetError::ConfigMissing { path, .. }) => assert_eq!(path, missing),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn test_resolves_absolute_and_relative_conf() {
		let proc = FakeProc::new();
		let conf = proc.root.path().join("node.cfg");
		fs::write(&conf, "[server]\n").unwrap();

		proc.with_cmdline(42, &["rippled", "--conf", conf.to_str().unwrap()]);
		let target = proc.resolve(42).unwrap();
		assert_eq!(target.pid, 42);
		assert_eq!(target.config_file, conf);

		// Relative paths resolve against the process working directory
		let dir = proc.with_cmdline(43, &["rippled", "--conf=node.cfg"]);
		fs::create_dir_all(dir.join("cwd")).unwrap();
		fs::write(dir.join("cwd").join("node.cfg"), "[server]\n").unwrap();
		let target = proc.resolve(43).unwrap();
		assert_eq!(target.config_file, dir.join("cwd").join("node.cfg"));
	}

	#[test]
	fn test_conf_argument_forms() {
		let args = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
		assert_eq!(conf_argument(&args(&["x", "--conf", "a.cfg"])), Some("a.cfg"));
		assert_eq!(conf_argument(&args(&["x", "--conf=b.cfg"])), Some("b.cfg"));
		assert_eq!(conf_argument(&args(&["x", "--conf"])), None);
		assert_eq!(conf_argument(&args(&["x", "--config", "c.cfg"])), None);
	}

	#[test]
	fn test_split_cmdline() {
		assert_eq!(
			split_cmdline(b"rippled\0--conf\0/etc/node.cfg\0"),
			vec!["rippled", "--conf", "/etc/node.cfg"]
		);
	}
}
