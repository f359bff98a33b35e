//! Path-find Churn Tester
//!
//! Main entry point for the churn tester

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pathfind_churn::{load_config, load_config_from, ChurnBuilder, Settings};

#[derive(Parser, Debug)]
#[command(name = "pathfind-churn")]
#[command(about = "Keep a churning pool of path_find subscriptions open against a ledger node")]
struct Args {
	/// Process id of the node under test
	#[arg(short, long, required_unless_present = "ws_url")]
	pid: Option<u32>,

	/// WebSocket endpoint, instead of reading it from the node's config
	#[arg(long)]
	ws_url: Option<String>,

	/// Number of concurrently running path-find workers
	#[arg(long)]
	pool_size: Option<usize>,

	/// Config file; defaults to config/config.{toml,json} when present
	#[arg(short, long)]
	config: Option<PathBuf>,
}

impl Args {
	fn settings(&self) -> Result<Settings, Box<dyn std::error::Error>> {
		let mut settings = match &self.config {
			Some(path) => load_config_from(path)?,
			None => load_config()?,
		};
		if let Some(pool_size) = self.pool_size {
			settings.pool.size = pool_size;
		}
		if let Some(url) = &self.ws_url {
			settings.server.ws_url = Some(url.clone());
		}
		settings.validate()?;
		Ok(settings)
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	dotenvy::dotenv().ok();
	let args = Args::parse();

	let settings = match args.settings() {
		Ok(settings) => settings,
		Err(e) => {
			eprintln!("pathfind-churn: {}", e);
			return ExitCode::FAILURE;
		},
	};

	let mut builder = ChurnBuilder::new().with_settings(settings);
	builder = match (&args.ws_url, args.pid) {
		(Some(url), _) => builder.with_ws_url(url.clone()),
		(None, Some(pid)) => builder.with_pid(pid),
		(None, None) => builder,
	};

	match builder.run().await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("pathfind-churn: {}", e);
			ExitCode::FAILURE
		},
	}
}
