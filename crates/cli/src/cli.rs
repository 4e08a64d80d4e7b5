use std::path::PathBuf;

use clap::{ArgAction, Args, Parser};

#[derive(Parser, Debug)]
#[command(name = "kotopdf")]
#[command(about = "Capture a Kotobee book chapter by chapter and merge it into one PDF")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v debug, -vv everything)
	#[arg(short, long, action = ArgAction::Count)]
	pub verbose: u8,

	/// Book identifier as it appears in the reader address
	#[arg(long)]
	pub id: String,

	/// First chapter index (zero-based, inclusive)
	#[arg(long, default_value_t = 0)]
	pub start: u32,

	/// Last chapter index (inclusive)
	#[arg(long)]
	pub end: u32,

	/// Display name appended to the final PDF filename
	#[arg(long)]
	pub name: Option<String>,

	/// Pipeline configuration file (JSON)
	#[arg(long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Output root, overrides the configured one
	#[arg(long, value_name = "DIR")]
	pub out_dir: Option<PathBuf>,

	/// Chapter address template with {book} and {chapter} placeholders
	#[arg(long, value_name = "TEMPLATE")]
	pub url_template: Option<String>,

	#[command(flatten)]
	pub browser: BrowserArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BrowserArgs {
	/// Run the browser without a window
	#[arg(long, env = "KOTOPDF_HEADLESS")]
	pub headless: bool,

	/// Browser executable (discovered on PATH when omitted)
	#[arg(long, env = "KOTOPDF_CHROME", value_name = "PATH")]
	pub chrome: Option<PathBuf>,

	/// Chrome user data directory holding a logged-in reader session
	#[arg(long, env = "KOTOPDF_USER_DATA_DIR", value_name = "DIR")]
	pub user_data_dir: Option<PathBuf>,

	/// Profile inside the user data directory, e.g. "Default"
	#[arg(long, env = "KOTOPDF_PROFILE_DIRECTORY", value_name = "NAME")]
	pub profile_directory: Option<String>,

	/// Pass --no-sandbox to the browser
	#[arg(long)]
	pub no_sandbox: bool,
}
