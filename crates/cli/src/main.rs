use clap::Parser;
use kotopdf_cli::{cli::Cli, commands, logging};
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::run(cli).await {
		error!(target = "kotopdf", error = %err, "command failed");
		std::process::exit(1);
	}
}
