use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. `RUST_LOG` wins over the `-v` count when set.
pub fn init_logging(verbosity: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(verbosity > 0)
		.with_writer(std::io::stderr)
		.try_init();
}

fn default_directives(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "warn,kotopdf=info",
		1 => "warn,kotopdf=debug",
		_ => "debug",
	}
}
