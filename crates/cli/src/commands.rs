//! The capture command: resolve configuration, launch Chromium, run the pipeline.

use kotopdf::{BookLayout, BookPipeline, BookSummary, ChapterRange, ChromiumBrowser, PipelineConfig};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::error::{CliError, Result};

pub async fn run(cli: Cli) -> Result<BookSummary> {
	let book_id = cli.id.trim().to_string();
	if book_id.is_empty() {
		return Err(CliError::EmptyBookId);
	}
	let range = ChapterRange::new(cli.start, cli.end)?;
	let config = resolve_config(&cli).await?;
	BookLayout::new(&config.output_dir, book_id.as_str())?;
	let settings = cli.browser.settings();

	let browser = ChromiumBrowser::launch(&settings).await?;
	let outcome = match BookPipeline::new(&browser, config) {
		Ok(pipeline) => pipeline.run(&book_id, range, cli.name.as_deref()).await,
		Err(err) => Err(err),
	};
	if let Err(err) = browser.close().await {
		warn!(target = "kotopdf", error = %err, "failed to shut down browser");
	}

	let summary = outcome?;
	report(&summary);
	Ok(summary)
}

/// Configuration file (or defaults) with command-line overrides applied.
pub async fn resolve_config(cli: &Cli) -> Result<PipelineConfig> {
	let mut config = match &cli.config {
		Some(path) => PipelineConfig::from_file(path).await?,
		None => PipelineConfig::default(),
	};
	if let Some(dir) = &cli.out_dir {
		config.output_dir = dir.clone();
	}
	if let Some(template) = &cli.url_template {
		config.chapter_url_template = template.clone();
	}
	config.validate()?;
	Ok(config)
}

fn report(summary: &BookSummary) {
	for chapter in &summary.chapters {
		info!(
			target = "kotopdf",
			chapter = chapter.artifact.chapter_index,
			kept = chapter.filter.kept,
			removed = chapter.filter.removed(),
			path = %chapter.artifact.pdf_path.display(),
			"chapter ready"
		);
	}
	info!(
		target = "kotopdf",
		book = %summary.book_id,
		chapters = summary.chapters.len(),
		pages = summary.total_pages(),
		path = %summary.final_path().display(),
		"book written"
	);
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use clap::Parser;
	use kotopdf::BookError;

	use super::*;

	fn parse(args: &[&str]) -> Cli {
		Cli::try_parse_from(args).unwrap()
	}

	#[tokio::test]
	async fn flags_override_defaults() {
		let cli = parse(&[
			"kotopdf",
			"--id",
			"1",
			"--end",
			"0",
			"--out-dir",
			"books",
			"--url-template",
			"https://reader.example/#/book/{book}/reader/chapter/{chapter}",
		]);
		let config = resolve_config(&cli).await.unwrap();

		assert_eq!(config.output_dir, PathBuf::from("books"));
		assert!(config.chapter_url_template.starts_with("https://reader.example/"));
		assert_eq!(config.blank_page_threshold, PipelineConfig::default().blank_page_threshold);
	}

	#[tokio::test]
	async fn flags_override_config_file() {
		let temp = tempfile::TempDir::new().unwrap();
		let path = temp.path().join("kotopdf.json");
		std::fs::write(&path, r#"{"outputDir": "from-file", "readySettleMs": 10}"#).unwrap();

		let path_arg = path.to_string_lossy().to_string();
		let cli = parse(&["kotopdf", "--id", "1", "--end", "0", "--config", &path_arg, "--out-dir", "from-flag"]);
		let config = resolve_config(&cli).await.unwrap();

		assert_eq!(config.output_dir, PathBuf::from("from-flag"));
		assert_eq!(config.ready_settle_ms, 10);
	}

	#[tokio::test]
	async fn template_without_placeholders_is_rejected() {
		let cli = parse(&["kotopdf", "--id", "1", "--end", "0", "--url-template", "https://reader.example/"]);
		assert!(matches!(resolve_config(&cli).await, Err(CliError::Book(BookError::Config(_)))));
	}

	#[tokio::test]
	async fn reversed_range_fails_before_launch() {
		let cli = parse(&["kotopdf", "--id", "1", "--start", "4", "--end", "2"]);
		assert!(matches!(run(cli).await, Err(CliError::Book(BookError::Config(_)))));
	}

	#[tokio::test]
	async fn blank_book_id_fails_before_launch() {
		let cli = parse(&["kotopdf", "--id", "  ", "--end", "2"]);
		assert!(matches!(run(cli).await, Err(CliError::EmptyBookId)));
	}

	#[tokio::test]
	async fn unsafe_book_id_fails_before_launch() {
		let cli = parse(&["kotopdf", "--id", "...", "--end", "0"]);
		assert!(matches!(run(cli).await, Err(CliError::Book(BookError::Config(_)))));
	}
}
