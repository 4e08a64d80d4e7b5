//! Run configuration injected into the pipeline.
//!
//! Every field has a default matching the Kotobee reader the tool was written for, so an
//! empty JSON object is a valid config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::address::{BOOK_PLACEHOLDER, CHAPTER_PLACEHOLDER};
use crate::error::{BookError, Result};

pub const DEFAULT_CHAPTER_URL_TEMPLATE: &str = "https://univterbuka.kotobee.com/#/book/{book}/reader/chapter/{chapter}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
	/// Address template with `{book}` and `{chapter}` placeholders.
	pub chapter_url_template: String,
	/// Navigation and address-match allowance for the first chapter of a run.
	pub first_navigation_timeout_ms: u64,
	/// Navigation and address-match allowance for every later chapter.
	pub navigation_timeout_ms: u64,
	pub content_marker_timeout_ms: u64,
	pub marker_poll_interval_ms: u64,
	/// Pause after the content marker appears.
	pub ready_settle_ms: u64,
	/// Pause after the reassembled document is loaded for printing.
	pub render_settle_ms: u64,
	pub content_root_selector: String,
	pub container_id: String,
	pub container_class: String,
	/// Pages whose content stream is at most this many bytes are dropped.
	pub blank_page_threshold: usize,
	pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			chapter_url_template: DEFAULT_CHAPTER_URL_TEMPLATE.to_string(),
			first_navigation_timeout_ms: 60_000,
			navigation_timeout_ms: 30_000,
			content_marker_timeout_ms: 30_000,
			marker_poll_interval_ms: 250,
			ready_settle_ms: 2_000,
			render_settle_ms: 500,
			content_root_selector: "#epubContent".to_string(),
			container_id: "epubContainer".to_string(),
			container_class: "stylesEnabled".to_string(),
			blank_page_threshold: 100,
			output_dir: PathBuf::from("storage"),
		}
	}
}

impl PipelineConfig {
	/// Loads a JSON config file; missing fields keep their defaults.
	pub async fn from_file(path: &Path) -> Result<Self> {
		let raw = tokio::fs::read_to_string(path).await?;
		let config: Self = serde_json::from_str(&raw)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		for placeholder in [BOOK_PLACEHOLDER, CHAPTER_PLACEHOLDER] {
			if !self.chapter_url_template.contains(placeholder) {
				return Err(BookError::Config(format!("chapterUrlTemplate must contain {placeholder}")));
			}
		}

		let sample = self.chapter_url_template.replace(BOOK_PLACEHOLDER, "0").replace(CHAPTER_PLACEHOLDER, "0");
		url::Url::parse(&sample).map_err(|e| BookError::Config(format!("chapterUrlTemplate is not a valid URL: {e}")))?;

		let timeouts = [
			("firstNavigationTimeoutMs", self.first_navigation_timeout_ms),
			("navigationTimeoutMs", self.navigation_timeout_ms),
			("contentMarkerTimeoutMs", self.content_marker_timeout_ms),
			("markerPollIntervalMs", self.marker_poll_interval_ms),
		];
		if let Some((name, _)) = timeouts.iter().find(|(_, ms)| *ms == 0) {
			return Err(BookError::Config(format!("{name} must be greater than zero")));
		}

		if self.content_root_selector.trim().is_empty() || self.container_id.trim().is_empty() {
			return Err(BookError::Config("content selectors must not be empty".into()));
		}

		Ok(())
	}

	/// Navigation allowance: cold start and login make the first chapter slower.
	pub fn navigation_timeout(&self, is_first_in_run: bool) -> Duration {
		if is_first_in_run {
			Duration::from_millis(self.first_navigation_timeout_ms)
		} else {
			Duration::from_millis(self.navigation_timeout_ms)
		}
	}

	pub fn content_marker_timeout(&self) -> Duration {
		Duration::from_millis(self.content_marker_timeout_ms)
	}

	pub fn marker_poll_interval(&self) -> Duration {
		Duration::from_millis(self.marker_poll_interval_ms)
	}

	pub fn ready_settle(&self) -> Duration {
		Duration::from_millis(self.ready_settle_ms)
	}

	pub fn render_settle(&self) -> Duration {
		Duration::from_millis(self.render_settle_ms)
	}
}
