//! Error types shared by every pipeline stage.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BookError>;

/// Stage of the per-chapter state machine a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterStage {
	Navigate,
	WaitReady,
	Extract,
	Reassemble,
	Render,
	Filter,
	Finalize,
}

impl fmt::Display for ChapterStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Navigate => "navigate",
			Self::WaitReady => "wait-ready",
			Self::Extract => "extract",
			Self::Reassemble => "reassemble",
			Self::Render => "render",
			Self::Filter => "filter",
			Self::Finalize => "finalize",
		};
		f.write_str(name)
	}
}

#[derive(Debug, Error)]
pub enum BookError {
	/// Transport-level load did not settle in time. Absorbed by the ready detector.
	#[error("Navigation to {url} did not settle within {waited_ms}ms")]
	NavigationTimeout { url: String, waited_ms: u64 },

	#[error("Reader never reached {url} within {waited_ms}ms")]
	AddressMatchTimeout { url: String, waited_ms: u64 },

	#[error("Content marker '{selector}' did not appear within {waited_ms}ms")]
	ContentMarkerTimeout { selector: String, waited_ms: u64 },

	#[error("Browser error: {0}")]
	Browser(String),

	#[error("Script evaluation failed ({script}): {message}")]
	Script { script: &'static str, message: String },

	#[error("PDF error: {0}")]
	Pdf(#[from] lopdf::Error),

	#[error("Cannot read chapter artifact {}: {message}", path.display())]
	MergeSourceUnreadable { path: PathBuf, message: String },

	#[error("Invalid configuration: {0}")]
	Config(String),

	#[error("Chapter {index} failed during {stage}: {source}")]
	Chapter {
		index: u32,
		stage: ChapterStage,
		#[source]
		source: Box<BookError>,
	},

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl BookError {
	pub(crate) fn in_chapter(self, index: u32, stage: ChapterStage) -> Self {
		match self {
			chapter @ Self::Chapter { .. } => chapter,
			other => Self::Chapter {
				index,
				stage,
				source: Box::new(other),
			},
		}
	}

	/// Returns `true` for timeouts a caller could reasonably retry.
	pub fn is_timeout(&self) -> bool {
		match self {
			Self::NavigationTimeout { .. } | Self::AddressMatchTimeout { .. } | Self::ContentMarkerTimeout { .. } => true,
			Self::Chapter { source, .. } => source.is_timeout(),
			_ => false,
		}
	}
}
