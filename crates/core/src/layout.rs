//! On-disk layout of run artifacts.
//!
//! ```text
//! <output_dir>/
//!   book_<id>.pdf                 final book (or book_<id>_<name>.pdf)
//!   <id>/
//!     chapter_<n>.html            debug dump of the reassembled document
//!     chapter_<n>_temp.pdf        renderer output before filtering
//!     chapter_<n>.pdf             filtered chapter
//! ```
//!
//! `n` is the one-based chapter number.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{BookError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookLayout {
	root: PathBuf,
	book_id: String,
}

impl BookLayout {
	/// Fails when the id has no filename-safe characters, which would put the chapter
	/// files directly in `root`.
	pub fn new(root: impl Into<PathBuf>, book_id: impl Into<String>) -> Result<Self> {
		let book_id = book_id.into();
		if sanitize(&book_id).is_empty() {
			return Err(BookError::Config(format!("book id {book_id:?} has no filename-safe characters")));
		}
		Ok(Self {
			root: root.into(),
			book_id,
		})
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn book_dir(&self) -> PathBuf {
		self.root.join(sanitize(&self.book_id))
	}

	/// Creates the per-book directory when missing.
	pub async fn ensure_book_dir(&self) -> Result<PathBuf> {
		let dir = self.book_dir();
		if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
			tokio::fs::create_dir_all(&dir).await?;
			info!(target = "kotopdf", path = %dir.display(), "created book folder");
		}
		Ok(dir)
	}

	pub fn chapter_html(&self, number: u32) -> PathBuf {
		self.book_dir().join(format!("chapter_{number}.html"))
	}

	pub fn chapter_pdf(&self, number: u32) -> PathBuf {
		self.book_dir().join(format!("chapter_{number}.pdf"))
	}

	pub fn chapter_temp_pdf(&self, number: u32) -> PathBuf {
		self.book_dir().join(format!("chapter_{number}_temp.pdf"))
	}

	/// Final book path, optionally carrying a display name.
	pub fn book_pdf(&self, name: Option<&str>) -> PathBuf {
		let id = sanitize(&self.book_id);
		let file = match name.map(sanitize).filter(|n| !n.is_empty()) {
			Some(name) => format!("book_{id}_{name}.pdf"),
			None => format!("book_{id}.pdf"),
		};
		self.root.join(file)
	}
}

/// Keeps letters, digits, `-`, `_` and `.`; runs of anything else become one `_`.
fn sanitize(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut pending_gap = false;

	for ch in raw.trim().chars() {
		if ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.') {
			if pending_gap && !out.is_empty() {
				out.push('_');
			}
			pending_gap = false;
			out.push(ch);
		} else {
			pending_gap = true;
		}
	}

	out.trim_matches('.').to_string()
}
