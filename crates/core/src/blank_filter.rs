//! Blank-page removal for renderer output.
//!
//! Chrome sometimes emits a leading or trailing empty page when the measured content
//! height is slightly off. A page counts as having content when its content stream is
//! longer than a byte threshold. This is a coarse proxy: a page holding only a large
//! image behind a tiny stream reads as blank, and verbose invisible paths read as
//! content.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{BookError, Result};
use crate::pdf;

/// Classification input for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRecord {
	/// 0-based, contiguous within one PDF.
	pub index: usize,
	pub content_byte_length: usize,
}

impl PageRecord {
	pub fn has_content(&self, threshold: usize) -> bool {
		self.content_byte_length > threshold
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterReport {
	pub total: usize,
	pub kept: usize,
}

impl FilterReport {
	pub fn removed(&self) -> usize {
		self.total - self.kept
	}
}

/// Returns the per-page records of a PDF.
pub fn page_records(bytes: &[u8]) -> Result<Vec<PageRecord>> {
	let doc = pdf::load(bytes)?;
	Ok(pdf::page_ids(&doc)
		.into_iter()
		.enumerate()
		.map(|(index, id)| PageRecord {
			index,
			content_byte_length: pdf::content_length(&doc, id),
		})
		.collect())
}

/// Rebuilds `bytes` with only the pages above `threshold`, in their original order.
///
/// When no page qualifies the result has zero pages.
pub fn filter_blank_pages(bytes: &[u8], threshold: usize) -> Result<(Vec<u8>, FilterReport)> {
	let mut doc = pdf::load(bytes)?;
	let ids = pdf::page_ids(&doc);

	let keep: Vec<_> = ids
		.iter()
		.enumerate()
		.filter(|(index, id)| {
			let record = PageRecord {
				index: *index,
				content_byte_length: pdf::content_length(&doc, **id),
			};
			let keep = record.has_content(threshold);
			debug!(
				target = "kotopdf.pdf",
				page = record.index,
				bytes = record.content_byte_length,
				keep,
				"classified page"
			);
			keep
		})
		.map(|(_, id)| *id)
		.collect();

	let report = FilterReport {
		total: ids.len(),
		kept: keep.len(),
	};

	pdf::keep_pages(&mut doc, &keep)?;
	Ok((pdf::save(&mut doc)?, report))
}

/// Filters the PDF at `path` and overwrites it with the result.
pub async fn filter_file_in_place(path: &Path, threshold: usize) -> Result<FilterReport> {
	let bytes = tokio::fs::read(path).await?;
	let (filtered, report) = tokio::task::spawn_blocking(move || filter_blank_pages(&bytes, threshold))
		.await
		.map_err(|e| BookError::Io(std::io::Error::other(e)))??;
	tokio::fs::write(path, filtered).await?;

	info!(
		target = "kotopdf.pdf",
		path = %path.display(),
		total = report.total,
		kept = report.kept,
		removed = report.removed(),
		"blank pages filtered"
	);
	Ok(report)
}
