//! Chapter addressing: which chapters a run covers and where each one lives.

use crate::error::{BookError, Result};

pub(crate) const BOOK_PLACEHOLDER: &str = "{book}";
pub(crate) const CHAPTER_PLACEHOLDER: &str = "{chapter}";

/// Maps `(book, chapter)` pairs to reader addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterAddress {
	template: String,
}

impl ChapterAddress {
	pub fn new(template: impl Into<String>) -> Self {
		Self { template: template.into() }
	}

	/// Address of a chapter. Pure: equal inputs always give equal addresses.
	pub fn url(&self, book_id: &str, chapter_index: u32) -> String {
		self.template
			.replace(BOOK_PLACEHOLDER, book_id)
			.replace(CHAPTER_PLACEHOLDER, &chapter_index.to_string())
	}

	pub fn template(&self) -> &str {
		&self.template
	}
}

/// One chapter to process, produced per loop iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRequest {
	pub book_id: String,
	pub chapter_index: u32,
	pub is_first_in_run: bool,
}

impl ChapterRequest {
	/// One-based chapter number used in artifact file names.
	pub fn number(&self) -> u32 {
		self.chapter_index + 1
	}
}

/// Inclusive chapter range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterRange {
	pub start: u32,
	pub end: u32,
}

impl ChapterRange {
	pub fn new(start: u32, end: u32) -> Result<Self> {
		if end < start {
			return Err(BookError::Config(format!("chapter range end ({end}) is before start ({start})")));
		}
		Ok(Self { start, end })
	}

	pub fn len(&self) -> usize {
		(self.end - self.start) as usize + 1
	}

	pub fn is_empty(&self) -> bool {
		false
	}

	/// Requests in ascending chapter order; only the first is flagged as such.
	pub fn requests<'a>(&self, book_id: &'a str) -> impl Iterator<Item = ChapterRequest> + 'a {
		let start = self.start;
		(self.start..=self.end).map(move |chapter_index| ChapterRequest {
			book_id: book_id.to_string(),
			chapter_index,
			is_first_in_run: chapter_index == start,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::DEFAULT_CHAPTER_URL_TEMPLATE;

	#[test]
	fn url_fills_both_placeholders() {
		let address = ChapterAddress::new(DEFAULT_CHAPTER_URL_TEMPLATE);
		assert_eq!(address.url("88480", 0), "https://univterbuka.kotobee.com/#/book/88480/reader/chapter/0");
	}

	#[test]
	fn url_is_deterministic() {
		let address = ChapterAddress::new(DEFAULT_CHAPTER_URL_TEMPLATE);
		for (book, chapter) in [("88480", 0), ("1", 17), ("abc", u32::MAX)] {
			assert_eq!(address.url(book, chapter), address.url(book, chapter));
			assert_eq!(address.url(book, chapter), ChapterAddress::new(DEFAULT_CHAPTER_URL_TEMPLATE).url(book, chapter));
		}
		assert_ne!(address.url("88480", 1), address.url("88480", 2));
	}

	#[test]
	fn range_is_inclusive_and_flags_first() {
		let range = ChapterRange::new(3, 5).unwrap();
		let requests: Vec<_> = range.requests("b").collect();

		assert_eq!(range.len(), 3);
		assert_eq!(requests.iter().map(|r| r.chapter_index).collect::<Vec<_>>(), vec![3, 4, 5]);
		assert_eq!(requests.iter().map(|r| r.is_first_in_run).collect::<Vec<_>>(), vec![true, false, false]);
		assert_eq!(requests[0].number(), 4);
	}

	#[test]
	fn single_chapter_range() {
		let range = ChapterRange::new(0, 0).unwrap();
		assert_eq!(range.requests("b").count(), 1);
	}

	#[test]
	fn reversed_range_is_rejected() {
		assert!(ChapterRange::new(5, 2).is_err());
	}
}
