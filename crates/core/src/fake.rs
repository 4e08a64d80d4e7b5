//! Scripted in-memory browser for exercising the pipeline without Chrome.
//!
//! The fake answers the scripts the pipeline sends by recognising what they probe
//! (marker existence, content extraction, measurement) and prints chapters as small
//! PDFs whose page content lengths are chosen per chapter.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::engine::{BrowserDriver, NavigationStream, PageDriver, PdfSize};
use crate::error::{BookError, Result};
use crate::pdf::fixtures::pdf_with_pages;

#[derive(Debug, Clone)]
pub(crate) struct FakeChapter {
	markup: Option<String>,
	styles: Vec<String>,
	skipped: Vec<String>,
	pages: Vec<usize>,
	corrupt_print: bool,
}

impl FakeChapter {
	pub(crate) fn new(markup: &str) -> Self {
		Self {
			markup: Some(markup.to_string()),
			styles: vec!["p { line-height: 1.4; }".to_string()],
			skipped: Vec::new(),
			pages: vec![480],
			corrupt_print: false,
		}
	}

	pub(crate) fn missing_root() -> Self {
		Self {
			markup: None,
			pages: vec![0],
			..Self::new("")
		}
	}

	pub(crate) fn with_styles<const N: usize>(mut self, styles: [&str; N]) -> Self {
		self.styles = styles.iter().map(|s| s.to_string()).collect();
		self
	}

	pub(crate) fn with_skipped_sheet(mut self, href: &str) -> Self {
		self.skipped.push(href.to_string());
		self
	}

	/// Content-stream length of each printed page.
	pub(crate) fn with_pages(mut self, pages: &[usize]) -> Self {
		self.pages = pages.to_vec();
		self
	}

	/// Printing yields bytes that are not a PDF.
	pub(crate) fn with_corrupt_print(mut self) -> Self {
		self.corrupt_print = true;
		self
	}
}

#[derive(Debug, Clone)]
pub(crate) struct FakeBook {
	chapters: BTreeMap<u32, FakeChapter>,
	marker: bool,
	stalled_load: bool,
	stuck_router: bool,
}

impl Default for FakeBook {
	fn default() -> Self {
		Self {
			chapters: BTreeMap::new(),
			marker: true,
			stalled_load: false,
			stuck_router: false,
		}
	}
}

impl FakeBook {
	pub(crate) fn chapter(mut self, index: u32, chapter: FakeChapter) -> Self {
		self.chapters.insert(index, chapter);
		self
	}

	pub(crate) fn without_marker(mut self) -> Self {
		self.marker = false;
		self
	}

	/// Transport load never settles, but the router still reaches the chapter.
	pub(crate) fn with_stalled_load(mut self) -> Self {
		self.stalled_load = true;
		self
	}

	/// Router stays on the library view whatever address is requested.
	pub(crate) fn with_stuck_router(mut self) -> Self {
		self.stuck_router = true;
		self
	}

	fn chapter_for(&self, index: Option<u32>) -> FakeChapter {
		index
			.and_then(|i| self.chapters.get(&i).cloned())
			.unwrap_or_else(|| FakeChapter::new(&format!("<div id=\"epubContent\"><p>chapter {}</p></div>", index.unwrap_or(0))))
	}
}

#[derive(Debug, Default)]
pub(crate) struct FakeStats {
	pub(crate) gotos: Vec<String>,
	pub(crate) documents: Vec<String>,
	pub(crate) printed: Vec<PdfSize>,
	pub(crate) opened: usize,
	pub(crate) closed: usize,
}

struct FakeState {
	book: FakeBook,
	active_chapter: Option<u32>,
	stats: FakeStats,
}

#[derive(Clone)]
pub(crate) struct FakeBrowser {
	state: Arc<Mutex<FakeState>>,
}

impl FakeBrowser {
	pub(crate) fn new(book: FakeBook) -> Self {
		Self {
			state: Arc::new(Mutex::new(FakeState {
				book,
				active_chapter: None,
				stats: FakeStats::default(),
			})),
		}
	}

	/// The page used for reader navigation.
	pub(crate) fn source_page(&self) -> FakePage {
		FakePage::new(Arc::clone(&self.state))
	}

	pub(crate) fn stats<R>(&self, f: impl FnOnce(&FakeStats) -> R) -> R {
		f(&self.state.lock().stats)
	}
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
	type Page = FakePage;

	async fn new_page(&self) -> Result<FakePage> {
		self.state.lock().stats.opened += 1;
		Ok(FakePage::new(Arc::clone(&self.state)))
	}
}

#[derive(Clone)]
pub(crate) struct FakePage {
	state: Arc<Mutex<FakeState>>,
	url: Arc<Mutex<Option<String>>>,
	forced: Arc<Mutex<Option<Value>>>,
	subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<String>>>>,
}

impl FakePage {
	fn new(state: Arc<Mutex<FakeState>>) -> Self {
		Self {
			state,
			url: Arc::new(Mutex::new(None)),
			forced: Arc::new(Mutex::new(None)),
			subscribers: Arc::new(Mutex::new(Vec::new())),
		}
	}

	/// Moves the page to `url` without emitting a navigation event.
	pub(crate) fn set_url(&self, url: &str) {
		*self.url.lock() = Some(url.to_string());
		self.state.lock().active_chapter = chapter_index(url);
	}

	/// Every later evaluation returns `value`.
	pub(crate) fn force_evaluate_result(&self, value: Value) {
		*self.forced.lock() = Some(value);
	}

	fn navigate_to(&self, url: &str) {
		self.set_url(url);
		self.subscribers.lock().retain(|tx| tx.unbounded_send(url.to_string()).is_ok());
	}
}

fn chapter_index(url: &str) -> Option<u32> {
	url.rsplit('/').next().and_then(|tail| tail.parse().ok())
}

#[async_trait]
impl PageDriver for FakePage {
	async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
		let (stalled, stuck) = {
			let mut state = self.state.lock();
			state.stats.gotos.push(url.to_string());
			(state.book.stalled_load, state.book.stuck_router)
		};

		if stuck {
			self.navigate_to("https://reader.test/#/library");
		} else {
			self.navigate_to(url);
		}

		if stalled {
			tokio::time::sleep(timeout).await;
			return Err(BookError::NavigationTimeout {
				url: url.to_string(),
				waited_ms: timeout.as_millis() as u64,
			});
		}
		Ok(())
	}

	async fn frame_navigations(&self) -> Result<NavigationStream> {
		let (tx, rx) = mpsc::unbounded();
		self.subscribers.lock().push(tx);
		Ok(rx.boxed())
	}

	async fn current_url(&self) -> Result<Option<String>> {
		Ok(self.url.lock().clone())
	}

	async fn evaluate(&self, script: &str) -> Result<Value> {
		if let Some(value) = self.forced.lock().clone() {
			return Ok(value);
		}

		let state = self.state.lock();
		let chapter = state.book.chapter_for(state.active_chapter);

		if script.contains("!== null") {
			return Ok(Value::Bool(state.book.marker));
		}
		if script.contains("outerHTML") {
			return Ok(json!({
				"markup": chapter.markup.unwrap_or_default(),
				"styles": chapter.styles,
				"skipped": chapter.skipped,
			}));
		}
		if script.contains("getBoundingClientRect") {
			return Ok(json!({ "width": 640.4, "height": 903.2, "source": "root" }));
		}
		Ok(Value::Null)
	}

	async fn set_content(&self, html: &str) -> Result<()> {
		self.state.lock().stats.documents.push(html.to_string());
		Ok(())
	}

	async fn print_pdf(&self, size: PdfSize) -> Result<Vec<u8>> {
		let mut state = self.state.lock();
		state.stats.printed.push(size);

		let index = state.active_chapter.unwrap_or(0);
		let chapter = state.book.chapter_for(state.active_chapter);
		if chapter.corrupt_print {
			return Ok(b"%PDF-1.5 truncated".to_vec());
		}
		let tags: Vec<String> = (0..chapter.pages.len()).map(|n| format!("c{index}p{n}")).collect();
		let pages: Vec<(&str, usize)> = tags.iter().map(String::as_str).zip(chapter.pages.iter().copied()).collect();
		Ok(pdf_with_pages(&pages))
	}

	async fn close(&self) -> Result<()> {
		self.state.lock().stats.closed += 1;
		Ok(())
	}
}
