//! Chapter rendering: prints a reassembled document to a PDF page sized to its content.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::blank_filter::{FilterReport, filter_file_in_place};
use crate::engine::{BrowserDriver, PageDriver, PdfSize};
use crate::error::{BookError, ChapterStage, Result};
use crate::reassembler::AssembledDocument;

/// Measures the content root, falling back to the wrapper and then the whole document.
const MEASURE_CONTENT_JS: &str = r#"(rootSelector, containerSelector) => {
	const target = document.querySelector(rootSelector) || document.querySelector(containerSelector);
	if (target) {
		const rect = target.getBoundingClientRect();
		return { width: rect.width, height: rect.height, source: target === document.querySelector(rootSelector) ? 'root' : 'container' };
	}
	const doc = document.documentElement;
	const body = document.body || doc;
	return {
		width: Math.max(doc.scrollWidth, body.scrollWidth, doc.offsetWidth, body.offsetWidth),
		height: Math.max(doc.scrollHeight, body.scrollHeight, doc.offsetHeight, body.offsetHeight),
		source: 'document',
	};
}"#;

/// Intrinsic size of the chapter content in whole CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentBounds {
	pub width: u32,
	pub height: u32,
}

impl ContentBounds {
	/// Rounds measured sizes up; never returns a zero dimension.
	pub fn from_measured(width: f64, height: f64) -> Self {
		Self {
			width: round_up_px(width),
			height: round_up_px(height),
		}
	}

	pub fn pdf_size(&self) -> PdfSize {
		PdfSize {
			width_px: self.width,
			height_px: self.height,
		}
	}
}

fn round_up_px(value: f64) -> u32 {
	if value.is_finite() && value > 1.0 {
		value.ceil().min(f64::from(u32::MAX)) as u32
	} else {
		1
	}
}

#[derive(Debug, Deserialize)]
struct Measurement {
	width: f64,
	height: f64,
	#[serde(default)]
	source: String,
}

/// Where one chapter's PDF is staged and where it finally lands.
#[derive(Debug, Clone)]
pub struct RenderTarget<'a> {
	pub chapter_index: u32,
	pub temp_path: &'a Path,
	pub final_path: &'a Path,
	pub content_root_selector: &'a str,
	pub container_id: &'a str,
	pub settle: Duration,
	pub blank_page_threshold: usize,
}

/// Filtered chapter PDF on disk.
#[derive(Debug, Clone)]
pub struct RenderedChapter {
	pub path: PathBuf,
	pub bounds: ContentBounds,
	pub filter: FilterReport,
}

/// Prints `document` on a fresh page, filters blank pages and moves the result into place.
///
/// The final path only ever holds a filtered PDF: printing and filtering happen on the
/// temporary path, which is renamed last. Errors carry the stage they happened in.
pub async fn render_chapter<B>(browser: &B, document: &AssembledDocument, target: &RenderTarget<'_>) -> Result<RenderedChapter>
where
	B: BrowserDriver + ?Sized,
{
	let index = target.chapter_index;

	let bounds = print_to_temp(browser, document, target)
		.await
		.map_err(|e| e.in_chapter(index, ChapterStage::Render))?;

	let filter = filter_file_in_place(target.temp_path, target.blank_page_threshold)
		.await
		.map_err(|e| e.in_chapter(index, ChapterStage::Filter))?;

	tokio::fs::rename(target.temp_path, target.final_path)
		.await
		.map_err(|e| BookError::from(e).in_chapter(index, ChapterStage::Finalize))?;

	info!(
		target = "kotopdf.render",
		path = %target.final_path.display(),
		width = bounds.width,
		height = bounds.height,
		pages = filter.kept,
		"chapter PDF saved"
	);

	Ok(RenderedChapter {
		path: target.final_path.to_path_buf(),
		bounds,
		filter,
	})
}

async fn print_to_temp<B>(browser: &B, document: &AssembledDocument, target: &RenderTarget<'_>) -> Result<ContentBounds>
where
	B: BrowserDriver + ?Sized,
{
	let surface = browser.new_page().await?;
	let printed = print_on_surface(&surface, document, target).await;
	if let Err(err) = surface.close().await {
		warn!(target = "kotopdf.render", error = %err, "failed to close render page");
	}
	let (bounds, pdf) = printed?;

	tokio::fs::write(target.temp_path, &pdf).await?;
	debug!(target = "kotopdf.render", path = %target.temp_path.display(), bytes = pdf.len(), "temporary PDF written");
	Ok(bounds)
}

async fn print_on_surface<P>(surface: &P, document: &AssembledDocument, target: &RenderTarget<'_>) -> Result<(ContentBounds, Vec<u8>)>
where
	P: PageDriver + ?Sized,
{
	surface.set_content(document.html()).await?;
	sleep(target.settle).await;

	let bounds = measure_content(surface, target.content_root_selector, &format!("#{}", target.container_id)).await?;
	let pdf = surface.print_pdf(bounds.pdf_size()).await?;
	Ok((bounds, pdf))
}

/// Measures the rendered content box of the loaded document.
pub async fn measure_content<P>(surface: &P, root_selector: &str, container_selector: &str) -> Result<ContentBounds>
where
	P: PageDriver + ?Sized,
{
	let args = [root_selector, container_selector].map(|s| serde_json::Value::String(s.to_string()).to_string());
	let script = format!("({MEASURE_CONTENT_JS})({}, {})", args[0], args[1]);

	let value = surface.evaluate(&script).await?;
	let measured: Measurement = serde_json::from_value(value).map_err(|e| BookError::Script {
		script: "measure-content",
		message: e.to_string(),
	})?;

	let bounds = ContentBounds::from_measured(measured.width, measured.height);
	debug!(
		target = "kotopdf.render",
		source = %measured.source,
		width = bounds.width,
		height = bounds.height,
		"content measured"
	);
	Ok(bounds)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::extractor::RenderedContent;
	use crate::fake::{FakeBook, FakeBrowser, FakeChapter};
	use crate::reassembler::{ContainerSpec, assemble_document};

	fn document() -> AssembledDocument {
		let content = RenderedContent {
			markup: "<div id=\"epubContent\"><p>Bab 1</p></div>".into(),
			style_rules: Vec::new(),
		};
		assemble_document(
			&content,
			&ContainerSpec {
				content_root_selector: "#epubContent",
				container_id: "epubContainer",
				container_class: "stylesEnabled",
			},
		)
	}

	fn target<'a>(temp_path: &'a Path, final_path: &'a Path) -> RenderTarget<'a> {
		RenderTarget {
			chapter_index: 0,
			temp_path,
			final_path,
			content_root_selector: "#epubContent",
			container_id: "epubContainer",
			settle: Duration::from_millis(1),
			blank_page_threshold: 100,
		}
	}

	#[tokio::test]
	async fn filtered_pdf_replaces_temporary_file() {
		let temp = tempfile::TempDir::new().unwrap();
		let browser = FakeBrowser::new(FakeBook::default().chapter(0, FakeChapter::new("<p/>").with_pages(&[400, 8])));
		browser.source_page().set_url("https://reader.test/#/book/1/reader/chapter/0");
		let (temp_path, final_path) = (temp.path().join("chapter_1_temp.pdf"), temp.path().join("chapter_1.pdf"));

		let rendered = render_chapter(&browser, &document(), &target(&temp_path, &final_path)).await.unwrap();

		assert_eq!(rendered.path, final_path);
		assert_eq!(rendered.filter, FilterReport { total: 2, kept: 1 });
		assert_eq!(rendered.bounds, ContentBounds { width: 641, height: 904 });
		assert!(!temp_path.exists());
		browser.stats(|stats| assert_eq!((stats.opened, stats.closed), (1, 1)));
	}

	#[tokio::test]
	async fn unreadable_print_never_reaches_final_path() {
		let temp = tempfile::TempDir::new().unwrap();
		let browser = FakeBrowser::new(FakeBook::default().chapter(0, FakeChapter::new("<p/>").with_corrupt_print()));
		browser.source_page().set_url("https://reader.test/#/book/1/reader/chapter/0");
		let (temp_path, final_path) = (temp.path().join("chapter_1_temp.pdf"), temp.path().join("chapter_1.pdf"));

		let err = render_chapter(&browser, &document(), &target(&temp_path, &final_path)).await.unwrap_err();

		match &err {
			BookError::Chapter { index, stage, source } => {
				assert_eq!(*index, 0);
				assert_eq!(*stage, ChapterStage::Filter);
				assert!(matches!(**source, BookError::Pdf(_)), "{source:?}");
			}
			other => panic!("expected chapter error, got {other:?}"),
		}
		assert!(!final_path.exists());
		browser.stats(|stats| assert_eq!(stats.closed, 1));
	}

	#[test]
	fn bounds_round_up_to_whole_pixels() {
		assert_eq!(
			ContentBounds::from_measured(600.2, 1280.0),
			ContentBounds {
				width: 601,
				height: 1280
			}
		);
	}

	#[test]
	fn degenerate_measurements_clamp_to_one_pixel() {
		assert_eq!(ContentBounds::from_measured(0.0, f64::NAN), ContentBounds { width: 1, height: 1 });
	}
}
