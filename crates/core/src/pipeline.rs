//! Pipeline orchestration across and within chapters.
//!
//! Chapters run strictly in ascending order on one shared reader page, which keeps the
//! session alive between chapters and gives the assembler its ordering. Each chapter
//! moves through `Navigate → WaitReady → Extract → Reassemble → Render → Filter →
//! Finalize`; the first failure aborts the run. Chapter files already written stay on
//! disk, but no book is assembled.

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::address::{ChapterAddress, ChapterRange, ChapterRequest};
use crate::assembler::{BookAssembly, assemble_book};
use crate::blank_filter::FilterReport;
use crate::config::PipelineConfig;
use crate::detector::{ReadyWait, begin_navigation, wait_until_ready};
use crate::engine::{BrowserDriver, PageDriver};
use crate::error::{BookError, ChapterStage, Result};
use crate::extractor::extract_content;
use crate::layout::BookLayout;
use crate::reassembler::{ContainerSpec, assemble_document};
use crate::renderer::{ContentBounds, RenderTarget, render_chapter};

/// A filtered chapter PDF ready for assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterArtifact {
	pub chapter_index: u32,
	pub pdf_path: PathBuf,
}

/// Everything one chapter produced.
#[derive(Debug, Clone)]
pub struct ChapterOutcome {
	pub artifact: ChapterArtifact,
	pub html_path: PathBuf,
	pub bounds: ContentBounds,
	pub filter: FilterReport,
	/// The content root was absent; the chapter still produced an artifact.
	pub empty_content: bool,
}

#[derive(Debug, Clone)]
pub struct BookSummary {
	pub book_id: String,
	pub chapters: Vec<ChapterOutcome>,
	pub book: BookAssembly,
}

impl BookSummary {
	pub fn total_pages(&self) -> usize {
		self.book.total_pages
	}

	pub fn final_path(&self) -> &std::path::Path {
		&self.book.path
	}
}

pub struct BookPipeline<'a, B> {
	browser: &'a B,
	config: PipelineConfig,
	address: ChapterAddress,
}

impl<'a, B> BookPipeline<'a, B>
where
	B: BrowserDriver,
{
	pub fn new(browser: &'a B, config: PipelineConfig) -> Result<Self> {
		config.validate()?;
		let address = ChapterAddress::new(config.chapter_url_template.clone());
		Ok(Self { browser, config, address })
	}

	pub fn config(&self) -> &PipelineConfig {
		&self.config
	}

	/// Processes every chapter in `range`, then merges them into the book PDF.
	pub async fn run(&self, book_id: &str, range: ChapterRange, name: Option<&str>) -> Result<BookSummary> {
		let layout = BookLayout::new(&self.config.output_dir, book_id)?;
		layout.ensure_book_dir().await?;

		info!(target = "kotopdf", book = %book_id, start = range.start, end = range.end, "scraping chapters");

		let source = self.browser.new_page().await?;
		let chapters = self.run_chapters(&source, &layout, book_id, range).await;
		if let Err(err) = source.close().await {
			warn!(target = "kotopdf", error = %err, "failed to close reader page");
		}
		let chapters = chapters?;

		let sources: Vec<PathBuf> = chapters.iter().map(|c| c.artifact.pdf_path.clone()).collect();
		let book = assemble_book(&sources, &layout.book_pdf(name)).await?;

		info!(
			target = "kotopdf",
			book = %book_id,
			chapters = chapters.len(),
			pages = book.total_pages,
			path = %book.path.display(),
			chapter_dir = %layout.book_dir().display(),
			"process completed"
		);

		Ok(BookSummary {
			book_id: book_id.to_string(),
			chapters,
			book,
		})
	}

	async fn run_chapters(&self, source: &B::Page, layout: &BookLayout, book_id: &str, range: ChapterRange) -> Result<Vec<ChapterOutcome>> {
		let total = range.len();
		let mut outcomes = Vec::with_capacity(total);

		for (position, request) in range.requests(book_id).enumerate() {
			info!(
				target = "kotopdf",
				chapter = request.chapter_index,
				progress = %format!("{}/{}", position + 1, total),
				"processing chapter"
			);

			match self.process_chapter(source, layout, &request).await {
				Ok(outcome) => outcomes.push(outcome),
				Err(err) => {
					error!(target = "kotopdf", chapter = request.chapter_index, error = %err, "chapter failed, aborting run");
					return Err(err);
				}
			}
		}

		Ok(outcomes)
	}

	/// Runs one chapter through every stage on the shared reader page.
	pub async fn process_chapter(&self, source: &B::Page, layout: &BookLayout, request: &ChapterRequest) -> Result<ChapterOutcome> {
		let index = request.chapter_index;
		let number = request.number();
		let config = &self.config;
		let url = self.address.url(&request.book_id, index);
		let wait = ReadyWait {
			navigation: config.navigation_timeout(request.is_first_in_run),
			content_marker: config.content_marker_timeout(),
			poll_interval: config.marker_poll_interval(),
			settle: config.ready_settle(),
		};

		let navigations = begin_navigation(source, &url, wait.navigation)
			.await
			.map_err(|e| e.in_chapter(index, ChapterStage::Navigate))?;

		wait_until_ready(source, navigations, &url, &config.content_root_selector, wait)
			.await
			.map_err(|e| e.in_chapter(index, ChapterStage::WaitReady))?;

		let content = extract_content(source, &config.content_root_selector)
			.await
			.map_err(|e| e.in_chapter(index, ChapterStage::Extract))?;

		let container = ContainerSpec {
			content_root_selector: &config.content_root_selector,
			container_id: &config.container_id,
			container_class: &config.container_class,
		};
		let document = assemble_document(&content, &container);
		let html_path = layout.chapter_html(number);
		tokio::fs::write(&html_path, document.html())
			.await
			.map_err(|e| BookError::from(e).in_chapter(index, ChapterStage::Reassemble))?;
		info!(target = "kotopdf", path = %html_path.display(), "HTML saved");

		let temp_path = layout.chapter_temp_pdf(number);
		let final_path = layout.chapter_pdf(number);
		let rendered = render_chapter(
			self.browser,
			&document,
			&RenderTarget {
				chapter_index: index,
				temp_path: &temp_path,
				final_path: &final_path,
				content_root_selector: &config.content_root_selector,
				container_id: &config.container_id,
				settle: config.render_settle(),
				blank_page_threshold: config.blank_page_threshold,
			},
		)
		.await
		.map_err(|e| e.in_chapter(index, ChapterStage::Render))?;

		if rendered.filter.kept == 0 {
			warn!(target = "kotopdf", chapter = index, path = %rendered.path.display(), "chapter has no pages after filtering");
		}

		Ok(ChapterOutcome {
			artifact: ChapterArtifact {
				chapter_index: index,
				pdf_path: rendered.path,
			},
			html_path,
			bounds: rendered.bounds,
			filter: rendered.filter,
			empty_content: content.is_empty(),
		})
	}
}
