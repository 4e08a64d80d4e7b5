//! Chapter capture and PDF assembly for paginated, script-rendered web book readers.
//!
//! A run walks an inclusive chapter range of one book. Each chapter is navigated in a
//! single shared browser page, waited on until the in-app router actually shows it,
//! extracted (markup plus every readable stylesheet), rebuilt as a standalone HTML
//! document, printed to a PDF sized to the content, stripped of blank pages and finally
//! concatenated into one book PDF.
//!
//! The browser and PDF libraries sit behind small seams: [`engine::BrowserDriver`] /
//! [`engine::PageDriver`] (implemented for Chromium in [`chromium`]) and the helpers in
//! [`pdf`].

pub mod address;
pub mod assembler;
pub mod blank_filter;
pub mod chromium;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod layout;
pub mod pdf;
pub mod pipeline;
pub mod reassembler;
pub mod renderer;

#[cfg(test)]
pub(crate) mod fake;

pub use address::{ChapterAddress, ChapterRange, ChapterRequest};
pub use assembler::{BookAssembly, assemble_book};
pub use blank_filter::{FilterReport, filter_blank_pages, filter_file_in_place};
pub use chromium::{BrowserSettings, ChromiumBrowser, ChromiumPage};
pub use config::PipelineConfig;
pub use engine::{BrowserDriver, PageDriver, PdfSize};
pub use error::{BookError, ChapterStage, Result};
pub use extractor::RenderedContent;
pub use layout::BookLayout;
pub use pipeline::{BookPipeline, BookSummary, ChapterArtifact, ChapterOutcome};
pub use reassembler::AssembledDocument;
pub use renderer::ContentBounds;
