//! Browser-engine seam.
//!
//! The pipeline only needs a handful of capabilities from a browser: navigate, watch
//! main-frame address changes, read the current address, evaluate scripts, load raw
//! HTML into a fresh surface, and print that surface to PDF.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::error::Result;

/// Stream of main-frame addresses, one item per navigation (including hash-route changes).
pub type NavigationStream = BoxStream<'static, String>;

/// PDF page size in CSS pixels. Margins are always zero and backgrounds always printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfSize {
	pub width_px: u32,
	pub height_px: u32,
}

impl PdfSize {
	pub const PX_PER_INCH: f64 = 96.0;

	pub fn width_in(&self) -> f64 {
		f64::from(self.width_px) / Self::PX_PER_INCH
	}

	pub fn height_in(&self) -> f64 {
		f64::from(self.height_px) / Self::PX_PER_INCH
	}
}

#[async_trait]
pub trait PageDriver: Send + Sync {
	/// Starts a navigation and waits for the transport-level load.
	///
	/// Returns [`BookError::NavigationTimeout`](crate::BookError::NavigationTimeout) when
	/// the load does not settle within `timeout`; the navigation itself keeps going.
	async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

	/// Subscribes to main-frame navigations from this point on.
	async fn frame_navigations(&self) -> Result<NavigationStream>;

	async fn current_url(&self) -> Result<Option<String>>;

	async fn evaluate(&self, script: &str) -> Result<Value>;

	/// Replaces the page document with `html`.
	async fn set_content(&self, html: &str) -> Result<()>;

	async fn print_pdf(&self, size: PdfSize) -> Result<Vec<u8>>;

	async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait BrowserDriver: Send + Sync {
	type Page: PageDriver;

	/// Opens a blank page that shares the browser session (cookies, storage).
	async fn new_page(&self) -> Result<Self::Page>;
}
