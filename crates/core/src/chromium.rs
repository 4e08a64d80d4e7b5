//! Chromium implementation of the engine seam over the DevTools protocol.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{EventFrameNavigated, EventNavigatedWithinDocument, PrintToPdfParams};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use futures::{StreamExt, future, stream};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::{BrowserDriver, NavigationStream, PageDriver, PdfSize};
use crate::error::{BookError, Result};

impl From<CdpError> for BookError {
	fn from(err: CdpError) -> Self {
		BookError::Browser(err.to_string())
	}
}

/// Launch options, normally sourced from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserSettings {
	pub headless: bool,
	pub executable: Option<PathBuf>,
	/// Existing Chrome profile root, so reader logins carry over.
	pub user_data_dir: Option<PathBuf>,
	pub profile_directory: Option<String>,
	pub no_sandbox: bool,
}

impl BrowserSettings {
	fn to_config(&self) -> Result<BrowserConfig> {
		let mut builder = BrowserConfig::builder();
		if !self.headless {
			builder = builder.with_head();
		}
		if self.no_sandbox {
			builder = builder.no_sandbox();
		}
		if let Some(path) = &self.executable {
			builder = builder.chrome_executable(path);
		}
		if let Some(dir) = &self.user_data_dir {
			builder = builder.user_data_dir(dir);
		}
		if let Some(profile) = &self.profile_directory {
			builder = builder.arg(format!("--profile-directory={profile}"));
		}
		builder.build().map_err(|e| BookError::Browser(format!("invalid browser config: {e}")))
	}
}

/// A launched Chromium instance plus its protocol handler task.
pub struct ChromiumBrowser {
	browser: Browser,
	handler: JoinHandle<()>,
}

impl ChromiumBrowser {
	pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
		let config = settings.to_config()?;
		debug!(target = "kotopdf", headless = settings.headless, "launching chromium");
		let (browser, mut handler) = Browser::launch(config).await?;

		let handler = tokio::spawn(async move {
			while let Some(event) = handler.next().await {
				if let Err(err) = event {
					debug!(target = "kotopdf", error = %err, "browser handler error");
				}
			}
		});

		info!(target = "kotopdf", "browser launched");
		Ok(Self { browser, handler })
	}

	pub async fn close(mut self) -> Result<()> {
		if let Err(err) = self.browser.close().await {
			warn!(target = "kotopdf", error = %err, "browser did not close cleanly");
		}
		self.handler.abort();
		Ok(())
	}
}

#[async_trait]
impl BrowserDriver for ChromiumBrowser {
	type Page = ChromiumPage;

	async fn new_page(&self) -> Result<ChromiumPage> {
		let page = self.browser.new_page("about:blank").await?;
		Ok(ChromiumPage { page })
	}
}

pub struct ChromiumPage {
	page: Page,
}

impl ChromiumPage {
	pub fn inner(&self) -> &Page {
		&self.page
	}
}

#[async_trait]
impl PageDriver for ChromiumPage {
	async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
		match tokio::time::timeout(timeout, self.page.goto(url)).await {
			Ok(Ok(_)) => Ok(()),
			Ok(Err(err)) => Err(err.into()),
			Err(_) => Err(BookError::NavigationTimeout {
				url: url.to_string(),
				waited_ms: timeout.as_millis() as u64,
			}),
		}
	}

	async fn frame_navigations(&self) -> Result<NavigationStream> {
		let main_frame = self.page.mainframe().await?;

		let documents = self
			.page
			.event_listener::<EventFrameNavigated>()
			.await?
			.filter(|event| future::ready(event.frame.parent_id.is_none()))
			.map(|event| format!("{}{}", event.frame.url, event.frame.url_fragment.as_deref().unwrap_or("")));

		// Hash-route changes in the reader never reload the document.
		let routes = self
			.page
			.event_listener::<EventNavigatedWithinDocument>()
			.await?
			.filter(move |event| future::ready(main_frame.as_ref().is_none_or(|id| *id == event.frame_id)))
			.map(|event| event.url.clone());

		Ok(stream::select(documents, routes).boxed())
	}

	async fn current_url(&self) -> Result<Option<String>> {
		Ok(self.page.url().await?)
	}

	async fn evaluate(&self, script: &str) -> Result<Value> {
		let params = EvaluateParams::builder()
			.expression(script)
			.await_promise(true)
			.return_by_value(true)
			.build()
			.map_err(|message| BookError::Script {
				script: "evaluate",
				message,
			})?;
		let result = self.page.evaluate_expression(params).await?;
		Ok(result.value().cloned().unwrap_or(Value::Null))
	}

	async fn set_content(&self, html: &str) -> Result<()> {
		self.page.set_content(html).await?;
		Ok(())
	}

	async fn print_pdf(&self, size: PdfSize) -> Result<Vec<u8>> {
		let params = PrintToPdfParams::builder()
			.paper_width(size.width_in())
			.paper_height(size.height_in())
			.margin_top(0.0)
			.margin_bottom(0.0)
			.margin_left(0.0)
			.margin_right(0.0)
			.print_background(true)
			.prefer_css_page_size(false)
			.build();
		Ok(self.page.pdf(params).await?)
	}

	async fn close(&self) -> Result<()> {
		self.page.clone().close().await?;
		Ok(())
	}
}
