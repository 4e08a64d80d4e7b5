//! Content extraction from the live reader DOM.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::PageDriver;
use crate::error::{BookError, Result};

/// In-page extraction routine. Called with the content-root selector.
///
/// Inline `<style>` blocks come first, then linked stylesheets; sheets whose rules
/// cannot be read (cross-origin) are reported in `skipped` instead of throwing.
const EXTRACT_CONTENT_JS: &str = r#"(selector) => {
	const root = document.querySelector(selector);
	const markup = root ? root.outerHTML : '';
	const styles = [];
	const skipped = [];

	document.querySelectorAll('style').forEach((tag) => {
		styles.push(tag.innerHTML);
	});

	document.querySelectorAll('link[rel="stylesheet"]').forEach((link) => {
		try {
			const sheet = link.sheet;
			if (sheet && sheet.cssRules) {
				let css = '';
				for (const rule of sheet.cssRules) {
					css += rule.cssText + '\n';
				}
				styles.push(css);
			}
		} catch (e) {
			skipped.push(link.href);
		}
	});

	return { markup, styles, skipped };
}"#;

/// Chapter markup plus every style rule that applied to it, in cascade source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedContent {
	/// Serialized content root, empty when the root is absent.
	pub markup: String,
	pub style_rules: Vec<String>,
}

impl RenderedContent {
	pub fn is_empty(&self) -> bool {
		self.markup.is_empty()
	}

	/// All style sources joined in order.
	pub fn flattened_styles(&self) -> String {
		self.style_rules.join("\n")
	}
}

#[derive(Debug, Deserialize)]
struct RawExtraction {
	#[serde(default)]
	markup: String,
	#[serde(default)]
	styles: Vec<String>,
	#[serde(default)]
	skipped: Vec<String>,
}

/// Pulls the content root and its styles out of a ready page.
///
/// Never fails for a missing root or an unreadable stylesheet; both are logged.
pub async fn extract_content<P>(page: &P, selector: &str) -> Result<RenderedContent>
where
	P: PageDriver + ?Sized,
{
	let quoted = serde_json::Value::String(selector.to_string()).to_string();
	let script = format!("({EXTRACT_CONTENT_JS})({quoted})");
	let value = page.evaluate(&script).await?;
	let raw: RawExtraction = serde_json::from_value(value).map_err(|e| BookError::Script {
		script: "extract-content",
		message: e.to_string(),
	})?;

	for href in &raw.skipped {
		warn!(target = "kotopdf", %href, "stylesheet not readable, skipping");
	}
	if raw.markup.is_empty() {
		warn!(target = "kotopdf", %selector, "content root missing, continuing with empty content");
	}

	debug!(
		target = "kotopdf",
		markup_bytes = raw.markup.len(),
		style_sources = raw.styles.len(),
		skipped = raw.skipped.len(),
		"content extracted"
	);

	Ok(RenderedContent {
		markup: raw.markup,
		style_rules: raw.styles,
	})
}
