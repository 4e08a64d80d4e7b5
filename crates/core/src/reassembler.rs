//! Standalone document synthesis for off-context printing.
//!
//! The reader lays chapters out for a scrolling viewport: fixed heights, hidden
//! overflow, absolutely positioned wrappers. The overrides below undo that so the
//! whole chapter flows onto a print surface. They come after the captured styles and
//! use `!important`, so they win every tie.

use crate::extractor::RenderedContent;

/// Identifies the content root and wrapper in the rebuilt document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec<'a> {
	/// Selector of the content root inside the captured markup.
	pub content_root_selector: &'a str,
	pub container_id: &'a str,
	pub container_class: &'a str,
}

/// A complete HTML document with no dependency on the reader's network context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
	html: String,
}

impl AssembledDocument {
	pub fn html(&self) -> &str {
		&self.html
	}

	pub fn into_html(self) -> String {
		self.html
	}
}

/// Wraps captured markup and styles into a print-ready document.
///
/// Identical input always produces byte-identical output.
pub fn assemble_document(content: &RenderedContent, spec: &ContainerSpec<'_>) -> AssembledDocument {
	let mut html = String::with_capacity(content.markup.len() + 2048);

	html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>\n");
	html.push_str("/* Captured styles */\n");
	html.push_str(&content.flattened_styles());
	html.push('\n');
	push_overrides(&mut html, spec);
	html.push_str("</style>\n</head>\n<body>\n");

	html.push_str(&format!("<div id=\"{}\" class=\"{}\">\n", spec.container_id, spec.container_class));
	html.push_str(&content.markup);
	html.push_str("\n</div>\n</body>\n</html>\n");

	AssembledDocument { html }
}

fn push_overrides(html: &mut String, spec: &ContainerSpec<'_>) {
	let container = format!("#{}", spec.container_id);
	let root = spec.content_root_selector;

	html.push_str(&format!(
		"/* Print layout overrides */
* {{
  box-sizing: border-box;
}}
html, body {{
  margin: 0 !important;
  padding: 0 !important;
  width: 100%;
  height: auto !important;
  overflow: visible !important;
  visibility: visible !important;
  position: relative !important;
}}
{container} {{
  margin: 0 !important;
  padding: 0 !important;
  width: 100% !important;
  height: auto !important;
  max-width: 100% !important;
  max-height: none !important;
  overflow: visible !important;
  visibility: visible !important;
  position: relative !important;
}}
{root} {{
  margin: 0 !important;
  width: 100% !important;
  height: auto !important;
  max-height: none !important;
  overflow: visible !important;
  visibility: visible !important;
  position: relative !important;
}}
"
	));
}
