//! Book assembly: concatenates per-chapter PDFs in the order given.

use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info};

use crate::error::{BookError, Result};
use crate::pdf;

/// Result of a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookAssembly {
	pub path: PathBuf,
	pub total_pages: usize,
	/// Pages contributed by each source, in merge order.
	pub pages_per_source: Vec<usize>,
}

/// Merges already-loaded documents. Sources are not sorted or deduplicated; a
/// zero-page source contributes nothing.
pub fn merge_documents(sources: Vec<Document>) -> Result<(Document, Vec<usize>)> {
	let mut merged = Document::with_version("1.5");
	let mut max_id: u32 = 1;
	let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
	let mut contributed = Vec::with_capacity(sources.len());

	for mut doc in sources {
		pdf::hoist_inherited_attributes(&mut doc);
		doc.renumber_objects_with(max_id);
		max_id = doc.max_id + 1;

		let page_ids = pdf::page_ids(&doc);
		contributed.push(page_ids.len());
		for page_id in page_ids {
			let page = doc.get_dictionary(page_id)?.clone();
			pages.push((page_id, page));
		}

		for (object_id, object) in doc.objects {
			match object.type_name().unwrap_or("") {
				"Catalog" | "Pages" | "Page" | "Outlines" | "Outline" => {}
				_ => {
					merged.objects.insert(object_id, object);
				}
			}
		}
	}

	merged.max_id = max_id;
	let pages_id = merged.new_object_id();

	let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
	let count = kids.len() as i64;
	for (page_id, mut page) in pages {
		page.set("Parent", Object::Reference(pages_id));
		merged.objects.insert(page_id, Object::Dictionary(page));
	}

	merged.objects.insert(
		pages_id,
		Object::Dictionary(Dictionary::from_iter([
			("Type", Object::Name(b"Pages".to_vec())),
			("Kids", Object::Array(kids)),
			("Count", Object::Integer(count)),
		])),
	);

	let catalog_id = merged.add_object(Dictionary::from_iter([
		("Type", Object::Name(b"Catalog".to_vec())),
		("Pages", Object::Reference(pages_id)),
	]));
	merged.trailer.set("Root", Object::Reference(catalog_id));

	merged.renumber_objects();
	merged.compress();

	Ok((merged, contributed))
}

/// Loads each source in order, merges them and writes the book to `output`.
///
/// An unreadable source aborts the merge with [`BookError::MergeSourceUnreadable`].
pub async fn assemble_book(sources: &[PathBuf], output: &Path) -> Result<BookAssembly> {
	let mut documents = Vec::with_capacity(sources.len());
	for path in sources {
		let doc = read_source(path).await?;
		debug!(target = "kotopdf.pdf", path = %path.display(), pages = doc.get_pages().len(), "loaded chapter artifact");
		documents.push(doc);
	}

	let (bytes, pages_per_source) = tokio::task::spawn_blocking(move || -> Result<_> {
		let (mut merged, contributed) = merge_documents(documents)?;
		Ok((pdf::save(&mut merged)?, contributed))
	})
	.await
	.map_err(|e| BookError::Io(std::io::Error::other(e)))??;

	if let Some(parent) = output.parent() {
		if !parent.as_os_str().is_empty() {
			tokio::fs::create_dir_all(parent).await?;
		}
	}
	tokio::fs::write(output, bytes).await?;

	let total_pages = pages_per_source.iter().sum();
	info!(
		target = "kotopdf.pdf",
		path = %output.display(),
		sources = sources.len(),
		total_pages,
		"book assembled"
	);

	Ok(BookAssembly {
		path: output.to_path_buf(),
		total_pages,
		pages_per_source,
	})
}

async fn read_source(path: &Path) -> Result<Document> {
	let unreadable = |message: String| BookError::MergeSourceUnreadable {
		path: path.to_path_buf(),
		message,
	};
	let bytes = tokio::fs::read(path).await.map_err(|e| unreadable(e.to_string()))?;
	pdf::load(&bytes).map_err(|e| unreadable(e.to_string()))
}
