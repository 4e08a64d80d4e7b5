//! Thin helpers over `lopdf` shared by the blank-page filter and the book assembler.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::Result;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

pub fn load(bytes: &[u8]) -> Result<Document> {
	Ok(Document::load_mem(bytes)?)
}

pub fn save(doc: &mut Document) -> Result<Vec<u8>> {
	let mut output = Vec::new();
	doc.save_to(&mut output)?;
	Ok(output)
}

pub fn page_count(bytes: &[u8]) -> Result<usize> {
	Ok(load(bytes)?.get_pages().len())
}

/// Page object ids in page order.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
	doc.get_pages().into_values().collect()
}

/// Stored (possibly compressed) length of all content streams of a page; zero when
/// it has none.
pub fn content_length(doc: &Document, page_id: ObjectId) -> usize {
	doc.get_page_contents(page_id)
		.into_iter()
		.filter_map(|id| doc.get_object(id).and_then(Object::as_stream).ok())
		.map(|stream| stream.content.len())
		.sum()
}

/// A valid document with an empty page tree.
pub fn empty_document() -> Document {
	let mut doc = Document::with_version("1.5");
	let pages_id = doc.add_object(Dictionary::from_iter([
		("Type", Object::Name(b"Pages".to_vec())),
		("Kids", Object::Array(Vec::new())),
		("Count", Object::Integer(0)),
	]));
	let catalog_id = doc.add_object(Dictionary::from_iter([
		("Type", Object::Name(b"Catalog".to_vec())),
		("Pages", Object::Reference(pages_id)),
	]));
	doc.trailer.set("Root", Object::Reference(catalog_id));
	doc
}

/// Copies inherited attributes onto each page so it stays intact when re-parented.
pub fn hoist_inherited_attributes(doc: &mut Document) {
	for page_id in page_ids(doc) {
		let missing: Vec<(&[u8], Object)> = INHERITABLE
			.iter()
			.filter(|key| doc.get_dictionary(page_id).map(|page| !page.has(key)).unwrap_or(false))
			.filter_map(|key| inherited_attribute(doc, page_id, key).map(|value| (*key, value)))
			.collect();

		if let Ok(page) = doc.get_dictionary_mut(page_id) {
			for (key, value) in missing {
				page.set(key.to_vec(), value);
			}
		}
	}
}

fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
	let mut current = parent_of(doc.get_dictionary(page_id).ok()?);

	for _ in 0..MAX_TREE_DEPTH {
		let node = doc.get_dictionary(current?).ok()?;
		if let Ok(value) = node.get(key) {
			return Some(value.clone());
		}
		current = parent_of(node);
	}
	None
}

fn parent_of(node: &Dictionary) -> Option<ObjectId> {
	node.get(b"Parent").and_then(Object::as_reference).ok()
}

/// Rewrites the page tree to hold exactly `keep`, in the given order, then drops
/// everything no longer reachable.
pub fn keep_pages(doc: &mut Document, keep: &[ObjectId]) -> Result<()> {
	hoist_inherited_attributes(doc);

	let pages_id = doc.catalog()?.get(b"Pages")?.as_reference()?;

	for page_id in keep {
		doc.get_dictionary_mut(*page_id)?.set("Parent", Object::Reference(pages_id));
	}

	let pages = doc.get_dictionary_mut(pages_id)?;
	pages.set("Kids", Object::Array(keep.iter().copied().map(Object::Reference).collect()));
	pages.set("Count", Object::Integer(keep.len() as i64));

	doc.prune_objects();
	Ok(())
}
