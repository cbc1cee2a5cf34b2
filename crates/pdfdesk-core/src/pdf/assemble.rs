//! Rebuilding documents from ordered page selections.
//!
//! All page operations (merge, split, delete, extract) go through one
//! routine: pull the requested pages out of their source documents, bake
//! inheritable attributes into each page dictionary, and hang the pages off
//! a fresh page tree in the requested order.

use std::collections::{BTreeMap, HashSet};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use tracing::debug;

use super::Result;
use crate::error::PdfError;

/// Page attributes a page may inherit from its ancestors in the source
/// page tree. The rebuilt tree is flat, so these are materialized onto
/// each page before its old parents are discarded.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// An ordered selection of pages from one source document.
pub(crate) struct PageSelection {
    pub doc: Document,
    /// 1-indexed page numbers, in output order. Duplicates allowed.
    pub pages: Vec<u32>,
}

/// Build a new document containing exactly the selected pages, in order.
pub(crate) fn assemble(sources: Vec<PageSelection>) -> Result<Document> {
    let mut output = Document::with_version("1.5");
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut selected: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut max_id: u32 = 1;

    for mut source in sources {
        source.doc.renumber_objects_with(max_id);
        max_id = source.doc.max_id + 1;

        let page_map = source.doc.get_pages();
        for &page in &source.pages {
            let page_id = *page_map.get(&page).ok_or(PdfError::InvalidPage {
                page,
                page_count: page_map.len() as u32,
            })?;
            let dict = flattened_page_dict(&source.doc, page_id)?;
            selected.push((page_id, dict));
        }
        objects.extend(source.doc.objects);
    }

    if selected.is_empty() {
        return Err(PdfError::EmptySelection);
    }

    output.objects = objects;
    output.max_id = max_id;

    let pages_id = output.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(selected.len());
    let mut used: HashSet<ObjectId> = HashSet::new();

    for (page_id, mut dict) in selected {
        dict.set("Parent", Object::Reference(pages_id));
        // A page selected twice gets a cloned object so the page tree
        // stays a tree.
        let id = if used.insert(page_id) {
            page_id
        } else {
            output.new_object_id()
        };
        output.objects.insert(id, Object::Dictionary(dict));
        kids.push(Object::Reference(id));
    }

    let count = kids.len() as i64;
    output.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => count,
            "Kids" => kids,
        }),
    );

    let catalog_id = output.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    output.trailer.set("Root", catalog_id);

    output.prune_objects();
    output.renumber_objects();
    output.compress();

    debug!("assembled document with {} pages", count);
    Ok(output)
}

/// Clone a page dictionary with inherited attributes resolved onto it and
/// the old parent link removed.
fn flattened_page_dict(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut dict = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| PdfError::Parse(e.to_string()))?
        .clone();
    dict.remove(b"Parent");

    for key in INHERITABLE_KEYS {
        if dict.get(key).is_err() {
            if let Some(value) = inherited_attribute(doc, page_id, key) {
                dict.set(key, value);
            }
        }
    }

    Ok(dict)
}

/// Walk the parent chain looking for an inheritable attribute, starting at
/// the page itself.
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node_id = page_id;
    loop {
        let dict = doc.get_object(node_id).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return match value {
                Object::Reference(id) => doc.get_object(*id).ok().cloned(),
                other => Some(other.clone()),
            };
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(id)) => node_id = *id,
            _ => return None,
        }
    }
}
