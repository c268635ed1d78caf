// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembly — merge, page extraction, and per-page splitting over
// `lopdf` object graphs.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use quire_core::error::Result;
use quire_core::{CancelToken, PageSelection, Progress, QuireError, SourceFile, SourceList};
use tracing::{debug, info, instrument};

/// Page attributes that may live on an ancestor `Pages` node. They are
/// copied onto the page itself before it leaves its original tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// One page of a split, carrying a complete single-page document.
#[derive(Debug, Clone)]
pub struct SplitPage {
    /// Zero-based index of the page in the source document.
    pub page_index: u32,
    pub bytes: Vec<u8>,
}

/// Combines, extracts, and splits PDF documents without rendering them.
///
/// Pages move between documents as deep clones of their object graphs, so
/// outputs never share state with their sources. Every operation walks the
/// [`Progress`] phase lifecycle and honours its [`CancelToken`] between
/// pages.
pub struct DocumentAssembler {
    cancel: CancelToken,
    progress: Progress,
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentAssembler {
    pub fn new() -> Self {
        Self {
            cancel: CancelToken::new(),
            progress: Progress::new(),
        }
    }

    /// Use caller-held cancellation and progress handles.
    pub fn with_observers(cancel: CancelToken, progress: Progress) -> Self {
        Self { cancel, progress }
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    // -- Merge ----------------------------------------------------------------

    /// Merge every document in `sources` into one, in list order.
    ///
    /// A source that fails to parse aborts the whole merge; the error names
    /// the offending file.
    pub fn merge(&self, sources: &SourceList) -> Result<Vec<u8>> {
        self.progress.track(|| self.merge_inner(sources))
    }

    #[instrument(skip(self, sources), fields(count = sources.len()))]
    fn merge_inner(&self, sources: &SourceList) -> Result<Vec<u8>> {
        if sources.is_empty() {
            return Err(QuireError::InvalidInput("no documents to merge".into()));
        }

        let total = sources.len() as u32;
        let mut target = TargetDocument::new();

        for (index, source) in sources.iter().enumerate() {
            self.cancel.check()?;
            self.progress.advance(index as u32, total);

            let document = open_document(source)?;
            let mut cloner = PageCloner::new();
            for (_, page_id) in document.get_pages() {
                self.cancel.check()?;
                let cloned = cloner.clone_page(&document, page_id, &mut target.document)?;
                target.adopt(cloned)?;
            }
            debug!(source = source.name(), "Source appended");
        }

        let bytes = target.finish()?;
        info!(documents = total, bytes = bytes.len(), "Merge complete");
        Ok(bytes)
    }

    // -- Extraction -----------------------------------------------------------

    /// Copy the selected pages of `source` into a new document, in
    /// ascending page order regardless of how the selection was written.
    pub fn extract(&self, source: &SourceFile, selection: &PageSelection) -> Result<Vec<u8>> {
        self.progress.track(|| self.extract_inner(source, selection))
    }

    #[instrument(skip(self, source, selection), fields(source = source.name(), pages = selection.len()))]
    fn extract_inner(&self, source: &SourceFile, selection: &PageSelection) -> Result<Vec<u8>> {
        if selection.is_empty() {
            return Err(QuireError::EmptySelection);
        }

        let document = open_document(source)?;
        let pages: Vec<ObjectId> = document.get_pages().into_values().collect();
        if let Some(max) = selection.max_index()
            && max as usize >= pages.len()
        {
            return Err(QuireError::InvalidInput(format!(
                "selection names page {} but {} has only {} page(s)",
                max + 1,
                source.name(),
                pages.len()
            )));
        }

        let total = selection.len() as u32;
        let mut target = TargetDocument::new();
        let mut cloner = PageCloner::new();
        for (done, index) in selection.iter().enumerate() {
            self.cancel.check()?;
            self.progress.advance(done as u32, total);
            let cloned = cloner.clone_page(&document, pages[index as usize], &mut target.document)?;
            target.adopt(cloned)?;
        }

        let bytes = target.finish()?;
        info!(pages = total, bytes = bytes.len(), "Extraction complete");
        Ok(bytes)
    }

    // -- Splitting ------------------------------------------------------------

    /// Split `source` into one single-page document per page, in one pass
    /// over the parsed source.
    pub fn split_all(&self, source: &SourceFile) -> Result<Vec<SplitPage>> {
        self.progress.track(|| self.split_all_inner(source))
    }

    #[instrument(skip(self, source), fields(source = source.name()))]
    fn split_all_inner(&self, source: &SourceFile) -> Result<Vec<SplitPage>> {
        let document = open_document(source)?;
        let pages: Vec<ObjectId> = document.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(QuireError::EmptySelection);
        }

        let total = pages.len() as u32;
        let mut outputs = Vec::with_capacity(pages.len());
        for (index, page_id) in pages.into_iter().enumerate() {
            self.cancel.check()?;
            self.progress.advance(index as u32, total);

            let mut target = TargetDocument::new();
            let mut cloner = PageCloner::new();
            let cloned = cloner.clone_page(&document, page_id, &mut target.document)?;
            target.adopt(cloned)?;
            outputs.push(SplitPage {
                page_index: index as u32,
                bytes: target.finish()?,
            });
        }

        info!(pages = total, "Split complete");
        Ok(outputs)
    }
}

/// Number of pages in a PDF source, from its page tree.
pub fn page_count(source: &SourceFile) -> Result<u32> {
    Ok(open_document(source)?.get_pages().len() as u32)
}

fn open_document(source: &SourceFile) -> Result<Document> {
    Document::load_mem(source.bytes())
        .map_err(|err| QuireError::Parse(format!("{}: {}", source.name(), err)))
}

// -- Output document ----------------------------------------------------------

/// A document under construction. The `Pages` node id is reserved up front
/// so cloned pages can point their `Parent` at it; the node itself, the
/// catalog, and the trailer are written by [`finish`](Self::finish).
struct TargetDocument {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl TargetDocument {
    fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Attach an already-cloned page to this document's page tree.
    fn adopt(&mut self, page_id: ObjectId) -> Result<()> {
        let object = self
            .document
            .get_object_mut(page_id)
            .map_err(|err| QuireError::Encode(format!("adopted page missing: {}", err)))?;
        let dict = object
            .as_dict_mut()
            .map_err(|err| QuireError::Encode(format!("adopted page is not a page: {}", err)))?;
        dict.set("Parent", self.pages_id);
        self.kids.push(page_id);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        let count = self.kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(self.pages_id),
        });
        self.document.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        self.document
            .save_to(&mut bytes)
            .map_err(|err| QuireError::Encode(format!("document write failed: {}", err)))?;
        Ok(bytes)
    }
}

// -- Page cloning --------------------------------------------------------------

/// Deep-clones page object graphs from one document into another.
///
/// A source-to-target id map makes shared objects (fonts, images) clone
/// once, and reserving the target id before recursing lets reference
/// cycles (annotation `/P` back-links) terminate. One cloner serves one
/// source document; its map must not be reused across sources.
struct PageCloner {
    mapping: HashMap<ObjectId, ObjectId>,
}

impl PageCloner {
    fn new() -> Self {
        Self {
            mapping: HashMap::new(),
        }
    }

    fn clone_page(
        &mut self,
        source: &Document,
        page_id: ObjectId,
        target: &mut Document,
    ) -> Result<ObjectId> {
        let page_object = source
            .get_object(page_id)
            .map_err(|err| QuireError::Parse(format!("page object missing: {}", err)))?;
        let mut page_dict = page_object
            .as_dict()
            .map_err(|err| QuireError::Parse(format!("page is not a dictionary: {}", err)))?
            .clone();

        // Materialize inherited attributes before the Parent link is cut,
        // or the clone would lose its resources and media box.
        for key in INHERITABLE_KEYS {
            if !page_dict.has(key)
                && let Some(value) = inherited_attribute(source, &page_dict, key)
            {
                page_dict.set(key, value);
            }
        }
        page_dict.remove(b"Parent");

        let cloned_id = target.new_object_id();
        self.mapping.insert(page_id, cloned_id);
        let resolved = self.clone_object(source, &Object::Dictionary(page_dict), target)?;
        target.objects.insert(cloned_id, resolved);
        Ok(cloned_id)
    }

    fn clone_object(
        &mut self,
        source: &Document,
        object: &Object,
        target: &mut Document,
    ) -> Result<Object> {
        match object {
            Object::Reference(id) => {
                if let Some(mapped) = self.mapping.get(id) {
                    return Ok(Object::Reference(*mapped));
                }
                let reserved = target.new_object_id();
                self.mapping.insert(*id, reserved);
                let referenced = source
                    .get_object(*id)
                    .map_err(|err| QuireError::Parse(format!("object {:?} missing: {}", id, err)))?;
                let cloned = self.clone_object(source, referenced, target)?;
                target.objects.insert(reserved, cloned);
                Ok(Object::Reference(reserved))
            }
            Object::Dictionary(dict) => {
                let mut cloned = Dictionary::new();
                for (key, value) in dict.iter() {
                    cloned.set(key.clone(), self.clone_object(source, value, target)?);
                }
                Ok(Object::Dictionary(cloned))
            }
            Object::Array(items) => {
                let mut cloned = Vec::with_capacity(items.len());
                for item in items {
                    cloned.push(self.clone_object(source, item, target)?);
                }
                Ok(Object::Array(cloned))
            }
            Object::Stream(stream) => {
                let mut dict = Dictionary::new();
                for (key, value) in stream.dict.iter() {
                    dict.set(key.clone(), self.clone_object(source, value, target)?);
                }
                Ok(Object::Stream(lopdf::Stream::new(dict, stream.content.clone())))
            }
            other => Ok(other.clone()),
        }
    }
}

/// Walk the source `Parent` chain looking for an inheritable attribute.
fn inherited_attribute(source: &Document, page_dict: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page_dict.get(b"Parent").ok().cloned();
    let mut hops = 0;
    while let Some(Object::Reference(id)) = parent {
        // A well-formed page tree is shallow; give up on cycles.
        if hops > 64 {
            return None;
        }
        hops += 1;
        let node = source.get_object(id).ok()?.as_dict().ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").ok().cloned();
    }
    None
}

#[cfg(test)]
mod tests {
    use lopdf::Stream;
    use quire_core::Phase;

    use super::*;

    /// A small document whose page content streams carry `{tag}-{n}`
    /// markers, so provenance survives merging and splitting. Resources
    /// and MediaBox live on the Pages node to exercise inheritance.
    fn sample_pdf(tag: &str, pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => Object::Reference(font_id) },
        });

        let mut kids: Vec<Object> = Vec::new();
        for number in 1..=pages {
            let text = format!("BT /F1 12 Tf 72 720 Td ({tag}-{number}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, text.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "Contents" => Object::Reference(content_id),
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => Object::Reference(resources_id),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn pdf_source(name: &str, tag: &str, pages: usize) -> SourceFile {
        SourceFile::pdf(name, sample_pdf(tag, pages)).unwrap()
    }

    fn page_texts(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .into_values()
            .map(|id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
            .collect()
    }

    #[test]
    fn merge_preserves_list_order() {
        let mut sources = SourceList::new();
        sources.push(pdf_source("a.pdf", "alpha", 3));
        sources.push(pdf_source("b.pdf", "beta", 2));

        let assembler = DocumentAssembler::new();
        let merged = assembler.merge(&sources).unwrap();

        let texts = page_texts(&merged);
        assert_eq!(texts.len(), 5);
        assert!(texts[0].contains("alpha-1"));
        assert!(texts[1].contains("alpha-2"));
        assert!(texts[2].contains("alpha-3"));
        assert!(texts[3].contains("beta-1"));
        assert!(texts[4].contains("beta-2"));
        assert_eq!(assembler.progress().phase(), Phase::Succeeded);
    }

    #[test]
    fn merge_follows_reordering() {
        let mut sources = SourceList::new();
        let first = sources.push(pdf_source("a.pdf", "alpha", 1));
        sources.push(pdf_source("b.pdf", "beta", 1));
        assert!(sources.move_to(first, 1));

        let merged = DocumentAssembler::new().merge(&sources).unwrap();
        let texts = page_texts(&merged);
        assert!(texts[0].contains("beta-1"));
        assert!(texts[1].contains("alpha-1"));
    }

    #[test]
    fn merge_rejects_empty_list() {
        let err = DocumentAssembler::new()
            .merge(&SourceList::new())
            .unwrap_err();
        assert!(matches!(err, QuireError::InvalidInput(_)));
    }

    #[test]
    fn merge_names_the_unparseable_source() {
        let mut sources = SourceList::new();
        sources.push(pdf_source("good.pdf", "fine", 1));
        sources.push(SourceFile::pdf("broken.pdf", b"%PDF-1.7 garbage".to_vec()).unwrap());

        let assembler = DocumentAssembler::new();
        let err = assembler.merge(&sources).unwrap_err();
        match err {
            QuireError::Parse(detail) => assert!(detail.contains("broken.pdf")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(assembler.progress().phase(), Phase::Failed);
    }

    #[test]
    fn extract_returns_pages_in_ascending_order() {
        let source = pdf_source("doc.pdf", "doc", 5);
        let selection = PageSelection::parse("4,2", 5);

        let extracted = DocumentAssembler::new()
            .extract(&source, &selection)
            .unwrap();
        let texts = page_texts(&extracted);
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("doc-2"));
        assert!(texts[1].contains("doc-4"));
    }

    #[test]
    fn extract_follows_a_mixed_range_selection() {
        let source = pdf_source("doc.pdf", "doc", 10);
        let selection = PageSelection::parse("3-5, 8", 10);

        let extracted = DocumentAssembler::new()
            .extract(&source, &selection)
            .unwrap();
        let texts = page_texts(&extracted);
        assert_eq!(texts.len(), 4);
        for (text, page) in texts.iter().zip([3, 4, 5, 8]) {
            assert!(text.contains(&format!("doc-{page}")));
        }

        // Everything out of bounds leaves nothing to extract.
        let out_of_bounds = PageSelection::parse("20", 10);
        let err = DocumentAssembler::new()
            .extract(&source, &out_of_bounds)
            .unwrap_err();
        assert!(matches!(err, QuireError::EmptySelection));
    }

    #[test]
    fn extract_is_idempotent() {
        let source = pdf_source("doc.pdf", "doc", 5);
        let selection = PageSelection::parse("1,3,5", 5);
        let assembler = DocumentAssembler::new();

        let first = assembler.extract(&source, &selection).unwrap();
        let second = assembler.extract(&source, &selection).unwrap();
        assert_eq!(page_texts(&first).len(), 3);
        assert_eq!(page_texts(&first), page_texts(&second));
    }

    #[test]
    fn extract_rejects_empty_selection() {
        let source = pdf_source("doc.pdf", "doc", 3);
        let selection = PageSelection::parse("abc", 3);
        let err = DocumentAssembler::new()
            .extract(&source, &selection)
            .unwrap_err();
        assert!(matches!(err, QuireError::EmptySelection));
    }

    #[test]
    fn extract_names_document_on_out_of_bounds_selection() {
        // A selection parsed against stale metadata can outrun the file.
        let source = pdf_source("short.pdf", "s", 3);
        let selection = PageSelection::parse("8", 10);
        let err = DocumentAssembler::new()
            .extract(&source, &selection)
            .unwrap_err();
        match err {
            QuireError::InvalidInput(detail) => {
                assert!(detail.contains("short.pdf"));
                assert!(detail.contains("3 page(s)"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extracted_pages_keep_inherited_attributes() {
        let source = pdf_source("doc.pdf", "doc", 2);
        let extracted = DocumentAssembler::new()
            .extract(&source, &PageSelection::parse("2", 2))
            .unwrap();

        let doc = Document::load_mem(&extracted).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
    }

    #[test]
    fn split_yields_one_document_per_page() {
        let source = pdf_source("doc.pdf", "doc", 3);
        let parts = DocumentAssembler::new().split_all(&source).unwrap();
        assert_eq!(parts.len(), 3);
        for (index, part) in parts.iter().enumerate() {
            assert_eq!(part.page_index, index as u32);
            let texts = page_texts(&part.bytes);
            assert_eq!(texts.len(), 1);
            assert!(texts[0].contains(&format!("doc-{}", index + 1)));
        }
    }

    #[test]
    fn split_of_empty_document_is_an_empty_selection() {
        let source = pdf_source("empty.pdf", "none", 0);
        let err = DocumentAssembler::new().split_all(&source).unwrap_err();
        assert!(matches!(err, QuireError::EmptySelection));
    }

    #[test]
    fn cancellation_aborts_between_pages() {
        let mut sources = SourceList::new();
        sources.push(pdf_source("a.pdf", "alpha", 2));

        let cancel = CancelToken::new();
        cancel.cancel();
        let assembler = DocumentAssembler::with_observers(cancel, Progress::new());
        let err = assembler.merge(&sources).unwrap_err();
        assert!(matches!(err, QuireError::Cancelled));
        assert_eq!(assembler.progress().phase(), Phase::Failed);
    }

    #[test]
    fn page_count_reads_the_page_tree() {
        let source = pdf_source("doc.pdf", "doc", 4);
        assert_eq!(page_count(&source).unwrap(), 4);
    }

    #[test]
    fn merged_output_reparses_standalone() {
        let mut sources = SourceList::new();
        sources.push(pdf_source("a.pdf", "alpha", 1));
        sources.push(pdf_source("b.pdf", "beta", 2));

        let merged = DocumentAssembler::new().merge(&sources).unwrap();
        // Round-trip through the parser proves the catalog and page tree
        // were written, not inherited from any source.
        let reparsed = Document::load_mem(&merged).unwrap();
        assert_eq!(reparsed.get_pages().len(), 3);
        let split = DocumentAssembler::new()
            .split_all(&SourceFile::pdf("merged.pdf", merged).unwrap())
            .unwrap();
        assert_eq!(split.len(), 3);

        // And back again: the split parts re-merge into the same sequence.
        let mut parts = SourceList::new();
        for part in split {
            let name = format!("part-{}.pdf", part.page_index + 1);
            parts.push(SourceFile::pdf(name, part.bytes).unwrap());
        }
        let remerged = DocumentAssembler::new().merge(&parts).unwrap();
        let texts = page_texts(&remerged);
        assert_eq!(texts.len(), 3);
        assert!(texts[0].contains("alpha-1"));
        assert!(texts[1].contains("beta-1"));
        assert!(texts[2].contains("beta-2"));
    }
}
