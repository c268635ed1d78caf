// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Quire document pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::DEFAULT_JPEG_QUALITY;
use crate::error::{QuireError, Result};

/// Unique identifier for an uploaded source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub Uuid);

impl SourceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named input file held in memory.
///
/// The payload is validated once at construction and never mutates
/// afterwards; operations read it through [`SourceFile::bytes`].
#[derive(Debug, Clone)]
pub struct SourceFile {
    id: SourceId,
    name: String,
    bytes: Vec<u8>,
}

impl SourceFile {
    /// Wrap PDF bytes, verifying the `%PDF-` header.
    pub fn pdf(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        if !has_pdf_magic(&bytes) {
            return Err(QuireError::InvalidInput(format!(
                "{name}: not a PDF (missing %PDF- header)"
            )));
        }
        Ok(Self {
            id: SourceId::new(),
            name,
            bytes,
        })
    }

    /// Wrap image bytes, verifying a recognisable raster-format header.
    pub fn image(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        if sniff_image_format(&bytes).is_none() {
            return Err(QuireError::InvalidInput(format!(
                "{name}: not a supported image format"
            )));
        }
        Ok(Self {
            id: SourceId::new(),
            name,
            bytes,
        })
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The header is allowed anywhere in the first 1024 bytes.
fn has_pdf_magic(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(1024)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Sniff common raster-image magic numbers.
fn sniff_image_format(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("png")
    } else if bytes.starts_with(b"GIF8") {
        Some("gif")
    } else if bytes.starts_with(b"BM") {
        Some("bmp")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        Some("tiff")
    } else {
        None
    }
}

/// Ordered collection of source files.
///
/// Operations iterate entries in their current list order, so removing or
/// reordering entries before a merge is reflected in the output.
#[derive(Debug, Clone, Default)]
pub struct SourceList {
    entries: Vec<SourceFile>,
}

impl SourceList {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a file and return its identifier.
    pub fn push(&mut self, file: SourceFile) -> SourceId {
        let id = file.id();
        self.entries.push(file);
        id
    }

    /// Remove the entry with the given id. Returns `false` if absent.
    pub fn remove(&mut self, id: SourceId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|f| f.id() != id);
        self.entries.len() != before
    }

    /// Move the entry with the given id to `position` (clamped to the end).
    /// Returns `false` if absent.
    pub fn move_to(&mut self, id: SourceId, position: usize) -> bool {
        let Some(from) = self.entries.iter().position(|f| f.id() == id) else {
            return false;
        };
        let file = self.entries.remove(from);
        let to = position.min(self.entries.len());
        self.entries.insert(to, file);
        true
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceFile> {
        self.entries.iter().find(|f| f.id() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceFile> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<SourceFile> for SourceList {
    fn from_iter<I: IntoIterator<Item = SourceFile>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SourceList {
    type Item = &'a SourceFile;
    type IntoIter = std::slice::Iter<'a, SourceFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Standard paper sizes for composed documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height), portrait.
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Rotate a portrait (width, height) pair to match this orientation.
    pub fn apply_to(&self, dims: (u32, u32)) -> (u32, u32) {
        match self {
            Self::Portrait => dims,
            Self::Landscape => (dims.1, dims.0),
        }
    }
}

/// Raster output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterFormat {
    /// Lossy JPEG at the given quality (1..=100).
    Jpeg { quality: u8 },
    /// Lossless PNG.
    Png,
}

impl RasterFormat {
    /// File extension for saved output.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }

    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

impl Default for RasterFormat {
    fn default() -> Self {
        Self::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_bytes() -> Vec<u8> {
        b"%PDF-1.5\nfake body\n%%EOF".to_vec()
    }

    #[test]
    fn pdf_magic_is_required() {
        assert!(SourceFile::pdf("a.pdf", pdf_bytes()).is_ok());
        assert!(SourceFile::pdf("a.pdf", b"not a pdf".to_vec()).is_err());
    }

    #[test]
    fn pdf_magic_may_follow_junk() {
        let mut bytes = vec![0u8; 64];
        bytes.extend_from_slice(b"%PDF-1.4\n");
        assert!(SourceFile::pdf("a.pdf", bytes).is_ok());
    }

    #[test]
    fn image_magic_is_sniffed() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A].to_vec();
        assert!(SourceFile::image("a.png", png).is_ok());

        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        assert!(SourceFile::image("a.jpg", jpeg).is_ok());

        assert!(SourceFile::image("a.txt", b"hello".to_vec()).is_err());
    }

    #[test]
    fn list_preserves_push_order() {
        let mut list = SourceList::new();
        list.push(SourceFile::pdf("one.pdf", pdf_bytes()).unwrap());
        list.push(SourceFile::pdf("two.pdf", pdf_bytes()).unwrap());

        let names: Vec<&str> = list.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["one.pdf", "two.pdf"]);
    }

    #[test]
    fn list_reorder_moves_entry() {
        let mut list = SourceList::new();
        let first = list.push(SourceFile::pdf("one.pdf", pdf_bytes()).unwrap());
        list.push(SourceFile::pdf("two.pdf", pdf_bytes()).unwrap());
        list.push(SourceFile::pdf("three.pdf", pdf_bytes()).unwrap());

        assert!(list.move_to(first, 2));
        let names: Vec<&str> = list.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["two.pdf", "three.pdf", "one.pdf"]);
    }

    #[test]
    fn list_remove_by_id() {
        let mut list = SourceList::new();
        let id = list.push(SourceFile::pdf("one.pdf", pdf_bytes()).unwrap());
        assert!(list.remove(id));
        assert!(!list.remove(id));
        assert!(list.is_empty());
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let a4 = PaperSize::A4.dimensions_mm();
        assert_eq!(Orientation::Portrait.apply_to(a4), (210, 297));
        assert_eq!(Orientation::Landscape.apply_to(a4), (297, 210));
    }

    #[test]
    fn raster_format_extensions() {
        assert_eq!(RasterFormat::Jpeg { quality: 85 }.extension(), "jpg");
        assert_eq!(RasterFormat::Png.extension(), "png");
    }
}
