// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image composition — builds PDF documents out of raster images using
// `printpdf` 0.8's data-oriented page API.

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectId, XObjectTransform,
};
use quire_core::error::Result;
use quire_core::{CancelToken, Orientation, PaperSize, Progress, QuireError, SourceFile};
use tracing::{debug, info, instrument};

/// Fraction of the page an image may occupy in single layout.
pub const SINGLE_FIT: f32 = 0.95;

/// Fraction of its grid cell an image may occupy.
pub const GRID_FIT: f32 = 0.9;

/// How images are arranged on composed pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageLayout {
    /// One image per page.
    #[default]
    Single,
    /// Four images per page in a 2x2 grid, filled in reading order.
    Grid2x2,
}

/// Builds a PDF from a sequence of images.
///
/// Each image is scaled to fit its page or grid cell while preserving its
/// aspect ratio, then centred within it. Input order is placement order.
pub struct Compositor {
    paper_size: PaperSize,
    orientation: Orientation,
    layout: ImageLayout,
    title: String,
    cancel: CancelToken,
    progress: Progress,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            paper_size: PaperSize::A4,
            orientation: Orientation::Portrait,
            layout: ImageLayout::Single,
            title: "Quire Composition".to_owned(),
            cancel: CancelToken::new(),
            progress: Progress::new(),
        }
    }

    pub fn with_paper(mut self, paper_size: PaperSize, orientation: Orientation) -> Self {
        self.paper_size = paper_size;
        self.orientation = orientation;
        self
    }

    pub fn with_layout(mut self, layout: ImageLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Title embedded in the document metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Use caller-held cancellation and progress handles.
    pub fn with_observers(mut self, cancel: CancelToken, progress: Progress) -> Self {
        self.cancel = cancel;
        self.progress = progress;
        self
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Compose `images` into a single PDF. An image that fails to decode
    /// aborts the composition; the error names the file.
    pub fn compose(&self, images: &[SourceFile]) -> Result<Vec<u8>> {
        self.progress.track(|| self.compose_inner(images))
    }

    #[instrument(skip(self, images), fields(count = images.len(), layout = ?self.layout))]
    fn compose_inner(&self, images: &[SourceFile]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(QuireError::InvalidInput("no images to compose".into()));
        }

        let (width_mm, height_mm) = self.orientation.apply_to(self.paper_size.dimensions_mm());
        let page_w = Mm(width_mm as f32);
        let page_h = Mm(height_mm as f32);

        info!(
            paper = ?self.paper_size,
            orientation = ?self.orientation,
            "Composing image document"
        );

        let mut doc = PdfDocument::new(&self.title);
        let pages = match self.layout {
            ImageLayout::Single => self.lay_out_single(&mut doc, images, page_w, page_h)?,
            ImageLayout::Grid2x2 => self.lay_out_grid(&mut doc, images, page_w, page_h)?,
        };
        doc.with_pages(pages);

        debug!(pages = doc.pages.len(), "Layout complete");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        Ok(output)
    }

    // -- Single layout --------------------------------------------------------

    fn lay_out_single(
        &self,
        doc: &mut PdfDocument,
        images: &[SourceFile],
        page_w: Mm,
        page_h: Mm,
    ) -> Result<Vec<PdfPage>> {
        let page_cell = Cell {
            x_pt: 0.0,
            y_pt: 0.0,
            width_pt: page_w.into_pt().0,
            height_pt: page_h.into_pt().0,
        };

        let total = images.len() as u32;
        let mut pages = Vec::with_capacity(images.len());
        for (index, source) in images.iter().enumerate() {
            self.cancel.check()?;
            self.progress.advance(index as u32, total);
            let placed = register_image(doc, source)?;
            let ops = vec![place_in_cell(&placed, &page_cell, SINGLE_FIT)];
            pages.push(PdfPage::new(page_w, page_h, ops));
        }
        Ok(pages)
    }

    // -- 2x2 grid layout ------------------------------------------------------

    fn lay_out_grid(
        &self,
        doc: &mut PdfDocument,
        images: &[SourceFile],
        page_w: Mm,
        page_h: Mm,
    ) -> Result<Vec<PdfPage>> {
        let page_w_pt = page_w.into_pt().0;
        let page_h_pt = page_h.into_pt().0;
        let cell_w = page_w_pt / 2.0;
        let cell_h = page_h_pt / 2.0;

        let total = images.len() as u32;
        let mut pages = Vec::new();
        let mut ops: Vec<Op> = Vec::new();
        for (index, source) in images.iter().enumerate() {
            self.cancel.check()?;
            self.progress.advance(index as u32, total);
            let placed = register_image(doc, source)?;

            // Reading order: top-left, top-right, bottom-left, bottom-right.
            let slot = index % 4;
            let column = (slot % 2) as f32;
            let row = (slot / 2) as f32;
            let cell = Cell {
                x_pt: column * cell_w,
                y_pt: page_h_pt - (row + 1.0) * cell_h,
                width_pt: cell_w,
                height_pt: cell_h,
            };
            ops.push(place_in_cell(&placed, &cell, GRID_FIT));

            if slot == 3 {
                pages.push(PdfPage::new(page_w, page_h, std::mem::take(&mut ops)));
            }
        }
        if !ops.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, ops));
        }
        Ok(pages)
    }
}

// -- Image placement -----------------------------------------------------------

struct PlacedImage {
    id: XObjectId,
    width_px: usize,
    height_px: usize,
}

/// A rectangle on the page, in points, origin bottom-left.
struct Cell {
    x_pt: f32,
    y_pt: f32,
    width_pt: f32,
    height_pt: f32,
}

fn register_image(doc: &mut PdfDocument, source: &SourceFile) -> Result<PlacedImage> {
    let decoded = image::load_from_memory(source.bytes())
        .map_err(|err| QuireError::InvalidInput(format!("{}: {}", source.name(), err)))?;
    let width_px = decoded.width() as usize;
    let height_px = decoded.height() as usize;

    let rgb = decoded.to_rgb8();
    let raw = RawImage {
        pixels: RawImageData::U8(rgb.into_raw()),
        width: width_px,
        height: height_px,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    };
    let id = doc.add_image(&raw);
    Ok(PlacedImage {
        id,
        width_px,
        height_px,
    })
}

/// Scale the image to `fit` of the largest aspect-preserving size the cell
/// allows, then centre it. The transform is anchored at 72 dpi, where one
/// pixel is exactly one point, so the scale applies to pixel dimensions
/// directly.
fn place_in_cell(image: &PlacedImage, cell: &Cell, fit: f32) -> Op {
    let image_w_pt = image.width_px as f32;
    let image_h_pt = image.height_px as f32;
    let scale = (cell.width_pt / image_w_pt).min(cell.height_pt / image_h_pt) * fit;
    let drawn_w = image_w_pt * scale;
    let drawn_h = image_h_pt * scale;
    let x = cell.x_pt + (cell.width_pt - drawn_w) / 2.0;
    let y = cell.y_pt + (cell.height_pt - drawn_h) / 2.0;

    Op::UseXobject {
        id: image.id.clone(),
        transform: XObjectTransform {
            translate_x: Some(Pt(x)),
            translate_y: Some(Pt(y)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(72.0),
            rotate: None,
        },
    }
}
