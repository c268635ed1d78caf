// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization — renders PDF pages to encoded images through the
// PDFium engine.

use std::io::Cursor;
use std::sync::Arc;

use image::DynamicImage;
use image::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use pdfium_render::prelude::*;
use quire_core::config::DEFAULT_RENDER_SCALE;
use quire_core::error::Result;
use quire_core::{
    CancelToken, PageSelection, PipelineConfig, Progress, QuireError, RasterFormat, SourceFile,
};
use quire_engine::EngineProvider;
use tracing::{info, instrument, warn};

/// How pages are rendered and encoded.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Viewport multiplier over the page's natural point size.
    pub scale: f32,
    pub format: RasterFormat,
}

impl RenderOptions {
    /// Options derived from pipeline settings, encoding as JPEG at the
    /// configured quality.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            scale: config.render_scale,
            format: RasterFormat::Jpeg {
                quality: config.jpeg_quality,
            },
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_RENDER_SCALE,
            format: RasterFormat::default(),
        }
    }
}

/// One successfully rendered page.
#[derive(Debug, Clone)]
pub struct RasterImage {
    page_index: u32,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
    format: RasterFormat,
}

impl RasterImage {
    /// Zero-based index of the page this image came from.
    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoded image data in [`format`](Self::format).
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> RasterFormat {
        self.format
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A page that failed to render, with the failure kept local to it.
#[derive(Debug, Clone)]
pub struct PageFailure {
    /// Zero-based index of the failed page.
    pub page_index: u32,
    pub detail: String,
}

/// Outcome of rasterizing a document: rendered pages plus any per-page
/// failures. A failed page never aborts its siblings.
#[derive(Debug, Clone, Default)]
pub struct RasterBatch {
    images: Vec<RasterImage>,
    failures: Vec<PageFailure>,
}

impl RasterBatch {
    pub fn images(&self) -> &[RasterImage] {
        &self.images
    }

    pub fn failures(&self) -> &[PageFailure] {
        &self.failures
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_parts(self) -> (Vec<RasterImage>, Vec<PageFailure>) {
        (self.images, self.failures)
    }
}

/// Renders document pages to images, sequentially and in page order.
///
/// The engine is resolved once through the shared [`EngineProvider`]; each
/// operation then binds its own engine instance, keeping the rasterizer
/// itself `Send + Sync`.
pub struct Rasterizer {
    provider: Arc<EngineProvider>,
    options: RenderOptions,
    cancel: CancelToken,
    progress: Progress,
}

impl Rasterizer {
    pub fn new(provider: Arc<EngineProvider>) -> Self {
        Self {
            provider,
            options: RenderOptions::default(),
            cancel: CancelToken::new(),
            progress: Progress::new(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
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

    /// Render the selected pages of `source`, in ascending page order.
    ///
    /// Pages that fail to render or encode are reported in the batch instead
    /// of failing the operation; only an empty selection, engine acquisition,
    /// an unparseable document, or cancellation abort it outright.
    pub fn rasterize(&self, source: &SourceFile, selection: &PageSelection) -> Result<RasterBatch> {
        self.progress.track(|| self.rasterize_inner(source, selection))
    }

    #[instrument(skip(self, source, selection), fields(source = source.name(), pages = selection.len(), scale = self.options.scale))]
    fn rasterize_inner(
        &self,
        source: &SourceFile,
        selection: &PageSelection,
    ) -> Result<RasterBatch> {
        self.cancel.check()?;
        if selection.is_empty() {
            return Err(QuireError::EmptySelection);
        }
        let handle = self.provider.acquire()?;
        let engine = handle.bind()?;
        let document = engine
            .load_pdf_from_byte_slice(source.bytes(), None)
            .map_err(|err| QuireError::Parse(format!("{}: {}", source.name(), err)))?;

        let page_total = u32::from(document.pages().len());
        let selected = selection.len() as u32;
        let mut batch = RasterBatch::default();
        for (done, page_index) in selection.iter().enumerate() {
            self.cancel.check()?;
            self.progress.advance(done as u32, selected);
            // A selection parsed against stale metadata can outrun the
            // document; that is a per-page failure, not a fatal one.
            if page_index >= page_total {
                warn!(page = page_index, "Selected page is out of range");
                batch.failures.push(PageFailure {
                    page_index,
                    detail: format!(
                        "page {} out of range ({} page(s))",
                        page_index + 1,
                        page_total
                    ),
                });
                continue;
            }
            match self.render_page(&document, page_index as u16) {
                Ok(image) => batch.images.push(image),
                Err(err) => {
                    warn!(page = page_index, error = %err, "Page failed to render");
                    batch.failures.push(PageFailure {
                        page_index,
                        detail: err.to_string(),
                    });
                }
            }
        }

        info!(
            rendered = batch.images.len(),
            failed = batch.failures.len(),
            "Rasterization complete"
        );
        Ok(batch)
    }

    /// Render a single page of `source`. Usable on its own, so callers can
    /// schedule pages individually.
    pub fn rasterize_page(&self, source: &SourceFile, page_index: u32) -> Result<RasterImage> {
        self.cancel.check()?;
        let handle = self.provider.acquire()?;
        let engine = handle.bind()?;
        let document = engine
            .load_pdf_from_byte_slice(source.bytes(), None)
            .map_err(|err| QuireError::Parse(format!("{}: {}", source.name(), err)))?;

        let page_total = u32::from(document.pages().len());
        if page_index >= page_total {
            return Err(QuireError::InvalidInput(format!(
                "page {} out of range for {} ({} page(s))",
                page_index + 1,
                source.name(),
                page_total
            )));
        }
        self.render_page(&document, page_index as u16)
    }

    fn render_page(&self, document: &PdfDocument<'_>, index: u16) -> Result<RasterImage> {
        let page = document.pages().get(index).map_err(|err| QuireError::Render {
            page: u32::from(index),
            detail: err.to_string(),
        })?;

        let target_width = (page.width().value * self.options.scale) as i32;
        let target_height = (page.height().value * self.options.scale) as i32;
        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width.max(1))
            .set_target_height(target_height.max(1));

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|err| QuireError::Render {
                page: u32::from(index),
                detail: err.to_string(),
            })?;
        let image = bitmap.as_image();

        encode_image(&image, u32::from(index), self.options.format)
    }
}

fn encode_image(image: &DynamicImage, page_index: u32, format: RasterFormat) -> Result<RasterImage> {
    let mut bytes = Vec::new();
    match format {
        RasterFormat::Jpeg { quality } => {
            let rgb = image.to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
            rgb.write_with_encoder(encoder)
                .map_err(|err| QuireError::Encode(format!("JPEG encoding failed: {}", err)))?;
        }
        RasterFormat::Png => {
            image
                .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                .map_err(|err| QuireError::Encode(format!("PNG encoding failed: {}", err)))?;
        }
    }
    Ok(RasterImage {
        page_index,
        width: image.width(),
        height: image.height(),
        bytes,
        format,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use lopdf::{Document, Object, dictionary};
    use quire_core::Phase;
    use quire_engine::EngineConfig;

    use super::*;

    /// One blank US-Letter page (612 x 792 pt).
    fn blank_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(lopdf::Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Resources" => dictionary! {},
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
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

    /// A provider that fails fast without touching the network stack's
    /// real mirrors or any local library.
    fn unavailable_provider(cache_dir: &std::path::Path) -> Arc<EngineProvider> {
        Arc::new(EngineProvider::new(EngineConfig {
            search_local: false,
            primary_mirror: "http://127.0.0.1:1/primary".to_owned(),
            secondary_mirror: "http://127.0.0.1:1/secondary".to_owned(),
            cache_dir: cache_dir.to_path_buf(),
            settle_delay: Duration::ZERO,
            probe_attempts: 1,
            probe_delay: Duration::ZERO,
            acquire_timeout: Duration::from_secs(5),
            download_timeout: Duration::from_millis(250),
            ..EngineConfig::default()
        }))
    }

    #[test]
    fn default_options_use_double_scale_and_jpeg() {
        let options = RenderOptions::default();
        assert_eq!(options.scale, 2.0);
        assert!(matches!(options.format, RasterFormat::Jpeg { quality: 85 }));
    }

    #[test]
    fn options_follow_pipeline_config() {
        let config = PipelineConfig {
            render_scale: 3.0,
            jpeg_quality: 60,
        };
        let options = RenderOptions::from_config(&config);
        assert_eq!(options.scale, 3.0);
        assert!(matches!(options.format, RasterFormat::Jpeg { quality: 60 }));
    }

    #[test]
    fn empty_selection_short_circuits_before_the_engine() {
        let cache = tempfile::tempdir().unwrap();
        let rasterizer = Rasterizer::new(unavailable_provider(cache.path()));
        let source = SourceFile::pdf("doc.pdf", blank_pdf()).unwrap();

        let err = rasterizer
            .rasterize(&source, &PageSelection::parse("", 5))
            .unwrap_err();
        assert!(matches!(err, QuireError::EmptySelection));
    }

    #[test]
    fn engine_failure_aborts_the_whole_operation() {
        let cache = tempfile::tempdir().unwrap();
        let rasterizer = Rasterizer::new(unavailable_provider(cache.path()));
        let source = SourceFile::pdf("doc.pdf", blank_pdf()).unwrap();

        let err = rasterizer
            .rasterize(&source, &PageSelection::all(1))
            .unwrap_err();
        assert!(matches!(err, QuireError::EngineLoad(_)));
        assert_eq!(rasterizer.progress().phase(), Phase::Failed);
    }

    #[test]
    fn cancellation_wins_over_engine_acquisition() {
        let cache = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let rasterizer = Rasterizer::new(unavailable_provider(cache.path()))
            .with_observers(cancel, Progress::new());
        let source = SourceFile::pdf("doc.pdf", blank_pdf()).unwrap();

        let err = rasterizer
            .rasterize(&source, &PageSelection::all(1))
            .unwrap_err();
        assert!(matches!(err, QuireError::Cancelled));
    }

    #[test]
    fn empty_batch_counts_as_complete() {
        let batch = RasterBatch::default();
        assert!(batch.is_complete());
        assert!(batch.images().is_empty());
    }

    #[test]
    #[ignore = "requires a pdfium library on the host"]
    fn renders_a_page_at_double_scale() {
        let provider = Arc::new(EngineProvider::new(EngineConfig::default()));
        let rasterizer = Rasterizer::new(provider);
        let source = SourceFile::pdf("doc.pdf", blank_pdf()).unwrap();

        let batch = rasterizer
            .rasterize(&source, &PageSelection::all(1))
            .unwrap();
        assert!(batch.is_complete());
        assert_eq!(batch.images().len(), 1);
        let image = &batch.images()[0];
        assert_eq!(image.page_index(), 0);
        assert_eq!(image.width(), 1224);
        assert_eq!(image.height(), 1584);
        assert_eq!(image.format().extension(), "jpg");
    }

    #[test]
    #[ignore = "requires a pdfium library on the host"]
    fn out_of_range_selection_entries_become_page_failures() {
        let provider = Arc::new(EngineProvider::new(EngineConfig::default()));
        let rasterizer = Rasterizer::new(provider);
        let source = SourceFile::pdf("doc.pdf", blank_pdf()).unwrap();

        let batch = rasterizer
            .rasterize(&source, &PageSelection::parse("1-3", 3))
            .unwrap();
        assert_eq!(batch.images().len(), 1);
        assert_eq!(batch.failures().len(), 2);
        assert_eq!(batch.failures()[0].page_index, 1);
    }

    #[test]
    #[ignore = "requires a pdfium library on the host"]
    fn single_page_render_rejects_out_of_range_index() {
        let provider = Arc::new(EngineProvider::new(EngineConfig::default()));
        let rasterizer = Rasterizer::new(provider);
        let source = SourceFile::pdf("doc.pdf", blank_pdf()).unwrap();

        assert!(rasterizer.rasterize_page(&source, 0).is_ok());
        let err = rasterizer.rasterize_page(&source, 5).unwrap_err();
        assert!(matches!(err, QuireError::InvalidInput(_)));
    }
}
