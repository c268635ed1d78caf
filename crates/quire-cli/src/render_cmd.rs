// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `quire render` — rasterize document pages to image files.

use std::path::Path;
use std::sync::Arc;

use quire_core::error::Result;
use quire_core::{PageSelection, SourceFile};
use quire_engine::{EngineConfig, EngineProvider};
use quire_pdf::{RenderOptions, Rasterizer, assembler};
use tracing::{info, warn};

use crate::cli::{FormatArg, display_name};

pub fn run(
    file: &Path,
    pages: Option<&str>,
    scale: f32,
    format: FormatArg,
    quality: u8,
    out_dir: &Path,
    prefix: &str,
) -> Result<()> {
    let bytes = std::fs::read(file)?;
    let source = SourceFile::pdf(display_name(file), bytes)?;
    let page_total = assembler::page_count(&source)?;

    let selection = match pages {
        Some(spec) => PageSelection::parse(spec, page_total),
        None => PageSelection::all(page_total),
    };
    for warning in selection.warnings() {
        warn!(%warning, "Ignored selection token");
    }

    let provider = Arc::new(EngineProvider::new(EngineConfig::default()));
    let options = RenderOptions {
        scale,
        format: format.to_raster_format(quality),
    };
    let batch = Rasterizer::new(provider)
        .with_options(options)
        .rasterize(&source, &selection)?;

    std::fs::create_dir_all(out_dir)?;
    for image in batch.images() {
        let name = format!(
            "{}-{:03}.{}",
            prefix,
            image.page_index() + 1,
            image.format().extension()
        );
        std::fs::write(out_dir.join(&name), image.bytes())?;
    }
    for failure in batch.failures() {
        warn!(page = failure.page_index + 1, detail = %failure.detail, "Page skipped");
    }
    info!(
        rendered = batch.images().len(),
        failed = batch.failures().len(),
        dir = %out_dir.display(),
        "Render written"
    );
    Ok(())
}
