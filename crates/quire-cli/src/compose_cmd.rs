// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `quire compose` — build a PDF document out of image files.

use std::path::{Path, PathBuf};

use quire_core::SourceFile;
use quire_core::error::Result;
use quire_pdf::Compositor;
use tracing::info;

use crate::cli::{LayoutArg, OrientationArg, PaperArg, display_name};

pub fn run(
    images: &[PathBuf],
    page_size: PaperArg,
    orientation: OrientationArg,
    layout: LayoutArg,
    title: &str,
    output: &Path,
) -> Result<()> {
    let mut sources = Vec::with_capacity(images.len());
    for path in images {
        let bytes = std::fs::read(path)?;
        sources.push(SourceFile::image(display_name(path), bytes)?);
    }

    let composed = Compositor::new()
        .with_paper(page_size.to_paper_size(), orientation.to_orientation())
        .with_layout(layout.to_layout())
        .with_title(title)
        .compose(&sources)?;
    std::fs::write(output, composed)?;
    info!(images = sources.len(), output = %output.display(), "Composition written");
    Ok(())
}
