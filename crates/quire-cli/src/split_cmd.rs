// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `quire split` — write each page of a document as its own file.

use std::path::Path;

use quire_core::SourceFile;
use quire_core::error::Result;
use quire_pdf::DocumentAssembler;
use tracing::info;

use crate::cli::display_name;

pub fn run(file: &Path, out_dir: &Path, prefix: &str) -> Result<()> {
    let bytes = std::fs::read(file)?;
    let source = SourceFile::pdf(display_name(file), bytes)?;

    let parts = DocumentAssembler::new().split_all(&source)?;
    std::fs::create_dir_all(out_dir)?;
    for part in &parts {
        let name = format!("{}-{:03}.pdf", prefix, part.page_index + 1);
        std::fs::write(out_dir.join(&name), &part.bytes)?;
    }
    info!(pages = parts.len(), dir = %out_dir.display(), "Split written");
    Ok(())
}
