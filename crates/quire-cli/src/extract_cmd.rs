// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `quire extract` — copy a page selection into a new document.

use std::path::Path;

use quire_core::error::Result;
use quire_core::{PageSelection, SourceFile};
use quire_pdf::{DocumentAssembler, assembler};
use tracing::{info, warn};

use crate::cli::display_name;

pub fn run(file: &Path, pages: &str, output: &Path) -> Result<()> {
    let bytes = std::fs::read(file)?;
    let source = SourceFile::pdf(display_name(file), bytes)?;

    let count = assembler::page_count(&source)?;
    let selection = PageSelection::parse(pages, count);
    for warning in selection.warnings() {
        warn!(%warning, "Ignored selection token");
    }

    let extracted = DocumentAssembler::new().extract(&source, &selection)?;
    std::fs::write(output, extracted)?;
    info!(pages = selection.len(), output = %output.display(), "Extraction written");
    Ok(())
}
