// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `quire merge` — combine PDF files into one document.

use std::path::{Path, PathBuf};

use quire_core::error::Result;
use quire_core::{SourceFile, SourceList};
use quire_pdf::DocumentAssembler;
use tracing::info;

use crate::cli::display_name;

pub fn run(files: &[PathBuf], output: &Path) -> Result<()> {
    let mut sources = SourceList::new();
    for path in files {
        let bytes = std::fs::read(path)?;
        sources.push(SourceFile::pdf(display_name(path), bytes)?);
    }

    let merged = DocumentAssembler::new().merge(&sources)?;
    std::fs::write(output, merged)?;
    info!(inputs = files.len(), output = %output.display(), "Merge written");
    Ok(())
}
