// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quire-pdf — Document processing for the Quire pipeline.
//
// Provides document assembly (merge, page extraction, per-page splitting),
// page rasterization through the PDFium engine, and composition of raster
// images into new PDF documents.

pub mod assembler;
pub mod compositor;
pub mod rasterizer;

// Re-export the primary structs so callers can use `quire_pdf::Rasterizer` etc.
pub use assembler::{DocumentAssembler, SplitPage};
pub use compositor::{Compositor, ImageLayout};
pub use rasterizer::{PageFailure, RasterBatch, RasterImage, RenderOptions, Rasterizer};
