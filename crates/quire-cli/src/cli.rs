// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line argument definitions for the `quire` binary.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use quire_core::config::{DEFAULT_JPEG_QUALITY, DEFAULT_RENDER_SCALE};
use quire_core::{Orientation, PaperSize, RasterFormat};
use quire_pdf::ImageLayout;

/// Merge, split, render, and compose PDF documents.
#[derive(Debug, Parser)]
#[command(name = "quire", about, version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge PDF documents into one, in the order given
    Merge {
        /// Input PDF files
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Output path
        #[arg(short, long, default_value = "merged.pdf")]
        output: PathBuf,
    },

    /// Extract a page selection into a new document
    Extract {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page selection (e.g. '1,3-5'); unusable tokens are skipped
        #[arg(short, long)]
        pages: String,

        /// Output path
        #[arg(short, long, default_value = "extracted.pdf")]
        output: PathBuf,
    },

    /// Split a document into one file per page
    Split {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Directory the page files are written into
        #[arg(short = 'o', long, default_value = ".")]
        out_dir: PathBuf,

        /// Output file name prefix
        #[arg(long, default_value = "page")]
        prefix: String,
    },

    /// Render pages to images
    Render {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page selection (e.g. '1,3-5'); all pages when omitted
        #[arg(short, long)]
        pages: Option<String>,

        /// Viewport scale over the page's natural size
        #[arg(long, default_value_t = DEFAULT_RENDER_SCALE)]
        scale: f32,

        /// Image format
        #[arg(long, value_enum, default_value_t = FormatArg::Jpeg)]
        format: FormatArg,

        /// JPEG quality (1-100)
        #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
        quality: u8,

        /// Directory the image files are written into
        #[arg(short = 'o', long, default_value = ".")]
        out_dir: PathBuf,

        /// Output file name prefix
        #[arg(long, default_value = "page")]
        prefix: String,
    },

    /// Compose images into a PDF document
    Compose {
        /// Input image files, placed in the order given
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,

        /// Paper size
        #[arg(long, value_enum, default_value_t = PaperArg::A4)]
        page_size: PaperArg,

        /// Page orientation
        #[arg(long, value_enum, default_value_t = OrientationArg::Portrait)]
        orientation: OrientationArg,

        /// Page layout
        #[arg(long, value_enum, default_value_t = LayoutArg::Single)]
        layout: LayoutArg,

        /// Document title
        #[arg(long, default_value = "Quire Composition")]
        title: String,

        /// Output path
        #[arg(short, long, default_value = "composed.pdf")]
        output: PathBuf,
    },
}

/// Paper size for composed documents.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PaperArg {
    A4,
    Letter,
    Legal,
}

impl PaperArg {
    pub fn to_paper_size(self) -> PaperSize {
        match self {
            Self::A4 => PaperSize::A4,
            Self::Letter => PaperSize::Letter,
            Self::Legal => PaperSize::Legal,
        }
    }
}

/// Page orientation for composed documents.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OrientationArg {
    Portrait,
    Landscape,
}

impl OrientationArg {
    pub fn to_orientation(self) -> Orientation {
        match self {
            Self::Portrait => Orientation::Portrait,
            Self::Landscape => Orientation::Landscape,
        }
    }
}

/// Image arrangement on composed pages.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LayoutArg {
    /// One image per page
    Single,
    /// Four images per page in a 2x2 grid
    Grid,
}

impl LayoutArg {
    pub fn to_layout(self) -> ImageLayout {
        match self {
            Self::Single => ImageLayout::Single,
            Self::Grid => ImageLayout::Grid2x2,
        }
    }
}

/// Rendered image encoding.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Jpeg,
    Png,
}

impl FormatArg {
    pub fn to_raster_format(self, quality: u8) -> RasterFormat {
        match self {
            Self::Jpeg => RasterFormat::Jpeg { quality },
            Self::Png => RasterFormat::Png,
        }
    }
}

/// File name of `path` for use in error messages and logs.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
