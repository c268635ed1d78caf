// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Quire.

use thiserror::Error;

/// Top-level error type for all Quire operations.
///
/// Structural failures (`InvalidInput`, `Parse`) abort the whole operation
/// with no partial output. A `Render` failure is recovered per page by the
/// rasterizer; it only reaches callers who ask for strict behaviour.
#[derive(Debug, Error)]
pub enum QuireError {
    // -- Input validation --
    #[error("unsupported input format: {0}")]
    InvalidInput(String),

    #[error("document failed to parse: {0}")]
    Parse(String),

    #[error("page selection resolved to zero pages")]
    EmptySelection,

    // -- Rendering --
    #[error("rendering engine unavailable: {0}")]
    EngineLoad(String),

    /// `page` is the zero-based page index.
    #[error("page {page} failed to render: {detail}")]
    Render { page: u32, detail: String },

    #[error("encoding failed: {0}")]
    Encode(String),

    // -- Control --
    #[error("operation cancelled")]
    Cancelled,

    // -- I/O / serialization --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QuireError>;
