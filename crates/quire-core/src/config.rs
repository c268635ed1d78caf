// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use serde::{Deserialize, Serialize};

/// Default working resolution for rasterization (page points to pixels).
///
/// Balances fidelity against memory and time for typical page sizes.
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

/// Default JPEG encode quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Tunable settings for the document pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Scale factor applied to page dimensions in points when rasterizing.
    pub render_scale: f32,
    /// Quality used when encoding lossy raster output.
    pub jpeg_quality: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            render_scale: DEFAULT_RENDER_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}
