// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every pipeline error maps to plain English with a clear suggestion.
// Three severity levels drive presentation and retry affordances.

use crate::error::QuireError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip, timeout: safe to retry automatically.
    Transient,
    /// User must change something (pick a different file, fix the range).
    ActionRequired,
    /// Cannot be fixed by retrying: damaged file, unsupported format.
    Permanent,
}

/// A plain-English error with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the system should auto-retry.
    pub retriable: bool,
    /// Severity level (drives icon/colour in a UI).
    pub severity: Severity,
}

/// Convert a `QuireError` into a `HumanError`.
pub fn humanize_error(err: &QuireError) -> HumanError {
    match err {
        QuireError::InvalidInput(detail) => HumanError {
            message: "This file isn't the right type.".into(),
            suggestion: format!(
                "Pick a PDF for document operations, or a JPEG/PNG for composition. ({detail})"
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuireError::Parse(detail) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: format!(
                "The file may be damaged. Try opening it in a viewer to check it works, or use a different copy. ({detail})"
            ),
            retriable: false,
            severity: Severity::Permanent,
        },

        QuireError::EmptySelection => HumanError {
            message: "No pages matched your selection.".into(),
            suggestion: "Check the page numbers. A selection like 1-3,5 must name pages that exist in the document.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuireError::EngineLoad(detail) => HumanError {
            message: "The page renderer couldn't be loaded.".into(),
            suggestion: format!("Check your network connection and try again. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        QuireError::Render { page, .. } => HumanError {
            message: format!("Page {} couldn't be rendered.", page + 1),
            suggestion: "The page may be damaged or unusually complex. Any other requested pages were still processed.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        QuireError::Encode(detail) => HumanError {
            message: "The output couldn't be encoded.".into(),
            suggestion: format!("Try a different output format, for example PNG instead of JPEG. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        QuireError::Cancelled => HumanError {
            message: "The operation was stopped.".into(),
            suggestion: "Nothing was written. Run it again if you didn't mean to cancel.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        QuireError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to read or write that file.".into(),
                    suggestion: "Check the file permissions, or try a different location.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        QuireError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}
