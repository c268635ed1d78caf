// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range parsing — "1-3,5" style selections over a bounded page count.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Why a token contributed no pages, or fewer than written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarnReason {
    /// Not a number or an `A-B` pair.
    Malformed,
    /// Range written back to front (`5-2`).
    Reversed,
    /// Page number(s) outside `1..=page_count`.
    OutOfBounds,
}

impl std::fmt::Display for WarnReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Malformed => "not a page number or range",
            Self::Reversed => "range is reversed",
            Self::OutOfBounds => "outside the document",
        };
        write!(f, "{text}")
    }
}

/// A token that was dropped or clipped while parsing a selection string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeWarning {
    /// The token as written, trimmed.
    pub token: String,
    pub reason: WarnReason,
}

impl std::fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" ({})", self.token, self.reason)
    }
}

/// Validated, deduplicated, ascending set of zero-based page indices.
///
/// Construct through [`PageSelection::parse`] or [`PageSelection::all`];
/// the index list never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    indices: Vec<u32>,
    warnings: Vec<RangeWarning>,
}

impl PageSelection {
    /// Parse a selection like `"1-3,5"` against a `page_count`-page document.
    ///
    /// Tokens are comma-separated, trimmed, and either a single 1-based page
    /// number or an `A-B` range with `A <= B`. Out-of-bounds numbers are
    /// filtered individually, so a range is clipped rather than rejected;
    /// malformed and reversed tokens are skipped. Parsing never fails:
    /// anything dropped is reported in [`warnings`](Self::warnings), and an
    /// unusable selection simply comes back empty. Callers decide whether an
    /// empty selection is an error.
    pub fn parse(spec: &str, page_count: u32) -> Self {
        let mut seen = BTreeSet::new();
        let mut warnings = Vec::new();

        for raw in spec.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }

            if let Some((start, end)) = token.split_once('-') {
                match (start.trim().parse::<u32>(), end.trim().parse::<u32>()) {
                    (Ok(a), Ok(b)) if a > b => warnings.push(RangeWarning {
                        token: token.to_owned(),
                        reason: WarnReason::Reversed,
                    }),
                    (Ok(a), Ok(b)) => {
                        let lo = a.max(1);
                        let hi = b.min(page_count);
                        if a < lo || b > hi {
                            warnings.push(RangeWarning {
                                token: token.to_owned(),
                                reason: WarnReason::OutOfBounds,
                            });
                        }
                        for page in lo..=hi {
                            seen.insert(page - 1);
                        }
                    }
                    _ => warnings.push(RangeWarning {
                        token: token.to_owned(),
                        reason: WarnReason::Malformed,
                    }),
                }
            } else {
                match token.parse::<u32>() {
                    Ok(page) if (1..=page_count).contains(&page) => {
                        seen.insert(page - 1);
                    }
                    Ok(_) => warnings.push(RangeWarning {
                        token: token.to_owned(),
                        reason: WarnReason::OutOfBounds,
                    }),
                    Err(_) => warnings.push(RangeWarning {
                        token: token.to_owned(),
                        reason: WarnReason::Malformed,
                    }),
                }
            }
        }

        Self {
            indices: seen.into_iter().collect(),
            warnings,
        }
    }

    /// Every page of a `page_count`-page document, in order.
    pub fn all(page_count: u32) -> Self {
        Self {
            indices: (0..page_count).collect(),
            warnings: Vec::new(),
        }
    }

    /// Zero-based page indices, ascending, no duplicates.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Tokens that were dropped or clipped during parsing.
    pub fn warnings(&self) -> &[RangeWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().copied()
    }

    /// Largest index, if any.
    pub fn max_index(&self) -> Option<u32> {
        self.indices.last().copied()
    }
}

impl<'a> IntoIterator for &'a PageSelection {
    type Item = u32;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, u32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(spec: &str, page_count: u32) -> Vec<u32> {
        PageSelection::parse(spec, page_count).indices().to_vec()
    }

    #[test]
    fn range_and_single_combine() {
        assert_eq!(indices("1-3,5", 10), vec![0, 1, 2, 4]);
    }

    #[test]
    fn out_of_range_single_is_dropped() {
        assert_eq!(indices("1-3,5", 3), vec![0, 1, 2]);
    }

    #[test]
    fn reversed_range_is_skipped() {
        let sel = PageSelection::parse("5-2", 10);
        assert!(sel.is_empty());
        assert_eq!(sel.warnings().len(), 1);
        assert_eq!(sel.warnings()[0].reason, WarnReason::Reversed);
    }

    #[test]
    fn empty_spec_is_empty() {
        let sel = PageSelection::parse("", 10);
        assert!(sel.is_empty());
        assert!(sel.warnings().is_empty());
    }

    #[test]
    fn overlapping_tokens_dedup() {
        assert_eq!(indices("1-4,3-6", 10), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn unordered_input_sorts_ascending() {
        assert_eq!(indices("9,1,5", 10), vec![0, 4, 8]);
    }

    #[test]
    fn range_clips_to_page_count() {
        let sel = PageSelection::parse("8-15", 10);
        assert_eq!(sel.indices(), &[7, 8, 9]);
        assert_eq!(sel.warnings().len(), 1);
        assert_eq!(sel.warnings()[0].reason, WarnReason::OutOfBounds);
    }

    #[test]
    fn fully_out_of_range_is_empty_with_warning() {
        let sel = PageSelection::parse("20", 10);
        assert!(sel.is_empty());
        assert_eq!(sel.warnings()[0].reason, WarnReason::OutOfBounds);
    }

    #[test]
    fn malformed_tokens_are_reported() {
        let sel = PageSelection::parse("abc,2,x-3", 5);
        assert_eq!(sel.indices(), &[1]);
        assert_eq!(sel.warnings().len(), 2);
        assert!(
            sel.warnings()
                .iter()
                .all(|w| w.reason == WarnReason::Malformed)
        );
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(indices(" 3-5 , 8 ", 10), vec![2, 3, 4, 7]);
    }

    #[test]
    fn zero_is_out_of_bounds() {
        let sel = PageSelection::parse("0", 10);
        assert!(sel.is_empty());
        assert_eq!(sel.warnings()[0].reason, WarnReason::OutOfBounds);
    }

    #[test]
    fn range_touching_zero_is_clipped() {
        let sel = PageSelection::parse("0-2", 10);
        assert_eq!(sel.indices(), &[0, 1]);
        assert_eq!(sel.warnings()[0].reason, WarnReason::OutOfBounds);
    }

    #[test]
    fn huge_range_clips_without_expanding() {
        // The loop must be bounded by page_count, not by the written range.
        let sel = PageSelection::parse("1-4294967295", 3);
        assert_eq!(sel.indices(), &[0, 1, 2]);
    }

    #[test]
    fn all_covers_every_page() {
        let sel = PageSelection::all(4);
        assert_eq!(sel.indices(), &[0, 1, 2, 3]);
        assert!(sel.warnings().is_empty());
    }

    #[test]
    fn all_of_zero_pages_is_empty() {
        assert!(PageSelection::all(0).is_empty());
    }
}
