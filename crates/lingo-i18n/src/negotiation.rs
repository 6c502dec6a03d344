//! Language tag canonicalization and `Accept-Language` parsing

use lingo_common::LanguageCode;
use std::cmp::Ordering;
use unic_langid::LanguageIdentifier;

/// Parses a BCP 47-ish tag with `unic-langid` and returns it canonically cased.
///
/// Accepts `_` separators (`zh_tw`). Returns `None` for anything that is
/// not a well-formed tag.
pub fn canonicalize_tag(raw: &str) -> Option<LanguageCode> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let identifier: LanguageIdentifier = raw.parse().ok()?;
    LanguageCode::parse(&identifier.to_string()).ok()
}

/// One entry of an `Accept-Language` header.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageRange {
    /// The requested tag; `None` for the `*` wildcard.
    pub code: Option<LanguageCode>,
    /// Quality weight in `0.0..=1.0`.
    pub quality: f32,
}

/// Parses an `Accept-Language` header into ranges ordered by preference.
///
/// Malformed entries are skipped, as are entries with `q=0`. Entries with
/// equal weight keep their header order.
pub fn parse_accept_language(header: &str) -> Vec<LanguageRange> {
    let mut ranges: Vec<LanguageRange> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() {
                return None;
            }

            let mut quality = 1.0_f32;
            for param in parts {
                let param = param.trim();
                if let Some(value) = param.strip_prefix("q=").or_else(|| param.strip_prefix("Q=")) {
                    quality = value.trim().parse::<f32>().ok().filter(|q| q.is_finite())?;
                }
            }
            let quality = quality.clamp(0.0, 1.0);
            if quality <= 0.0 {
                return None;
            }

            let code = if tag == "*" {
                None
            } else {
                Some(canonicalize_tag(tag)?)
            };
            Some(LanguageRange { code, quality })
        })
        .collect();

    ranges.sort_by(|a, b| b.quality.partial_cmp(&a.quality).unwrap_or(Ordering::Equal));
    ranges
}
