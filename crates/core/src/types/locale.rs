//! Supported UI locales and language negotiation.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A locale the front end has messages for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    /// English (United States).
    #[serde(rename = "en-US")]
    EnUs,
    /// Simplified Chinese.
    #[default]
    #[serde(rename = "zh-CN")]
    ZhCn,
}

impl Locale {
    /// Every supported locale, in display order.
    pub const ALL: [Self; 2] = [Self::EnUs, Self::ZhCn];

    /// The BCP 47 tag, e.g. `en-US`.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhCn => "zh-CN",
        }
    }

    /// The locale's own name for itself.
    #[must_use]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::EnUs => "English",
            Self::ZhCn => "简体中文",
        }
    }

    /// Exact (case-insensitive) tag match.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|l| l.tag().eq_ignore_ascii_case(tag.trim()))
    }

    /// Match a requested tag against the supported locales.
    ///
    /// An exact match wins; otherwise the first locale sharing the base
    /// language (`en-GB` → `en-US`, `zh` → `zh-CN`).
    ///
    /// ```
    /// use portal_core::Locale;
    ///
    /// assert_eq!(Locale::negotiate("en-GB"), Some(Locale::EnUs));
    /// assert_eq!(Locale::negotiate("fr-FR"), None);
    /// ```
    #[must_use]
    pub fn negotiate(tag: &str) -> Option<Self> {
        if let Some(exact) = Self::from_tag(tag) {
            return Some(exact);
        }
        let base = tag.trim().split(['-', '_']).next()?;
        if base.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|l| {
            l.tag()
                .split('-')
                .next()
                .is_some_and(|b| b.eq_ignore_ascii_case(base))
        })
    }

    /// Pick a locale from an `Accept-Language` header value.
    ///
    /// Entries are tried in descending `q` order (ties keep header order);
    /// entries with `q=0` and the `*` wildcard are skipped.
    #[must_use]
    pub fn from_accept_language(header: &str) -> Option<Self> {
        let mut ranges: Vec<(&str, f32)> = header
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.split(';');
                let tag = parts.next()?.trim();
                let q = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                (!tag.is_empty() && tag != "*" && q > 0.0).then_some((tag, q))
            })
            .collect();
        ranges.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranges.into_iter().find_map(|(tag, _)| Self::negotiate(tag))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_simplified_chinese() {
        assert_eq!(Locale::default(), Locale::ZhCn);
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        assert_eq!(Locale::from_tag("EN-us"), Some(Locale::EnUs));
        assert_eq!(Locale::from_tag("en"), None);
    }

    #[test]
    fn test_negotiate_base_language() {
        assert_eq!(Locale::negotiate("en"), Some(Locale::EnUs));
        assert_eq!(Locale::negotiate("zh-TW"), Some(Locale::ZhCn));
        assert_eq!(Locale::negotiate("zh_HK"), Some(Locale::ZhCn));
        assert_eq!(Locale::negotiate("de-DE"), None);
        assert_eq!(Locale::negotiate(""), None);
    }

    #[test]
    fn test_accept_language_respects_quality() {
        let header = "fr-FR;q=0.9, en-GB;q=0.8, zh-CN;q=0.85";
        assert_eq!(Locale::from_accept_language(header), Some(Locale::ZhCn));

        let header = "de, en;q=0.5";
        assert_eq!(Locale::from_accept_language(header), Some(Locale::EnUs));
    }

    #[test]
    fn test_accept_language_skips_wildcard_and_zero_quality() {
        assert_eq!(Locale::from_accept_language("*, en;q=0"), None);
    }

    #[test]
    fn test_serde_uses_tags() {
        let json = serde_json::to_string(&Locale::EnUs).unwrap_or_default();
        assert_eq!(json, "\"en-US\"");
    }
}
