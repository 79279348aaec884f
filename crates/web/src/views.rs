//! View models shared by the page templates.

use portal_core::{Locale, Paginated, SessionUser, Theme};
use url::form_urlencoded;

use crate::api::Filters;
use crate::i18n::Translator;
use crate::middleware::Preferences;

/// Page sizes offered under list views.
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 20, 50, 100];

/// Everything `base.html` needs: language, theme, navigation and user.
#[derive(Debug, Clone)]
pub struct Layout {
    translator: Translator,
    /// `lang` attribute, e.g. `zh-CN`.
    pub lang: &'static str,
    /// Stored theme choice (`light`, `dark`, `system`).
    pub theme: &'static str,
    /// Resolved color scheme class for `<html>`.
    pub scheme_class: &'static str,
    pub has_user: bool,
    pub user_name: String,
    pub current_path: String,
}

impl Layout {
    #[must_use]
    pub fn new(prefs: &Preferences, user: Option<&SessionUser>, current_path: &str) -> Self {
        Self {
            translator: prefs.translator(),
            lang: prefs.locale.tag(),
            theme: prefs.theme.as_str(),
            scheme_class: prefs.color_scheme().css_class(),
            has_user: user.is_some(),
            user_name: user.map(|u| u.name.clone()).unwrap_or_default(),
            current_path: current_path.to_string(),
        }
    }

    /// Translate a message key.
    #[must_use]
    pub fn t<'a>(&self, key: &'a str) -> &'a str {
        self.translator.get(key)
    }

    /// The translator behind [`Layout::t`].
    #[must_use]
    pub const fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Whether a navigation link points at the current page.
    #[must_use]
    pub fn is_active(&self, href: &str) -> bool {
        if href == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(href)
        }
    }

    /// Locale choices for the language switcher.
    #[must_use]
    pub fn locales(&self) -> Vec<ChoiceOption> {
        Locale::ALL
            .iter()
            .map(|l| ChoiceOption {
                value: l.tag(),
                label: l.native_name().to_string(),
                selected: l.tag() == self.lang,
            })
            .collect()
    }

    /// Theme choices for the theme switcher, labelled in the page language.
    #[must_use]
    pub fn themes(&self) -> Vec<ChoiceOption> {
        Theme::ALL
            .iter()
            .map(|theme| ChoiceOption {
                value: theme.as_str(),
                label: self.translator.get(theme_key(*theme)).to_string(),
                selected: theme.as_str() == self.theme,
            })
            .collect()
    }
}

const fn theme_key(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "theme.light",
        Theme::Dark => "theme.dark",
        Theme::System => "theme.system",
    }
}

/// One `<option>` of a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub value: &'static str,
    pub label: String,
    pub selected: bool,
}

/// A page-size link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitLink {
    pub value: u32,
    pub href: String,
    pub selected: bool,
}

/// Pagination controls under a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNav {
    pub page: u32,
    pub total_pages: u64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_href: String,
    pub next_href: String,
    /// "Showing 11 to 20 of 42 results"
    pub showing: String,
    pub limits: Vec<LimitLink>,
}

impl PageNav {
    /// Controls for `page` of the list at `base_path`, keeping `filters` in
    /// every link.
    #[must_use]
    pub fn new<T>(
        base_path: &str,
        page: &Paginated<T>,
        filters: &Filters,
        translator: &Translator,
    ) -> Self {
        let href = |p: u32, limit: u32| page_href(base_path, p, limit, filters);

        let from = if page.data.is_empty() {
            0
        } else {
            u64::from(page.page - 1) * u64::from(page.limit) + 1
        };
        let to = (from + page.data.len() as u64).saturating_sub(1).max(from);
        let showing = translator.format(
            "pagination.showing",
            &[
                ("from", &from.to_string()),
                ("to", &to.to_string()),
                ("total", &page.total.to_string()),
            ],
        );

        Self {
            page: page.page,
            total_pages: page.total_pages(),
            has_prev: page.has_prev(),
            has_next: page.has_next(),
            prev_href: href(page.page.saturating_sub(1).max(1), page.limit),
            next_href: href(page.page.saturating_add(1), page.limit),
            showing,
            limits: PAGE_SIZE_OPTIONS
                .iter()
                .map(|&value| LimitLink {
                    value,
                    href: href(1, value),
                    selected: value == page.limit,
                })
                .collect(),
        }
    }
}

/// `base_path?page=..&limit=..&<filters>` with form encoding.
#[must_use]
pub fn page_href(base_path: &str, page: u32, limit: u32, filters: &Filters) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("page", &page.to_string());
    query.append_pair("limit", &limit.to_string());
    for (key, value) in filters {
        query.append_pair(key, value);
    }
    format!("{base_path}?{}", query.finish())
}

/// A filter's current value, or empty.
#[must_use]
pub fn filter_value(filters: &Filters, key: &str) -> String {
    filters
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use axum::http::HeaderMap;

    fn english() -> Translator {
        Translator::new(Locale::EnUs, Locale::EnUs)
    }

    fn page_of(len: u32, page: u32, limit: u32, total: u64) -> Paginated<u32> {
        Paginated {
            data: (0..len).collect(),
            total,
            page,
            limit,
        }
    }

    #[test]
    fn test_page_href_encodes_filters() {
        let filters = vec![("search".to_string(), "a&b c".to_string())];
        assert_eq!(
            page_href("/dashboard/users", 2, 20, &filters),
            "/dashboard/users?page=2&limit=20&search=a%26b+c"
        );
    }

    #[test]
    fn test_page_nav_middle_page() {
        let nav = PageNav::new("/x", &page_of(10, 2, 10, 42), &Filters::new(), &english());
        assert_eq!(nav.showing, "Showing 11 to 20 of 42 results");
        assert!(nav.has_prev && nav.has_next);
        assert_eq!(nav.total_pages, 5);
        assert_eq!(nav.prev_href, "/x?page=1&limit=10");
        assert_eq!(nav.next_href, "/x?page=3&limit=10");
        assert!(nav.limits.iter().any(|l| l.selected && l.value == 10));
    }

    #[test]
    fn test_page_nav_empty_list() {
        let nav = PageNav::new("/x", &page_of(0, 1, 10, 0), &Filters::new(), &english());
        assert_eq!(nav.showing, "Showing 0 to 0 of 0 results");
        assert!(!nav.has_prev && !nav.has_next);
    }

    #[test]
    fn test_layout_active_links_and_user() {
        let prefs = Preferences::from_headers(&HeaderMap::new(), Locale::EnUs);
        let user = SessionUser {
            id: 1.into(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: "admin".to_string(),
        };
        let layout = Layout::new(&prefs, Some(&user), "/dashboard/users");

        assert!(layout.is_active("/dashboard"));
        assert!(!layout.is_active("/"));
        assert!(layout.has_user);
        assert_eq!(layout.user_name, "Ada");
        assert_eq!(layout.lang, "en-US");
        assert_eq!(layout.t("nav.settings"), "Settings");
        assert_eq!(layout.themes().iter().filter(|o| o.selected).count(), 1);
    }
}
