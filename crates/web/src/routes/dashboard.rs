//! Dashboard route handlers.
//!
//! All pages here sit behind the route guard and call the backend with the
//! visitor's own token. A backend that rejects the token sends the visitor
//! back to `/login`; any other backend failure renders the page with an
//! error banner instead of failing the request.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use portal_core::{Document, Paginated, RecordId, UserInput, UserRecord};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::api::{ApiError, Filters, split_page_params};
use crate::error::Result;
use crate::filters;
use crate::i18n::Translator;
use crate::middleware::{AuthRejection, AuthToken, CurrentUser, Preferences};
use crate::pagination::Paginator;
use crate::routes::auth::is_local_path;
use crate::state::AppState;
use crate::views::{ChoiceOption, Layout, PageNav, filter_value, page_href};

/// Characters of document content shown in the list.
const EXCERPT_CHARS: usize = 80;

/// Role filter values understood by the backend, with their message keys.
const ROLE_FILTERS: [(&str, &str); 3] = [
    ("admin", "users.admin"),
    ("editor", "users.editor"),
    ("user", "users.user"),
];

/// Status values understood by the backend, with their message keys.
const STATUS_FILTERS: [(&str, &str); 3] = [
    ("active", "users.active"),
    ("inactive", "users.inactive"),
    ("disabled", "users.disabled"),
];

const STATUS_ACTIVE: &str = "active";
const STATUS_DISABLED: &str = "disabled";

// =============================================================================
// View rows
// =============================================================================

/// One line of the recent activity table.
pub struct ActivityRow {
    pub user_id: String,
    pub action: String,
    pub target: String,
    pub timestamp: String,
}

/// One line of the user table.
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub last_login: String,
    pub is_active: bool,
}

impl UserRow {
    fn new(user: UserRecord, t: &Translator) -> Self {
        Self {
            id: user.id.to_string(),
            is_active: user.status == STATUS_ACTIVE,
            status: label_for(&STATUS_FILTERS, &user.status, t),
            role: label_for(&ROLE_FILTERS, &user.role, t),
            last_login: user
                .last_login
                .map_or_else(|| t.get("users.never").to_string(), |at| format_time(&at)),
            name: user.name,
            email: user.email,
        }
    }
}

/// One line of the document table.
pub struct DocumentRow {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub updated_at: String,
}

impl From<Document> for DocumentRow {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id.to_string(),
            excerpt: doc.excerpt(EXCERPT_CHARS).to_string(),
            updated_at: format_time(&doc.updated_at),
            title: doc.title,
        }
    }
}

fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// Translated label for a known backend value, or the value itself.
fn label_for(known: &[(&str, &str)], value: &str, t: &Translator) -> String {
    known
        .iter()
        .find(|(v, _)| *v == value)
        .map_or_else(|| value.to_string(), |(_, key)| t.get(key).to_string())
}

fn filter_options(
    known: &[(&'static str, &'static str)],
    selected: &str,
    t: &Translator,
) -> Vec<ChoiceOption> {
    known
        .iter()
        .map(|&(value, key)| ChoiceOption {
            value,
            label: t.get(key).to_string(),
            selected: value == selected,
        })
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Dashboard overview template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/index.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub error: String,
    pub user_count: u64,
    pub document_count: u64,
    pub active_users: u64,
    pub activities: Vec<ActivityRow>,
}

/// User list template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/users.html")]
pub struct UsersTemplate {
    pub layout: Layout,
    pub error: String,
    pub rows: Vec<UserRow>,
    pub nav: PageNav,
    pub limit: u32,
    pub search: String,
    pub roles: Vec<ChoiceOption>,
    pub statuses: Vec<ChoiceOption>,
    /// This page's own URL, for the status toggle to return to.
    pub current_url: String,
}

/// Document list template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/documents.html")]
pub struct DocumentsTemplate {
    pub layout: Layout,
    pub error: String,
    pub rows: Vec<DocumentRow>,
    pub nav: PageNav,
    pub limit: u32,
    pub search: String,
}

/// Status toggle form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    /// The user's status when the page was rendered.
    pub status: String,
    /// List URL to return to.
    #[serde(default)]
    pub back: Option<String>,
}

/// Outcome of a backend call a page can survive.
enum Loaded<T> {
    Ready(T),
    /// The backend rejected the token.
    SignedOut,
    /// Anything else; the page shows a banner.
    Failed,
}

fn classify<T>(result: std::result::Result<T, ApiError>, what: &str) -> Loaded<T> {
    match result {
        Ok(value) => Loaded::Ready(value),
        Err(e) if e.is_unauthorized() => Loaded::SignedOut,
        Err(e) => {
            warn!(error = %e, "Failed to load {what}");
            Loaded::Failed
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the analytics overview.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    prefs: Preferences,
    CurrentUser(user): CurrentUser,
    AuthToken(token): AuthToken,
) -> Response {
    let api = state.api().with_token(&token);
    let t = prefs.translator();
    let layout = Layout::new(&prefs, Some(&user), "/dashboard");

    match classify(api.analytics().dashboard().await, "dashboard") {
        Loaded::Ready(data) => DashboardTemplate {
            layout,
            error: String::new(),
            user_count: data.user_count,
            document_count: data.document_count,
            active_users: data.active_users,
            activities: data
                .recent_activities
                .into_iter()
                .map(|a| ActivityRow {
                    user_id: a.user_id.to_string(),
                    action: a.action,
                    target: a.target,
                    timestamp: a.timestamp,
                })
                .collect(),
        }
        .into_response(),
        Loaded::SignedOut => AuthRejection::RedirectToLogin.into_response(),
        Loaded::Failed => DashboardTemplate {
            layout,
            error: t.get("error.backend").to_string(),
            user_count: 0,
            document_count: 0,
            active_users: 0,
            activities: Vec::new(),
        }
        .into_response(),
    }
}

/// Display one page of users.
///
/// `page` and `limit` select the page; `search`, `role` and `status` are
/// passed to the backend as filters.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn users(
    State(state): State<AppState>,
    prefs: Preferences,
    CurrentUser(user): CurrentUser,
    AuthToken(token): AuthToken,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let (request, filters) = split_page_params(params);
    let filters = non_empty(filters);
    let api = state.api().with_token(&token);
    let t = prefs.translator();

    let paginator = Paginator::new(api.users(), request, filters);
    let loaded = classify(paginator.load().await, "users");
    let filters = paginator.filters().clone();
    let page = paginator.into_page();

    let error = match loaded {
        Loaded::Ready(_) => String::new(),
        Loaded::SignedOut => return AuthRejection::RedirectToLogin.into_response(),
        Loaded::Failed => t.get("error.backend").to_string(),
    };

    let current_url = page_href("/dashboard/users", page.page, page.limit, &filters);
    UsersTemplate {
        layout: Layout::new(&prefs, Some(&user), "/dashboard/users"),
        error,
        nav: PageNav::new("/dashboard/users", &page, &filters, &t),
        limit: page.limit,
        search: filter_value(&filters, "search"),
        roles: filter_options(&ROLE_FILTERS, &filter_value(&filters, "role"), &t),
        statuses: filter_options(&STATUS_FILTERS, &filter_value(&filters, "status"), &t),
        current_url,
        rows: rows(page, |u| UserRow::new(u, &t)),
    }
    .into_response()
}

/// Display one page of documents.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn documents(
    State(state): State<AppState>,
    prefs: Preferences,
    CurrentUser(user): CurrentUser,
    AuthToken(token): AuthToken,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let (request, filters) = split_page_params(params);
    let filters = non_empty(filters);
    let api = state.api().with_token(&token);
    let t = prefs.translator();

    let paginator = Paginator::new(api.documents(), request, filters);
    let loaded = classify(paginator.load().await, "documents");
    let filters = paginator.filters().clone();
    let page = paginator.into_page();

    let error = match loaded {
        Loaded::Ready(_) => String::new(),
        Loaded::SignedOut => return AuthRejection::RedirectToLogin.into_response(),
        Loaded::Failed => t.get("error.backend").to_string(),
    };

    DocumentsTemplate {
        layout: Layout::new(&prefs, Some(&user), "/dashboard/documents"),
        error,
        nav: PageNav::new("/dashboard/documents", &page, &filters, &t),
        limit: page.limit,
        search: filter_value(&filters, "search"),
        rows: rows(page, DocumentRow::from),
    }
    .into_response()
}

/// Flip a user between active and disabled, then return to the list.
#[instrument(skip_all, fields(user_id = %user.id, target = %id))]
pub async fn toggle_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AuthToken(token): AuthToken,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let next_status = if form.status == STATUS_ACTIVE {
        STATUS_DISABLED
    } else {
        STATUS_ACTIVE
    };
    let input = UserInput {
        status: Some(next_status.to_string()),
        ..UserInput::default()
    };

    let api = state.api().with_token(&token);
    api.users().update(&RecordId::from(id), &input).await?;

    let back = form
        .back
        .as_deref()
        .filter(|url| url.starts_with("/dashboard/users") && is_local_path(url))
        .unwrap_or("/dashboard/users");
    Ok(Redirect::to(back).into_response())
}

/// Drop filters the form submitted empty (`?search=&role=`).
fn non_empty(filters: Filters) -> Filters {
    filters.into_iter().filter(|(_, v)| !v.trim().is_empty()).collect()
}

fn rows<T, R>(page: Paginated<T>, to_row: impl FnMut(T) -> R) -> Vec<R> {
    page.data.into_iter().map(to_row).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use portal_core::Locale;

    fn english() -> Translator {
        Translator::new(Locale::EnUs, Locale::EnUs)
    }

    #[test]
    fn test_user_row_labels_and_never_logged_in() {
        let user = UserRecord {
            id: RecordId::from(7),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: "admin".to_string(),
            status: "active".to_string(),
            last_login: None,
        };
        let row = UserRow::new(user, &english());

        assert_eq!(row.id, "7");
        assert_eq!(row.role, "Admin");
        assert_eq!(row.status, "Active");
        assert_eq!(row.last_login, "Never");
        assert!(row.is_active);
    }

    #[test]
    fn test_unknown_backend_values_shown_verbatim() {
        assert_eq!(label_for(&ROLE_FILTERS, "auditor", &english()), "auditor");
    }

    #[test]
    fn test_non_empty_drops_blank_filters() {
        let filters = vec![
            ("search".to_string(), "  ".to_string()),
            ("role".to_string(), "admin".to_string()),
        ];
        assert_eq!(non_empty(filters), vec![("role".to_string(), "admin".to_string())]);
    }

    #[test]
    fn test_filter_options_mark_selection() {
        let options = filter_options(&STATUS_FILTERS, "disabled", &english());
        let selected: Vec<_> = options.iter().filter(|o| o.selected).map(|o| o.value).collect();
        assert_eq!(selected, vec!["disabled"]);
    }
}
