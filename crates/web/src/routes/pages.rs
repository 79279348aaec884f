//! Static page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use tracing::instrument;

use crate::filters;
use crate::middleware::{OptionalUser, Preferences};
use crate::views::Layout;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
}

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub layout: Layout,
}

/// Blog page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog.html")]
pub struct BlogTemplate {
    pub layout: Layout,
}

/// Display the home page.
#[instrument(skip_all)]
pub async fn home(prefs: Preferences, OptionalUser(user): OptionalUser) -> HomeTemplate {
    HomeTemplate {
        layout: Layout::new(&prefs, user.as_ref(), "/"),
    }
}

/// Display the about page.
#[instrument(skip_all)]
pub async fn about(prefs: Preferences, OptionalUser(user): OptionalUser) -> AboutTemplate {
    AboutTemplate {
        layout: Layout::new(&prefs, user.as_ref(), "/about"),
    }
}

/// Display the blog page.
#[instrument(skip_all)]
pub async fn blog(prefs: Preferences, OptionalUser(user): OptionalUser) -> BlogTemplate {
    BlogTemplate {
        layout: Layout::new(&prefs, user.as_ref(), "/blog"),
    }
}
