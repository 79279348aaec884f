//! Message lookup for the supported locales.
//!
//! The embedded catalog covers only the strings this crate renders itself.
//! Lookups fall back to the default locale's message and finally to the key,
//! so a missing translation shows up as its key instead of an empty string.

use std::collections::HashMap;
use std::sync::LazyLock;

use portal_core::Locale;

/// `(key, en-US, zh-CN)`
const CATALOG: &[(&str, &str, &str)] = &[
    // Navigation
    ("nav.appname", "Portal", "门户"),
    ("nav.home", "Home", "首页"),
    ("nav.about", "About", "关于"),
    ("nav.blog", "Blog", "博客"),
    ("nav.settings", "Settings", "设置"),
    ("nav.dashboard", "Dashboard", "仪表盘"),
    ("nav.login", "Sign in", "登录"),
    ("nav.logout", "Sign out", "退出登录"),
    // Common
    ("common.loading", "Loading...", "加载中..."),
    ("common.error", "Error", "错误"),
    ("common.actions", "Actions", "操作"),
    ("common.save", "Save", "保存"),
    // Login
    ("login.title", "Sign in to your account", "登录您的账户"),
    ("login.email", "Email", "邮箱"),
    ("login.emailPlaceholder", "Enter your email", "请输入邮箱"),
    ("login.password", "Password", "密码"),
    ("login.passwordPlaceholder", "Enter your password", "请输入密码"),
    ("login.rememberMe", "Remember me", "记住我"),
    ("login.forgotPassword", "Forgot password?", "忘记密码？"),
    ("login.signIn", "Sign in", "登录"),
    ("login.noAccount", "Don't have an account?", "还没有账户？"),
    ("login.signUp", "Sign up", "注册"),
    (
        "login.error.invalidCredentials",
        "Invalid email or password",
        "邮箱或密码错误",
    ),
    (
        "login.error.serverError",
        "Server error, please try again later",
        "服务器错误，请稍后重试",
    ),
    // Register
    ("register.title", "Create an account", "创建账户"),
    ("register.subtitle", "Fill in the form to get started", "填写以下信息开始使用"),
    ("register.name", "Name", "姓名"),
    ("register.namePlaceholder", "Enter your name", "请输入姓名"),
    ("register.email", "Email", "邮箱"),
    ("register.emailPlaceholder", "Enter your email", "请输入邮箱"),
    ("register.password", "Password", "密码"),
    ("register.passwordPlaceholder", "At least 8 characters", "至少 8 个字符"),
    ("register.confirmPassword", "Confirm password", "确认密码"),
    (
        "register.confirmPasswordPlaceholder",
        "Enter your password again",
        "请再次输入密码",
    ),
    ("register.signUp", "Sign up", "注册"),
    ("register.haveAccount", "Already have an account?", "已有账户？"),
    ("register.signIn", "Sign in", "登录"),
    ("register.fieldsRequired", "All fields are required", "请填写所有字段"),
    ("register.invalidEmail", "Please enter a valid email", "请输入有效的邮箱地址"),
    ("register.passwordMismatch", "Passwords do not match", "两次输入的密码不一致"),
    (
        "register.passwordTooShort",
        "Password must be at least 8 characters",
        "密码长度至少为 8 个字符",
    ),
    // Dashboard
    ("dashboard.title", "Dashboard", "仪表盘"),
    ("dashboard.users", "Users", "用户管理"),
    ("dashboard.documents", "Documents", "文档管理"),
    ("dashboard.userCount", "Users", "用户总数"),
    ("dashboard.documentCount", "Documents", "文档总数"),
    ("dashboard.activeUsers", "Active users", "活跃用户"),
    ("dashboard.recentActivity", "Recent activity", "最近活动"),
    ("dashboard.noActivity", "No recent activity", "暂无活动"),
    // Users
    ("users.name", "Name", "姓名"),
    ("users.email", "Email", "邮箱"),
    ("users.role", "Role", "角色"),
    ("users.status", "Status", "状态"),
    ("users.lastLogin", "Last login", "最后登录"),
    ("users.noUsers", "No users found", "没有找到用户"),
    ("users.searchPlaceholder", "Search users...", "搜索用户..."),
    ("users.allRoles", "All roles", "所有角色"),
    ("users.allStatuses", "All statuses", "所有状态"),
    ("users.never", "Never", "从未"),
    ("users.admin", "Admin", "管理员"),
    ("users.editor", "Editor", "编辑"),
    ("users.user", "User", "用户"),
    ("users.active", "Active", "活跃"),
    ("users.inactive", "Inactive", "非活跃"),
    ("users.disabled", "Disabled", "已禁用"),
    ("users.enable", "Enable", "启用"),
    ("users.disable", "Disable", "禁用"),
    // Documents
    ("documents.title", "Title", "标题"),
    ("documents.excerpt", "Content", "内容"),
    ("documents.updatedAt", "Updated", "更新时间"),
    ("documents.noDocuments", "No documents found", "没有找到文档"),
    ("documents.searchPlaceholder", "Search documents...", "搜索文档..."),
    // Pagination
    (
        "pagination.showing",
        "Showing {from} to {to} of {total} results",
        "显示第 {from} 到 {to} 条，共 {total} 条",
    ),
    ("pagination.previous", "Previous", "上一页"),
    ("pagination.next", "Next", "下一页"),
    ("pagination.perPage", "Per page", "每页"),
    // Settings
    ("settings.title", "Settings", "设置"),
    ("settings.language", "Language", "语言"),
    ("settings.theme", "Theme", "主题"),
    ("theme.light", "Light", "浅色"),
    ("theme.dark", "Dark", "深色"),
    ("theme.system", "System", "跟随系统"),
    // Static pages
    ("home.title", "Welcome to Portal", "欢迎使用门户"),
    (
        "home.subtitle",
        "Manage your documents and team in one place",
        "在一个地方管理您的文档和团队",
    ),
    ("home.getStarted", "Get started", "开始使用"),
    ("about.title", "About", "关于我们"),
    (
        "about.body",
        "Portal is the web front end for the document management service.",
        "门户是文档管理服务的网页前端。",
    ),
    ("blog.title", "Blog", "博客"),
    ("blog.empty", "No posts yet", "暂无文章"),
    // Errors
    ("error.notFound", "Page not found", "页面未找到"),
    ("error.unauthorized", "Please sign in to continue", "请先登录"),
    ("error.badRequest", "Bad request", "请求无效"),
    ("error.internal", "Something went wrong", "出错了"),
    ("error.backend", "The service is temporarily unavailable", "服务暂时不可用"),
];

static MESSAGES: LazyLock<HashMap<&'static str, [&'static str; 2]>> = LazyLock::new(|| {
    CATALOG
        .iter()
        .map(|&(key, en, zh)| (key, [en, zh]))
        .collect()
});

const fn column(locale: Locale) -> usize {
    match locale {
        Locale::EnUs => 0,
        Locale::ZhCn => 1,
    }
}

/// Looks up messages for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translator {
    locale: Locale,
    fallback: Locale,
}

impl Translator {
    /// A translator for `locale` that falls back to `fallback`.
    #[must_use]
    pub const fn new(locale: Locale, fallback: Locale) -> Self {
        Self { locale, fallback }
    }

    /// The locale messages are looked up in.
    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// The message for `key`, or `key` itself if no locale has it.
    #[must_use]
    pub fn get<'a>(&self, key: &'a str) -> &'a str {
        let Some(entry) = MESSAGES.get(key) else {
            return key;
        };
        [self.locale, self.fallback]
            .into_iter()
            .map(|l| entry[column(l)])
            .find(|m| !m.is_empty())
            .unwrap_or(key)
    }

    /// The message for `key` with `{name}` placeholders replaced.
    #[must_use]
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.get(key).to_string(), |message, (name, value)| {
                message.replace(&format!("{{{name}}}"), value)
            })
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(Locale::default(), Locale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_per_locale() {
        let en = Translator::new(Locale::EnUs, Locale::ZhCn);
        let zh = Translator::new(Locale::ZhCn, Locale::ZhCn);
        assert_eq!(en.get("nav.home"), "Home");
        assert_eq!(zh.get("nav.home"), "首页");
    }

    #[test]
    fn test_unknown_key_returns_key() {
        let t = Translator::default();
        assert_eq!(t.get("missing.key"), "missing.key");
    }

    #[test]
    fn test_format_replaces_placeholders() {
        let t = Translator::new(Locale::EnUs, Locale::ZhCn);
        let text = t.format(
            "pagination.showing",
            &[("from", "11"), ("to", "20"), ("total", "42")],
        );
        assert_eq!(text, "Showing 11 to 20 of 42 results");
    }

    #[test]
    fn test_catalog_is_complete_and_unique() {
        assert_eq!(MESSAGES.len(), CATALOG.len(), "duplicate catalog key");
        for (key, en, zh) in CATALOG {
            assert!(!en.is_empty() && !zh.is_empty(), "{key} is missing a translation");
        }
    }

    #[test]
    fn test_error_keys_exist() {
        let t = Translator::new(Locale::EnUs, Locale::EnUs);
        for key in [
            "login.error.invalidCredentials",
            "login.error.serverError",
            "register.passwordMismatch",
            "register.passwordTooShort",
            "register.fieldsRequired",
            "register.invalidEmail",
        ] {
            assert_ne!(t.get(key), key);
        }
    }
}
