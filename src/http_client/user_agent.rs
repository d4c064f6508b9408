//! User agent selection for downloads.

/// Default agent for direct downloads.
pub const USER_AGENT: &str = "ruleacquire/0.1 (rulebook archiver)";

/// Agent presented by the rendering browser. Downloads can borrow it so the
/// whole run looks like one client to the site.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Config keyword selecting [`BROWSER_USER_AGENT`].
const BROWSER_KEYWORD: &str = "browser";

/// Resolve the download user agent from config.
/// - None => [`USER_AGENT`]
/// - "browser" => [`BROWSER_USER_AGENT`]
/// - other => used verbatim
pub fn resolve_user_agent(config: Option<&str>) -> &str {
    match config.map(str::trim) {
        None | Some("") => USER_AGENT,
        Some(value) if value.eq_ignore_ascii_case(BROWSER_KEYWORD) => BROWSER_USER_AGENT,
        Some(custom) => custom,
    }
}
