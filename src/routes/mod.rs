use tracing::debug;

pub(crate) const HOME_PATH: &str = "/";
pub(crate) const LOGIN_PATH: &str = "/login";
pub(crate) const REGISTER_PATH: &str = "/register";
pub(crate) const MEMO_CREATE_PATH: &str = "/memo/create";
pub(crate) const QUEUE_PATH: &str = "/queue";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Access {
    Public,
    RequiresAuth,
    /// Only for signed-out visitors (login, register).
    RequiresGuest,
}

/// Access level per route path. Unknown paths are public.
pub(crate) fn access_for(path: &str) -> Access {
    match path {
        LOGIN_PATH | REGISTER_PATH => Access::RequiresGuest,
        QUEUE_PATH => Access::RequiresAuth,
        _ => Access::Public,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum GuardDecision {
    Proceed,
    RedirectToLogin { redirect: String },
    RedirectHome,
}

impl GuardDecision {
    /// Where to navigate, if anywhere.
    pub fn target(&self) -> Option<String> {
        match self {
            GuardDecision::Proceed => None,
            GuardDecision::RedirectToLogin { redirect } => Some(format!(
                "{LOGIN_PATH}?redirect={}",
                urlencoding::encode(redirect)
            )),
            GuardDecision::RedirectHome => Some(HOME_PATH.to_string()),
        }
    }
}

pub(crate) fn guard(access: Access, authenticated: bool, full_path: &str) -> GuardDecision {
    let decision = match access {
        Access::RequiresAuth if !authenticated => GuardDecision::RedirectToLogin {
            redirect: full_path.to_string(),
        },
        Access::RequiresGuest if authenticated => GuardDecision::RedirectHome,
        _ => GuardDecision::Proceed,
    };
    debug!(?access, authenticated, full_path, ?decision, "route guard");
    decision
}

/// Joins a pathname and a query string, with or without its leading `?`.
pub(crate) fn with_query(pathname: &str, search: &str) -> String {
    match search.trim_start_matches('?') {
        "" => pathname.to_string(),
        q => format!("{pathname}?{q}"),
    }
}

/// Post-login destination taken from `?redirect=`. Only same-origin paths
/// are honoured.
pub(crate) fn post_login_target(redirect: Option<&str>) -> String {
    match redirect {
        Some(r) if r.starts_with('/') && !r.starts_with("//") => r.to_string(),
        _ => HOME_PATH.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_routes_bounce_signed_in_users_home() {
        assert_eq!(
            guard(access_for(LOGIN_PATH), true, LOGIN_PATH),
            GuardDecision::RedirectHome
        );
        assert_eq!(
            guard(access_for(REGISTER_PATH), false, REGISTER_PATH),
            GuardDecision::Proceed
        );
    }

    #[test]
    fn test_auth_routes_redirect_with_encoded_path() {
        let d = guard(Access::RequiresAuth, false, "/tags/rust timeline?x=1");
        assert_eq!(
            d.target().as_deref(),
            Some("/login?redirect=%2Ftags%2Frust%20timeline%3Fx%3D1")
        );
        assert_eq!(guard(access_for(QUEUE_PATH), true, QUEUE_PATH), GuardDecision::Proceed);
    }

    #[test]
    fn test_public_routes_always_proceed() {
        for authed in [true, false] {
            assert_eq!(guard(access_for(HOME_PATH), authed, "/"), GuardDecision::Proceed);
            assert_eq!(
                guard(access_for(MEMO_CREATE_PATH), authed, MEMO_CREATE_PATH),
                GuardDecision::Proceed
            );
        }
    }

    #[test]
    fn test_with_query_normalises_leading_mark() {
        assert_eq!(with_query("/queue", ""), "/queue");
        assert_eq!(with_query("/queue", "a=1"), "/queue?a=1");
        assert_eq!(with_query("/queue", "?a=1"), "/queue?a=1");
    }

    #[test]
    fn test_post_login_target_rejects_foreign_urls() {
        assert_eq!(post_login_target(Some("/memo/create")), "/memo/create");
        assert_eq!(post_login_target(Some("https://evil.example")), "/");
        assert_eq!(post_login_target(Some("//evil.example")), "/");
        assert_eq!(post_login_target(None), "/");
    }
}
