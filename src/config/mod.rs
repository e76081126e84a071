use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_API_URL: &str = "http://localhost:8080";
pub(crate) const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime configuration injected by the hosting page as `window.ENV`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub log_level: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        Self::from_lookup(read_window_env)
    }

    /// Build from any key lookup. Upper-case keys win over lower-case ones.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |keys: [&str; 2], default: &str| {
            keys.into_iter()
                .find_map(|k| lookup(k).filter(|v| !v.trim().is_empty()))
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            api_url: pick(["API_URL", "api_url"], DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            log_level: pick(["LOG_LEVEL", "log_level"], DEFAULT_LOG_LEVEL),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_window_env(key: &str) -> Option<String> {
    let window = web_sys::window()?;
    let env = window.get("ENV")?;
    if env.is_undefined() || !env.is_object() {
        return None;
    }
    js_sys::Reflect::get(&env, &key.into()).ok()?.as_string()
}
