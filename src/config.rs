use std::env;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub session_path: PathBuf,
}

impl Config {
    /// `HONDANA_API_URL` overrides the default backend address and
    /// `HONDANA_SESSION_FILE` the session file location.
    pub fn from_env() -> Self {
        let api_url = env::var("HONDANA_API_URL")
            .ok()
            .and_then(non_blank)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let session_path = env::var("HONDANA_SESSION_FILE")
            .ok()
            .and_then(non_blank)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                default_session_path(env::var("XDG_DATA_HOME").ok(), env::var("HOME").ok())
            });
        Config {
            api_url,
            session_path,
        }
    }

    /// Command-line override wins over the environment.
    pub fn override_api_url(&mut self, api_url: Option<String>) {
        if let Some(api_url) = api_url.and_then(non_blank) {
            self.api_url = api_url;
        }
    }
}

fn default_session_path(xdg_data_home: Option<String>, home: Option<String>) -> PathBuf {
    if let Some(base) = xdg_data_home.and_then(non_blank) {
        return PathBuf::from(base).join("hondana/session.json");
    }
    if let Some(home) = home.and_then(non_blank) {
        return PathBuf::from(home).join(".local/share/hondana/session.json");
    }
    PathBuf::from(".hondana-session.json")
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
