use std::path::PathBuf;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PREFS_FILE: &str = "aulad_prefs.json";

/// Environment-backed settings, loaded once at startup. The shell can
/// still override base URL and token per session via `session.configure`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub prefs_path: PathBuf,
    pub http_timeout_secs: u64,
}

impl Settings {
    pub fn load() -> Self {
        let prefs_path = env_optional("AULAD_PREFS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFS_FILE));
        let http_timeout_secs = env_optional("AULAD_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Settings {
            api_base_url: env_optional("AULAD_API_BASE_URL"),
            api_token: env_optional("AULAD_API_TOKEN"),
            prefs_path,
            http_timeout_secs,
        }
    }
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
