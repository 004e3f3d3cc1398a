use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed runtime configuration, read from the environment (and `.env` if present).
#[derive(Clone, Debug)]
pub struct Config {
    // Directory service
    pub atlas_url: String,
    pub atlas_token: String,

    // Translation
    pub google_api_key: String,
    pub google_project_id: Option<String>,

    // Persistence
    pub state_file: PathBuf,

    // Caching
    pub directory_cache_ttl: Duration,

    // Admin login
    pub auth_code_ttl: Duration,
    pub auth_fail_threshold: u32,
    pub auth_fail_delay: Duration,

    // Outbound HTTP
    pub http_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let atlas_url = required("ATLAS_URL")?;
        let atlas_token = required("ATLAS_TOKEN")?;
        let google_api_key = required("GOOGLE_API_KEY")?;
        let google_project_id = env_str("GOOGLE_PROJECT_ID").and_then(non_empty);

        let state_file =
            env_path("STATE_FILE").unwrap_or_else(|| PathBuf::from("/tmp/tbot-state.json"));

        let directory_cache_ttl =
            Duration::from_secs(env_u64("DIRECTORY_CACHE_TTL").unwrap_or(60));

        let auth_code_ttl = Duration::from_secs(env_u64("AUTH_CODE_TTL").unwrap_or(60));
        let auth_fail_threshold = env_u32("AUTH_FAIL_THRESHOLD").unwrap_or(10).max(1);
        let auth_fail_delay = Duration::from_millis(env_u64("AUTH_FAIL_DELAY_MS").unwrap_or(500));

        let http_timeout = Duration::from_millis(env_u64("HTTP_TIMEOUT_MS").unwrap_or(10_000));

        Ok(Self {
            atlas_url: trim_trailing_slash(&atlas_url),
            atlas_token,
            google_api_key,
            google_project_id,
            state_file,
            directory_cache_ttl,
            auth_code_ttl,
            auth_fail_threshold,
            auth_fail_delay,
            http_timeout,
        })
    }
}

fn required(key: &str) -> Result<String> {
    env_str(key)
        .and_then(non_empty)
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn trim_trailing_slash(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
