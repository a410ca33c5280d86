use std::{collections::HashMap, fs, time::Duration};

use shared::domain::{Identity, Role};

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub remote_state_url: Option<String>,
    pub remote_state_auth: Option<String>,
    pub store_timeout_ms: u64,
    pub session_ttl_seconds: i64,
    pub users: Vec<Identity>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3300".into(),
            remote_state_url: None,
            remote_state_auth: None,
            store_timeout_ms: 5_000,
            session_ttl_seconds: 24 * 60 * 60,
            users: Vec::new(),
        }
    }
}

impl Settings {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply_file_overrides(&mut settings, &file_cfg);
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub(crate) fn apply_file_overrides(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("remote_state_url") {
        settings.remote_state_url = non_empty(v);
    }
    if let Some(v) = file_cfg.get("remote_state_auth") {
        settings.remote_state_auth = non_empty(v);
    }
    if let Some(v) = file_cfg.get("store_timeout_ms") {
        set_positive(&mut settings.store_timeout_ms, v);
    }
    if let Some(v) = file_cfg.get("session_ttl_seconds") {
        set_positive(&mut settings.session_ttl_seconds, v);
    }
    if let Some(v) = file_cfg.get("users") {
        settings.users = parse_roster(v);
    }
}

pub(crate) fn apply_env_overrides(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }
    if let Some(v) = env("PORT") {
        if let Ok(port) = v.trim().parse::<u16>() {
            settings.server_bind = with_port(&settings.server_bind, port);
        }
    }

    if let Some(v) = env("REMOTE_STATE_URL") {
        settings.remote_state_url = non_empty(&v);
    }
    if let Some(v) = env("APP__REMOTE_STATE_URL") {
        settings.remote_state_url = non_empty(&v);
    }

    if let Some(v) = env("REMOTE_STATE_AUTH") {
        settings.remote_state_auth = non_empty(&v);
    }
    if let Some(v) = env("APP__REMOTE_STATE_AUTH") {
        settings.remote_state_auth = non_empty(&v);
    }

    if let Some(v) = env("APP__STORE_TIMEOUT_MS") {
        set_positive(&mut settings.store_timeout_ms, &v);
    }
    if let Some(v) = env("APP__SESSION_TTL_SECONDS") {
        set_positive(&mut settings.session_ttl_seconds, &v);
    }
    if let Some(v) = env("APP__USERS") {
        settings.users = parse_roster(&v);
    }
}

/// Parses `name:role` pairs separated by commas. Entries without a name are skipped and
/// unrecognized roles become viewers.
pub fn parse_roster(raw: &str) -> Vec<Identity> {
    raw.split(',')
        .filter_map(|entry| {
            let (name, role) = entry.split_once(':').unwrap_or((entry, ""));
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Identity::new(name, Role::from_label(role)))
        })
        .collect()
}

fn with_port(bind: &str, port: u16) -> String {
    match bind.rsplit_once(':') {
        Some((host, _)) => format!("{host}:{port}"),
        None => format!("{bind}:{port}"),
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn set_positive<T>(slot: &mut T, raw: &str)
where
    T: std::str::FromStr + PartialOrd + Default,
{
    if let Ok(parsed) = raw.trim().parse::<T>() {
        if parsed > T::default() {
            *slot = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
