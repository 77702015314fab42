use std::{collections::HashMap, fs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub stockfish_path: Option<String>,
    pub search_depth: u32,
    pub engine_timeout_ms: u64,
    pub session_ttl_seconds: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            stockfish_path: None,
            search_depth: 20,
            engine_timeout_ms: 30_000,
            session_ttl_seconds: 3600,
        }
    }
}

/// Defaults, overlaid by an optional flat `trainer.toml`, overlaid by
/// environment variables. Unparsable numeric values fall back silently.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("trainer.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply(&mut settings, |key| file_cfg.get(key).cloned());
        }
    }

    apply(&mut settings, |key| {
        std::env::var(key.to_uppercase()).ok()
    });

    settings
}

fn apply<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("server_bind") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("stockfish_path") {
        settings.stockfish_path = Some(v);
    }
    if let Some(v) = lookup("search_depth") {
        if let Ok(parsed) = v.parse() {
            settings.search_depth = parsed;
        }
    }
    if let Some(v) = lookup("engine_timeout_ms") {
        if let Ok(parsed) = v.parse() {
            settings.engine_timeout_ms = parsed;
        }
    }
    if let Some(v) = lookup("session_ttl_seconds") {
        if let Ok(parsed) = v.parse() {
            settings.session_ttl_seconds = parsed;
        }
    }
}

/// Engine binaries to probe, in order: the configured path first, then the
/// usual install locations, then whatever `stockfish` resolves to on PATH.
pub fn engine_path_candidates(configured: Option<&str>) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    if let Some(path) = configured {
        candidates.push(path.to_string());
    }
    for fallback in [
        "/opt/homebrew/bin/stockfish",
        "/usr/bin/stockfish",
        "stockfish",
    ] {
        if candidates.iter().all(|c| c != fallback) {
            candidates.push(fallback.to_string());
        }
    }
    candidates
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
