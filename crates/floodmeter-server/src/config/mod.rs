//! Server config loader: defaults, optional strict YAML file, then env overrides.

pub mod schema;

use std::fs;

use floodmeter_core::error::{FloodError, Result};

pub use schema::{FeedSection, ServerConfig, ServerSection, StatsSection, TimerSection};

/// Env var naming an optional YAML config file.
pub const CONFIG_PATH_ENV: &str = "FLOODMETER_CONFIG";
/// Env var overriding `server.port`.
pub const PORT_ENV: &str = "PORT";
/// Env var enabling CI smoke-test mode.
pub const CI_ENV: &str = "CI";

/// Load config from the process environment.
pub fn load() -> Result<ServerConfig> {
    load_with(|key| std::env::var(key).ok())
}

/// Load config using `env` for variable lookups.
pub fn load_with<F>(env: F) -> Result<ServerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match env(CONFIG_PATH_ENV) {
        Some(path) if !path.trim().is_empty() => load_from_file(&path)?,
        _ => ServerConfig::default(),
    };
    apply_env(&mut cfg, &env)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_file(path: &str) -> Result<ServerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| FloodError::BadConfig(format!("read config failed (path={path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServerConfig> {
    let cfg: ServerConfig = serde_yaml::from_str(s)
        .map_err(|e| FloodError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Apply `PORT` and `CI` on top of whatever the file or defaults said.
pub fn apply_env<F>(cfg: &mut ServerConfig, env: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = env(PORT_ENV) {
        let port = port.trim();
        if !port.is_empty() {
            cfg.server.port = port
                .parse()
                .map_err(|e| FloodError::BadConfig(format!("{PORT_ENV}={port:?} is not a port: {e}")))?;
        }
    }
    if let Some(ci) = env(CI_ENV) {
        cfg.server.ci = ci_flag(&ci);
    }
    Ok(())
}

fn ci_flag(raw: &str) -> bool {
    let v = raw.trim();
    !(v.is_empty() || v == "0" || v.eq_ignore_ascii_case("false"))
}
