use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use viewer::geocode::{DEFAULT_USER_AGENT, NOMINATIM_URL};
use viewer::search::MAX_RESULTS;
use viewer::world::{WORLD_BUNDLE_PATH, WORLD_CDN_URL};

pub const DEFAULT_ADDR: &str = "127.0.0.1:9200";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub world_bundle_path: PathBuf,
    pub world_cdn_url: String,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocode_limit: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let addr_text = env_var_string("PERSPECTIVE_ADDR", DEFAULT_ADDR);
        let addr = addr_text
            .parse()
            .map_err(|e| format!("invalid PERSPECTIVE_ADDR {addr_text:?}: {e}"))?;
        Ok(Self {
            addr,
            world_bundle_path: PathBuf::from(env_var_string("WORLD_BUNDLE_PATH", WORLD_BUNDLE_PATH)),
            world_cdn_url: env_var_string("WORLD_CDN_URL", WORLD_CDN_URL),
            geocoder_url: env_var_string("GEOCODER_URL", NOMINATIM_URL),
            geocoder_user_agent: env_var_string("GEOCODER_USER_AGENT", DEFAULT_USER_AGENT),
            geocode_limit: env_var_usize("GEOCODE_LIMIT", MAX_RESULTS).clamp(1, MAX_RESULTS),
        })
    }
}

fn env_var_string(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
