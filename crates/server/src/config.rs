use std::{fs, path::Path};

use alloy_primitives::Address;
use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub rpc_url: String,
    pub contract_address: Option<String>,
    pub rpc_timeout_seconds: u64,
}

/// `server.toml` keys; anything absent keeps its default.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    rpc_url: Option<String>,
    contract_address: Option<String>,
    rpc_timeout_seconds: Option<u64>,
}

impl FileSettings {
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.bind_addr {
            settings.server_bind = v;
        }
        if let Some(v) = self.rpc_url {
            settings.rpc_url = v;
        }
        if let Some(v) = self.contract_address {
            settings.contract_address = Some(v);
        }
        if let Some(v) = self.rpc_timeout_seconds {
            settings.rpc_timeout_seconds = v;
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            rpc_url: "https://api.avax-test.network/ext/bc/C/rpc".into(),
            contract_address: None,
            rpc_timeout_seconds: 10,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new("server.toml"), |key| std::env::var(key).ok())
}

/// Defaults, then `server.toml`, then environment. Later `APP__*` names win
/// over the short ones.
pub fn load_settings_from(
    file: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => file_cfg.apply(&mut settings),
            Err(err) => warn!(path = %file.display(), %err, "ignoring unreadable settings file"),
        }
    }

    if let Some(port) = env("PORT") {
        settings.server_bind = with_port(&settings.server_bind, &port);
    }
    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("RPC_URL") {
        settings.rpc_url = v;
    }
    if let Some(v) = env("APP__RPC_URL") {
        settings.rpc_url = v;
    }

    if let Some(v) = env("CONTRACT_ADDRESS") {
        settings.contract_address = Some(v);
    }
    if let Some(v) = env("APP__CONTRACT_ADDRESS") {
        settings.contract_address = Some(v);
    }

    if let Some(v) = env("APP__RPC_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.rpc_timeout_seconds = parsed;
        }
    }

    settings
}

fn with_port(bind: &str, port: &str) -> String {
    let host = bind.rsplit_once(':').map(|(host, _)| host).unwrap_or(bind);
    format!("{host}:{}", port.trim())
}

pub fn parse_rpc_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid rpc url '{raw}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("rpc url '{raw}' must use http or https, not '{other}'"),
    }
}

pub fn parse_contract_address(raw: Option<&str>) -> anyhow::Result<Address> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        bail!("contract address is not configured; set CONTRACT_ADDRESS or contract_address in server.toml");
    };
    raw.parse::<Address>()
        .with_context(|| format!("invalid contract address '{raw}'"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
