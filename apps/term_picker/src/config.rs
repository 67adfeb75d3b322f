use std::{fs, io, path::Path};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub site_url: String,
    pub group_id: String,
    pub set_id: String,
    pub anchor_term_id: String,
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site_url: "http://127.0.0.1:8080".into(),
            group_id: "a66b7b2f-9f5d-4573-b763-542518574351".into(),
            set_id: "f6fc9802-3af3-4200-92de-9fe5f4af4fd2".into(),
            anchor_term_id: "e8e6feb5-1cf7-47bd-afb7-e352b78bd365".into(),
            access_token: None,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    site_url: Option<String>,
    group_id: Option<String>,
    set_id: Option<String>,
    anchor_term_id: Option<String>,
    access_token: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then the config file if it exists, then the process environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.site_url {
        settings.site_url = v;
    }
    if let Some(v) = file_cfg.group_id {
        settings.group_id = v;
    }
    if let Some(v) = file_cfg.set_id {
        settings.set_id = v;
    }
    if let Some(v) = file_cfg.anchor_term_id {
        settings.anchor_term_id = v;
    }
    if let Some(v) = file_cfg.access_token {
        settings.access_token = Some(v);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("TERM_PICKER_SITE_URL") {
        settings.site_url = v;
    }
    if let Some(v) = lookup("APP__SITE_URL") {
        settings.site_url = v;
    }
    if let Some(v) = lookup("APP__GROUP_ID") {
        settings.group_id = v;
    }
    if let Some(v) = lookup("APP__SET_ID") {
        settings.set_id = v;
    }
    if let Some(v) = lookup("APP__ANCHOR_TERM_ID") {
        settings.anchor_term_id = v;
    }
    if let Some(v) = lookup("APP__ACCESS_TOKEN") {
        settings.access_token = Some(v);
    }
    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = v
            .parse()
            .with_context(|| format!("APP__REQUEST_TIMEOUT_SECS must be whole seconds, got '{v}'"))?;
    }
    Ok(())
}
