// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading.
//!
//! Compiled defaults are overlaid by `/etc/mnemo/mnemo.toml`, then the user
//! config directory, then `./mnemo.toml`, and finally `MNEMO_*` variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MnemoConfig;

const FILE_NAME: &str = "mnemo.toml";

/// Config files consulted by [`load_config`], lowest precedence first.
///
/// Missing files are skipped silently at load time.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/mnemo").join(FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("mnemo").join(FILE_NAME));
    }
    paths.push(PathBuf::from(FILE_NAME));
    paths
}

fn defaults() -> Figment {
    Figment::from(Serialized::defaults(MnemoConfig::default()))
}

/// Load from every path in [`config_search_paths`] plus the environment.
pub fn load_config() -> Result<MnemoConfig, figment::Error> {
    build_figment().extract()
}

/// Load a TOML string over the defaults. Files and environment are ignored.
pub fn load_config_from_str(toml_content: &str) -> Result<MnemoConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

/// Load one explicit file over the defaults, then apply the environment.
pub fn load_config_from_path(path: &Path) -> Result<MnemoConfig, figment::Error> {
    defaults()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    config_search_paths()
        .into_iter()
        .fold(defaults(), |figment, path| figment.merge(Toml::file(path)))
        .merge(env_provider())
}

/// `MNEMO_*` variables, mapped so only the section prefix becomes a dot.
///
/// Splitting on every underscore would turn `MNEMO_GEMINI_API_KEY` into
/// `gemini.api.key`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("MNEMO_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ["memory", "gemini", "storage", "logging"] {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
