// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mnemo check` command implementation.
//!
//! Verifies that the database opens and migrates, that the Gemini adapters
//! can be constructed and report healthy, and (with `--live`) that the
//! embedding endpoint returns vectors of the configured dimensionality.

use std::time::{Duration, Instant};

use mnemo_config::MnemoConfig;
use mnemo_core::types::HealthStatus;
use mnemo_core::{MnemoError, PluginAdapter};
use mnemo_storage::Database;

use crate::runtime::ManagerRuntime;

/// Status of a diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(
        name: &'static str,
        started: Instant,
        outcome: Result<String, (CheckStatus, String)>,
    ) -> Self {
        let (status, message) = match outcome {
            Ok(message) => (CheckStatus::Pass, message),
            Err((status, message)) => (status, message),
        };
        Self {
            name,
            status,
            message,
            duration: started.elapsed(),
        }
    }
}

/// Run the `mnemo check` command. Fails when any check fails.
pub async fn run_check(config: &MnemoConfig, live: bool) -> Result<(), MnemoError> {
    let mut results = vec![CheckResult {
        name: "config",
        status: CheckStatus::Pass,
        message: "configuration is valid".to_string(),
        duration: Duration::ZERO,
    }];
    results.push(check_database(config).await);
    results.extend(check_adapters(config, live).await);

    println!();
    println!("  mnemo check");
    println!("  {}", "-".repeat(50));
    for result in &results {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        println!(
            "    {tag} {:<12} {} ({}ms)",
            result.name,
            result.message,
            result.duration.as_millis()
        );
    }
    println!();

    let failed = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    if failed > 0 {
        return Err(MnemoError::Internal(format!("{failed} check(s) failed")));
    }
    Ok(())
}

async fn check_database(config: &MnemoConfig) -> CheckResult {
    let started = Instant::now();
    let outcome = match Database::open_with_config(&config.storage).await {
        Ok(database) => match database.close().await {
            Ok(()) => Ok(format!("{} opened and migrated", config.storage.database_path)),
            Err(e) => Err((CheckStatus::Warn, format!("opened but close failed: {e}"))),
        },
        Err(e) => Err((CheckStatus::Fail, e.to_string())),
    };
    CheckResult::new("database", started, outcome)
}

async fn check_adapters(config: &MnemoConfig, live: bool) -> Vec<CheckResult> {
    let started = Instant::now();
    let runtime = match ManagerRuntime::open(config).await {
        Ok(runtime) => runtime,
        Err(e) => {
            return vec![CheckResult::new(
                "gemini",
                started,
                Err((CheckStatus::Fail, e.to_string())),
            )];
        }
    };

    let mut results = vec![
        CheckResult::new(
            "embedding",
            started,
            health(runtime.embedder.as_ref(), &config.gemini.embedding_model).await,
        ),
        CheckResult::new(
            "generation",
            started,
            health(runtime.generator.as_ref(), &config.gemini.generation_model).await,
        ),
    ];

    if live {
        let started = Instant::now();
        let outcome = match runtime.manager.embedder().embed("mnemo connectivity probe").await {
            Ok(vector) => Ok(format!("received {} dimensions", vector.len())),
            Err(e) => Err((CheckStatus::Fail, e.to_string())),
        };
        results.push(CheckResult::new("live embed", started, outcome));
    }

    if let Err(e) = runtime.close().await {
        results.push(CheckResult::new(
            "shutdown",
            Instant::now(),
            Err((CheckStatus::Warn, e.to_string())),
        ));
    }
    results
}

async fn health(adapter: &dyn PluginAdapter, model: &str) -> Result<String, (CheckStatus, String)> {
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => Ok(format!(
            "{} v{} ({model}) healthy",
            adapter.name(),
            adapter.version()
        )),
        Ok(HealthStatus::Degraded(reason)) => Err((CheckStatus::Warn, reason)),
        Ok(HealthStatus::Unhealthy(reason)) => Err((CheckStatus::Fail, reason)),
        Err(e) => Err((CheckStatus::Fail, e.to_string())),
    }
}
