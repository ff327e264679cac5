// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory subcommands: `recall`, `extract`, `remember`, `list`, `clear`,
//! `forget-character` and `stats`.

use std::path::Path;

use mnemo_config::MnemoConfig;
use mnemo_core::{MnemoError, Scope, Turn};
use mnemo_memory::{ExtractionReport, format_memory_context};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::runtime::ManagerRuntime;

#[derive(Debug, Serialize)]
struct ExtractOutput<'a> {
    scope: &'a Scope,
    distilled: usize,
    saved: usize,
    duplicates: usize,
    failed: usize,
    discarded: bool,
}

impl<'a> ExtractOutput<'a> {
    fn new(scope: &'a Scope, report: &ExtractionReport) -> Self {
        Self {
            scope,
            distilled: report.distilled,
            saved: report.saved,
            duplicates: report.duplicates,
            failed: report.failed,
            discarded: report.discarded,
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), MnemoError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| MnemoError::Internal(format!("failed to serialize output: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Read a transcript of `{"speaker": "user"|"character", "text": ...}` turns.
pub async fn read_transcript(path: &Path) -> Result<Vec<Turn>, MnemoError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        MnemoError::Validation(format!("cannot read transcript {}: {e}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        MnemoError::Validation(format!("invalid transcript {}: {e}", path.display()))
    })
}

pub async fn run_recall(
    config: &MnemoConfig,
    scope: &Scope,
    query: &str,
    limit: Option<usize>,
    json: bool,
) -> Result<(), MnemoError> {
    let runtime = ManagerRuntime::open(config).await?;
    let limit = limit.unwrap_or(runtime.manager.settings().retrieval_limit);
    let memories = runtime.manager.retrieve_relevant(scope, query, limit).await;

    if json {
        print_json(&memories)?;
    } else {
        match format_memory_context(&memories) {
            Some(block) => println!("{block}"),
            None => println!("No relevant memories for {scope}."),
        }
    }
    runtime.close().await
}

/// Runs extraction in the foreground, stopping early on Ctrl-C.
pub async fn run_extract(
    config: &MnemoConfig,
    scope: &Scope,
    transcript: &Path,
    label: &str,
    json: bool,
) -> Result<(), MnemoError> {
    let turns = read_transcript(transcript).await?;
    let runtime = ManagerRuntime::open(config).await?;

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let outcome = runtime
        .manager
        .extract_and_store(scope, &turns, label, &cancel)
        .await;
    ctrl_c.abort();
    let report = outcome?;

    if json {
        print_json(&ExtractOutput::new(scope, &report))?;
    } else if report.discarded {
        println!("Scope {scope} was cleared during extraction; nothing saved.");
    } else {
        println!(
            "Saved {} of {} distilled memories for {scope} ({} duplicates, {} failed).",
            report.saved, report.distilled, report.duplicates, report.failed
        );
    }
    runtime.close().await
}

pub async fn run_remember(
    config: &MnemoConfig,
    scope: &Scope,
    content: &str,
    importance: Option<u8>,
    json: bool,
) -> Result<(), MnemoError> {
    let runtime = ManagerRuntime::open(config).await?;
    let id = runtime.manager.remember(scope, content, importance).await?;
    if json {
        print_json(&serde_json::json!({ "id": id }))?;
    } else {
        println!("Saved memory {id} for {scope}.");
    }
    runtime.close().await
}

pub async fn run_list(
    config: &MnemoConfig,
    scope: &Scope,
    limit: Option<usize>,
    json: bool,
) -> Result<(), MnemoError> {
    let runtime = ManagerRuntime::open(config).await?;
    let memories = runtime.manager.list_memories(scope, limit).await?;

    if json {
        print_json(&memories)?;
    } else if memories.is_empty() {
        println!("No memories for {scope}.");
    } else {
        for memory in &memories {
            println!(
                "{}  [{}]  {}  ({})",
                memory.created_at.format("%Y-%m-%d %H:%M"),
                memory.importance,
                memory.content,
                memory.id
            );
        }
    }
    runtime.close().await
}

pub async fn run_clear(config: &MnemoConfig, scope: &Scope, json: bool) -> Result<(), MnemoError> {
    let runtime = ManagerRuntime::open(config).await?;
    let deleted = runtime.manager.clear_scope(scope).await?;
    if json {
        print_json(&serde_json::json!({ "scope": scope, "deleted": deleted }))?;
    } else {
        println!("Deleted {deleted} memories for {scope}.");
    }
    runtime.close().await
}

pub async fn run_forget_character(
    config: &MnemoConfig,
    character_id: &str,
    json: bool,
) -> Result<(), MnemoError> {
    let runtime = ManagerRuntime::open(config).await?;
    let deleted = runtime.manager.clear_character(character_id).await?;
    if json {
        print_json(&serde_json::json!({ "character_id": character_id, "deleted": deleted }))?;
    } else {
        println!("Deleted {deleted} memories of character {character_id}.");
    }
    runtime.close().await
}

pub async fn run_stats(config: &MnemoConfig, user_id: &str, json: bool) -> Result<(), MnemoError> {
    let runtime = ManagerRuntime::open(config).await?;
    let count = runtime.manager.count_for_user(user_id).await?;
    if json {
        print_json(&serde_json::json!({ "user_id": user_id, "memory_count": count }))?;
    } else {
        println!("User {user_id} has {count} memories.");
    }
    runtime.close().await
}
