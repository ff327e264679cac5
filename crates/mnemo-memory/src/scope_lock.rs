// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-scope serialization of writes and clears.
//!
//! A registry entry lives only while some [`ScopeTicket`] or [`ScopeGuard`]
//! refers to it. The last holder to let go removes it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use mnemo_core::Scope;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
struct ScopeState {
    write: Arc<Mutex<()>>,
    /// Bumped by every clear.
    epoch: Arc<AtomicU64>,
}

/// Registry of per-scope write locks and clear epochs.
#[derive(Default)]
pub(crate) struct ScopeLocks {
    scopes: DashMap<Scope, Arc<ScopeState>>,
}

/// Keeps a registry entry alive and prunes it once unused.
struct Lease<'a> {
    locks: &'a ScopeLocks,
    scope: Scope,
    state: Option<Arc<ScopeState>>,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        // Release our reference first so the last holder sees a count of 1.
        drop(self.state.take());
        self.locks
            .scopes
            .remove_if(&self.scope, |_, state| Arc::strong_count(state) == 1);
    }
}

/// Clear epoch observed before a batch starts its slow work.
pub(crate) struct ScopeTicket<'a> {
    seen: u64,
    epoch: Arc<AtomicU64>,
    write: Arc<Mutex<()>>,
    lease: Lease<'a>,
}

/// Held while writing to or clearing a scope.
pub(crate) struct ScopeGuard<'a> {
    _write: OwnedMutexGuard<()>,
    seen: u64,
    epoch: Arc<AtomicU64>,
    _lease: Lease<'a>,
}

impl ScopeLocks {
    /// Record the scope's current clear epoch without locking it.
    pub(crate) fn ticket(&self, scope: &Scope) -> ScopeTicket<'_> {
        let state = Arc::clone(self.scopes.entry(scope.clone()).or_default().value());
        ScopeTicket {
            seen: state.epoch.load(Ordering::Acquire),
            epoch: Arc::clone(&state.epoch),
            write: Arc::clone(&state.write),
            lease: Lease {
                locks: self,
                scope: scope.clone(),
                state: Some(state),
            },
        }
    }

    /// Wait for exclusive write access to a scope.
    pub(crate) async fn lock(&self, scope: &Scope) -> ScopeGuard<'_> {
        self.ticket(scope).lock().await
    }

    /// Lock every scope of a character that has a batch in flight or a
    /// writer waiting, in user id order.
    pub(crate) async fn lock_character(&self, character_id: &str) -> Vec<ScopeGuard<'_>> {
        let mut scopes: Vec<Scope> = self
            .scopes
            .iter()
            .filter(|entry| entry.key().character_id == character_id)
            .map(|entry| entry.key().clone())
            .collect();
        scopes.sort_by(|a, b| a.user_id.cmp(&b.user_id));

        let mut guards = Vec::with_capacity(scopes.len());
        for scope in &scopes {
            guards.push(self.lock(scope).await);
        }
        guards
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.scopes.len()
    }
}

impl<'a> ScopeTicket<'a> {
    /// Wait for the write lock, keeping the epoch seen at ticket time.
    pub(crate) async fn lock(self) -> ScopeGuard<'a> {
        let write = Arc::clone(&self.write).lock_owned().await;
        ScopeGuard {
            _write: write,
            seen: self.seen,
            epoch: self.epoch,
            _lease: self.lease,
        }
    }
}

impl ScopeGuard<'_> {
    /// Whether a clear ran between taking the ticket and acquiring the lock.
    pub(crate) fn cleared_since_ticket(&self) -> bool {
        self.epoch.load(Ordering::Acquire) != self.seen
    }

    /// Mark the scope as cleared.
    pub(crate) fn bump(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }
}
