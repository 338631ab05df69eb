//! Per-(thread, cluster) conversation store.
//!
//! The store is the only shared mutable state of the relay. It hands out
//! [`ExchangeLease`]s that serialize exchanges per key: a second exchange
//! on the same key waits for the first lease to drop, while different keys
//! never contend beyond a brief map lookup.
//!
//! Every slot carries a generation counter. `reset` bumps it and cancels the
//! in-flight exchange, so an answer that arrives after a reset is discarded
//! by [`ContextStore::record_exchange`] instead of being written into the
//! fresh conversation.

use chrono::{Duration as ChronoDuration, Utc};
use relay_domain::{ContextIdChange, ContextKey, ContextSnapshot, ConversationContext};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct SlotState {
    context: ConversationContext,
    generation: u64,
    /// Detached from the table by reset or eviction
    removed: bool,
    in_flight: Option<CancellationToken>,
}

struct ContextSlot {
    gate: Arc<AsyncMutex<()>>,
    state: Mutex<SlotState>,
}

impl ContextSlot {
    fn new(key: ContextKey) -> Self {
        Self {
            gate: Arc::new(AsyncMutex::new(())),
            state: Mutex::new(SlotState {
                context: ConversationContext::new(key),
                generation: 0,
                removed: false,
                in_flight: None,
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Detach the slot: stale leases stop recording and the running
    /// exchange is cancelled.
    fn retire(&self) {
        let mut state = self.state();
        state.generation += 1;
        state.removed = true;
        if let Some(token) = state.in_flight.take() {
            token.cancel();
        }
    }
}

/// Exclusive right to run one exchange on a context.
///
/// Holding a lease blocks other exchanges on the same key. Dropping it
/// releases the key.
pub struct ExchangeLease {
    key: ContextKey,
    slot: Arc<ContextSlot>,
    generation: u64,
    context: ConversationContext,
    cancel: CancellationToken,
    _guard: OwnedMutexGuard<()>,
}

impl ExchangeLease {
    pub fn key(&self) -> &ContextKey {
        &self.key
    }

    /// The context as it was when the lease was taken.
    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn protocol_context_id(&self) -> Option<&str> {
        self.context.protocol_context_id()
    }

    /// Fires when the context is reset while the exchange runs.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for ExchangeLease {
    fn drop(&mut self) {
        let mut state = self.slot.state();
        if state.generation == self.generation {
            state.in_flight = None;
        }
    }
}

/// Keyed table of [`ConversationContext`]s.
pub struct ContextStore {
    slots: Mutex<HashMap<ContextKey, Arc<ContextSlot>>>,
    root: CancellationToken,
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStore {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            root: CancellationToken::new(),
        }
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<ContextKey, Arc<ContextSlot>>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn slot(&self, key: &ContextKey) -> Arc<ContextSlot> {
        let mut table = self.table();
        Arc::clone(
            table
                .entry(key.clone())
                .or_insert_with(|| Arc::new(ContextSlot::new(key.clone()))),
        )
    }

    fn existing(&self, key: &ContextKey) -> Option<Arc<ContextSlot>> {
        self.table().get(key).cloned()
    }

    /// Return the context for `key`, creating an empty one if absent.
    pub fn get_or_create(&self, key: &ContextKey) -> ConversationContext {
        self.slot(key).state().context.clone()
    }

    /// Return the context for `key` without creating it.
    pub fn get(&self, key: &ContextKey) -> Option<ConversationContext> {
        self.existing(key).map(|slot| slot.state().context.clone())
    }

    /// Wait until no other exchange runs on `key`, then take the lease.
    pub async fn begin_exchange(&self, key: &ContextKey) -> ExchangeLease {
        loop {
            let slot = self.slot(key);
            let guard = Arc::clone(&slot.gate).lock_owned().await;
            if let Some(lease) = self.lease(key, slot, guard) {
                return lease;
            }
            // The slot was reset while we waited; retry on the fresh one.
        }
    }

    /// Take the lease only if `key` is idle.
    pub fn try_begin_exchange(&self, key: &ContextKey) -> Option<ExchangeLease> {
        let slot = self.slot(key);
        let guard = Arc::clone(&slot.gate).try_lock_owned().ok()?;
        self.lease(key, slot, guard)
    }

    fn lease(
        &self,
        key: &ContextKey,
        slot: Arc<ContextSlot>,
        guard: OwnedMutexGuard<()>,
    ) -> Option<ExchangeLease> {
        let cancel = self.root.child_token();
        let (generation, context) = {
            let mut state = slot.state();
            if state.removed {
                return None;
            }
            state.in_flight = Some(cancel.clone());
            (state.generation, state.context.clone())
        };
        Some(ExchangeLease {
            key: key.clone(),
            slot,
            generation,
            context,
            cancel,
            _guard: guard,
        })
    }

    /// Apply a completed exchange.
    ///
    /// Returns `false` and changes nothing if the context was reset or
    /// evicted after the lease was taken.
    pub fn record_exchange(
        &self,
        lease: &ExchangeLease,
        protocol_context_id: Option<&str>,
        tokens: u64,
    ) -> bool {
        let mut state = lease.slot.state();
        if state.removed || state.generation != lease.generation {
            debug!(key = %lease.key, "Discarding exchange result for reset context");
            return false;
        }

        match state.context.apply_exchange(protocol_context_id, tokens) {
            ContextIdChange::Assigned(id) => {
                debug!(key = %lease.key, context_id = %id, "Adopted remote context id");
            }
            ContextIdChange::Rotated { previous, current } => {
                debug!(key = %lease.key, %previous, %current, "Remote context id rotated");
            }
            ContextIdChange::Unchanged => {}
        }
        true
    }

    /// Delete one context and cancel its in-flight exchange.
    ///
    /// Returns `true` if a context existed.
    pub fn reset(&self, key: &ContextKey) -> bool {
        let removed = self.table().remove(key);
        match removed {
            Some(slot) => {
                slot.retire();
                true
            }
            None => false,
        }
    }

    /// Reset every context of a thread; returns the affected clusters, sorted.
    pub fn reset_thread(&self, thread_id: &str) -> Vec<String> {
        let removed: Vec<(ContextKey, Arc<ContextSlot>)> = {
            let mut table = self.table();
            let keys: Vec<ContextKey> = table
                .keys()
                .filter(|k| k.thread_id == thread_id)
                .cloned()
                .collect();
            keys.into_iter()
                .filter_map(|k| table.remove(&k).map(|slot| (k, slot)))
                .collect()
        };

        let mut clusters: Vec<String> = removed
            .into_iter()
            .map(|(key, slot)| {
                slot.retire();
                key.cluster
            })
            .collect();
        clusters.sort();
        clusters
    }

    /// Whether the context has reached `limit` estimated tokens.
    /// Absent contexts are never over budget.
    pub fn is_over_budget(&self, key: &ContextKey, limit: u64) -> bool {
        self.existing(key)
            .is_some_and(|slot| slot.state().context.is_over_budget(limit))
    }

    /// Snapshots of every context of a thread, sorted by cluster.
    pub fn status(&self, thread_id: &str) -> Vec<ContextSnapshot> {
        let slots: Vec<Arc<ContextSlot>> = self
            .table()
            .iter()
            .filter(|(k, _)| k.thread_id == thread_id)
            .map(|(_, slot)| Arc::clone(slot))
            .collect();

        let mut snapshots: Vec<ContextSnapshot> = slots
            .iter()
            .map(|slot| slot.state().context.snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.cluster.cmp(&b.cluster));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Remove contexts idle for longer than `max_idle` with no exchange in
    /// flight. Returns the evicted keys.
    pub fn evict_idle(&self, max_idle: ChronoDuration) -> Vec<ContextKey> {
        let cutoff = Utc::now() - max_idle;
        self.evict_where(|candidates| {
            candidates
                .iter()
                .filter(|(_, last)| *last < cutoff)
                .map(|(key, _)| key.clone())
                .collect()
        })
    }

    /// Evict least recently used idle contexts until at most `max_entries`
    /// remain (contexts with an exchange in flight are never evicted).
    pub fn evict_lru(&self, max_entries: usize) -> Vec<ContextKey> {
        let total = self.len();
        if total <= max_entries {
            return Vec::new();
        }
        let excess = total - max_entries;
        self.evict_where(|candidates| {
            let mut sorted = candidates.to_vec();
            sorted.sort_by_key(|(_, last)| *last);
            sorted.into_iter().take(excess).map(|(key, _)| key).collect()
        })
    }

    /// Evict the keys chosen by `select` from the idle candidates, given as
    /// `(key, last_activity)`.
    fn evict_where<F>(&self, select: F) -> Vec<ContextKey>
    where
        F: FnOnce(&[(ContextKey, chrono::DateTime<Utc>)]) -> Vec<ContextKey>,
    {
        let mut table = self.table();
        let candidates: Vec<(ContextKey, chrono::DateTime<Utc>)> = table
            .iter()
            .filter_map(|(key, slot)| {
                let state = slot.state();
                state
                    .in_flight
                    .is_none()
                    .then(|| (key.clone(), state.context.last_activity()))
            })
            .collect();

        let chosen = select(&candidates);
        for key in &chosen {
            if let Some(slot) = table.remove(key) {
                slot.retire();
                debug!(key = %key, "Evicted idle context");
            }
        }
        chosen
    }

    /// Cancel every in-flight exchange (process shutdown).
    pub fn shutdown(&self) {
        self.root.cancel();
    }
}
