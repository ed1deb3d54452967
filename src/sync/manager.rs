//! The stateful sync engine.
//!
//! One lock guards the tips, the pending-target queue and the published list
//! snapshots. The lock is never held across a dispatch call or a snapshot
//! save; request parameters and snapshots are copied out first.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::hash_types::BlockHash;
use crate::network::message_sml::{GetMnListDiff, MnListDiff};
use crate::sml::masternode_list::{MasternodeList, UNANCHORED_HEIGHT};
use crate::sml::quorum_list::QuorumList;
use crate::storage::{LLMQ_FORMAT_VERSION, MN_FORMAT_VERSION, ManagerSnapshot, SnapshotStore};
use crate::sync::config::SyncConfig;
use crate::sync::transition::{DiffError, apply_diff_transition};
use crate::sync::{BlockInfo, ChainTipSource, PeerDispatch};

use hashes::Hash;

/// Where the engine currently is in its request cycle.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SyncPhase {
    /// No request outstanding.
    Idle,
    /// A from-scratch diff (zero base) has been requested.
    AwaitingFullResync,
    /// An incremental diff from the current tip has been requested.
    AwaitingIncrementalDiff,
}

/// Progress counters, exposed so an embedding application can observe a
/// stuck sync instead of catching an exception that never comes.
#[derive(Copy, Clone, Default, Debug)]
pub struct SyncStats {
    /// Requests handed to the dispatcher.
    pub requests_sent: u64,
    /// Diffs applied and committed.
    pub diffs_applied: u64,
    /// Diffs dropped because they did not connect to the tip.
    pub stale_diffs_ignored: u64,
    /// Diffs dropped because verification failed.
    pub verification_failures: u64,
    /// Escalations from incremental to full resync.
    pub full_resync_escalations: u64,
    /// Targets abandoned after the retry budget ran out.
    pub abandoned_targets: u64,
}

struct SyncState {
    mn_list: Arc<MasternodeList>,
    quorum_list: Arc<QuorumList>,
    tip_hash: BlockHash,
    tip_height: u32,
    phase: SyncPhase,
    pending_targets: VecDeque<BlockInfo>,
    last_request: Option<(BlockHash, BlockHash)>,
    last_request_repeats: u32,
    full_resync_attempts: u32,
    stats: SyncStats,
}

impl SyncState {
    fn fresh() -> Self {
        SyncState {
            mn_list: Arc::new(MasternodeList::empty()),
            quorum_list: Arc::new(QuorumList::empty()),
            tip_hash: BlockHash::all_zeros(),
            tip_height: UNANCHORED_HEIGHT,
            phase: SyncPhase::Idle,
            pending_targets: VecDeque::new(),
            last_request: None,
            last_request_repeats: 0,
            full_resync_attempts: 0,
            stats: SyncStats::default(),
        }
    }

    fn reset_lists(&mut self) {
        self.mn_list = Arc::new(MasternodeList::empty());
        self.quorum_list = Arc::new(QuorumList::empty());
        self.tip_hash = BlockHash::all_zeros();
        self.tip_height = UNANCHORED_HEIGHT;
    }

    fn tip_is_unset(&self) -> bool {
        self.tip_hash == BlockHash::all_zeros() || self.tip_height == UNANCHORED_HEIGHT
    }
}

/// The masternode-list sync engine.
///
/// Drives `GetMnListDiff`/`MnListDiff` exchanges to keep the local list pair
/// converged with the chain tip. All inputs arrive through explicit method
/// calls; the chain, transport and store are injected at construction.
pub struct MasternodeSyncManager<D, C, S> {
    config: SyncConfig,
    dispatch: D,
    chain: C,
    store: S,
    state: Mutex<SyncState>,
}

impl<D: PeerDispatch, C: ChainTipSource, S: SnapshotStore> MasternodeSyncManager<D, C, S> {
    /// A fresh engine with an empty, unanchored list pair.
    pub fn new(config: SyncConfig, dispatch: D, chain: C, store: S) -> Self {
        MasternodeSyncManager {
            config,
            dispatch,
            chain,
            store,
            state: Mutex::new(SyncState::fresh()),
        }
    }

    /// Restores the last persisted snapshot, if one exists. Returns whether
    /// anything was restored. A corrupt snapshot is discarded; the engine
    /// then starts from scratch like a fresh one.
    pub fn load(&self) -> bool {
        match self.store.load() {
            Ok(Some(snapshot)) => {
                let mut state = self.lock_state();
                state.tip_hash = snapshot.tip_hash;
                state.tip_height = snapshot.tip_height;
                state.mn_list = Arc::new(snapshot.mn_list);
                state.quorum_list = Arc::new(snapshot.quorum_list);
                info!(
                    height = state.tip_height,
                    masternodes = state.mn_list.len(),
                    "restored masternode list snapshot"
                );
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("discarding unusable masternode list snapshot: {e}");
                false
            }
        }
    }

    /// The current masternode list snapshot. Cheap; safe to hold across
    /// later commits.
    pub fn masternode_list(&self) -> Arc<MasternodeList> {
        Arc::clone(&self.lock_state().mn_list)
    }

    /// The current quorum list snapshot.
    pub fn quorum_list(&self) -> Arc<QuorumList> {
        Arc::clone(&self.lock_state().quorum_list)
    }

    /// The tip the lists are anchored to.
    pub fn tip(&self) -> (BlockHash, u32) {
        let state = self.lock_state();
        (state.tip_hash, state.tip_height)
    }

    /// The engine's current phase.
    pub fn sync_phase(&self) -> SyncPhase {
        self.lock_state().phase
    }

    /// Progress counters.
    pub fn stats(&self) -> SyncStats {
        self.lock_state().stats
    }

    /// Chain-tip notification: a new best block exists.
    pub fn on_new_best_block(&self, block: BlockInfo) {
        if block.height < self.config.dmn_activation_height {
            return;
        }
        self.request_diff(block);
    }

    /// A peer connected. If the local tip trails the known chain head, use
    /// the occasion to catch up.
    pub fn on_peer_connected(&self) {
        let Some(head) = self.chain.chain_tip() else {
            return;
        };
        let behind = {
            let state = self.lock_state();
            state.tip_is_unset() || state.tip_height < head.height
        };
        if behind {
            self.request_diff(head);
        }
    }

    /// The peer serving the outstanding request disconnected. The request is
    /// treated as failed and re-issued, so a dropped connection cannot leave
    /// the engine waiting forever.
    pub fn on_peer_disconnected(&self) {
        let request = {
            let mut state = self.lock_state();
            if state.phase == SyncPhase::Idle {
                return;
            }
            debug!("peer lost with a diff request outstanding, re-requesting");
            state.phase = SyncPhase::Idle;
            self.next_request(&mut state)
        };
        self.send(request);
    }

    /// Enqueues `target` and issues a request for it unless one is already
    /// outstanding. Targets are served one at a time.
    pub fn request_diff(&self, target: BlockInfo) {
        let request = {
            let mut state = self.lock_state();
            // Already there; nothing to request.
            if target.hash == state.tip_hash && target.hash != BlockHash::all_zeros() {
                return;
            }
            if target.height < self.config.dmn_activation_height {
                return;
            }
            if state.pending_targets.iter().any(|queued| queued.hash == target.hash) {
                return;
            }
            state.pending_targets.push_back(target);
            if state.phase != SyncPhase::Idle {
                // The running exchange resolves first; the queue keeps order.
                return;
            }
            self.next_request(&mut state)
        };
        self.send(request);
    }

    /// A decoded diff arrived from the network.
    pub fn on_diff_message(&self, diff: MnListDiff) {
        let (request, snapshot) = {
            let mut state = self.lock_state();
            let expected_height = state
                .pending_targets
                .iter()
                .find(|target| target.hash == diff.block_hash)
                .map(|target| target.height);

            match apply_diff_transition(&state.mn_list, &state.quorum_list, &diff, expected_height)
            {
                Ok(transition) => {
                    let had_changes = transition.has_changes;
                    match transition.mn_list {
                        Some(new_list) => state.mn_list = Arc::new(new_list),
                        // Anchor-only move. Readers holding the old snapshot
                        // keep it; make_mut clones only when they exist.
                        None => Arc::make_mut(&mut state.mn_list)
                            .set_anchor(transition.block_hash, transition.height),
                    }
                    if let Some(new_quorums) = transition.quorum_list {
                        state.quorum_list = Arc::new(new_quorums);
                    }
                    state.tip_hash = transition.block_hash;
                    state.tip_height = transition.height;
                    state.phase = SyncPhase::Idle;
                    state.last_request = None;
                    state.last_request_repeats = 0;
                    state.full_resync_attempts = 0;
                    state.stats.diffs_applied += 1;
                    state.pending_targets.retain(|target| target.hash != transition.block_hash);
                    info!(
                        height = state.tip_height,
                        masternodes = state.mn_list.len(),
                        quorums = state.quorum_list.len(),
                        "masternode list advanced"
                    );

                    let snapshot = had_changes.then(|| self.snapshot_locked(&state));
                    (self.next_request(&mut state), snapshot)
                }
                Err(DiffError::Stale(e)) => {
                    // Routine under duplicate delivery.
                    debug!("ignoring stale masternode list diff: {e}");
                    state.stats.stale_diffs_ignored += 1;
                    (None, None)
                }
                Err(DiffError::Verification(e)) => {
                    warn!("masternode list diff failed verification: {e}");
                    state.stats.verification_failures += 1;
                    state.phase = SyncPhase::Idle;
                    (self.next_request(&mut state), None)
                }
            }
        };
        if let Some(snapshot) = snapshot {
            // Persistence failures cost durability, never correctness.
            if let Err(e) = self.store.save(&snapshot) {
                warn!("failed to persist masternode list snapshot: {e}");
            }
        }
        self.send(request);
    }

    /// Builds a persistable snapshot of the current state.
    pub fn snapshot(&self) -> ManagerSnapshot {
        self.snapshot_locked(&self.lock_state())
    }

    fn snapshot_locked(&self, state: &SyncState) -> ManagerSnapshot {
        let format_version =
            if state.quorum_list.is_empty() { MN_FORMAT_VERSION } else { LLMQ_FORMAT_VERSION };
        ManagerSnapshot {
            format_version,
            mn_list: (*state.mn_list).clone(),
            tip_hash: state.tip_hash,
            tip_height: state.tip_height,
            quorum_list: (*state.quorum_list).clone(),
        }
    }

    /// Decides the next wire request for the front pending target, updating
    /// the retry bookkeeping. Returns `None` when there is nothing to do or
    /// the target was abandoned.
    fn next_request(&self, state: &mut SyncState) -> Option<GetMnListDiff> {
        loop {
            let target = *state.pending_targets.front()?;

            let stale = state.tip_is_unset()
                || state.tip_height.saturating_add(self.config.staleness_threshold)
                    < target.height;
            if stale && !state.tip_is_unset() {
                info!(
                    tip = state.tip_height,
                    target = target.height,
                    "tip too far behind target, switching to full resync"
                );
            }
            if stale {
                state.reset_lists();
                state.phase = SyncPhase::AwaitingFullResync;
            } else {
                state.phase = SyncPhase::AwaitingIncrementalDiff;
            }
            let request =
                GetMnListDiff { base_block_hash: state.tip_hash, block_hash: target.hash };

            // Duplicate-request accounting: the same edge requested over and
            // over without an apply means the peer or our base is unproductive.
            let edge = (request.base_block_hash, request.block_hash);
            if state.last_request == Some(edge) {
                state.last_request_repeats += 1;
                if state.last_request_repeats > self.config.max_repeat_requests {
                    state.last_request_repeats = 0;
                    state.full_resync_attempts += 1;
                    if state.full_resync_attempts > self.config.max_full_resync_attempts {
                        warn!(
                            target = target.height,
                            "giving up on sync target after exhausting retries"
                        );
                        state.stats.abandoned_targets += 1;
                        state.pending_targets.pop_front();
                        state.phase = SyncPhase::Idle;
                        state.full_resync_attempts = 0;
                        state.last_request = None;
                        continue;
                    }
                    state.stats.full_resync_escalations += 1;
                    warn!(
                        repeats = self.config.max_repeat_requests,
                        "repeated identical diff requests, escalating to full resync"
                    );
                    state.reset_lists();
                    state.phase = SyncPhase::AwaitingFullResync;
                    let full = GetMnListDiff {
                        base_block_hash: BlockHash::all_zeros(),
                        block_hash: target.hash,
                    };
                    state.last_request = Some((full.base_block_hash, full.block_hash));
                    state.stats.requests_sent += 1;
                    return Some(full);
                }
            } else {
                state.last_request = Some(edge);
                state.last_request_repeats = 0;
            }
            state.stats.requests_sent += 1;
            return Some(request);
        }
    }

    fn send(&self, request: Option<GetMnListDiff>) {
        let Some(request) = request else {
            return;
        };
        debug!(
            base = %request.base_block_hash,
            target = %request.block_hash,
            "requesting masternode list diff"
        );
        if let Err(e) = self.dispatch.send_get_diff(request) {
            // The next trigger (peer event or block) retries.
            warn!("could not dispatch diff request: {e}");
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
