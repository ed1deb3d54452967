/// Tunables of the sync engine.
///
/// The defaults are the constants the protocol has been operated with; they
/// are configuration, not invariants.
#[derive(Copy, Clone, Debug)]
pub struct SyncConfig {
    /// Height from which deterministic masternode lists exist on this
    /// network. Blocks below it are never sync targets.
    pub dmn_activation_height: u32,
    /// How far the local tip may trail a target before an incremental diff
    /// is considered more expensive than a fresh full list and the engine
    /// switches to a from-scratch request.
    pub staleness_threshold: u32,
    /// How often the identical (base, target) request may be issued in a row
    /// before the engine assumes the incremental path is unproductive and
    /// escalates to a full resync.
    pub max_repeat_requests: u32,
    /// How many full-resync escalations a single target may cost before the
    /// engine gives up on it.
    pub max_full_resync_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            dmn_activation_height: 0,
            staleness_threshold: 2000,
            max_repeat_requests: 5,
            max_full_resync_attempts: 24,
        }
    }
}
