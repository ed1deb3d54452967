use crate::network::message_sml::MnListDiff;
use crate::sml::error::SmlError;
use crate::sml::masternode_list::MasternodeList;

impl MasternodeList {
    /// Checks that `diff` transitions away from this exact snapshot.
    pub fn check_connects(&self, diff: &MnListDiff) -> Result<(), SmlError> {
        if self.block_hash != diff.base_block_hash {
            return Err(SmlError::BaseBlockHashMismatch {
                expected: self.block_hash,
                found: diff.base_block_hash,
            });
        }
        Ok(())
    }

    /// Applies a diff, producing the successor snapshot.
    ///
    /// `self` is left untouched; deletions are processed before additions so
    /// a delete/re-add of the same registration within one diff lands on the
    /// new entry. `known_height` is the height of the diff's target block,
    /// taken from the verified coinbase payload.
    pub fn apply_diff(
        &self,
        diff: &MnListDiff,
        known_height: u32,
    ) -> Result<MasternodeList, SmlError> {
        self.check_connects(diff)?;

        let mut updated = self.clone();
        updated.set_anchor(diff.block_hash, known_height);
        for pro_reg_tx_hash in &diff.deleted_masternodes {
            updated.remove_entry(pro_reg_tx_hash);
        }
        for new_entry in &diff.new_masternodes {
            updated.add_entry(new_entry.clone());
        }
        Ok(updated)
    }
}
