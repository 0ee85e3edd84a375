use std::time::{Duration, SystemTime};

use bitcoin::Amount;

use crate::error::FeeError;

/// Age after which a table is no longer served.
pub const MAX_TABLE_AGE: Duration = Duration::from_secs(10 * 60);

/// Fee for confirmation within `blocks` blocks, in base units per 1000
/// virtual bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEntry {
    pub blocks: u32,
    pub fee_per_kb: u64,
}

/// Snapshot of the last successful download, ordered by `blocks`. Fees
/// never rise with the target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeTable {
    entries: Vec<FeeEntry>,
    last_sync: Option<SystemTime>,
    fallback_fee_per_kb: Option<u64>,
}

impl FeeTable {
    pub fn new(mut entries: Vec<FeeEntry>, synced_at: SystemTime) -> Self {
        entries.sort_by_key(|e| e.blocks);
        let mut floor = u64::MAX;
        for entry in &mut entries {
            floor = floor.min(entry.fee_per_kb);
            entry.fee_per_kb = floor;
        }
        Self {
            entries,
            last_sync: Some(synced_at),
            fallback_fee_per_kb: None,
        }
    }

    /// Fee returned for targets beyond the last entry, in place of that
    /// entry's fee. Capped at the last entry's fee.
    pub fn with_fallback(mut self, fee_per_kb: Option<u64>) -> Self {
        self.fallback_fee_per_kb = fee_per_kb.filter(|fee| *fee > 0);
        self
    }

    pub fn entries(&self) -> &[FeeEntry] {
        &self.entries
    }

    pub fn last_sync(&self) -> Option<SystemTime> {
        self.last_sync
    }

    /// Fee of the first entry covering `blocks`.
    pub fn estimate(&self, blocks: u32, now: SystemTime) -> Result<Amount, FeeError> {
        let (Some(last_entry), Some(last_sync)) = (self.entries.last(), self.last_sync) else {
            return Err(FeeError::NoFeesYet);
        };
        if last_sync + MAX_TABLE_AGE < now {
            return Err(FeeError::Stale {
                last_sync_at: last_sync,
            });
        }
        let fee = self
            .entries
            .iter()
            .find(|e| e.blocks >= blocks)
            .map(|e| e.fee_per_kb)
            .unwrap_or_else(|| {
                self.fallback_fee_per_kb
                    .map_or(last_entry.fee_per_kb, |fee| fee.min(last_entry.fee_per_kb))
            });
        Ok(Amount::from_sat(fee))
    }
}
