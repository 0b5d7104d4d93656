use std::collections::BTreeMap;

use ethereum_types::H256;

use crate::constants::REORG_WINDOW;

/// Sliding window of recent block hashes for one chain, used to detect
/// divergence and locate a common ancestor. One instance watches L1, another
/// mirrors the local L2 head.
#[derive(Debug, Default)]
pub struct ReorgDetector {
    window: BTreeMap<u64, H256>,
}

impl ReorgDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one observed `(number, hash)` pair.
    ///
    /// Returns `Some(common_ancestor)` when the stored hash for `number`
    /// differs from the observed one. The ancestor is the highest
    /// still-stored block below `number`; 0 (genesis) when none remains.
    /// Entries invalidated by the divergence are dropped and the new hash
    /// takes their place.
    pub fn on_block(&mut self, number: u64, hash: H256) -> Option<u64> {
        if let Some(stored) = self.window.get(&number) {
            if *stored != hash {
                let ancestor = self
                    .window
                    .range(..number)
                    .next_back()
                    .map(|(ancestor, _)| *ancestor)
                    .unwrap_or(0);
                self.window.split_off(&number);
                self.window.insert(number, hash);
                return Some(ancestor);
            }
            return None;
        }

        self.window.insert(number, hash);
        let cutoff = number.saturating_sub(REORG_WINDOW);
        self.window = self.window.split_off(&cutoff);
        None
    }

    pub fn latest(&self) -> Option<u64> {
        self.window.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
