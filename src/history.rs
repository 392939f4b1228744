//! Append-only history log (spec §3 "History", §4.9).
//!
//! Every mutable index the engine hands out is a `u32` position into
//! `HistoryLog::entries`, never a pointer, so snapshots stay cheap to copy
//! and reason about.

use crate::event::MEMPOOL_HEIGHT;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HistoryType {
  InscribeDeploy,
  InscribeMint,
  InscribeTransfer,
  Transfer,
  Send,
  Receive,
  ModuleDeploy,
  ModuleDeposit,
  ModuleApprove,
  ModuleWithdraw,
  ModuleCommit,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
  pub kind: HistoryType,
  pub valid: bool,
  pub height: u32,
  pub tx_idx_in_block: u32,
  pub block_time: u32,
  pub inscription_id: String,
  pub ticker: Option<String>,
  pub from: Option<String>,
  pub to: Option<String>,
  pub amount: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
  entries: Vec<HistoryEntry>,
  first_history_by_height: HashMap<u32, u32>,
  last_history_height: u32,
  first_mempool_history: Option<u32>,
}

impl HistoryLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn get(&self, index: u32) -> Option<&HistoryEntry> {
    self.entries.get(index as usize)
  }

  pub fn entries(&self) -> &[HistoryEntry] {
    &self.entries
  }

  pub fn first_history_by_height(&self) -> &HashMap<u32, u32> {
    &self.first_history_by_height
  }

  pub fn last_history_height(&self) -> u32 {
    self.last_history_height
  }

  pub fn first_mempool_history(&self) -> Option<u32> {
    self.first_mempool_history
  }

  /// Appends `entry`, returns its index, and backfills
  /// `first_history_by_height` over every height skipped since the last
  /// append (spec §4.9).
  pub fn append(&mut self, entry: HistoryEntry) -> u32 {
    let height = entry.height;
    let index = self.entries.len() as u32;
    self.entries.push(entry);

    if height == self.last_history_height {
      return index;
    }

    if height == MEMPOOL_HEIGHT {
      if self.first_mempool_history.is_none() {
        self.first_mempool_history = Some(index);
      }
      return index;
    }

    if self.last_history_height == 0 {
      self.first_history_by_height.insert(height, index);
    } else {
      for h in (self.last_history_height + 1)..=height {
        self.first_history_by_height.insert(h, index);
      }
    }
    self.last_history_height = height;

    index
  }

  #[cfg(test)]
  pub(crate) fn check_monotone(&self) -> bool {
    for (&h, &i) in &self.first_history_by_height {
      if self.entries[..i as usize].iter().any(|e| e.height >= h) {
        return false;
      }
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(height: u32) -> HistoryEntry {
    HistoryEntry {
      kind: HistoryType::InscribeDeploy,
      valid: true,
      height,
      tx_idx_in_block: 0,
      block_time: 0,
      inscription_id: "x".to_string(),
      ticker: None,
      from: None,
      to: None,
      amount: None,
    }
  }

  #[test]
  fn backfills_skipped_heights() {
    let mut log = HistoryLog::new();
    log.append(entry(5));
    log.append(entry(5));
    log.append(entry(8));
    assert_eq!(*log.first_history_by_height().get(&5).unwrap(), 0);
    assert_eq!(*log.first_history_by_height().get(&6).unwrap(), 2);
    assert_eq!(*log.first_history_by_height().get(&7).unwrap(), 2);
    assert_eq!(*log.first_history_by_height().get(&8).unwrap(), 2);
    assert!(log.check_monotone());
  }

  #[test]
  fn mempool_tracked_separately() {
    let mut log = HistoryLog::new();
    log.append(entry(MEMPOOL_HEIGHT));
    log.append(entry(MEMPOOL_HEIGHT));
    assert_eq!(log.first_mempool_history(), Some(0));
    assert!(log.first_history_by_height().is_empty());
  }
}
