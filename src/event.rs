//! The immutable input record (spec §3 "Inscription event") and the typed
//! `Event` variant the classifier reduces it to (spec Design Notes:
//! "tagged variant... avoid polymorphic dispatch through inheritance").

use crate::content::{self, Operation};
use crate::script::ScriptKey;
use once_cell::unsync::OnceCell;

pub const MEMPOOL_HEIGHT: u32 = u32::MAX;

/// One line of the chronologically ordered event stream: either the
/// creation of an inscription or the n-th time it has been moved.
#[derive(Debug, Clone)]
pub struct InscriptionEvent {
  pub is_transfer: bool,
  pub txid: [u8; 32],
  pub index: u32,
  pub vout: u32,
  pub offset: u64,

  pub satoshi: u64,
  pub pk_script: ScriptKey,

  pub inscription_number: i64,
  /// Inscription id of this inscription's parent, when it has one (spec
  /// §4 supplement: `original_source/model/model.go`'s `Parent []byte`
  /// field). Self-mint gating (spec §4.5) checks this against the
  /// ticker's deploying inscription.
  pub parent_inscription_id: Option<String>,
  pub content_body: Vec<u8>,
  pub create_idx_key: u64,

  pub height: u32,
  pub tx_idx_in_block: u32,
  pub block_time: u32,
  pub sequence: u16,

  cached_inscription_id: OnceCell<String>,
}

impl InscriptionEvent {
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    is_transfer: bool,
    txid: [u8; 32],
    index: u32,
    vout: u32,
    offset: u64,
    satoshi: u64,
    pk_script: ScriptKey,
    inscription_number: i64,
    parent_inscription_id: Option<String>,
    content_body: Vec<u8>,
    create_idx_key: u64,
    height: u32,
    tx_idx_in_block: u32,
    block_time: u32,
    sequence: u16,
  ) -> Self {
    Self {
      is_transfer,
      txid,
      index,
      vout,
      offset,
      satoshi,
      pk_script,
      inscription_number,
      parent_inscription_id,
      content_body,
      create_idx_key,
      height,
      tx_idx_in_block,
      block_time,
      sequence,
      cached_inscription_id: OnceCell::new(),
    }
  }

  /// `txid:index`, cached on first access (spec §4 supplement: the Go
  /// reference memoizes `GetInscriptionId` the same way).
  pub fn inscription_id(&self) -> &str {
    self.cached_inscription_id.get_or_init(|| {
      format!("{}i{}", hex::encode(self.txid), self.index)
    })
  }

  pub fn is_confirmed(&self) -> bool {
    self.block_time > 0
  }

  pub fn is_mempool(&self) -> bool {
    self.height == MEMPOOL_HEIGHT
  }
}

/// The result of classifying one event: exactly one handler will consume
/// this.
#[derive(Debug, Clone)]
pub enum ClassifiedEvent {
  /// A move of an already-created inscription whose creation this engine
  /// has a record of (transfer move, approve confirm, withdraw confirm, or
  /// commit move).
  TransferMove,
  ApproveMove,
  WithdrawMove,
  CommitMove,
  /// A brand-new inscription recognized as one of the protocol operations.
  Inscribe(Operation),
  /// Nothing matched; the event advances the stream without side effect.
  Unhandled,
}

/// Stage 1 of classification per spec §4.3: for move events, only the
/// first post-creation move matters, and the concrete routing among
/// transfer/approve/withdraw/commit maps needs live indexer state, so this
/// only determines whether content-decoding should even be attempted.
pub fn classify_inscribe(event: &InscriptionEvent) -> ClassifiedEvent {
  debug_assert!(!event.is_transfer);
  if event.satoshi == 0 {
    return ClassifiedEvent::Unhandled;
  }
  match content::decode(&event.content_body) {
    Some(op) => ClassifiedEvent::Inscribe(op),
    None => ClassifiedEvent::Unhandled,
  }
}
