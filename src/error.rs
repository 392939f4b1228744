use crate::decimal::Decimal;

/// Failures that cause an inscription event to be rejected rather than
/// applied. Every variant here is a *soft* failure: the dispatcher logs it
/// at `debug!` and moves on to the next event. None of these are returned
/// to a caller as a crate-level error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
  #[error("malformed content")]
  MalformedContent,

  #[error("unrecognized protocol/operation")]
  UnrecognizedOperation,

  #[error("ticker '{0}' invalid (length or allow-list)")]
  InvalidTicker(String),

  #[error("ticker '{0}' already deployed")]
  DuplicateTicker(String),

  #[error("ticker '{0}' not found")]
  UnknownTicker(String),

  #[error("invalid number: {0}")]
  InvalidNumber(String),

  #[error("value out of range")]
  OutOfRange,

  #[error("self_mint flag invalid")]
  InvalidSelfMintFlag,

  #[error("self-mint gated by height")]
  SelfMintNotEnabled,

  #[error("self-mint parent mismatch")]
  SelfMintParentMismatch,

  #[error("mint amount exceeds per-mint limit")]
  MintExceedsLimit,

  #[error("ticker already fully minted")]
  MintExhausted,

  #[error("insufficient available balance: have {have}, need {need}")]
  InsufficientAvailable { have: Decimal, need: Decimal },

  #[error("insufficient module balance")]
  InsufficientModuleBalance,

  #[error("duplicate transfer move")]
  DuplicateTransferMove,

  #[error("module '{0}' not found")]
  UnknownModule(String),

  #[error("module '{0}' already deployed")]
  DuplicateModule(String),

  #[error("commit signature invalid")]
  InvalidSignature,

  #[error("commit parent '{0}' unknown or already chained")]
  InvalidCommitParent(String),

  #[error("commit function '{0}' unknown")]
  UnknownFunction(String),

  #[error("commit function '{0}' called with malformed parameters")]
  InvalidFunctionParams(String),

  #[error("nothing pending for this key")]
  NothingPending,

  #[error("module configuration invalid or incomplete: {0}")]
  InvalidModuleConfig(String),
}

/// Violations of an internal invariant: these are bugs in the engine, not
/// malformed input, and are not meant to be caught by callers. Per the
/// design's error-handling split (silent reject vs. hard error), surfacing
/// these means aborting rather than continuing with corrupted state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
  #[error("two-way index mismatch for {0}")]
  IndexMismatch(String),

  #[error("negative balance for {0}")]
  NegativeBalance(String),

  #[error("history/index count mismatch")]
  HistoryCountMismatch,
}

impl InvariantViolation {
  /// Aborts the process. Hard errors are bugs, not input errors; callers
  /// should never attempt to recover from one.
  #[track_caller]
  pub fn abort(self) -> ! {
    panic!("internal invariant violated: {self}")
  }
}

pub(crate) fn debug_reject(context: &str, reason: &RejectReason) {
  log::debug!("{context}: rejected ({reason})");
}
