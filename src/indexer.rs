//! The engine: a single-threaded, in-memory state machine that folds an
//! ordered stream of `InscriptionEvent`s into ticker/module state and an
//! append-only history log (spec §1, §4). Grounded on
//! `original_source/indexer/indexer.go`'s top-level dispatch loop and the
//! teacher's `okx/protocol/brc20/msg_executor.rs` match-and-apply shape.

use crate::config::Config;
use crate::content::Operation;
use crate::error::{debug_reject, RejectReason};
use crate::event::{classify_inscribe, ClassifiedEvent, InscriptionEvent};
use crate::handlers::{deploy, inscribe_transfer, mint, spend};
use crate::history::{HistoryEntry, HistoryLog, HistoryType};
use crate::ledger::Ledger;
use crate::module::sign::SignatureVerifier;
use crate::module::{self, ModuleRegistry};
use crate::script::{AddressCodec, ModuleScriptDecoder, ScriptKey};
use crate::ticker::TickerRegistry;
use log::info;
use std::collections::HashMap;
use std::sync::Mutex;

/// The external collaborators this crate never implements itself (spec
/// §1 Non-goals / §6): address<->script encoding, module-script
/// recognition, and compact-signature verification. Bundled so the
/// dispatcher takes one reference instead of three.
pub struct Collaborators<'a> {
  pub address_codec: &'a dyn AddressCodec,
  pub module_script_decoder: &'a dyn ModuleScriptDecoder,
  pub signature_verifier: &'a dyn SignatureVerifier,
}

/// Where a pending transfer inscription's eventual move is routed.
/// `valid` mirrors whether it landed in the ledger's valid- or
/// invalid-transfer map (spec §4.6): an invalid one is still indexed
/// here so its eventual spend is recognized as a no-op rather than
/// falling through as "nothing pending" (spec §4.7).
#[derive(Debug, Clone)]
struct PendingTransfer {
  owner: ScriptKey,
  ticker: String,
  valid: bool,
}

/// A pending module approve awaiting its own first move (spec §4.8
/// step 2).
#[derive(Debug, Clone)]
struct PendingApprove {
  user: ScriptKey,
  module: String,
  tick: String,
}

/// A pending module withdraw awaiting its own first move (spec §4.8
/// step 3).
#[derive(Debug, Clone)]
struct PendingWithdraw {
  user: ScriptKey,
  module: String,
  tick: String,
}

#[derive(Debug)]
pub struct BRC20ModuleIndexer {
  pub config: Config,
  pub tickers: TickerRegistry,
  pub ledger: Ledger,
  pub modules: ModuleRegistry,
  pub history: HistoryLog,

  /// Highest confirmed height seen so far, used as `latestHeight` in the
  /// module-deposit safe-confirmation gate (spec §4.7). Mempool events
  /// (`height == MEMPOOL_HEIGHT`) never advance this.
  latest_height: u32,

  /// `create_idx_key -> (owner, ticker)` for inscribe-transfers awaiting
  /// their spend move (spec §4.6/§4.7).
  transfer_index: HashMap<u64, PendingTransfer>,
  /// `create_idx_key -> pending approve` awaiting its confirming move
  /// (spec §4.8 step 2).
  approve_index: HashMap<u64, PendingApprove>,
  /// `create_idx_key -> pending withdraw` awaiting its confirming move
  /// (spec §4.8 step 3).
  withdraw_index: HashMap<u64, PendingWithdraw>,

  /// Per-user aggregate history, supplementing the per-ticker and
  /// per-module history lists with a single cross-ticker feed (spec
  /// supplement: the reference keeps a parallel user history index
  /// alongside the ticker-scoped ones).
  user_history: HashMap<ScriptKey, Vec<u32>>,

  /// Lazily-memoized, height-descending holder list per ticker, guarded
  /// the way the reference guards `TokenUsersBalanceDataSortedCache`
  /// with a mutex rather than recomputing on every read. Invalidated
  /// (cleared) whenever a balance changes.
  sorted_holders_cache: Mutex<HashMap<String, Vec<ScriptKey>>>,
}

impl Clone for BRC20ModuleIndexer {
  /// Manual `Clone`: `Mutex` doesn't derive, and a fresh clone starts
  /// with a cold holder cache rather than cloning the lock itself (spec
  /// §5 `deep_copy`: the cache is a memoization detail, not state that
  /// needs to survive a snapshot byte-for-byte).
  fn clone(&self) -> Self {
    Self {
      config: self.config.clone(),
      tickers: self.tickers.clone(),
      ledger: self.ledger.clone(),
      modules: self.modules.clone(),
      history: self.history.clone(),
      latest_height: self.latest_height,
      transfer_index: self.transfer_index.clone(),
      approve_index: self.approve_index.clone(),
      withdraw_index: self.withdraw_index.clone(),
      user_history: self.user_history.clone(),
      sorted_holders_cache: Mutex::new(HashMap::new()),
    }
  }
}

impl BRC20ModuleIndexer {
  pub fn new(config: Config) -> Self {
    Self {
      config,
      tickers: TickerRegistry::new(),
      ledger: Ledger::new(),
      modules: ModuleRegistry::new(),
      history: HistoryLog::new(),
      latest_height: 0,
      transfer_index: HashMap::new(),
      approve_index: HashMap::new(),
      withdraw_index: HashMap::new(),
      user_history: HashMap::new(),
      sorted_holders_cache: Mutex::new(HashMap::new()),
    }
  }

  /// Logs a one-line summary of the engine's size at `info` level (spec
  /// supplement: the reference logs a progress summary after every
  /// processed batch rather than per-event). Callers decide what counts
  /// as a "batch" — the CLI calls this once after the whole input file
  /// has been applied.
  pub fn process_batch(&self, batch_events: usize) {
    info!(
      "batch done: {} events, {} tickers, {} modules, {} history entries, latest_height={}",
      batch_events,
      self.tickers.len(),
      self.modules.len(),
      self.history.len(),
      self.latest_height,
    );
  }

  fn invalidate_sorted_holders(&self, ticker: &str) {
    self.sorted_holders_cache.lock().expect("cache mutex poisoned").remove(ticker);
  }

  /// Holders of `ticker` sorted by descending available balance,
  /// computed once and cached until the next balance change.
  pub fn sorted_holders(&self, ticker: &str) -> Vec<ScriptKey> {
    let mut cache = self.sorted_holders_cache.lock().expect("cache mutex poisoned");
    if let Some(cached) = cache.get(ticker) {
      return cached.clone();
    }
    let mut holders: Vec<ScriptKey> = self.ledger.holders(ticker).cloned().collect();
    holders.sort_by(|a, b| {
      let ba = self.ledger.balance(ticker, a).expect("listed as a holder").available;
      let bb = self.ledger.balance(ticker, b).expect("listed as a holder").available;
      bb.cmp(&ba)
    });
    cache.insert(ticker.to_string(), holders.clone());
    holders
  }

  fn record_history(
    &mut self,
    kind: HistoryType,
    valid: bool,
    event: &InscriptionEvent,
    ticker: Option<String>,
    from: Option<ScriptKey>,
    to: Option<ScriptKey>,
    amount: Option<String>,
  ) -> u32 {
    let entry = HistoryEntry {
      kind,
      valid,
      height: event.height,
      tx_idx_in_block: event.tx_idx_in_block,
      block_time: event.block_time,
      inscription_id: event.inscription_id().to_string(),
      ticker,
      from: from.as_ref().map(ScriptKey::to_string),
      to: to.as_ref().map(ScriptKey::to_string),
      amount,
    };
    let index = self.history.append(entry);
    if let Some(owner) = from {
      self.user_history.entry(owner).or_default().push(index);
    }
    if let Some(owner) = to {
      self.user_history.entry(owner).or_default().push(index);
    }
    index
  }

  /// Applies one event from the ordered stream. Never returns an error
  /// to the caller: malformed or disallowed events are logged at debug
  /// and skipped (spec §4.3), since a rejection is a normal outcome of
  /// indexing untrusted on-chain data, not a bug.
  pub fn apply_event(&mut self, event: &InscriptionEvent, collab: &Collaborators) {
    if event.is_confirmed() && !event.is_mempool() && event.height > self.latest_height {
      self.latest_height = event.height;
    }
    if event.is_transfer {
      // Only the first post-creation move of a transferable inscription
      // is ever meaningful (spec §4.3 step 1); later re-spends of the
      // same sat are outside this protocol's concern.
      if event.sequence == 1 {
        self.apply_move(event, collab);
      }
    } else {
      self.apply_creation(event, collab);
    }
  }

  fn apply_creation(&mut self, event: &InscriptionEvent, collab: &Collaborators) {
    match classify_inscribe(event) {
      ClassifiedEvent::Inscribe(op) => self.apply_operation(event, op, collab),
      _ => {}
    }
  }

  fn apply_operation(&mut self, event: &InscriptionEvent, op: Operation, collab: &Collaborators) {
    match op {
      Operation::Deploy { tick, max, lim, dec, self_mint } => {
        let owner = event.pk_script.clone();
        let deploy_inscription_id = event.inscription_id().to_string();
        match deploy::handle_deploy(
          &mut self.tickers,
          &self.config,
          owner.clone(),
          deploy_inscription_id,
          event.height,
          &tick,
          &max,
          lim.as_deref(),
          dec.as_deref(),
          self_mint.as_deref(),
        ) {
          Ok(lower) => {
            let idx = self.record_history(
              HistoryType::InscribeDeploy,
              true,
              event,
              Some(lower.clone()),
              None,
              Some(event.pk_script.clone()),
              Some(max),
            );
            if let Some(info) = self.tickers.get_mut(&lower) {
              info.history.push(idx);
            }
            // Install the deployer's own zero-balance record in both
            // ledger indices (spec §4.4).
            let decimal = self.tickers.get(&lower).map(|i| i.decimal).unwrap_or(0);
            self.ledger.balance_mut(&lower, &owner, decimal);
          }
          Err(reason) => debug_reject("deploy", &reason),
        }
      }

      Operation::Mint { tick, amt } => {
        let minter = event.pk_script.clone();
        let self_mint_enabled = event.height >= self.config.enable_self_mint_height;
        match mint::handle_mint(
          &mut self.tickers,
          &mut self.ledger,
          minter.clone(),
          &tick,
          &amt,
          event.parent_inscription_id.as_deref(),
          self_mint_enabled,
          event.is_confirmed(),
          event.height,
          event.block_time,
        ) {
          Ok(credited) => {
            let lower = tick.to_lowercase();
            self.invalidate_sorted_holders(&lower);
            let decimal = self.tickers.get(&lower).map(|i| i.decimal).unwrap_or(0);
            let idx = self.record_history(
              HistoryType::InscribeMint,
              true,
              event,
              Some(lower.clone()),
              None,
              Some(minter.clone()),
              Some(credited.to_string()),
            );
            if let Some(info) = self.tickers.get_mut(&lower) {
              info.history.push(idx);
              info.history_mint.push(idx);
            }
            self.ledger.balance_mut(&lower, &minter, decimal).history_mint.push(idx);
          }
          Err(reason) => debug_reject("mint", &reason),
        }
      }

      Operation::Transfer { tick, amt } => {
        let owner = event.pk_script.clone();
        let lower = tick.to_lowercase();
        match inscribe_transfer::handle_inscribe_transfer(
          &self.tickers,
          &mut self.ledger,
          owner.clone(),
          &tick,
          &amt,
          event.create_idx_key,
        ) {
          Ok(valid) => {
            self.invalidate_sorted_holders(&lower);
            self.transfer_index.insert(
              event.create_idx_key,
              PendingTransfer {
                owner: owner.clone(),
                ticker: lower.clone(),
                valid,
              },
            );
            let decimal = self.tickers.get(&lower).map(|i| i.decimal).unwrap_or(0);
            let idx = self.record_history(
              HistoryType::InscribeTransfer,
              valid,
              event,
              Some(lower.clone()),
              None,
              Some(owner.clone()),
              Some(amt),
            );
            if let Some(info) = self.tickers.get_mut(&lower) {
              info.history.push(idx);
              info.history_inscribe_transfer.push(idx);
            }
            self.ledger.balance_mut(&lower, &owner, decimal).history_inscribe_transfer.push(idx);
          }
          Err(reason) => debug_reject("inscribe-transfer", &reason),
        }
      }

      Operation::ModuleDeploy { name, source: _, init } => {
        let deployer = event.pk_script.clone();
        let module_id = event.inscription_id().to_string();
        match module::create::handle_module_deploy(
          &mut self.modules,
          module_id.clone(),
          deployer.clone(),
          name,
          &init,
          collab.address_codec,
        ) {
          Ok(()) => {
            let idx = self.record_history(
              HistoryType::ModuleDeploy,
              true,
              event,
              None,
              None,
              Some(deployer),
              None,
            );
            if let Some(m) = self.modules.get_mut(&module_id) {
              m.history.push(idx);
            }
          }
          Err(reason) => debug_reject("module-deploy", &reason),
        }
      }

      Operation::ModuleApprove { module, tick, amt } => {
        let user = event.pk_script.clone();
        if !self.modules.contains(&module) {
          debug_reject("module-approve", &RejectReason::UnknownModule(module));
          return;
        }
        let lower = tick.to_lowercase();
        let decimal = match self.tickers.get(&lower) {
          Some(info) => info.decimal,
          None => {
            debug_reject("module-approve", &RejectReason::UnknownTicker(lower));
            return;
          }
        };
        let outcome = {
          let m = self.modules.get_mut(&module).expect("checked above");
          module::approve::handle_module_approve_inscribe(&mut self.ledger, m, &user, &lower, &amt, decimal, event.create_idx_key)
        };
        match outcome {
          Ok(amount) => {
            self.approve_index.insert(
              event.create_idx_key,
              PendingApprove {
                user: user.clone(),
                module: module.clone(),
                tick: lower.clone(),
              },
            );
            let idx = self.record_history(
              HistoryType::ModuleApprove,
              true,
              event,
              Some(lower.clone()),
              None,
              Some(user.clone()),
              Some(amount.to_string()),
            );
            if let Some(m) = self.modules.get_mut(&module) {
              m.history.push(idx);
              m.balance_mut(&lower, &user).history.push(idx);
            }
          }
          Err(reason) => debug_reject("module-approve", &reason),
        }
      }

      Operation::ModuleWithdraw { module, tick, amt } => {
        let user = event.pk_script.clone();
        let height = event.height;
        let create_idx_key = event.create_idx_key;
        let lower = tick.to_lowercase();
        let outcome = self
          .modules
          .get_mut(&module)
          .ok_or_else(|| RejectReason::UnknownModule(module.clone()))
          .and_then(|m| module::withdraw::handle_module_withdraw_inscribe(m, &user, &lower, &amt, create_idx_key, height));
        match outcome {
          Ok(amount) => {
            self.withdraw_index.insert(
              create_idx_key,
              PendingWithdraw {
                user: user.clone(),
                module: module.clone(),
                tick: lower.clone(),
              },
            );
            let idx = self.record_history(
              HistoryType::ModuleWithdraw,
              true,
              event,
              Some(lower.clone()),
              Some(user.clone()),
              None,
              Some(amount.to_string()),
            );
            if let Some(m) = self.modules.get_mut(&module) {
              m.history.push(idx);
              m.balance_mut(&lower, &user).history.push(idx);
            }
          }
          Err(reason) => debug_reject("module-withdraw", &reason),
        }
      }

      Operation::ModuleCommit { module, parent, gas_price: _, data } => {
        let outcome = self.modules.get_mut(&module).ok_or_else(|| RejectReason::UnknownModule(module.clone())).and_then(|m| {
          module::commit::apply_commit(m, parent.as_deref(), &data, collab.signature_verifier, collab.address_codec)
        });
        match outcome {
          Ok(commit_id) => {
            let idx = self.record_history(
              HistoryType::ModuleCommit,
              true,
              event,
              None,
              None,
              None,
              Some(commit_id),
            );
            if let Some(m) = self.modules.get_mut(&module) {
              m.history.push(idx);
            }
          }
          Err(reason) => debug_reject("module-commit", &reason),
        }
      }
    }
  }

  /// Routes an inscription's own first move to whichever pending map it
  /// was registered under, checked in priority order: an inscription id
  /// is only ever parked in one of the three (spec §4.3 step 2).
  fn apply_move(&mut self, event: &InscriptionEvent, collab: &Collaborators) {
    if self.transfer_index.contains_key(&event.create_idx_key) {
      self.apply_transfer_move(event, collab);
    } else if self.approve_index.contains_key(&event.create_idx_key) {
      self.apply_approve_move(event, collab);
    } else if self.withdraw_index.contains_key(&event.create_idx_key) {
      self.apply_withdraw_move(event, collab);
    }
  }

  fn apply_transfer_move(&mut self, event: &InscriptionEvent, collab: &Collaborators) {
    let pending = self.transfer_index.get(&event.create_idx_key).cloned().expect("checked by caller");
    // A fee-spent inscription (no satoshi ever reaches a recipient
    // script) refunds the sender instead of crediting whatever script
    // happened to pay the fee (spec §4.7).
    let recipient = if event.satoshi == 0 { pending.owner.clone() } else { event.pk_script.clone() };
    let module_id_for_recipient = collab.module_script_decoder.module_id_for(&recipient);

    match spend::handle_spend(
      &mut self.tickers,
      &mut self.ledger,
      &mut self.modules,
      &pending.owner,
      &pending.ticker,
      event.create_idx_key,
      &recipient,
      module_id_for_recipient.clone(),
      pending.valid,
      event.is_confirmed(),
      event.height,
      self.latest_height,
      self.config.module_safe_confirmation,
    ) {
      Ok(outcome) => {
        self.transfer_index.remove(&event.create_idx_key);
        self.invalidate_sorted_holders(&pending.ticker);
        if matches!(outcome, spend::SpendOutcome::Invalid) {
          return;
        }
        let kind = match outcome {
          spend::SpendOutcome::Deposited { .. } => HistoryType::ModuleDeposit,
          spend::SpendOutcome::Transferred | spend::SpendOutcome::Burned => HistoryType::Transfer,
          spend::SpendOutcome::Invalid => unreachable!("handled above"),
        };
        let decimal = self.tickers.get(&pending.ticker).map(|i| i.decimal).unwrap_or(0);
        let idx = self.record_history(
          kind,
          true,
          event,
          Some(pending.ticker.clone()),
          Some(pending.owner.clone()),
          Some(recipient.clone()),
          None,
        );
        if let Some(info) = self.tickers.get_mut(&pending.ticker) {
          info.history.push(idx);
          info.history_transfer.push(idx);
        }
        self.ledger.balance_mut(&pending.ticker, &pending.owner, decimal).history_send.push(idx);
        self.ledger.balance_mut(&pending.ticker, &recipient, decimal).history_receive.push(idx);
      }
      Err(reason) => debug_reject("spend", &reason),
    }
  }

  /// An approve's confirming move settles into the module's own
  /// `swap_account` when it lands back on the module's script, and
  /// refunds to base-ledger `available` otherwise — the same settle/
  /// refund split a plain transfer makes between a module deposit and a
  /// regular recipient (spec §4.8 step 2, Open Question: see DESIGN.md).
  fn apply_approve_move(&mut self, event: &InscriptionEvent, collab: &Collaborators) {
    let pending = self.approve_index.get(&event.create_idx_key).cloned().expect("checked by caller");
    let recipient = event.pk_script.clone();
    let settle = collab.module_script_decoder.module_id_for(&recipient).as_deref() == Some(pending.module.as_str());
    let decimal = self.tickers.get(&pending.tick).map(|i| i.decimal).unwrap_or(0);

    let outcome = self
      .modules
      .get_mut(&pending.module)
      .ok_or_else(|| RejectReason::UnknownModule(pending.module.clone()))
      .and_then(|m| {
        module::approve::handle_module_approve_spend(&mut self.ledger, m, &pending.user, &pending.tick, decimal, event.create_idx_key, settle)
      });
    match outcome {
      Ok(amount) => {
        self.approve_index.remove(&event.create_idx_key);
        let idx = self.record_history(
          HistoryType::ModuleApprove,
          true,
          event,
          Some(pending.tick.clone()),
          Some(pending.user.clone()),
          Some(recipient),
          Some(amount.to_string()),
        );
        if let Some(m) = self.modules.get_mut(&pending.module) {
          m.history.push(idx);
          m.balance_mut(&pending.tick, &pending.user).history.push(idx);
        }
      }
      Err(reason) => debug_reject("module-approve-spend", &reason),
    }
  }

  /// A withdraw's confirming move completes (credits the destination's
  /// base-ledger `available`) unless it lands back on the module's own
  /// script, in which case it's treated as cancelled and refunded to
  /// `swap_account` (spec §4.8 step 3, Open Question: see DESIGN.md).
  fn apply_withdraw_move(&mut self, event: &InscriptionEvent, collab: &Collaborators) {
    let pending = self.withdraw_index.get(&event.create_idx_key).cloned().expect("checked by caller");
    let destination = event.pk_script.clone();
    let complete = collab.module_script_decoder.module_id_for(&destination).as_deref() != Some(pending.module.as_str());
    let decimal = self.tickers.get(&pending.tick).map(|i| i.decimal).unwrap_or(0);
    let confirmed = event.is_confirmed();

    let outcome = self
      .modules
      .get_mut(&pending.module)
      .ok_or_else(|| RejectReason::UnknownModule(pending.module.clone()))
      .and_then(|m| {
        module::withdraw::handle_module_withdraw_spend(
          &mut self.ledger,
          m,
          &pending.user,
          &pending.tick,
          decimal,
          event.create_idx_key,
          &destination,
          confirmed,
          complete,
        )
      });
    match outcome {
      Ok(amount) => {
        self.withdraw_index.remove(&event.create_idx_key);
        if complete {
          self.invalidate_sorted_holders(&pending.tick);
        }
        let idx = self.record_history(
          HistoryType::ModuleWithdraw,
          true,
          event,
          Some(pending.tick.clone()),
          Some(pending.user.clone()),
          Some(destination.clone()),
          Some(amount.to_string()),
        );
        if let Some(m) = self.modules.get_mut(&pending.module) {
          m.history.push(idx);
        }
        if complete {
          self.ledger.balance_mut(&pending.tick, &destination, decimal).history_receive.push(idx);
        }
      }
      Err(reason) => debug_reject("module-withdraw-spend", &reason),
    }
  }
}
