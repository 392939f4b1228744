//! The reference harness's text file format (spec §6): one inscription
//! event per line, whitespace-separated, byte fields hex-encoded;
//! `#`-prefixed and blank lines are comments. Any malformed line is
//! fatal — grounded on the teacher's `brc20/custom_serde/*.rs` hex-field
//! marker-struct convention, adapted here to a line-oriented reader/writer
//! instead of a `serde` field attribute since the line format is a flat
//! record, not a JSON document.

use crate::event::InscriptionEvent;
use crate::indexer::BRC20ModuleIndexer;
use crate::script::ScriptKey;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LineFormatError {
  #[error("line {line}: expected 15 whitespace-separated fields, found {found}")]
  WrongFieldCount { line: usize, found: usize },
  #[error("line {line}: invalid hex in field {field}: {source}")]
  InvalidHex { line: usize, field: &'static str, source: hex::FromHexError },
  #[error("line {line}: txid must be exactly 32 bytes, found {found}")]
  BadTxidLength { line: usize, found: usize },
  #[error("line {line}: invalid integer in field {field}: {source}")]
  InvalidInt { line: usize, field: &'static str, source: std::num::ParseIntError },
  #[error("line {line}: invalid boolean in field {field}, expected 0 or 1")]
  InvalidBool { line: usize, field: &'static str },
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

const FIELD_COUNT: usize = 15;

/// Reads the ordered event stream from `path`. Any line that survives
/// comment/blank filtering but doesn't parse is fatal — the whole read
/// fails rather than skipping the bad line, per spec §6.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<InscriptionEvent>, LineFormatError> {
  let file = File::open(path)?;
  let reader = BufReader::new(file);
  let mut events = Vec::new();

  for (line_no, line) in reader.lines().enumerate() {
    let line = line?;
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
      continue;
    }
    events.push(parse_line(trimmed, line_no + 1)?);
  }

  Ok(events)
}

fn parse_line(line: &str, line_no: usize) -> Result<InscriptionEvent, LineFormatError> {
  let fields: Vec<&str> = line.split_whitespace().collect();
  if fields.len() != FIELD_COUNT {
    return Err(LineFormatError::WrongFieldCount { line: line_no, found: fields.len() });
  }

  let bool_field = |name: &'static str, s: &str| -> Result<bool, LineFormatError> {
    match s {
      "0" => Ok(false),
      "1" => Ok(true),
      _ => Err(LineFormatError::InvalidBool { line: line_no, field: name }),
    }
  };
  let hex_field = |name: &'static str, s: &str| -> Result<Vec<u8>, LineFormatError> {
    hex::decode(s).map_err(|source| LineFormatError::InvalidHex { line: line_no, field: name, source })
  };
  let int_field = |name: &'static str, s: &str| -> Result<u64, LineFormatError> {
    s.parse::<u64>().map_err(|source| LineFormatError::InvalidInt { line: line_no, field: name, source })
  };

  let is_transfer = bool_field("is_transfer", fields[0])?;
  let txid_bytes = hex_field("txid", fields[1])?;
  if txid_bytes.len() != 32 {
    return Err(LineFormatError::BadTxidLength { line: line_no, found: txid_bytes.len() });
  }
  let mut txid = [0u8; 32];
  txid.copy_from_slice(&txid_bytes);

  let index = int_field("index", fields[2])? as u32;
  let vout = int_field("vout", fields[3])? as u32;
  let offset = int_field("offset", fields[4])?;
  let satoshi = int_field("satoshi", fields[5])?;
  let pk_script = ScriptKey::from_bytes(hex_field("pk_script", fields[6])?);
  let inscription_number = fields[7]
    .parse::<i64>()
    .map_err(|source| LineFormatError::InvalidInt { line: line_no, field: "inscription_number", source })?;
  let parent_inscription_id = if fields[8] == "-" { None } else { Some(fields[8].to_string()) };
  let content_body = hex_field("content_body", fields[9])?;
  let create_idx_key = int_field("create_idx_key", fields[10])?;
  let height = int_field("height", fields[11])? as u32;
  let tx_idx_in_block = int_field("tx_idx_in_block", fields[12])? as u32;
  let block_time = int_field("block_time", fields[13])? as u32;
  let sequence = int_field("sequence", fields[14])? as u16;

  Ok(InscriptionEvent::new(
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
  ))
}

/// Output artifact 1 (spec §6): the input stream echoed back with one
/// derived field, the inscription id, appended to each line.
pub fn write_stream_echo(path: impl AsRef<Path>, events: &[InscriptionEvent]) -> std::io::Result<()> {
  let mut out = BufWriter::new(File::create(path)?);
  for event in events {
    writeln!(
      out,
      "{} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {}",
      event.is_transfer as u8,
      hex::encode(event.txid),
      event.index,
      event.vout,
      event.offset,
      event.satoshi,
      hex::encode(event.pk_script.as_bytes()),
      event.inscription_number,
      event.parent_inscription_id.as_deref().unwrap_or("-"),
      hex::encode(&event.content_body),
      event.create_idx_key,
      event.height,
      event.tx_idx_in_block,
      event.block_time,
      event.sequence,
      event.inscription_id(),
    )?;
  }
  Ok(())
}

/// Output artifact 3 (spec §6): per-ticker snapshot of deploy parameters,
/// running totals, and every holder's balance, sorted by ticker then by
/// descending available balance so the file is deterministic across runs
/// of the same input.
pub fn write_ticker_snapshot(path: impl AsRef<Path>, indexer: &BRC20ModuleIndexer) -> std::io::Result<()> {
  let mut out = BufWriter::new(File::create(path)?);
  let mut names: Vec<&String> = indexer.tickers.iter().map(|(name, _)| name).collect();
  names.sort();

  for name in names {
    let info = indexer.tickers.get(name).expect("just listed");
    writeln!(
      out,
      "# ticker {} self_mint={} decimal={} max={} limit={} minted={} confirmed_minted={} burned={} mint_times={}/{}",
      info.ticker, info.self_mint, info.decimal, info.max, info.limit, info.minted, info.confirmed_minted, info.burned, info.mint_times, info.max_mint_times,
    )?;
    for holder in indexer.sorted_holders(name) {
      let balance = indexer.ledger.balance(name, &holder).expect("listed as a holder");
      writeln!(
        out,
        "{} {} available={} available_safe={} transferable={}",
        name, holder, balance.available, balance.available_safe, balance.transferable,
      )?;
    }
  }
  Ok(())
}

/// Output artifact 2 (spec §6): per-module snapshot of deploy parameters
/// and every (user, ticker) sub-ledger entry, sorted by module id then by
/// ticker then by user script for determinism.
pub fn write_module_snapshot(path: impl AsRef<Path>, indexer: &BRC20ModuleIndexer) -> std::io::Result<()> {
  let mut out = BufWriter::new(File::create(path)?);
  let mut ids: Vec<&String> = indexer.modules.iter().map(|(id, _)| id).collect();
  ids.sort();

  for id in ids {
    let module = indexer.modules.get(id).expect("just listed");
    writeln!(
      out,
      "# module {} name={} gas_tick={} deployer={} sequencer={}",
      module.id, module.name, module.gas_tick, module.deployer, module.sequencer,
    )?;

    let mut entries: Vec<(&(ScriptKey, String), &crate::module::balance::ModuleTokenBalance)> =
      module.user_tick_balances.iter().collect();
    entries.sort_by(|a, b| (&a.0 .1, &a.0 .0).cmp(&(&b.0 .1, &b.0 .0)));
    for ((user, tick), balance) in entries {
      let pending_withdraw: Vec<String> = balance.ready_to_withdraw.values().map(|(h, a)| format!("{a}@{h}")).collect();
      writeln!(
        out,
        "{} {} {} swap_account={} swap_account_safe={} approveable={} ready_to_withdraw_amount={} ready_to_withdraw={}",
        module.id,
        tick,
        user,
        balance.swap_account,
        balance.swap_account_safe,
        balance.approveable,
        balance.ready_to_withdraw_amount,
        pending_withdraw.join(","),
      )?;
    }

    let mut pool_keys: Vec<&(String, String)> = module.pools.keys().collect();
    pool_keys.sort();
    for key in pool_keys {
      let pool = module.pools.get(key).expect("just listed");
      writeln!(
        out,
        "{} pool {}/{} tick_balance={}/{} lp_balance={} last_root_k={}",
        module.id, pool.tick[0], pool.tick[1], pool.tick_balance[0], pool.tick_balance[1], pool.lp_balance, pool.last_root_k,
      )?;
    }
  }
  Ok(())
}
