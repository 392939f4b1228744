//! Inscription content decoder. Given raw content bytes, fast-reject
//! anything that can't possibly be protocol JSON, then attempt a typed
//! decode into one of the recognized operation shapes. Any field present
//! under the wrong JSON type (e.g. a number where a string is required)
//! drops the record — it is "not our protocol", not a decode error, per
//! spec §4.2.

use crate::script::ScriptKey;
use serde::Deserialize;
use std::collections::HashMap;

pub const PROTO_BRC20: &str = "brc-20";
pub const PROTO_MODULE: &str = "brc20-module";
pub const PROTO_SWAP: &str = "brc20-swap";

pub const OP_DEPLOY: &str = "deploy";
pub const OP_MINT: &str = "mint";
pub const OP_TRANSFER: &str = "transfer";
pub const OP_APPROVE: &str = "approve";
pub const OP_WITHDRAW: &str = "withdraw";
pub const OP_COMMIT: &str = "commit";

/// Fast-reject per spec §4.2: fewer than 40 bytes, or not a trimmed
/// balanced `{...}`.
pub fn looks_like_json_object(content: &[u8]) -> bool {
  if content.len() < 40 {
    return false;
  }
  let trimmed = trim_ascii_whitespace(content);
  trimmed.first() == Some(&b'{') && trimmed.last() == Some(&b'}')
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
  let start = bytes.iter().position(|b| !b.is_ascii_whitespace());
  let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace());
  match (start, end) {
    (Some(s), Some(e)) => &bytes[s..=e],
    _ => &[],
  }
}

#[derive(Debug, Deserialize)]
struct ProtocolHeader {
  p: Option<String>,
  op: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeployBody {
  tick: String,
  max: String,
  #[serde(default)]
  lim: Option<String>,
  #[serde(default)]
  dec: Option<String>,
  #[serde(default)]
  self_mint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MintTransferBody {
  tick: String,
  amt: String,
}

#[derive(Debug, Deserialize)]
struct ModuleDeployBody {
  name: String,
  #[serde(default)]
  source: Option<String>,
  #[serde(default)]
  init: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ModuleApproveWithdrawBody {
  module: String,
  tick: String,
  amt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionData {
  pub addr: String,
  pub func: String,
  #[serde(default)]
  pub params: Vec<String>,
  pub ts: u64,
  pub sig: String,
}

#[derive(Debug, Deserialize)]
struct ModuleCommitBody {
  module: String,
  #[serde(default)]
  parent: Option<String>,
  #[serde(default)]
  gas_price: String,
  data: Vec<FunctionData>,
}

/// A successfully decoded, typed operation. Everything that fails to
/// decode as one of these shapes is simply not our protocol.
#[derive(Debug, Clone)]
pub enum Operation {
  Deploy {
    tick: String,
    max: String,
    lim: Option<String>,
    dec: Option<String>,
    self_mint: Option<String>,
  },
  Mint {
    tick: String,
    amt: String,
  },
  Transfer {
    tick: String,
    amt: String,
  },
  ModuleDeploy {
    name: String,
    source: Option<String>,
    init: HashMap<String, String>,
  },
  ModuleApprove {
    module: String,
    tick: String,
    amt: String,
  },
  ModuleWithdraw {
    module: String,
    tick: String,
    amt: String,
  },
  ModuleCommit {
    module: String,
    parent: Option<String>,
    gas_price: String,
    data: Vec<FunctionData>,
  },
}

/// Decodes raw inscription content into a typed `Operation`, returning
/// `None` for anything that isn't a recognized shape (unknown proto/op,
/// wrong field types, or not JSON at all).
pub fn decode(content: &[u8]) -> Option<Operation> {
  if !looks_like_json_object(content) {
    return None;
  }
  let header: ProtocolHeader = serde_json::from_slice(content).ok()?;
  let proto = header.p?;
  let op = header.op?;

  match (proto.as_str(), op.as_str()) {
    (PROTO_BRC20, OP_DEPLOY) => {
      let body: DeployBody = serde_json::from_slice(content).ok()?;
      Some(Operation::Deploy {
        tick: body.tick,
        max: body.max,
        lim: body.lim,
        dec: body.dec,
        self_mint: body.self_mint,
      })
    }
    (PROTO_BRC20, OP_MINT) => {
      let body: MintTransferBody = serde_json::from_slice(content).ok()?;
      Some(Operation::Mint {
        tick: body.tick,
        amt: body.amt,
      })
    }
    (PROTO_BRC20, OP_TRANSFER) => {
      let body: MintTransferBody = serde_json::from_slice(content).ok()?;
      Some(Operation::Transfer {
        tick: body.tick,
        amt: body.amt,
      })
    }
    (PROTO_MODULE, OP_DEPLOY) => {
      let body: ModuleDeployBody = serde_json::from_slice(content).ok()?;
      Some(Operation::ModuleDeploy {
        name: body.name,
        source: body.source,
        init: body.init,
      })
    }
    (PROTO_MODULE, OP_WITHDRAW) | (PROTO_SWAP, OP_WITHDRAW) => {
      let body: ModuleApproveWithdrawBody = serde_json::from_slice(content).ok()?;
      Some(Operation::ModuleWithdraw {
        module: body.module,
        tick: body.tick,
        amt: body.amt,
      })
    }
    (PROTO_SWAP, OP_APPROVE) | (PROTO_MODULE, OP_APPROVE) => {
      let body: ModuleApproveWithdrawBody = serde_json::from_slice(content).ok()?;
      Some(Operation::ModuleApprove {
        module: body.module,
        tick: body.tick,
        amt: body.amt,
      })
    }
    (PROTO_SWAP, OP_COMMIT) => {
      let body: ModuleCommitBody = serde_json::from_slice(content).ok()?;
      Some(Operation::ModuleCommit {
        module: body.module,
        parent: body.parent,
        gas_price: body.gas_price,
        data: body.data,
      })
    }
    _ => None,
  }
}

/// Canonicalizes a ticker to its identity form (lowercase) and validates
/// its byte length and, when active, the allow-list.
pub fn validate_ticker(
  tick: &str,
  tick_min_len: usize,
  tick_max_len: usize,
  ticks_enabled: Option<&std::collections::HashSet<String>>,
) -> Option<String> {
  let lower = tick.to_lowercase();
  if lower.len() < tick_min_len || lower.len() > tick_max_len {
    return None;
  }
  if let Some(allow) = ticks_enabled {
    if lower.contains(' ') {
      return None;
    }
    if !allow.contains(&lower) {
      return None;
    }
  }
  Some(lower)
}

/// Module id derived from a script whose first push names a module, as
/// decided by the externally supplied `ModuleScriptDecoder`.
pub fn module_id_from_script(
  decoder: &dyn crate::script::ModuleScriptDecoder,
  script: &ScriptKey,
) -> Option<String> {
  decoder.module_id_for(script)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pad(json: &str) -> String {
    let mut s = json.to_string();
    while s.len() < 40 {
      s.insert(s.len() - 1, ' ');
    }
    s
  }

  #[test]
  fn rejects_short_content() {
    assert!(decode(br#"{"p":"brc-20"}"#).is_none());
  }

  #[test]
  fn decodes_deploy() {
    let json = pad(r#"{"p":"brc-20","op":"deploy","tick":"ordi","max":"21000000","lim":"1000"}"#);
    match decode(json.as_bytes()) {
      Some(Operation::Deploy { tick, max, lim, .. }) => {
        assert_eq!(tick, "ordi");
        assert_eq!(max, "21000000");
        assert_eq!(lim.as_deref(), Some("1000"));
      }
      other => panic!("unexpected: {other:?}"),
    }
  }

  #[test]
  fn drops_wrong_field_type() {
    let json = pad(r#"{"p":"brc-20","op":"deploy","tick":"ordi","max":21000000}"#);
    assert!(decode(json.as_bytes()).is_none());
  }

  #[test]
  fn unknown_proto_ignored() {
    let json = pad(r#"{"p":"unknown-proto","op":"deploy","tick":"ordi","max":"1"}"#);
    assert!(decode(json.as_bytes()).is_none());
  }

  #[test]
  fn validate_ticker_length_and_allowlist() {
    assert_eq!(validate_ticker("ORDI", 4, 6, None), Some("ordi".to_string()));
    assert_eq!(validate_ticker("ab", 4, 6, None), None);
    let mut allow = std::collections::HashSet::new();
    allow.insert("ordi".to_string());
    assert_eq!(validate_ticker("ordi", 4, 6, Some(&allow)), Some("ordi".to_string()));
    assert_eq!(validate_ticker("meme", 4, 6, Some(&allow)), None);
    assert_eq!(validate_ticker("a b", 4, 6, Some(&allow)), None);
  }
}
