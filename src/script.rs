//! The owning/receiving script carried by every inscription event.
//!
//! Address<->script encoding is an external collaborator (spec §1
//! Non-goals): this module treats scripts as opaque, hashable byte strings
//! and only special-cases the two shapes the core cares about — the burn
//! marker and the module-identifying push. Resolving a human-readable
//! address from a script is delegated to an `AddressCodec` the caller
//! supplies (e.g. for CLI output), mirroring the teacher's
//! `ScriptKey::from_script(script, network)` split between an opaque key
//! and a display form.

use bitcoin::ScriptBuf;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// The single-byte `OP_RETURN` burn marker script.
pub const BURN_SCRIPT: &[u8] = &[0x6a];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScriptKey(Vec<u8>);

impl ScriptKey {
  pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
    Self(bytes.into())
  }

  pub fn from_script(script: &ScriptBuf) -> Self {
    Self(script.to_bytes())
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  pub fn is_burn(&self) -> bool {
    self.0.as_slice() == BURN_SCRIPT
  }
}

impl Display for ScriptKey {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}", hex::encode(&self.0))
  }
}

/// External collaborator: resolves a human-facing address from a script
/// (or vice versa) under a given network. Not implemented by this crate;
/// the reference harness supplies a concrete implementation.
pub trait AddressCodec {
  fn address_for(&self, script: &ScriptKey) -> Option<String>;
  fn script_for(&self, address: &str) -> Option<ScriptKey>;
}

/// Identifies whether a script matches the module-account shape (the
/// script's first push decodes as a known module id). The decoder of the
/// push itself is provided externally (spec §6); this trait only asks
/// "does this look like one, and if so, which module id".
pub trait ModuleScriptDecoder {
  fn module_id_for(&self, script: &ScriptKey) -> Option<String>;
}
