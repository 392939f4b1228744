//! Module deploy handler (spec §4.8 step 1). The Go indexer's own
//! module-deploy processing file isn't among the kept `original_source`
//! files, so this is grounded on `original_source/model/swap.go`'s
//! `BRC20ModuleSwapInfo` field set (`DeployerPkScript`,
//! `SequencerPkScript`, `GasToPkScript`, `LpFeePkScript`).

use crate::module::{ModuleInfo, ModuleRegistry};
use crate::error::RejectReason;
use crate::script::{AddressCodec, ScriptKey};
use std::collections::HashMap;

const KEY_SEQUENCER: &str = "sequencer";
const KEY_GAS_TO: &str = "gas_to";
const KEY_LP_FEE_PK_SCRIPT: &str = "lp_fee_pk_script";
const KEY_FEE_RATE_SWAP: &str = "fee_rate_swap";
const KEY_GAS_TICK: &str = "gas_tick";

fn required_address(
  init: &HashMap<String, String>,
  key: &str,
  address_codec: &dyn AddressCodec,
) -> Result<ScriptKey, RejectReason> {
  let addr = init
    .get(key)
    .ok_or_else(|| RejectReason::InvalidModuleConfig(key.to_string()))?;
  address_codec
    .script_for(addr)
    .ok_or_else(|| RejectReason::InvalidModuleConfig(key.to_string()))
}

fn required_string(init: &HashMap<String, String>, key: &str) -> Result<String, RejectReason> {
  init
    .get(key)
    .cloned()
    .ok_or_else(|| RejectReason::InvalidModuleConfig(key.to_string()))
}

/// Deploys a new module. `module_id` is the deploying inscription's own
/// id (spec §3: a module is identified by its deploy inscription).
pub fn handle_module_deploy(
  modules: &mut ModuleRegistry,
  module_id: String,
  deployer: ScriptKey,
  name: String,
  init: &HashMap<String, String>,
  address_codec: &dyn AddressCodec,
) -> Result<(), RejectReason> {
  if modules.contains(&module_id) {
    return Err(RejectReason::DuplicateModule(module_id));
  }

  let sequencer = required_address(init, KEY_SEQUENCER, address_codec)?;
  let gas_to = required_address(init, KEY_GAS_TO, address_codec)?;
  let lp_fee_pk_script = required_address(init, KEY_LP_FEE_PK_SCRIPT, address_codec)?;
  let fee_rate_swap = required_string(init, KEY_FEE_RATE_SWAP)?;
  let gas_tick = required_string(init, KEY_GAS_TICK)?.to_lowercase();

  let info = ModuleInfo::new(
    module_id,
    name,
    deployer,
    sequencer,
    gas_to,
    lp_fee_pk_script,
    fee_rate_swap,
    gas_tick,
  );
  modules.insert(info);
  Ok(())
}
