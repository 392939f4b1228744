//! CLI entry point (spec §6): reads the event stream, replays it through
//! the engine, and writes the three output artifacts. Peripheral to the
//! engine itself — grounded on the teacher's `arguments.rs` `clap::Parser`
//! usage, simplified to a flat flag set since this crate has no
//! subcommands.

use anyhow::{bail, Context};
use brc20swap_indexer::config::Config;
use brc20swap_indexer::indexer::{BRC20ModuleIndexer, Collaborators};
use brc20swap_indexer::io::line_format;
use brc20swap_indexer::module::sign::SignatureVerifier;
use brc20swap_indexer::script::{AddressCodec, ModuleScriptDecoder, ScriptKey};
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::secp256k1::{ecdsa, schnorr, Message, Secp256k1, XOnlyPublicKey};
use bitcoin::{Address, Network, PublicKey};
use clap::Parser;
use regex::Regex;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "brc20swap-indexer", about = "Deterministic indexer for a BRC-20-style token protocol and its module/swap extension")]
struct Args {
  /// Path to the whitespace-separated, hex-encoded event stream (spec §6).
  #[arg(long)]
  input: PathBuf,

  /// Where to write the echoed input stream plus derived fields.
  #[arg(long)]
  output: PathBuf,

  /// Where to write the per-module snapshot.
  #[arg(long)]
  output_module: PathBuf,

  /// Where to write the per-ticker snapshot.
  #[arg(long)]
  output_ticker: PathBuf,

  /// Use testnet address encoding instead of mainnet.
  #[arg(long, default_value_t = false)]
  testnet: bool,

  /// Enable debug-level logging.
  #[arg(long, default_value_t = false)]
  debug: bool,
}

/// `AddressCodec` backed by `bitcoin::Address`'s real encoder/decoder.
struct BitcoinAddressCodec {
  network: Network,
}

impl AddressCodec for BitcoinAddressCodec {
  fn address_for(&self, script: &ScriptKey) -> Option<String> {
    let script_buf = bitcoin::ScriptBuf::from_bytes(script.as_bytes().to_vec());
    Address::from_script(&script_buf, self.network).ok().map(|a| a.to_string())
  }

  fn script_for(&self, address: &str) -> Option<ScriptKey> {
    let parsed = Address::from_str(address).ok()?.require_network(self.network).ok()?;
    Some(ScriptKey::from_bytes(parsed.script_pubkey().to_bytes()))
  }
}

/// Recognizes a module script structurally: its first data push, read as
/// UTF-8, has the `<64 hex chars>i<digits>` shape an inscription id has
/// (spec §6: "a script shape whose first push decodes as a known module
/// id"). Whether the candidate id names a module that actually exists is
/// left to the engine's own registry lookup.
struct InscriptionIdModuleScriptDecoder {
  pattern: Regex,
}

impl InscriptionIdModuleScriptDecoder {
  fn new() -> Self {
    Self { pattern: Regex::new(r"^[0-9a-f]{64}i[0-9]+$").expect("valid regex") }
  }
}

impl ModuleScriptDecoder for InscriptionIdModuleScriptDecoder {
  fn module_id_for(&self, script: &ScriptKey) -> Option<String> {
    let script_buf = bitcoin::ScriptBuf::from_bytes(script.as_bytes().to_vec());
    let mut instructions = script_buf.instructions();
    let first = instructions.next()?.ok()?;
    let bitcoin::blockdata::script::Instruction::PushBytes(bytes) = first else {
      return None;
    };
    let candidate = std::str::from_utf8(bytes.as_bytes()).ok()?;
    self.pattern.is_match(candidate).then(|| candidate.to_string())
  }
}

/// Verifies a witness-style signature over `message` (spec §4.8 step 3,
/// §6). Supports the two witness shapes `decode_witness` produces: a
/// single 64-byte Schnorr signature checked against the script's embedded
/// x-only key-path pubkey (P2TR), or a `[signature, pubkey]` pair checked
/// as an ECDSA signature over the Bitcoin-signed-message double-SHA256
/// digest of `message`.
struct Secp256k1SignatureVerifier {
  secp: Secp256k1<bitcoin::secp256k1::VerifyOnly>,
}

impl Secp256k1SignatureVerifier {
  fn new() -> Self {
    Self { secp: Secp256k1::verification_only() }
  }

  fn taproot_pubkey(script: &ScriptKey) -> Option<XOnlyPublicKey> {
    let bytes = script.as_bytes();
    if bytes.len() == 34 && bytes[0] == 0x51 && bytes[1] == 0x20 {
      XOnlyPublicKey::from_slice(&bytes[2..]).ok()
    } else {
      None
    }
  }
}

impl SignatureVerifier for Secp256k1SignatureVerifier {
  fn verify(&self, witness: &[Vec<u8>], script: &ScriptKey, message: &str) -> bool {
    let digest = sha256d::Hash::hash(message.as_bytes());
    let Ok(msg) = Message::from_slice(digest.as_ref()) else { return false };

    match witness {
      [sig_bytes] if sig_bytes.len() == 64 => {
        let (Some(pubkey), Ok(sig)) = (Self::taproot_pubkey(script), schnorr::Signature::from_slice(sig_bytes)) else {
          return false;
        };
        self.secp.verify_schnorr(&sig, &msg, &pubkey).is_ok()
      }
      [sig_bytes, pubkey_bytes] => {
        let (Ok(pubkey), Ok(sig)) = (PublicKey::from_slice(pubkey_bytes), ecdsa::Signature::from_der(sig_bytes)) else {
          return false;
        };
        self.secp.verify_ecdsa(&msg, &sig, &pubkey.inner).is_ok()
      }
      _ => false,
    }
  }
}

fn main() -> anyhow::Result<()> {
  let args = Args::parse();
  brc20swap_indexer::logging::init(args.debug).context("failed to initialize logging")?;

  let network = if args.testnet { Network::Testnet } else { Network::Bitcoin };
  let config = if args.testnet { Config::testnet() } else { Config::default() };

  let events = match line_format::read_events(&args.input) {
    Ok(events) => events,
    Err(err) => bail!("fatal input format error: {err}"),
  };

  let address_codec = BitcoinAddressCodec { network };
  let module_script_decoder = InscriptionIdModuleScriptDecoder::new();
  let signature_verifier = Secp256k1SignatureVerifier::new();
  let collab = Collaborators {
    address_codec: &address_codec,
    module_script_decoder: &module_script_decoder,
    signature_verifier: &signature_verifier,
  };

  let mut indexer = BRC20ModuleIndexer::new(config);
  for event in &events {
    indexer.apply_event(event, &collab);
  }
  indexer.process_batch(events.len());

  line_format::write_stream_echo(&args.output, &events).context("writing stream echo")?;
  line_format::write_module_snapshot(&args.output_module, &indexer).context("writing module snapshot")?;
  line_format::write_ticker_snapshot(&args.output_ticker, &indexer).context("writing ticker snapshot")?;

  Ok(())
}
