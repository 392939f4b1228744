//! Compact-signature verification is an external collaborator (spec §1,
//! §6): "the cryptographic primitive for verifying a compact signature
//! over a message under a script (assumed provided)". This module only
//! owns the shape checks and message construction the engine is
//! responsible for; the actual verification is delegated.

use crate::script::ScriptKey;

/// Verifies a witness-style signature blob over `message` under `script`.
/// Concrete implementations (e.g. BIP-322) live outside this crate.
pub trait SignatureVerifier {
  fn verify(&self, witness: &[Vec<u8>], script: &ScriptKey, message: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureShapeError {
  #[error("signature is not valid base64")]
  InvalidBase64,
  #[error("signature length does not match a recognized witness shape")]
  InvalidShape,
}

/// Splits a base64-encoded signature blob into the witness stack the
/// verifier expects, per spec §4.8 step 3: shapes of length 66, or
/// `(2+64+34) < len <= (2+72+34)`, are accepted; anything else is
/// rejected before it ever reaches the verifier.
pub fn decode_witness(signature_b64: &str) -> Result<Vec<Vec<u8>>, SignatureShapeError> {
  use base64::Engine;
  let raw = base64::engine::general_purpose::STANDARD
    .decode(signature_b64)
    .map_err(|_| SignatureShapeError::InvalidBase64)?;

  let len = raw.len();
  if len == 66 {
    Ok(vec![raw[2..].to_vec()])
  } else if len > (2 + 64 + 34) && len <= (2 + 72 + 34) {
    Ok(vec![raw[2..len - 34].to_vec(), raw[len - 33..len].to_vec()])
  } else {
    Err(SignatureShapeError::InvalidShape)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decode_witness_66_bytes() {
    let raw = vec![0u8; 66];
    let b64 = {
      use base64::Engine;
      base64::engine::general_purpose::STANDARD.encode(&raw)
    };
    let witness = decode_witness(&b64).unwrap();
    assert_eq!(witness.len(), 1);
    assert_eq!(witness[0].len(), 64);
  }

  #[test]
  fn decode_witness_rejects_bad_length() {
    let raw = vec![0u8; 10];
    let b64 = {
      use base64::Engine;
      base64::engine::general_purpose::STANDARD.encode(&raw)
    };
    assert!(decode_witness(&b64).is_err());
  }
}
