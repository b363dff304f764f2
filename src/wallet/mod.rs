use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};
use sha2::{Digest, Sha256};

use crate::error::{LedgerError, Result};

/// Opaque signature check used to gate submissions.
pub trait SignatureVerifier: Send + Sync {
    /// Verify `signature` over `payload` against `public_key`. Malformed key
    /// or signature material is a verification failure, not a panic.
    fn verify(&self, payload: &[u8], signature: &str, public_key: &str) -> Result<()>;
}

/// ECDSA over secp256k1. Keys are hex of the compressed public key,
/// signatures are hex DER over SHA-256(payload).
pub struct Secp256k1Verifier {
    secp: Secp256k1<secp256k1::VerifyOnly>,
}

impl Secp256k1Verifier {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }
}

impl Default for Secp256k1Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureVerifier for Secp256k1Verifier {
    fn verify(&self, payload: &[u8], signature: &str, public_key: &str) -> Result<()> {
        let fail = |reason: &str| LedgerError::SignatureVerification(reason.to_string());

        let sig_bytes = hex::decode(signature.trim()).map_err(|_| fail("invalid signature hex"))?;
        let sig = Signature::from_der(&sig_bytes).map_err(|_| fail("invalid DER signature"))?;

        let pk_bytes = hex::decode(public_key).map_err(|_| fail("invalid pubkey hex"))?;
        let pk = PublicKey::from_slice(&pk_bytes).map_err(|_| fail("invalid pubkey bytes"))?;

        let msg = Message::from_digest(digest(payload));
        self.secp
            .verify_ecdsa(&msg, &sig, &pk)
            .map_err(|_| fail("signature does not match sender"))
    }
}

fn digest(payload: &[u8]) -> [u8; 32] {
    Sha256::digest(payload).into()
}

/// Generate a new secp256k1 keypair and return (priv_hex, pub_hex_compressed).
/// The compressed public key hex doubles as the sender/miner address.
pub fn generate_keypair_hex() -> (String, String) {
    let secp = Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut OsRng);
    (hex::encode(sk.secret_bytes()), hex::encode(pk.serialize()))
}

/// Sign `payload` with a hex private key, returning hex DER. This is the
/// client side of `Secp256k1Verifier`.
pub fn sign_hex(secret_hex: &str, payload: &[u8]) -> Result<String> {
    let bytes = hex::decode(secret_hex)
        .map_err(|_| LedgerError::Encoding("invalid private key hex".into()))?;
    let sk = SecretKey::from_slice(&bytes)
        .map_err(|_| LedgerError::Encoding("invalid private key bytes".into()))?;
    let secp = Secp256k1::signing_only();
    let sig = secp.sign_ecdsa(&Message::from_digest(digest(payload)), &sk);
    Ok(hex::encode(sig.serialize_der().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::{Secp256k1Verifier, SignatureVerifier, generate_keypair_hex, sign_hex};
    use crate::error::LedgerError;

    #[test]
    fn signature_round_trip() {
        let (sk, pk) = generate_keypair_hex();
        let sig = sign_hex(&sk, b"payload").unwrap();
        Secp256k1Verifier::new().verify(b"payload", &sig, &pk).unwrap();
    }

    #[test]
    fn wrong_key_or_payload_fails() {
        let (sk, pk) = generate_keypair_hex();
        let (_, other_pk) = generate_keypair_hex();
        let sig = sign_hex(&sk, b"payload").unwrap();
        let v = Secp256k1Verifier::new();

        assert!(matches!(
            v.verify(b"payload", &sig, &other_pk),
            Err(LedgerError::SignatureVerification(_))
        ));
        assert!(v.verify(b"other", &sig, &pk).is_err());
    }

    #[test]
    fn malformed_material_is_a_verification_error() {
        let (sk, pk) = generate_keypair_hex();
        let sig = sign_hex(&sk, b"p").unwrap();
        let v = Secp256k1Verifier::new();

        let cases = [
            ("zz", pk.as_str()),
            ("3000", pk.as_str()),
            (sig.as_str(), "nothex"),
            (sig.as_str(), "02ab"),
        ];
        for (s, k) in cases {
            assert!(matches!(
                v.verify(b"p", s, k),
                Err(LedgerError::SignatureVerification(_))
            ));
        }
    }
}
