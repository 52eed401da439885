use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_ITERATIONS: u32 = 260_000;
const SALT_LENGTH: usize = 16;
const KEY_LENGTH: usize = 32;

#[derive(Debug, Error, PartialEq)]
pub enum PasswordError {
    #[error("invalid hash format: {0}")]
    InvalidFormat(&'static str),

    #[error("PBKDF2 failure: {0}")]
    Derivation(String),
}

/// Hash des mots de passe au format "pbkdf2:sha256:iterations$salt$hash"
/// (PBKDF2-HMAC-SHA256, salt aléatoire de 16 bytes, base64 URL-safe sans padding)
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill(&mut salt);

        let mut key = [0u8; KEY_LENGTH];
        derive(password, &salt, self.iterations, &mut key)?;

        Ok(format!(
            "pbkdf2:sha256:{}${}${}",
            self.iterations,
            URL_SAFE_NO_PAD.encode(salt),
            URL_SAFE_NO_PAD.encode(key)
        ))
    }

    /// Hash bien formé qui ne correspond à aucun mot de passe connu,
    /// avec le même nombre d'itérations que les vrais hashs
    pub fn decoy_hash(&self) -> String {
        format!(
            "pbkdf2:sha256:{}${}${}",
            self.iterations,
            URL_SAFE_NO_PAD.encode([0u8; SALT_LENGTH]),
            URL_SAFE_NO_PAD.encode([0u8; KEY_LENGTH])
        )
    }
}

/// Vérifie un mot de passe contre un hash stocké.
/// Le nombre d'itérations est lu dans le hash, pas dans la config courante.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let mut parts = stored_hash.split('$');
    let (Some(header), Some(salt_str), Some(hash_str), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(PasswordError::InvalidFormat("expected 3 '$'-separated parts"));
    };

    let iterations = match header.split(':').collect::<Vec<_>>().as_slice() {
        ["pbkdf2", "sha256", iterations] => iterations
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(PasswordError::InvalidFormat("invalid iterations"))?,
        _ => return Err(PasswordError::InvalidFormat("unsupported header")),
    };

    let salt = decode(salt_str)?;
    let expected = decode(hash_str)?;
    if expected.is_empty() {
        return Err(PasswordError::InvalidFormat("empty hash"));
    }

    let mut computed = vec![0u8; expected.len()];
    derive(password, &salt, iterations, &mut computed)?;

    // Comparaison en temps constant
    Ok(computed.as_slice().ct_eq(expected.as_slice()).into())
}

fn derive(password: &str, salt: &[u8], iterations: u32, out: &mut [u8]) -> Result<(), PasswordError> {
    pbkdf2::<HmacSha256>(password.as_bytes(), salt, iterations, out)
        .map_err(|e| PasswordError::Derivation(e.to_string()))
}

// Tolère un padding '=' éventuel
fn decode(input: &str) -> Result<Vec<u8>, PasswordError> {
    URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .map_err(|_| PasswordError::InvalidFormat("invalid base64"))
}
