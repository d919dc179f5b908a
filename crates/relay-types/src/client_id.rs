use std::fmt;

use rand::Rng;
use rand::distributions::{Distribution, Standard};
use serde::{Deserialize, Serialize};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const LEN: usize = 5;

/// Opaque identifier a client mints at optimistic-apply time to correlate
/// its own submissions with the server's eventual acknowledgement.
///
/// Drawn uniformly from the 36-character lowercase alphanumeric alphabet.
/// Collisions within one client's live pending set are astronomically
/// unlikely (36^5 ≈ 60.5M); across clients, ids are not required to be
/// globally unique — the server treats them as opaque bytes and echoes
/// whatever arrived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// Mints a fresh, random id using the given RNG.
    pub fn mint<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let id: String = (0..LEN)
            .map(|_| {
                let idx = rng.gen_range(0..ALPHABET.len());
                ALPHABET[idx] as char
            })
            .collect();
        Self(id)
    }

    /// Wraps an externally-supplied id verbatim (e.g. one decoded off the
    /// wire). The server never mints ids itself — it only echoes them.
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Distribution<ClientId> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ClientId {
        ClientId::mint(rng)
    }
}
