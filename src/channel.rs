//! Signed channel names.
//!
//! A channel is the hex HMAC-SHA1 of a path-like name keyed by the shared
//! auth token. Signing is deterministic, so a browser handed a channel by
//! the server and the server publishing later arrive at the same name
//! without any handshake.

use crate::types::SyncAction;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

/// Length of a hex-encoded signature.
pub const SIGNATURE_LEN: usize = 40;

/// Broker-specific rewriting of a signature into a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Normalization {
    /// Polling broker channels are absolute (`/<signature>`).
    LeadingSlash,
    /// Push broker channels are the bare signature.
    Verbatim,
}

impl Normalization {
    pub fn apply(&self, signature: &str) -> String {
        match self {
            Normalization::LeadingSlash => format!("/{}", signature),
            Normalization::Verbatim => signature.to_string(),
        }
    }

    fn strip<'a>(&self, channel: &'a str) -> Option<&'a str> {
        match self {
            Normalization::LeadingSlash => channel.strip_prefix('/'),
            Normalization::Verbatim => Some(channel),
        }
    }
}

/// Derives and verifies channels for one shared secret.
#[derive(Clone)]
pub struct ChannelSigner {
    mac: HmacSha1,
    normalization: Normalization,
}

impl ChannelSigner {
    pub fn new(secret: &str, normalization: Normalization) -> Self {
        // HMAC hashes keys longer than a block, so no key length is rejected.
        let mac = HmacSha1::new_from_slice(secret.as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
        Self { mac, normalization }
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Hex HMAC-SHA1 of `name`.
    pub fn signature(&self, name: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(name.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Normalized channel for `name`.
    pub fn channel(&self, name: &str) -> String {
        self.normalization.apply(&self.signature(name))
    }

    /// Channel of an action on an identity: the signature of
    /// `"{identity}-{action}"`.
    pub fn channel_for(&self, identity: &str, action: SyncAction) -> String {
        self.channel(&format!("{}-{}", identity, action))
    }

    /// Channel of an action on a path given as segments.
    pub fn channel_name(&self, segments: &[String], action: SyncAction) -> String {
        self.channel_for(&format!("/{}", segments.join("/")), action)
    }

    /// Whether `candidate` is the channel token of `name`.
    ///
    /// The comparison runs in constant time over the decoded signature.
    pub fn authorize(&self, candidate: &str, name: &str) -> bool {
        let Some(signature) = self.normalization.strip(candidate) else {
            return false;
        };
        if signature.len() != SIGNATURE_LEN {
            return false;
        }
        let Ok(bytes) = hex::decode(signature) else {
            return false;
        };

        let mut mac = self.mac.clone();
        mac.update(name.as_bytes());
        mac.verify_slice(&bytes).is_ok()
    }
}

impl fmt::Debug for ChannelSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSigner")
            .field("normalization", &self.normalization)
            .finish_non_exhaustive()
    }
}

/// Equality of two tokens without an early exit on the first mismatch.
pub(crate) fn tokens_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
