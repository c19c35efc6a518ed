//! API key gate
//!
//! Keys are compared as HMAC-SHA256 digests under a per-process secret, using
//! the MAC's constant-time verification, and every configured key is checked
//! on each call.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Request header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allowed,
    Denied,
}

/// Allow-list of API keys; empty means auth is disabled
#[derive(Clone)]
pub struct ApiKeyGate {
    secret: [u8; 32],
    digests: Vec<Vec<u8>>,
}

impl ApiKeyGate {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);

        let digests = keys
            .into_iter()
            .filter(|k| !k.as_ref().is_empty())
            .filter_map(|k| Self::digest(&secret, k.as_ref()))
            .map(|mac| mac.finalize().into_bytes().to_vec())
            .collect();

        Self { secret, digests }
    }

    /// Whether any key is configured
    pub fn is_enabled(&self) -> bool {
        !self.digests.is_empty()
    }

    /// Check a presented key against the allow-list
    pub fn authorize(&self, presented: Option<&str>) -> AuthDecision {
        if !self.is_enabled() {
            return AuthDecision::Allowed;
        }

        let mac = match presented.and_then(|key| Self::digest(&self.secret, key)) {
            Some(mac) => mac,
            None => {
                debug!("Request without API key denied");
                return AuthDecision::Denied;
            }
        };

        let mut matched = false;
        for expected in &self.digests {
            matched |= mac.clone().verify_slice(expected).is_ok();
        }

        if matched {
            AuthDecision::Allowed
        } else {
            debug!("Request with unknown API key denied");
            AuthDecision::Denied
        }
    }

    fn digest(secret: &[u8], key: &str) -> Option<HmacSha256> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(secret).ok()?;
        mac.update(key.as_bytes());
        Some(mac)
    }
}

impl std::fmt::Debug for ApiKeyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGate")
            .field("keys", &self.digests.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_allows_everything() {
        let gate = ApiKeyGate::new(Vec::<String>::new());
        assert!(!gate.is_enabled());
        assert_eq!(gate.authorize(None), AuthDecision::Allowed);
        assert_eq!(gate.authorize(Some("anything")), AuthDecision::Allowed);
    }

    #[test]
    fn test_blank_keys_do_not_enable_auth() {
        let gate = ApiKeyGate::new([""]);
        assert_eq!(gate.authorize(None), AuthDecision::Allowed);
    }

    #[test]
    fn test_configured_key() {
        let gate = ApiKeyGate::new(["abc"]);
        assert_eq!(gate.authorize(Some("abc")), AuthDecision::Allowed);
        assert_eq!(gate.authorize(Some("wrong")), AuthDecision::Denied);
        assert_eq!(gate.authorize(Some("abcd")), AuthDecision::Denied);
        assert_eq!(gate.authorize(Some("")), AuthDecision::Denied);
        assert_eq!(gate.authorize(None), AuthDecision::Denied);
    }

    #[test]
    fn test_any_of_several_keys() {
        let gate = ApiKeyGate::new(["one", "two"]);
        assert_eq!(gate.authorize(Some("two")), AuthDecision::Allowed);
        assert_eq!(gate.authorize(Some("one")), AuthDecision::Allowed);
        assert_eq!(gate.authorize(Some("three")), AuthDecision::Denied);
    }
}
