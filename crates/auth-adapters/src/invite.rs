//! Invitation pass.
//!
//! Redeeming the invite code sets a cookie holding `{expiry}.{signature}`,
//! where the signature is HMAC-SHA256 over the expiry. The route guard
//! checks the signature and the expiry, not just that a cookie exists.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use domains::{DomainError, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie carrying the pass.
pub const INVITE_COOKIE: &str = "admin_access_token";

pub struct InvitePass {
    keyed: HmacSha256,
    ttl: Duration,
}

impl InvitePass {
    pub fn new(signing_key: impl AsRef<[u8]>, ttl: Duration) -> Result<Self> {
        let signing_key = signing_key.as_ref();
        if signing_key.is_empty() {
            return Err(DomainError::validation("invite signing key is empty"));
        }
        let keyed = HmacSha256::new_from_slice(signing_key)
            .map_err(|e| DomainError::internal(format!("invite signing key rejected: {e}")))?;
        Ok(Self { keyed, ttl })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A fresh pass valid for `ttl` from `now`.
    pub fn issue(&self, now: DateTime<Utc>) -> String {
        let expires = (now + self.ttl).timestamp();
        format!("{expires}.{}", self.sign(expires))
    }

    pub fn verify(&self, pass: &str, now: DateTime<Utc>) -> bool {
        let Some((expires, signature)) = pass.split_once('.') else {
            return false;
        };
        let Ok(expires) = expires.parse::<i64>() else {
            return false;
        };
        let Ok(signature) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        if expires <= now.timestamp() {
            return false;
        }
        self.mac(expires).verify_slice(&signature).is_ok()
    }

    fn sign(&self, expires: i64) -> String {
        URL_SAFE_NO_PAD.encode(self.mac(expires).finalize().into_bytes())
    }

    fn mac(&self, expires: i64) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(expires.to_string().as_bytes());
        mac
    }
}

/// Compares two secrets through their SHA-256 digests so the comparison
/// time does not depend on where the inputs first differ.
pub fn secrets_match(given: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    Sha256::digest(given.as_bytes()) == Sha256::digest(expected.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn issued_pass_verifies_until_expiry() {
        let invite = InvitePass::new("k3y", Duration::hours(24)).unwrap();
        let pass = invite.issue(now());

        assert!(invite.verify(&pass, now()));
        assert!(invite.verify(&pass, now() + Duration::hours(23)));
        assert!(!invite.verify(&pass, now() + Duration::hours(24)));
    }

    #[test]
    fn tampered_or_foreign_passes_fail() {
        let invite = InvitePass::new("k3y", Duration::hours(24)).unwrap();
        let pass = invite.issue(now());
        let (_, sig) = pass.split_once('.').unwrap();
        let extended = format!("{}.{sig}", (now() + Duration::days(30)).timestamp());

        assert!(!invite.verify(&extended, now()));
        assert!(!invite.verify("present", now()));
        assert!(!InvitePass::new("other", Duration::hours(24)).unwrap().verify(&pass, now()));
    }

    #[test]
    fn empty_signing_key_is_refused() {
        assert!(InvitePass::new("", Duration::hours(24)).is_err());
    }

    #[test]
    fn secret_comparison() {
        assert!(secrets_match("hamamatsu", "hamamatsu"));
        assert!(!secrets_match("hamamatsu ", "hamamatsu"));
        assert!(!secrets_match("", ""));
    }
}
