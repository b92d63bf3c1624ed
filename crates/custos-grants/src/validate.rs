//! Pure grant validation
//!
//! `validate` is a function of grant + current time + agent identity +
//! policy. It has no side effects; the session layer is responsible for
//! emitting `token_validated` / `token_rejected` audit entries from the
//! verdict.

use crate::error::RejectionReason;
use crate::grant::{CapabilityGrant, SIGNATURE_ALGORITHM_ED25519};
use custos_crypto::{ed25519_verify, Ed25519Signature, Ed25519VerifyingKey};

/// Policy knobs for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Whether unsigned grants are rejected.
    ///
    /// Accepting unsigned grants is an explicit weaker-trust path; it must
    /// be opted into and every acceptance is marked on the verdict.
    pub require_signature: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            require_signature: true,
        }
    }
}

/// A positive validation verdict.
///
/// Wraps the validated grant; constructing one outside [`validate`] is not
/// possible, so holding a `ValidGrant` proves the checks passed.
#[derive(Debug, Clone)]
pub struct ValidGrant {
    grant: CapabilityGrant,
    validated_at: u64,
    unsigned: bool,
}

impl ValidGrant {
    /// The validated grant.
    pub fn grant(&self) -> &CapabilityGrant {
        &self.grant
    }

    /// When validation happened, Unix seconds.
    pub fn validated_at(&self) -> u64 {
        self.validated_at
    }

    /// Whether the grant was accepted without an issuer signature.
    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }
}

/// Validate a parsed grant.
///
/// Checks run in a fixed order and the first failure is the reported
/// reason:
///
/// 1. subject binding — [`RejectionReason::WrongSubject`]
/// 2. expiry — [`RejectionReason::Expired`]
/// 3. issuer signature — [`RejectionReason::BadSignature`]
/// 4. scope well-formedness — [`RejectionReason::ScopeDenied`]
pub fn validate(
    grant: &CapabilityGrant,
    now: u64,
    agent_public_key: &[u8; 32],
    policy: &ValidationPolicy,
    issuer_key: Option<&Ed25519VerifyingKey>,
) -> Result<ValidGrant, RejectionReason> {
    if &grant.subject != agent_public_key {
        return Err(RejectionReason::WrongSubject);
    }

    if now >= grant.expires_at {
        return Err(RejectionReason::Expired);
    }

    let unsigned = match grant.signature {
        Some(signature_bytes) => {
            if grant.signature_algorithm.as_deref() != Some(SIGNATURE_ALGORITHM_ED25519) {
                return Err(RejectionReason::BadSignature);
            }
            let issuer_key = issuer_key.ok_or(RejectionReason::BadSignature)?;
            let signable = grant
                .signable_bytes()
                .map_err(|_| RejectionReason::BadSignature)?;
            let signature = Ed25519Signature::from_bytes(&signature_bytes);
            ed25519_verify(issuer_key, &signable, &signature)
                .map_err(|_| RejectionReason::BadSignature)?;
            false
        }
        None => {
            if policy.require_signature {
                return Err(RejectionReason::BadSignature);
            }
            true
        }
    };

    if grant.scopes.iter().any(|scope| scope.path.is_empty()) {
        return Err(RejectionReason::ScopeDenied);
    }

    Ok(ValidGrant {
        grant: grant.clone(),
        validated_at: now,
        unsigned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{Permission, Scope};
    use assert_matches::assert_matches;
    use custos_core::Effects;
    use custos_crypto::{
        ed25519_sign, ed25519_verifying_key, generate_ed25519_key, wrap_dek, AgentKeyPair,
        DataKey,
    };

    const NOW: u64 = 1735689600;

    fn grant_for(agent: &AgentKeyPair, effects: &Effects) -> CapabilityGrant {
        let dek = DataKey::generate(effects);
        let wrapped = wrap_dek(&dek, &agent.public_key_bytes(), effects).unwrap();
        CapabilityGrant {
            id: "grant-v".to_string(),
            issuer: "did:web:vault.example".to_string(),
            subject: agent.public_key_bytes(),
            issued_at: NOW,
            expires_at: NOW + 3600,
            scopes: vec![Scope::new("health/metrics", vec![Permission::Read])],
            resource_locator: "vault://objects/abc".to_string(),
            wrapped_key: wrapped,
            signature: None,
            signature_algorithm: None,
        }
    }

    fn sign(grant: &mut CapabilityGrant, key: &custos_crypto::Ed25519SigningKey) {
        let signable = grant.signable_bytes().unwrap();
        grant.signature = Some(ed25519_sign(key, &signable).to_bytes());
        grant.signature_algorithm = Some(SIGNATURE_ALGORITHM_ED25519.to_string());
    }

    fn relaxed() -> ValidationPolicy {
        ValidationPolicy {
            require_signature: false,
        }
    }

    #[test]
    fn accepts_well_formed_signed_grant() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let issuer = generate_ed25519_key(&effects);
        let mut grant = grant_for(&agent, &effects);
        sign(&mut grant, &issuer);

        let verdict = validate(
            &grant,
            NOW + 1800,
            &agent.public_key_bytes(),
            &ValidationPolicy::default(),
            Some(&ed25519_verifying_key(&issuer)),
        )
        .unwrap();
        assert!(!verdict.is_unsigned());
        assert_eq!(verdict.validated_at(), NOW + 1800);
    }

    #[test]
    fn wrong_subject_is_reported_before_expiry() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let other = AgentKeyPair::generate(&effects);
        let mut grant = grant_for(&agent, &effects);
        // Expired as well - subject binding must still be the verdict
        grant.expires_at = NOW - 1;

        assert_matches!(
            validate(
                &grant,
                NOW,
                &other.public_key_bytes(),
                &relaxed(),
                None
            ),
            Err(RejectionReason::WrongSubject)
        );
    }

    #[test]
    fn expired_grant_is_rejected_regardless_of_signature() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let issuer = generate_ed25519_key(&effects);
        let mut grant = grant_for(&agent, &effects);
        sign(&mut grant, &issuer);

        assert_matches!(
            validate(
                &grant,
                grant.expires_at,
                &agent.public_key_bytes(),
                &ValidationPolicy::default(),
                Some(&ed25519_verifying_key(&issuer)),
            ),
            Err(RejectionReason::Expired)
        );
    }

    #[test]
    fn tampered_grant_fails_signature_check() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let issuer = generate_ed25519_key(&effects);
        let mut grant = grant_for(&agent, &effects);
        sign(&mut grant, &issuer);
        grant.scopes.push(Scope::read_write("finance/*"));

        assert_matches!(
            validate(
                &grant,
                NOW + 1,
                &agent.public_key_bytes(),
                &ValidationPolicy::default(),
                Some(&ed25519_verifying_key(&issuer)),
            ),
            Err(RejectionReason::BadSignature)
        );
    }

    #[test]
    fn signature_from_wrong_issuer_is_rejected() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let issuer = generate_ed25519_key(&effects);
        let impostor = generate_ed25519_key(&effects);
        let mut grant = grant_for(&agent, &effects);
        sign(&mut grant, &impostor);

        assert_matches!(
            validate(
                &grant,
                NOW + 1,
                &agent.public_key_bytes(),
                &ValidationPolicy::default(),
                Some(&ed25519_verifying_key(&issuer)),
            ),
            Err(RejectionReason::BadSignature)
        );
    }

    #[test]
    fn unsigned_grant_rejected_under_default_policy() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let grant = grant_for(&agent, &effects);

        assert_matches!(
            validate(
                &grant,
                NOW + 1,
                &agent.public_key_bytes(),
                &ValidationPolicy::default(),
                None
            ),
            Err(RejectionReason::BadSignature)
        );
    }

    #[test]
    fn unsigned_grant_accepted_and_marked_when_policy_allows() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let grant = grant_for(&agent, &effects);

        let verdict = validate(
            &grant,
            NOW + 1,
            &agent.public_key_bytes(),
            &relaxed(),
            None,
        )
        .unwrap();
        assert!(verdict.is_unsigned());
    }

    #[test]
    fn unknown_signature_algorithm_is_rejected() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let issuer = generate_ed25519_key(&effects);
        let mut grant = grant_for(&agent, &effects);
        sign(&mut grant, &issuer);
        grant.signature_algorithm = Some("secp256k1".to_string());

        assert_matches!(
            validate(
                &grant,
                NOW + 1,
                &agent.public_key_bytes(),
                &ValidationPolicy::default(),
                Some(&ed25519_verifying_key(&issuer)),
            ),
            Err(RejectionReason::BadSignature)
        );
    }

    #[test]
    fn empty_scope_path_is_rejected() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let mut grant = grant_for(&agent, &effects);
        grant.scopes.push(Scope::read(""));

        assert_matches!(
            validate(
                &grant,
                NOW + 1,
                &agent.public_key_bytes(),
                &relaxed(),
                None
            ),
            Err(RejectionReason::ScopeDenied)
        );
    }
}
