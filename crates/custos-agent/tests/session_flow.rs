//! End-to-end session scenarios
//!
//! Issuer-side grant minting, payload sealing, and the full agent
//! pipeline: parse, validate, unwrap, fetch, decrypt, export. The audit
//! chain produced along the way must re-verify independently.

use assert_matches::assert_matches;
use custos_agent::{
    AgentError, MemoryIssuerDirectory, MemoryObjectStore, ObjectStore, Session,
};
use custos_audit::{verify_export, AuditAction, Details};
use custos_core::{sha256_hex, Effects};
use custos_crypto::{
    ed25519_sign, ed25519_verifying_key, encrypt_payload, generate_ed25519_key, unwrap_dek,
    wrap_dek, AgentKeyPair, DataKey, Ed25519SigningKey, UnwrapError,
};
use custos_grants::{
    CapabilityGrant, Permission, RejectionReason, Scope, ValidationPolicy,
};
use std::sync::Arc;

/// Capture session logs when a test runs with `RUST_LOG` set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const ISSUED_AT: u64 = 1735689600;
const ISSUER_DID: &str = "did:web:vault.example";
const LOCATOR: &str = "vault://objects/sha256-9f2c";
const PAYLOAD: &[u8] = b"date,heart_rate,steps\n2025-01-01,72,10417\n";

struct Fixture {
    effects: Effects,
    agent: Arc<AgentKeyPair>,
    issuer_key: Ed25519SigningKey,
    issuers: Arc<MemoryIssuerDirectory>,
    store: Arc<MemoryObjectStore>,
    dek: DataKey,
}

impl Fixture {
    /// Issuer-side setup: seal the payload, wrap the DEK for the agent,
    /// seed the object store.
    fn new(seed: u64) -> Self {
        init_tracing();
        let effects = Effects::deterministic(seed, ISSUED_AT);
        let agent = Arc::new(AgentKeyPair::generate(&effects));
        let issuer_key = generate_ed25519_key(&effects);
        let issuers = Arc::new(
            MemoryIssuerDirectory::new()
                .with_issuer(ISSUER_DID, ed25519_verifying_key(&issuer_key)),
        );

        let dek = DataKey::generate(&effects);
        let sealed = encrypt_payload(PAYLOAD, &dek, &effects).unwrap();
        let store = Arc::new(MemoryObjectStore::new().with_object(LOCATOR, sealed));

        Fixture {
            effects,
            agent,
            issuer_key,
            issuers,
            store,
            dek,
        }
    }

    fn grant(&self, scopes: Vec<Scope>) -> CapabilityGrant {
        let wrapped = wrap_dek(&self.dek, &self.agent.public_key_bytes(), &self.effects).unwrap();
        let mut grant = CapabilityGrant {
            id: "grant-e2e-1".to_string(),
            issuer: ISSUER_DID.to_string(),
            subject: self.agent.public_key_bytes(),
            issued_at: ISSUED_AT,
            expires_at: ISSUED_AT + 3600,
            scopes,
            resource_locator: LOCATOR.to_string(),
            wrapped_key: wrapped,
            signature: None,
            signature_algorithm: None,
        };
        let signable = grant.signable_bytes().unwrap();
        grant.signature = Some(ed25519_sign(&self.issuer_key, &signable).to_bytes());
        grant.signature_algorithm = Some("ed25519".to_string());
        grant
    }

    fn session(&self) -> Session {
        Session::new(
            self.agent.clone(),
            self.issuers.clone(),
            self.store.clone(),
            ValidationPolicy::default(),
            self.effects.clone(),
        )
        .unwrap()
    }
}

fn count(export_entries: &[custos_audit::AuditEntry], action: AuditAction) -> usize {
    export_entries.iter().filter(|e| e.action == action).count()
}

#[tokio::test]
async fn granted_read_access_end_to_end() {
    let fixture = Fixture::new(11);
    let wire = serde_json::to_vec(&fixture.grant(vec![Scope::read("health/metrics")])).unwrap();

    // Validation happens halfway through the grant's lifetime.
    fixture.effects.advance_time(1800).unwrap();
    let mut session = fixture.session();

    let grant = session.receive_grant(&wire).unwrap();
    let valid = session.validate_grant(&grant).unwrap();
    assert!(!valid.is_unsigned());

    let dek = session.unwrap_key(&valid).unwrap();
    let ciphertext = session.fetch_payload(&valid, "health/metrics").await.unwrap();
    let plaintext = session.decrypt_data(&valid, &ciphertext, &dek).unwrap();
    assert_eq!(plaintext, PAYLOAD);

    session.begin_inference(Details::new()).unwrap();
    session.complete_inference(Details::new(), Some(250)).unwrap();

    assert!(session.chain().verify().valid);
    let export = session.finish().unwrap();

    assert_eq!(count(&export.entries, AuditAction::TokenReceived), 1);
    assert_eq!(count(&export.entries, AuditAction::TokenValidated), 1);
    assert_eq!(count(&export.entries, AuditAction::DekUnwrapped), 1);
    assert_eq!(count(&export.entries, AuditAction::DataDecrypted), 1);
    assert_eq!(count(&export.entries, AuditAction::TokenRejected), 0);
    assert_eq!(count(&export.entries, AuditAction::Error), 0);
    assert_eq!(export.data_hash.as_deref(), Some(sha256_hex(PAYLOAD).as_str()));

    // The issuer re-verifies the export with no access to agent state.
    let roundtripped: custos_audit::AuditExport =
        serde_json::from_slice(&serde_json::to_vec(&export).unwrap()).unwrap();
    assert!(verify_export(&roundtripped).valid);
}

#[tokio::test]
async fn expired_grant_is_rejected_with_no_data_access() {
    let fixture = Fixture::new(13);
    let wire = serde_json::to_vec(&fixture.grant(vec![Scope::read("health/metrics")])).unwrap();

    // One second past expiry.
    fixture.effects.advance_time(3601).unwrap();
    let mut session = fixture.session();

    let grant = session.receive_grant(&wire).unwrap();
    assert_matches!(
        session.validate_grant(&grant),
        Err(AgentError::Rejected(RejectionReason::Expired))
    );

    let export = session.finish().unwrap();
    assert_eq!(count(&export.entries, AuditAction::TokenRejected), 1);
    assert_eq!(count(&export.entries, AuditAction::DekUnwrapped), 0);
    assert_eq!(count(&export.entries, AuditAction::DataFetched), 0);
    assert_eq!(export.entries[1].details["reason"], serde_json::json!("expired"));
    assert!(verify_export(&export).valid);
}

#[tokio::test]
async fn grant_for_another_agent_is_rejected() {
    let fixture = Fixture::new(17);
    let wire = serde_json::to_vec(&fixture.grant(vec![Scope::read("health/metrics")])).unwrap();

    let other_agent = Arc::new(AgentKeyPair::generate(&fixture.effects));
    let mut session = Session::new(
        other_agent,
        fixture.issuers.clone(),
        fixture.store.clone(),
        ValidationPolicy::default(),
        fixture.effects.clone(),
    )
    .unwrap();

    let grant = session.receive_grant(&wire).unwrap();
    assert_matches!(
        session.validate_grant(&grant),
        Err(AgentError::Rejected(RejectionReason::WrongSubject))
    );
}

#[test]
fn wrapped_dek_does_not_open_for_another_private_key() {
    let fixture = Fixture::new(19);
    let grant = fixture.grant(vec![Scope::read("health/metrics")]);
    let other_agent = AgentKeyPair::generate(&fixture.effects);

    assert_matches!(
        unwrap_dek(&grant.wrapped_key, other_agent.secret()),
        Err(UnwrapError::AuthenticationFailed)
    );
    // The rightful subject still recovers the DEK.
    let recovered = unwrap_dek(&grant.wrapped_key, fixture.agent.secret()).unwrap();
    assert_eq!(recovered, fixture.dek);
}

#[tokio::test]
async fn write_back_requires_and_uses_write_scope() {
    let fixture = Fixture::new(23);
    let wire = serde_json::to_vec(
        &fixture.grant(vec![
            Scope::read("health/metrics"),
            Scope::read_write("health/reports/*"),
        ]),
    )
    .unwrap();

    fixture.effects.advance_time(60).unwrap();
    let mut session = fixture.session();

    let grant = session.receive_grant(&wire).unwrap();
    let valid = session.validate_grant(&grant).unwrap();
    let dek = session.unwrap_key(&valid).unwrap();

    let report = b"weekly_summary: resting heart rate stable";
    let sealed = session.encrypt_output(&valid, report, &dek).unwrap();

    // A path outside the write scopes is denied before any store call.
    assert_matches!(
        session
            .store_output(&valid, "health/metrics", sealed.clone())
            .await,
        Err(AgentError::Rejected(RejectionReason::ScopeDenied))
    );

    session
        .store_output(&valid, "health/reports/weekly", sealed)
        .await
        .unwrap();

    let export = session.finish().unwrap();
    assert_eq!(count(&export.entries, AuditAction::OutputEncrypted), 1);
    assert_eq!(count(&export.entries, AuditAction::OutputStored), 1);
    assert_eq!(count(&export.entries, AuditAction::TokenRejected), 1);
    assert_eq!(
        export.result_hash.as_deref(),
        Some(sha256_hex(report).as_str())
    );
    assert!(verify_export(&export).valid);

    // The stored object decrypts back to the report under the same DEK.
    let stored = fixture.store.get(LOCATOR).await.unwrap();
    let recovered = custos_crypto::decrypt_payload(&stored, &dek).unwrap();
    assert_eq!(recovered, report);
}

#[tokio::test]
async fn unknown_issuer_fails_signature_verification() {
    let fixture = Fixture::new(29);
    let wire = serde_json::to_vec(&fixture.grant(vec![Scope::read("health/metrics")])).unwrap();

    let mut session = Session::new(
        fixture.agent.clone(),
        Arc::new(MemoryIssuerDirectory::new()),
        fixture.store.clone(),
        ValidationPolicy::default(),
        fixture.effects.clone(),
    )
    .unwrap();

    let grant = session.receive_grant(&wire).unwrap();
    assert_matches!(
        session.validate_grant(&grant),
        Err(AgentError::Rejected(RejectionReason::BadSignature))
    );
}

#[tokio::test]
async fn tampered_store_object_is_access_denied() {
    let fixture = Fixture::new(31);
    let wire = serde_json::to_vec(&fixture.grant(vec![Scope::read("health/metrics")])).unwrap();

    // Corrupt the stored ciphertext before the agent fetches it.
    let mut sealed = fixture.store.get(LOCATOR).await.unwrap();
    let last = sealed.len() - 1;
    sealed[last] ^= 0xff;
    fixture.store.put(LOCATOR, sealed).await.unwrap();

    let mut session = fixture.session();
    let grant = session.receive_grant(&wire).unwrap();
    let valid = session.validate_grant(&grant).unwrap();
    let dek = session.unwrap_key(&valid).unwrap();
    let ciphertext = session.fetch_payload(&valid, "health/metrics").await.unwrap();

    assert_matches!(
        session.decrypt_data(&valid, &ciphertext, &dek),
        Err(AgentError::Cipher(custos_crypto::CipherError::TagMismatch))
    );

    let export = session.finish().unwrap();
    assert_eq!(count(&export.entries, AuditAction::Error), 1);
    assert_eq!(count(&export.entries, AuditAction::DataDecrypted), 0);
    assert!(export.data_hash.is_none());
    assert!(verify_export(&export).valid);
}
