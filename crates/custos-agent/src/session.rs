//! The per-request session pipeline
//!
//! A session drives one grant through parse → validate → unwrap →
//! decrypt, emitting exactly one audit entry per transition, rejections
//! included. The session owns its audit chain exclusively; the agent
//! keypair is shared read-only.

use crate::error::AgentError;
use crate::issuer::IssuerDirectory;
use crate::store::ObjectStore;
use custos_audit::{AuditAction, AuditChain, AuditError, AuditExport, Details, EntryHashes};
use custos_core::{sha256_hex, Effects, SessionId};
use custos_crypto::{decrypt_payload, encrypt_payload, unwrap_dek, AgentKeyPair, DataKey};
use custos_grants::{
    parse_grant, permits, validate, CapabilityGrant, Permission, RejectionReason, ValidGrant,
    ValidationPolicy,
};
use serde_json::json;
use std::sync::Arc;

/// One request's pipeline over the security core.
pub struct Session {
    keypair: Arc<AgentKeyPair>,
    issuers: Arc<dyn IssuerDirectory>,
    store: Arc<dyn ObjectStore>,
    policy: ValidationPolicy,
    effects: Effects,
    chain: AuditChain,
    data_hash: Option<String>,
    result_hash: Option<String>,
}

impl Session {
    /// Start a session with a fresh audit chain.
    pub fn new(
        keypair: Arc<AgentKeyPair>,
        issuers: Arc<dyn IssuerDirectory>,
        store: Arc<dyn ObjectStore>,
        policy: ValidationPolicy,
        effects: Effects,
    ) -> Result<Self, AgentError> {
        let session_id = SessionId::new_with_effects(&effects);
        let chain = AuditChain::new(session_id, effects.clone())?;
        tracing::info!(%session_id, "Session started");
        Ok(Session {
            keypair,
            issuers,
            store,
            policy,
            effects,
            chain,
            data_hash: None,
            result_hash: None,
        })
    }

    /// This session's identifier.
    pub fn session_id(&self) -> SessionId {
        self.chain.session_id()
    }

    /// The audit chain accumulated so far.
    pub fn chain(&self) -> &AuditChain {
        &self.chain
    }

    /// Parse an incoming grant.
    ///
    /// Emits `token_received` on success, an `error` entry on malformed
    /// wire bytes. A malformed grant never reaches validation.
    pub fn receive_grant(&mut self, wire_bytes: &[u8]) -> Result<CapabilityGrant, AgentError> {
        match parse_grant(wire_bytes) {
            Ok(grant) => {
                let mut details = Details::new();
                details.insert("grant_id".to_string(), json!(grant.id));
                details.insert("issuer".to_string(), json!(grant.issuer));
                details.insert("scope_count".to_string(), json!(grant.scopes.len()));
                self.chain.append(AuditAction::TokenReceived, details)?;
                tracing::info!(grant_id = %grant.id, issuer = %grant.issuer, "Grant received");
                Ok(grant)
            }
            Err(e) => {
                self.append_error("parse", &e)?;
                Err(e.into())
            }
        }
    }

    /// Validate a parsed grant against this agent's identity and policy.
    ///
    /// Emits `token_validated` or `token_rejected`.
    pub fn validate_grant(&mut self, grant: &CapabilityGrant) -> Result<ValidGrant, AgentError> {
        let issuer_key = self.issuers.verifying_key(&grant.issuer);
        let now = self.effects.now().map_err(AuditError::from)?;

        match validate(
            grant,
            now,
            &self.keypair.public_key_bytes(),
            &self.policy,
            issuer_key.as_ref(),
        ) {
            Ok(verdict) => {
                let mut details = Details::new();
                details.insert("grant_id".to_string(), json!(grant.id));
                details.insert("expires_at".to_string(), json!(grant.expires_at));
                if verdict.is_unsigned() {
                    details.insert("unsigned".to_string(), json!(true));
                    tracing::warn!(
                        grant_id = %grant.id,
                        "Unsigned grant accepted under relaxed signature policy"
                    );
                }
                self.chain.append(AuditAction::TokenValidated, details)?;
                Ok(verdict)
            }
            Err(reason) => {
                let mut details = Details::new();
                details.insert("grant_id".to_string(), json!(grant.id));
                details.insert("reason".to_string(), json!(reason.code()));
                self.chain.append(AuditAction::TokenRejected, details)?;
                tracing::warn!(grant_id = %grant.id, reason = reason.code(), "Grant rejected");
                Err(reason.into())
            }
        }
    }

    /// Unwrap the grant's DEK with the agent's private key.
    ///
    /// Emits `dek_unwrapped`, or an `error` entry on authentication
    /// failure. A failed unwrap is a security event and is never retried
    /// with the same material.
    pub fn unwrap_key(&mut self, valid: &ValidGrant) -> Result<DataKey, AgentError> {
        match unwrap_dek(&valid.grant().wrapped_key, self.keypair.secret()) {
            Ok(dek) => {
                let mut details = Details::new();
                details.insert("grant_id".to_string(), json!(valid.grant().id));
                self.chain.append(AuditAction::DekUnwrapped, details)?;
                Ok(dek)
            }
            Err(e) => {
                tracing::warn!(
                    grant_id = %valid.grant().id,
                    "DEK unwrap authentication failed"
                );
                self.append_error("dek_unwrap", &e)?;
                Err(e.into())
            }
        }
    }

    /// Fetch the grant's ciphertext from the object store.
    ///
    /// The read scope for `path` is checked first; a denial emits
    /// `token_rejected` and no store call happens. Transient store
    /// failures are not retried here.
    pub async fn fetch_payload(
        &mut self,
        valid: &ValidGrant,
        path: &str,
    ) -> Result<Vec<u8>, AgentError> {
        self.check_scope(valid, path, Permission::Read)?;

        let locator = valid.grant().resource_locator.clone();
        match self.store.get(&locator).await {
            Ok(ciphertext) => {
                let mut details = Details::new();
                details.insert("grant_id".to_string(), json!(valid.grant().id));
                details.insert("locator".to_string(), json!(locator));
                details.insert("bytes".to_string(), json!(ciphertext.len()));
                self.chain.append(AuditAction::DataFetched, details)?;
                Ok(ciphertext)
            }
            Err(e) => {
                self.append_error("fetch", &e)?;
                Err(e.into())
            }
        }
    }

    /// Decrypt a fetched payload under the DEK.
    ///
    /// Emits `data_decrypted` carrying SHA-256 of the plaintext (never the
    /// plaintext itself) so the user can verify the hash out of band.
    pub fn decrypt_data(
        &mut self,
        valid: &ValidGrant,
        ciphertext: &[u8],
        dek: &DataKey,
    ) -> Result<Vec<u8>, AgentError> {
        match decrypt_payload(ciphertext, dek) {
            Ok(plaintext) => {
                let digest = sha256_hex(&plaintext);
                let mut details = Details::new();
                details.insert("grant_id".to_string(), json!(valid.grant().id));
                details.insert("bytes".to_string(), json!(plaintext.len()));
                self.chain.append_with(
                    AuditAction::DataDecrypted,
                    details,
                    EntryHashes::output(digest.clone()),
                    None,
                )?;
                self.data_hash = Some(digest);
                Ok(plaintext)
            }
            Err(e) => {
                tracing::warn!(grant_id = %valid.grant().id, "Payload authentication failed");
                self.append_error("decrypt", &e)?;
                Err(e.into())
            }
        }
    }

    /// Record the start of host-driven inference over the decrypted data.
    pub fn begin_inference(&mut self, details: Details) -> Result<(), AgentError> {
        self.chain.append(AuditAction::InferenceStarted, details)?;
        Ok(())
    }

    /// Record the completion of host-driven inference.
    pub fn complete_inference(
        &mut self,
        details: Details,
        duration_ms: Option<u64>,
    ) -> Result<(), AgentError> {
        self.chain.append_with(
            AuditAction::InferenceCompleted,
            details,
            EntryHashes::default(),
            duration_ms,
        )?;
        Ok(())
    }

    /// Encrypt an output payload under the DEK.
    ///
    /// Emits `output_encrypted` carrying SHA-256 of the plaintext input.
    pub fn encrypt_output(
        &mut self,
        valid: &ValidGrant,
        plaintext: &[u8],
        dek: &DataKey,
    ) -> Result<Vec<u8>, AgentError> {
        let digest = sha256_hex(plaintext);
        match encrypt_payload(plaintext, dek, &self.effects) {
            Ok(ciphertext) => {
                let mut details = Details::new();
                details.insert("grant_id".to_string(), json!(valid.grant().id));
                details.insert("bytes".to_string(), json!(plaintext.len()));
                self.chain.append_with(
                    AuditAction::OutputEncrypted,
                    details,
                    EntryHashes::input(digest.clone()),
                    None,
                )?;
                self.result_hash = Some(digest);
                Ok(ciphertext)
            }
            Err(e) => {
                self.append_error("encrypt", &e)?;
                Err(e.into())
            }
        }
    }

    /// Write an encrypted output back to the object store.
    ///
    /// The write scope for `path` is checked first; a denial emits
    /// `token_rejected` and no store call happens.
    pub async fn store_output(
        &mut self,
        valid: &ValidGrant,
        path: &str,
        ciphertext: Vec<u8>,
    ) -> Result<(), AgentError> {
        self.check_scope(valid, path, Permission::Write)?;

        let locator = valid.grant().resource_locator.clone();
        let bytes = ciphertext.len();
        match self.store.put(&locator, ciphertext).await {
            Ok(()) => {
                let mut details = Details::new();
                details.insert("grant_id".to_string(), json!(valid.grant().id));
                details.insert("locator".to_string(), json!(locator));
                details.insert("path".to_string(), json!(path));
                details.insert("bytes".to_string(), json!(bytes));
                self.chain.append(AuditAction::OutputStored, details)?;
                Ok(())
            }
            Err(e) => {
                self.append_error("store", &e)?;
                Err(e.into())
            }
        }
    }

    /// Finish the session and produce the export document.
    pub fn finish(self) -> Result<AuditExport, AgentError> {
        let completed_at = self.effects.now().map_err(AuditError::from)?;
        let export = self
            .chain
            .export(completed_at, self.data_hash, self.result_hash);
        tracing::info!(
            session_id = %export.session_id,
            entries = export.entries.len(),
            "Session finished"
        );
        Ok(export)
    }

    /// Data-access boundary: first matching scope decides.
    fn check_scope(
        &mut self,
        valid: &ValidGrant,
        path: &str,
        permission: Permission,
    ) -> Result<(), AgentError> {
        if permits(&valid.grant().scopes, path, permission) {
            return Ok(());
        }

        let reason = RejectionReason::ScopeDenied;
        let mut details = Details::new();
        details.insert("grant_id".to_string(), json!(valid.grant().id));
        details.insert("path".to_string(), json!(path));
        details.insert(
            "permission".to_string(),
            json!(match permission {
                Permission::Read => "read",
                Permission::Write => "write",
            }),
        );
        details.insert("reason".to_string(), json!(reason.code()));
        self.chain.append(AuditAction::TokenRejected, details)?;
        tracing::warn!(grant_id = %valid.grant().id, path, "Scope denied");
        Err(reason.into())
    }

    fn append_error(
        &mut self,
        stage: &str,
        error: &dyn std::fmt::Display,
    ) -> Result<(), AgentError> {
        let mut details = Details::new();
        details.insert("stage".to_string(), json!(stage));
        details.insert("error".to_string(), json!(error.to_string()));
        self.chain.append(AuditAction::Error, details)?;
        Ok(())
    }
}
