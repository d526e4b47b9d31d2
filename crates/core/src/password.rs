//! Password flows in front of the credential gate.
//!
//! These are the consumer-side rules: the length policy, two-step creation with
//! confirmation, unlocking, and changing the password from settings.

use crate::credentials::{CredentialGate, CredentialStore};
use crate::validation::validate_password_policy;
use crate::{CoreError, CoreResult};
use zeroize::Zeroizing;

/// What the gate needs from the user before the library opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No password exists yet; one must be created
    NeedsSetup,
    /// A password exists and must be entered
    Locked,
}

/// Reports whether the user must create a password or enter the existing one.
pub fn gate_state<S: CredentialStore>(gate: &CredentialGate<S>) -> CoreResult<GateState> {
    if gate.has_credential()? {
        Ok(GateState::Locked)
    } else {
        Ok(GateState::NeedsSetup)
    }
}

/// Result of one entry during password creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    /// First entry accepted; the same password must be entered again
    ConfirmationRequired,
    /// Second entry matched and the password was saved
    Created,
}

/// Two-step password creation.
///
/// The first accepted entry is remembered (and wiped from memory when dropped); the
/// second must match it. A mismatch discards the first entry and starts over.
#[derive(Debug, Default)]
pub struct PasswordSetup {
    first_entry: Option<Zeroizing<String>>,
}

impl PasswordSetup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the next entry is the confirmation.
    pub fn is_awaiting_confirmation(&self) -> bool {
        self.first_entry.is_some()
    }

    /// Forgets a pending first entry.
    pub fn reset(&mut self) {
        self.first_entry = None;
    }

    /// Submits one password entry.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if:
    /// - The entry is too short (`PasswordTooShort`); the flow stays where it was
    /// - The confirmation differs from the first entry (`PasswordMismatch`); the flow resets
    /// - Saving the credential fails
    pub fn submit<S: CredentialStore>(
        &mut self,
        gate: &mut CredentialGate<S>,
        entry: &str,
    ) -> CoreResult<SetupStep> {
        validate_password_policy(entry)?;

        let Some(first) = self.first_entry.take() else {
            self.first_entry = Some(Zeroizing::new(entry.to_owned()));
            return Ok(SetupStep::ConfirmationRequired);
        };

        if first.as_str() != entry {
            tracing::debug!("password confirmation did not match");
            return Err(CoreError::PasswordMismatch);
        }

        gate.set_credential(entry)?;
        Ok(SetupStep::Created)
    }
}

/// Checks a password entered to open the library.
///
/// # Errors
///
/// Returns `CoreError` if:
/// - The entry is too short (`PasswordTooShort`)
/// - No password has been set (`NoCredential`)
/// - The password is wrong (`WrongPassword`)
pub fn unlock<S: CredentialStore>(gate: &CredentialGate<S>, candidate: &str) -> CoreResult<()> {
    validate_password_policy(candidate)?;

    if !gate.has_credential()? {
        return Err(CoreError::NoCredential);
    }

    if gate.verify(candidate)? {
        tracing::info!("library unlocked");
        Ok(())
    } else {
        tracing::warn!("unlock attempt with wrong password");
        Err(CoreError::WrongPassword)
    }
}

/// Replaces the password from settings.
///
/// # Errors
///
/// Returns `CoreError` if:
/// - The new password is too short (`PasswordTooShort`)
/// - It equals the current password (`SameAsCurrent`)
/// - Saving fails
pub fn change_password<S: CredentialStore>(
    gate: &mut CredentialGate<S>,
    new_password: &str,
) -> CoreResult<()> {
    validate_password_policy(new_password)?;

    if gate.verify(new_password)? {
        return Err(CoreError::SameAsCurrent);
    }

    gate.set_credential(new_password)
}
