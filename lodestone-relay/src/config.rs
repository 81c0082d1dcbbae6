//! Relay configuration.

use serde::{Deserialize, Serialize};

use lodestone_core::AccountId;

use crate::error::ScanError;

/// Configuration of the scanner.
///
/// The account set is static: nonces are compared and commitments searched
/// only for accounts listed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Id of the parachain whose commitments are relayed.
    pub para_id: u32,

    /// Accounts to watch.
    pub accounts: Vec<AccountId>,

    /// Treat a bundle proof whose root does not match its commitment as a
    /// hard error instead of skipping the account for the scan.
    pub strict_proof_verification: bool,
}

impl RelayConfig {
    /// Create a new configuration.
    pub fn new(para_id: u32, accounts: Vec<AccountId>) -> Self {
        Self {
            para_id,
            accounts,
            strict_proof_verification: false,
        }
    }

    /// Enable strict proof verification.
    pub fn with_strict_proofs(mut self) -> Self {
        self.strict_proof_verification = true;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ScanError> {
        let mut seen = std::collections::BTreeSet::new();
        for account in &self.accounts {
            if !seen.insert(account) {
                return Err(ScanError::Config(format!(
                    "duplicate watched account: {}",
                    account
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_accounts_rejected() {
        let account = AccountId::from_bytes([1u8; 32]);
        let config = RelayConfig::new(1013, vec![account, account]);
        assert!(config.validate().is_err());

        let config = RelayConfig::new(1013, vec![account]);
        assert!(config.validate().is_ok());
    }
}
