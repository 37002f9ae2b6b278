//! In-memory state tax registry.
//!
//! A registry is a plain value: build one per request from the stored rows
//! (or from [`StateTaxRegistry::with_defaults`]) and hand it to the
//! calculators. Nothing here is process-global.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{CarKeepError, RecordKind};
use crate::models::{ReliefCapBasis, StateTaxConfig, normalize_state_code};

/// Codes that can be updated but never deleted.
pub const PROTECTED_STATE_CODES: [&str; 3] = ["VA", "TX", "CA"];

/// Returns `true` when `code` names a protected configuration.
pub fn is_protected(code: &str) -> bool {
    let code = normalize_state_code(code);
    PROTECTED_STATE_CODES.contains(&code.as_str())
}

/// The configurations seeded for a fresh store.
pub fn default_state_taxes() -> Vec<StateTaxConfig> {
    vec![
        StateTaxConfig {
            state_code: "VA".to_string(),
            state_name: "Virginia".to_string(),
            property_tax_rate: Decimal::new(457, 4),
            pptra_relief: Decimal::new(51, 2),
            relief_cap: Decimal::new(20000, 0),
            relief_cap_basis: ReliefCapBasis::TaxableValue,
        },
        StateTaxConfig {
            state_code: "TX".to_string(),
            state_name: "Texas".to_string(),
            property_tax_rate: Decimal::ZERO,
            pptra_relief: Decimal::ZERO,
            relief_cap: Decimal::ZERO,
            relief_cap_basis: ReliefCapBasis::ReliefAmount,
        },
        StateTaxConfig {
            state_code: "CA".to_string(),
            state_name: "California".to_string(),
            property_tax_rate: Decimal::new(65, 4),
            pptra_relief: Decimal::ZERO,
            relief_cap: Decimal::ZERO,
            relief_cap_basis: ReliefCapBasis::ReliefAmount,
        },
    ]
}

#[derive(Debug, Clone, Default)]
pub struct StateTaxRegistry {
    configs: HashMap<String, StateTaxConfig>,
}

impl StateTaxRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding [`default_state_taxes`].
    pub fn with_defaults() -> Self {
        Self::from_configs(default_state_taxes())
    }

    /// Builds a snapshot from already-stored configurations. Codes are
    /// normalized; later duplicates replace earlier ones.
    pub fn from_configs<I>(configs: I) -> Self
    where
        I: IntoIterator<Item = StateTaxConfig>,
    {
        let configs = configs
            .into_iter()
            .map(|config| {
                let config = config.normalized();
                (config.state_code.clone(), config)
            })
            .collect();
        Self { configs }
    }

    /// Looks up a configuration by code, ignoring case.
    ///
    /// # Errors
    ///
    /// [`CarKeepError::NotFound`] when the code is not registered.
    pub fn get(
        &self,
        code: &str,
    ) -> Result<&StateTaxConfig, CarKeepError> {
        let code = normalize_state_code(code);
        self.configs
            .get(&code)
            .ok_or_else(|| CarKeepError::not_found(RecordKind::StateTax, code))
    }

    /// Validates and inserts or replaces a configuration.
    pub fn upsert(
        &mut self,
        config: StateTaxConfig,
    ) -> Result<(), CarKeepError> {
        config.validate()?;
        let config = config.normalized();
        info!(state = %config.state_code, "upserting state tax configuration");
        self.configs.insert(config.state_code.clone(), config);
        Ok(())
    }

    /// Removes a configuration.
    ///
    /// # Errors
    ///
    /// [`CarKeepError::ProtectedRecord`] for VA, TX and CA;
    /// [`CarKeepError::NotFound`] when the code is not registered.
    pub fn delete(
        &mut self,
        code: &str,
    ) -> Result<StateTaxConfig, CarKeepError> {
        let code = normalize_state_code(code);
        if is_protected(&code) {
            return Err(CarKeepError::ProtectedRecord(code));
        }
        let removed = self
            .configs
            .remove(&code)
            .ok_or_else(|| CarKeepError::not_found(RecordKind::StateTax, code.as_str()))?;
        debug!(state = %code, "deleted state tax configuration");
        Ok(removed)
    }

    /// All configurations keyed by code, in code order.
    pub fn list(&self) -> BTreeMap<String, StateTaxConfig> {
        self.configs
            .iter()
            .map(|(code, config)| (code.clone(), config.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn oregon() -> StateTaxConfig {
        StateTaxConfig {
            state_code: "or".to_string(),
            state_name: "Oregon".to_string(),
            property_tax_rate: dec!(0.01),
            pptra_relief: dec!(0),
            relief_cap: dec!(0),
            relief_cap_basis: ReliefCapBasis::ReliefAmount,
        }
    }

    #[test]
    fn defaults_contain_protected_states() {
        let registry = StateTaxRegistry::with_defaults();

        assert_eq!(registry.len(), 3);
        for code in PROTECTED_STATE_CODES {
            assert!(registry.get(code).is_ok(), "missing default for {code}");
        }
    }

    #[test]
    fn defaults_are_valid() {
        for config in default_state_taxes() {
            assert_eq!(config.validate(), Ok(()), "{}", config.state_code);
        }
    }

    #[test]
    fn get_ignores_case() {
        let registry = StateTaxRegistry::with_defaults();

        assert_eq!(registry.get("va").unwrap().state_name, "Virginia");
    }

    #[test]
    fn get_unknown_code_is_not_found() {
        let registry = StateTaxRegistry::with_defaults();

        assert_eq!(
            registry.get("ZZ"),
            Err(CarKeepError::not_found(RecordKind::StateTax, "ZZ"))
        );
    }

    #[test]
    fn upsert_normalizes_and_stores() {
        let mut registry = StateTaxRegistry::new();

        registry.upsert(oregon()).unwrap();

        assert_eq!(registry.get("OR").unwrap().state_code, "OR");
    }

    #[test]
    fn upsert_replaces_existing() {
        let mut registry = StateTaxRegistry::with_defaults();
        let mut texas = registry.get("TX").unwrap().clone();
        texas.property_tax_rate = dec!(0.02);

        registry.upsert(texas).unwrap();

        assert_eq!(registry.get("TX").unwrap().property_tax_rate, dec!(0.02));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn upsert_rejects_invalid_rate() {
        let mut registry = StateTaxRegistry::new();
        let config = StateTaxConfig {
            property_tax_rate: dec!(2),
            ..oregon()
        };

        assert!(matches!(
            registry.upsert(config),
            Err(CarKeepError::Validation { field, .. }) if field == "property_tax_rate"
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn delete_protected_code_fails() {
        let mut registry = StateTaxRegistry::with_defaults();

        assert_eq!(
            registry.delete("ca"),
            Err(CarKeepError::ProtectedRecord("CA".to_string()))
        );
        assert!(registry.get("CA").is_ok());
    }

    #[test]
    fn delete_unprotected_code_removes_it() {
        let mut registry = StateTaxRegistry::with_defaults();
        registry.upsert(oregon()).unwrap();

        let removed = registry.delete("OR").unwrap();

        assert_eq!(removed.state_name, "Oregon");
        assert!(registry.get("OR").is_err());
    }

    #[test]
    fn delete_missing_code_is_not_found() {
        let mut registry = StateTaxRegistry::with_defaults();

        assert_eq!(
            registry.delete("NV"),
            Err(CarKeepError::not_found(RecordKind::StateTax, "NV"))
        );
    }

    #[test]
    fn list_is_ordered_by_code() {
        let registry = StateTaxRegistry::with_defaults();

        let codes: Vec<_> = registry.list().into_keys().collect();

        assert_eq!(codes, vec!["CA", "TX", "VA"]);
    }

    #[test]
    fn is_protected_ignores_case() {
        assert!(is_protected("va"));
        assert!(!is_protected("OR"));
    }
}
