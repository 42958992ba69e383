//! Payout method → gateway bank code table

use cashout_core::{PayoutMethod, UnknownVariant};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankCodeError {
    #[error("Malformed bank code entry '{0}', expected Method=code")]
    Malformed(String),

    #[error(transparent)]
    UnknownMethod(#[from] UnknownVariant),

    #[error("Duplicate bank code entry for {0}")]
    Duplicate(PayoutMethod),
}

/// Which gateway bank code each payout method is sent with.
///
/// Deployers populate this; a method without an entry cannot be paid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankCodeTable {
    codes: HashMap<PayoutMethod, String>,
}

impl BankCodeTable {
    pub fn new() -> Self {
        Self {
            codes: HashMap::new(),
        }
    }

    /// Parse `Nequi=Nequi,Bancolombia=1022` style lists
    pub fn parse(list: &str) -> Result<Self, BankCodeError> {
        let mut table = Self::new();

        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (method, code) = entry
                .split_once('=')
                .map(|(m, c)| (m.trim(), c.trim()))
                .filter(|(m, c)| !m.is_empty() && !c.is_empty())
                .ok_or_else(|| BankCodeError::Malformed(entry.to_string()))?;

            let method: PayoutMethod = method.parse()?;
            if table.codes.insert(method, code.to_string()).is_some() {
                return Err(BankCodeError::Duplicate(method));
            }
        }

        Ok(table)
    }

    pub fn with_code(mut self, method: PayoutMethod, code: impl Into<String>) -> Self {
        self.codes.insert(method, code.into());
        self
    }

    pub fn code_for(&self, method: PayoutMethod) -> Option<&str> {
        self.codes.get(&method).map(String::as_str)
    }

    /// Methods with no code configured
    pub fn unmapped(&self) -> Vec<PayoutMethod> {
        PayoutMethod::ALL
            .into_iter()
            .filter(|m| !self.codes.contains_key(m))
            .collect()
    }
}

impl Default for BankCodeTable {
    /// Historical mapping: the wallet goes by name, both bank brands share `1022`.
    fn default() -> Self {
        Self::new()
            .with_code(PayoutMethod::Nequi, "Nequi")
            .with_code(PayoutMethod::Bancolombia, "1022")
            .with_code(PayoutMethod::Daviplata, "1022")
    }
}

impl fmt::Display for BankCodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = PayoutMethod::ALL
            .into_iter()
            .filter_map(|m| self.code_for(m).map(|c| format!("{m}={c}")))
            .collect();
        f.write_str(&entries.join(","))
    }
}
