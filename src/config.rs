use std::env;

/// Configuration for the funding subsystem
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundingConfig {
    /// Built-in account identities to register at startup.
    pub accounts: Vec<String>,
    /// Account where cancelled-order funds land before onward transfer.
    pub holding_account: String,
    /// Scope passed to the open-order listing call.
    pub order_scope: String,
}

impl FundingConfig {
    /// Default configuration with the built-in account set
    pub fn default() -> FundingConfig {
        FundingConfig {
            accounts: vec![
                "lending".to_string(),
                "exchange".to_string(),
                "margin".to_string(),
            ],
            holding_account: "exchange".to_string(),
            order_scope: "all".to_string(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> FundingConfig {
        let mut config = FundingConfig::default();

        if let Ok(accounts) = env::var("FUNDING_ACCOUNTS") {
            let parsed = Self::parse_accounts(&accounts);
            if parsed.is_empty() {
                tracing::warn!(
                    "FUNDING_ACCOUNTS '{}' contains no account names, using defaults: {:?}",
                    accounts,
                    config.accounts
                );
            } else {
                config.accounts = parsed;
            }
        }

        if let Ok(holding) = env::var("FUNDING_HOLDING_ACCOUNT") {
            let holding = holding.trim();
            if holding.is_empty() {
                tracing::warn!(
                    "FUNDING_HOLDING_ACCOUNT is empty, using default: {}",
                    config.holding_account
                );
            } else {
                config.holding_account = holding.to_string();
            }
        }

        if let Ok(scope) = env::var("FUNDING_ORDER_SCOPE") {
            let scope = scope.trim();
            if !scope.is_empty() {
                config.order_scope = scope.to_string();
            }
        }

        config
    }

    /// Parse a comma-separated account list, trimming whitespace and
    /// dropping empty entries.
    pub fn parse_accounts(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|account| !account.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn has_account(&self, account: &str) -> bool {
        self.accounts.iter().any(|a| a == account)
    }
}
