//! Account record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Balance;

/// A persisted account.
///
/// `version` is the optimistic-concurrency fencing token: it starts at 0 on
/// creation and is incremented by exactly 1 on every committed balance write.
/// Accounts are created by provisioning, conditionally rewritten by every
/// deposit/withdraw/transfer, and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// Externally visible unique key, immutable after creation.
    pub account_number: String,
    /// Owning user. Ownership reference only, no lifecycle coupling.
    pub owner_id: Uuid,
    /// Classification such as "SAVINGS" or "CHECKING", informational only.
    pub account_type: String,
    pub balance: Balance,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for account provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub owner_id: Uuid,
    pub account_number: String,
    pub account_type: String,
    pub initial_balance: Balance,
}

impl Account {
    /// Materialize a freshly provisioned account at version 0.
    pub fn provision(new: NewAccount) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_number: new.account_number,
            owner_id: new.owner_id,
            account_type: new.account_type,
            balance: new.initial_balance,
            version: 0,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provision_starts_at_version_zero() {
        let account = Account::provision(NewAccount {
            owner_id: Uuid::new_v4(),
            account_number: "10010001".to_string(),
            account_type: "SAVINGS".to_string(),
            initial_balance: Balance::zero(),
        });

        assert_eq!(account.version, 0);
        assert_eq!(account.account_number, "10010001");
        assert_eq!(account.balance, Balance::zero());
    }
}
