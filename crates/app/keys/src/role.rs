//! Signing roles of a multi-authority account.

use std::fmt;

/// The authority a signature is produced for.
///
/// Role-based accounts hold a separate key per role; other key types answer
/// every role with the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Ordinary transactions sent by the account.
    Transaction,
    /// Transactions that replace the account key itself.
    AccountUpdate,
    /// Fee payment on behalf of another sender.
    FeePayer,
}

impl Role {
    /// All roles in their on-chain order.
    pub const ALL: [Role; 3] = [Role::Transaction, Role::AccountUpdate, Role::FeePayer];

    /// Position of the role inside a role-based key.
    pub const fn index(self) -> usize {
        match self {
            Role::Transaction => 0,
            Role::AccountUpdate => 1,
            Role::FeePayer => 2,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Transaction => f.write_str("transaction"),
            Role::AccountUpdate => f.write_str("account update"),
            Role::FeePayer => f.write_str("fee payer"),
        }
    }
}
