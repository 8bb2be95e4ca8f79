use serde::{Deserialize, Serialize};

use rinha_core::{AccountId, DomainError, DomainResult, Entity};

use crate::movement::{MovementKind, MovementRequest};

/// `(limite, saldo)` pair returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub limite: i64,
    pub saldo: i64,
}

/// A provisioned account.
///
/// Invariant: `saldo >= -limite`. `limite` is fixed at provisioning time and
/// `saldo` only changes through [`Account::admit`] followed by a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Non-negative overdraft allowance, in centavos.
    pub limite: i64,
    /// Signed running balance, in centavos.
    pub saldo: i64,
}

impl Account {
    /// Freshly provisioned account (zero balance).
    pub fn provision(id: AccountId, limite: i64) -> DomainResult<Self> {
        if limite < 0 {
            return Err(DomainError::validation("limite must be non-negative"));
        }
        Ok(Self { id, limite, saldo: 0 })
    }

    pub fn balance(&self) -> Balance {
        Balance {
            limite: self.limite,
            saldo: self.saldo,
        }
    }

    /// Balance after applying `kind`/`amount`, or `None` on arithmetic overflow.
    pub fn prospective(&self, kind: MovementKind, amount: i64) -> Option<i64> {
        match kind {
            MovementKind::Credito => self.saldo.checked_add(amount),
            MovementKind::Debito => self.saldo.checked_sub(amount),
        }
    }

    /// Decide whether `request` is admitted against the current balance.
    ///
    /// Returns the post-operation balance on admission. On rejection the error
    /// carries the *pre-operation* balance and nothing about `self` changes.
    pub fn admit(&self, request: &MovementRequest) -> DomainResult<Balance> {
        if request.account_id != self.id() {
            return Err(DomainError::validation(format!(
                "movement for account {} applied to account {}",
                request.account_id,
                self.id()
            )));
        }

        let saldo = self
            .prospective(request.kind, request.amount.get())
            .ok_or_else(|| DomainError::validation("valor out of range"))?;

        if saldo < -self.limite {
            return Err(DomainError::limit_exceeded(self.limite, self.saldo));
        }

        Ok(Balance {
            limite: self.limite,
            saldo,
        })
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_account(limite: i64) -> Account {
        Account::provision(AccountId::new(1), limite).unwrap()
    }

    fn request(valor: i64, tipo: &str) -> MovementRequest {
        MovementRequest::parse(AccountId::new(1), valor, tipo, "teste").unwrap()
    }

    #[test]
    fn debit_down_to_the_limit_is_admitted() {
        let account = test_account(1000);
        let balance = account.admit(&request(1000, "d")).unwrap();
        assert_eq!(balance, Balance { limite: 1000, saldo: -1000 });
    }

    #[test]
    fn balance_changes_keep_identity() {
        let before = test_account(1000);
        let after = Account { saldo: -5, ..before };
        assert!(before.is_same(&after));
        assert!(!before.is_same(&Account::provision(AccountId::new(2), 1000).unwrap()));
    }

    #[test]
    fn debit_past_the_limit_reports_pre_operation_balance() {
        let account = Account {
            saldo: -1000,
            ..test_account(1000)
        };
        let err = account.admit(&request(1, "d")).unwrap_err();
        assert_eq!(err, DomainError::LimitExceeded { limite: 1000, saldo: -1000 });
    }

    #[test]
    fn credit_is_always_admitted_when_in_range() {
        let account = Account {
            saldo: -1000,
            ..test_account(1000)
        };
        assert_eq!(account.admit(&request(500, "c")).unwrap().saldo, -500);
    }

    #[test]
    fn overflowing_credit_is_a_validation_error() {
        let account = Account {
            saldo: i64::MAX - 1,
            ..test_account(0)
        };
        assert!(matches!(
            account.admit(&request(10, "c")),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn request_for_another_account_is_refused() {
        let account = test_account(10);
        let other = MovementRequest::parse(AccountId::new(2), 1, "c", "x").unwrap();
        assert!(account.admit(&other).is_err());
    }

    #[test]
    fn negative_limit_cannot_be_provisioned() {
        assert!(Account::provision(AccountId::new(9), -1).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whatever sequence of requests arrives, admitted balances
        /// never go below `-limite` and always equal credits minus debits.
        #[test]
        fn balance_stays_within_limit_and_matches_admitted_movements(
            limite in 0i64..1_000_000i64,
            ops in prop::collection::vec((1i64..500_000i64, any::<bool>()), 1..64)
        ) {
            let mut account = test_account(limite);
            let mut net: i64 = 0;

            for (valor, is_credit) in ops {
                let tipo = if is_credit { "c" } else { "d" };
                let before = account;
                match account.admit(&request(valor, tipo)) {
                    Ok(balance) => {
                        account.saldo = balance.saldo;
                        net += if is_credit { valor } else { -valor };
                    }
                    Err(DomainError::LimitExceeded { limite: l, saldo: s }) => {
                        prop_assert!(!is_credit);
                        prop_assert_eq!(l, before.limite);
                        prop_assert_eq!(s, before.saldo);
                    }
                    Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
                }
                prop_assert!(account.saldo >= -account.limite);
            }

            prop_assert_eq!(account.saldo, net);
        }
    }
}
