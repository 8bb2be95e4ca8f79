use chrono::{DateTime, Utc};
use rinha_core::{AccountId, DomainError, DomainResult, EntryId};
use rinha_ledger::{Movement, NewMovement};

/// In-memory entry log for a single account.
///
/// Entries are kept in write order. `criado_em` never decreases along the log:
/// an entry stamped earlier than its predecessor (clock step back) is restamped
/// with the predecessor's time, so `last_n` is a plain reverse walk and the
/// `(criado_em, id)` order always agrees with the write order.
#[derive(Debug, Clone)]
pub struct EntryLog {
    account_id: AccountId,
    entries: Vec<Movement>,
    next_id: i64,
}

impl EntryLog {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            entries: Vec::new(),
            next_id: 1,
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Id the next appended entry will receive.
    pub fn next_id(&self) -> EntryId {
        EntryId::new(self.next_id)
    }

    /// Timestamp of the newest recorded entry.
    pub fn latest_stamp(&self) -> Option<DateTime<Utc>> {
        self.entries.last().map(|m| m.criado_em)
    }

    /// Check an entry without recording it.
    pub fn check(&self, entry: &NewMovement) -> DomainResult<()> {
        if entry.account_id != self.account_id {
            return Err(DomainError::validation(format!(
                "entry for account {} appended to log of account {}",
                entry.account_id, self.account_id
            )));
        }
        if entry.valor.get() <= 0 {
            return Err(DomainError::validation("valor must be a positive integer"));
        }
        Ok(())
    }

    /// Record an entry at the end of the log and return its assigned id.
    pub fn append(&mut self, mut entry: NewMovement) -> DomainResult<EntryId> {
        self.check(&entry)?;

        if let Some(latest) = self.latest_stamp() {
            entry.criado_em = entry.criado_em.max(latest);
        }

        let id = self.next_id();
        self.next_id += 1;
        self.entries.push(entry.into_stored(id));

        Ok(id)
    }

    /// At most `n` entries, newest first.
    pub fn last_n(&self, n: usize) -> Vec<Movement> {
        self.entries.iter().rev().take(n).cloned().collect()
    }

    /// Net effect of every recorded entry (credits minus debits).
    pub fn net_total(&self) -> i64 {
        self.entries.iter().map(Movement::signed_value).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rinha_ledger::MovementRequest;

    fn account() -> AccountId {
        AccountId::new(1)
    }

    fn entry(valor: i64, tipo: &str, at: DateTime<Utc>) -> NewMovement {
        MovementRequest::parse(account(), valor, tipo, "t")
            .unwrap()
            .to_entry(at)
    }

    #[test]
    fn empty_log_yields_no_entries() {
        let log = EntryLog::new(account());
        assert!(log.last_n(10).is_empty());
        assert_eq!(log.net_total(), 0);
    }

    #[test]
    fn last_n_is_newest_first_and_bounded() {
        let mut log = EntryLog::new(account());
        let t0 = Utc::now();
        for i in 0..15 {
            log.append(entry(i + 1, "c", t0 + Duration::milliseconds(i)))
                .unwrap();
        }

        let last = log.last_n(10);
        assert_eq!(last.len(), 10);
        assert_eq!(last[0].valor, 15);
        assert_eq!(last[9].valor, 6);
        assert!(last.windows(2).all(|w| w[0].criado_em >= w[1].criado_em));
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let mut log = EntryLog::new(account());
        let t0 = Utc::now();
        let first = log.append(entry(1, "c", t0)).unwrap();
        let second = log.append(entry(2, "d", t0)).unwrap();

        let last = log.last_n(2);
        assert_eq!(last[0].id, second);
        assert_eq!(last[1].id, first);
    }

    #[test]
    fn entry_stamped_in_the_past_still_lists_as_newest() {
        let mut log = EntryLog::new(account());
        let t0 = Utc::now();
        let first = log.append(entry(1, "c", t0)).unwrap();
        let second = log
            .append(entry(2, "c", t0 - Duration::milliseconds(5)))
            .unwrap();

        let newest = log.last_n(1);
        assert_eq!(newest[0].id, second);
        assert_eq!(newest[0].criado_em, t0);

        let both = log.last_n(2);
        assert_eq!(both[1].id, first);
        assert!(both[0].criado_em >= both[1].criado_em);
        assert_eq!(log.latest_stamp(), Some(t0));
    }

    #[test]
    fn entry_for_another_account_is_rejected() {
        let mut log = EntryLog::new(AccountId::new(2));
        assert!(log.append(entry(1, "c", Utc::now())).is_err());
        assert!(log.is_empty());
    }

    #[test]
    fn net_total_sums_signed_values() {
        let mut log = EntryLog::new(account());
        let now = Utc::now();
        log.append(entry(500, "c", now)).unwrap();
        log.append(entry(200, "d", now)).unwrap();
        assert_eq!(log.net_total(), 300);
        assert_eq!(log.len(), 2);
    }
}
