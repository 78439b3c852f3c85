//! Loan ledger: lending, returns, borrowed lists and fee payments.
//!
//! Each operation either applies completely or leaves the state untouched
//! and reports a [`Refusal`]. Holder and borrowed sets are updated together
//! so the two sides never disagree once a call returns.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::CirculationError;
use crate::fees::FeePolicy;
use crate::storage::types::{Item, ItemId, LibraryState, LoanRecord, MemberId};

/// Why a ledger operation was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    UnknownMember(MemberId),
    UnknownItem(ItemId),
    /// Every copy is out on loan
    NoCopiesAvailable(ItemId),
    /// The member already holds a copy of this item
    AlreadyBorrowed { member_id: MemberId, item_id: ItemId },
    /// The member does not hold this item
    NotBorrowed { member_id: MemberId, item_id: ItemId },
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refusal::UnknownMember(id) => write!(f, "Member {} not found", id),
            Refusal::UnknownItem(id) => write!(f, "Item {} not found", id),
            Refusal::NoCopiesAvailable(id) => write!(f, "No copies of item {} available", id),
            Refusal::AlreadyBorrowed { member_id, item_id } => {
                write!(f, "Member {} already borrowed item {}", member_id, item_id)
            }
            Refusal::NotBorrowed { member_id, item_id } => {
                write!(f, "Member {} has not borrowed item {}", member_id, item_id)
            }
        }
    }
}

/// Outcome of a lend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LendOutcome {
    Lent(LoanRecord),
    Refused(Refusal),
}

/// Outcome of a return request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// `fee` is zero for on-time returns and when no matching loan record exists.
    Returned { fee: Decimal },
    Refused(Refusal),
}

/// A fee payment that was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    /// Amount actually taken, never more than was owed
    pub paid: Decimal,
    pub remaining: Decimal,
}

/// Outcome of a fee payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid(Payment),
    Refused(Refusal),
}

impl LendOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LendOutcome::Lent(_))
    }
}

impl ReturnOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ReturnOutcome::Returned { .. })
    }
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Paid(_))
    }
}

impl From<Result<LoanRecord, Refusal>> for LendOutcome {
    fn from(result: Result<LoanRecord, Refusal>) -> Self {
        match result {
            Ok(record) => LendOutcome::Lent(record),
            Err(refusal) => LendOutcome::Refused(refusal),
        }
    }
}

impl From<Result<Payment, Refusal>> for PaymentOutcome {
    fn from(result: Result<Payment, Refusal>) -> Self {
        match result {
            Ok(payment) => PaymentOutcome::Paid(payment),
            Err(refusal) => PaymentOutcome::Refused(refusal),
        }
    }
}

impl LibraryState {
    /// Lend one copy of `item_id` to `member_id`, due at `due_date`.
    ///
    /// Checks, in order: member exists, item exists, a copy is available,
    /// the member does not already hold the item. The loan record for the
    /// item is created or overwritten.
    pub fn lend(
        &mut self,
        member_id: MemberId,
        item_id: ItemId,
        due_date: DateTime<Utc>,
    ) -> Result<LoanRecord, Refusal> {
        if !self.members.contains_key(&member_id) {
            return Err(Refusal::UnknownMember(member_id));
        }
        let item = self
            .items
            .get_mut(&item_id)
            .ok_or(Refusal::UnknownItem(item_id))?;
        if !item.is_available() {
            return Err(Refusal::NoCopiesAvailable(item_id));
        }
        let member = self
            .members
            .get_mut(&member_id)
            .ok_or(Refusal::UnknownMember(member_id))?;
        if member.has_borrowed(item_id) {
            return Err(Refusal::AlreadyBorrowed { member_id, item_id });
        }

        item.available_copies -= 1;
        item.holders.push(member_id);
        member.borrowed.push(item_id);

        let record = LoanRecord {
            member_id,
            due_date,
        };
        self.loan_records.insert(item_id, record.clone());
        Ok(record)
    }

    /// Take back `item_id` from `member_id` at `returned_at`, charging any late fee.
    ///
    /// A fee is only assessed when the item's loan record names this member;
    /// that record is then removed. A record naming another member (one
    /// record per item, several copies out) is left alone and no fee is
    /// charged.
    ///
    /// # Errors
    ///
    /// Returns `CirculationError::Validation` if the fee or the resulting
    /// balance overflows. The state is left unchanged in that case.
    pub fn return_item(
        &mut self,
        member_id: MemberId,
        item_id: ItemId,
        returned_at: DateTime<Utc>,
        policy: &FeePolicy,
    ) -> crate::error::Result<ReturnOutcome> {
        let Some(member) = self.members.get(&member_id) else {
            return Ok(ReturnOutcome::Refused(Refusal::UnknownMember(member_id)));
        };
        if !self.items.contains_key(&item_id) {
            return Ok(ReturnOutcome::Refused(Refusal::UnknownItem(item_id)));
        }
        if !member.has_borrowed(item_id) {
            return Ok(ReturnOutcome::Refused(Refusal::NotBorrowed {
                member_id,
                item_id,
            }));
        }

        // Everything fallible happens before the first mutation.
        let fee = match self.loan_records.get(&item_id) {
            Some(record) if record.member_id == member_id => {
                Some(policy.fee(record.due_date, returned_at)?)
            }
            _ => None,
        };
        let balance = match fee {
            Some(fee) => member.fine_balance.checked_add(fee).ok_or_else(|| {
                CirculationError::Validation(format!(
                    "Balance of member {} overflows when adding {}",
                    member_id, fee
                ))
            })?,
            None => member.fine_balance,
        };

        if let Some(member) = self.members.get_mut(&member_id) {
            member.borrowed.retain(|id| *id != item_id);
            member.fine_balance = balance;
        }
        if let Some(item) = self.items.get_mut(&item_id) {
            item.holders.retain(|holder| *holder != member_id);
            item.available_copies = (item.available_copies + 1).min(item.total_copies);
        }
        if fee.is_some() {
            self.loan_records.remove(&item_id);
        }

        Ok(ReturnOutcome::Returned {
            fee: fee.unwrap_or(Decimal::ZERO),
        })
    }

    /// Items the member currently holds, in borrowing order.
    ///
    /// Ids that no longer resolve to an item are skipped. Unknown members
    /// hold nothing.
    pub fn list_borrowed(&self, member_id: MemberId) -> Vec<&Item> {
        self.members
            .get(&member_id)
            .map(|member| {
                member
                    .borrowed
                    .iter()
                    .filter_map(|item_id| self.items.get(item_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reduce the member's balance by `amount`, clamped to what is owed.
    pub fn pay_fine(&mut self, member_id: MemberId, amount: Decimal) -> Result<Payment, Refusal> {
        let member = self
            .members
            .get_mut(&member_id)
            .ok_or(Refusal::UnknownMember(member_id))?;

        let paid = amount.max(Decimal::ZERO).min(member.fine_balance);
        member.fine_balance -= paid;
        Ok(Payment {
            paid,
            remaining: member.fine_balance,
        })
    }

    /// Loan records due strictly before `at`, in item id order.
    pub fn overdue_loans(&self, at: DateTime<Utc>) -> Vec<(ItemId, &LoanRecord)> {
        self.loan_records
            .iter()
            .filter(|(_, record)| record.is_overdue_at(at))
            .map(|(item_id, record)| (*item_id, record))
            .collect()
    }
}
