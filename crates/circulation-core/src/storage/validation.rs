//! Store invariant checks.
//!
//! Run on every load so that a document that parses but describes an
//! impossible state is treated like a corrupt one.

use rust_decimal::Decimal;

use crate::error::{CirculationError, Result};
use crate::storage::types::LibraryState;

fn violation(message: String) -> CirculationError {
    CirculationError::Integrity(message)
}

/// Verify that the state satisfies every store-wide invariant.
///
/// - map keys match embedded ids, counters are ahead of every id
/// - `available_copies + holders == total_copies`, `total_copies >= 1`
/// - holders and borrowed sets mirror each other, without duplicates
/// - each loan record names an existing item held by its member
/// - no negative fee balances
pub fn check_integrity(state: &LibraryState) -> Result<()> {
    for (key, item) in &state.items {
        if *key != item.id {
            return Err(violation(format!(
                "Item stored under key {} has id {}",
                key, item.id
            )));
        }
        if item.id.0 == 0 || item.id.0 >= state.next_item_id {
            return Err(violation(format!(
                "Item id {} outside allocated range (next {})",
                item.id, state.next_item_id
            )));
        }
        if item.total_copies == 0 {
            return Err(violation(format!("Item {} has no copies", item.id)));
        }
        if item.available_copies > item.total_copies {
            return Err(violation(format!(
                "Item {} has {} available of {} copies",
                item.id, item.available_copies, item.total_copies
            )));
        }
        if item.holders.len() as u64 != u64::from(item.copies_on_loan()) {
            return Err(violation(format!(
                "Item {} has {} holders but {} copies on loan",
                item.id,
                item.holders.len(),
                item.copies_on_loan()
            )));
        }
        for (index, holder) in item.holders.iter().enumerate() {
            if item.holders[..index].contains(holder) {
                return Err(violation(format!(
                    "Item {} lists member {} twice",
                    item.id, holder
                )));
            }
            let member = state.members.get(holder).ok_or_else(|| {
                violation(format!(
                    "Item {} is held by unknown member {}",
                    item.id, holder
                ))
            })?;
            if !member.has_borrowed(item.id) {
                return Err(violation(format!(
                    "Item {} lists member {} who has not borrowed it",
                    item.id, holder
                )));
            }
        }
    }

    for (key, member) in &state.members {
        if *key != member.id {
            return Err(violation(format!(
                "Member stored under key {} has id {}",
                key, member.id
            )));
        }
        if member.id.0 == 0 || member.id.0 >= state.next_member_id {
            return Err(violation(format!(
                "Member id {} outside allocated range (next {})",
                member.id, state.next_member_id
            )));
        }
        if member.fine_balance < Decimal::ZERO {
            return Err(violation(format!(
                "Member {} has a negative balance",
                member.id
            )));
        }
        for (index, item_id) in member.borrowed.iter().enumerate() {
            if member.borrowed[..index].contains(item_id) {
                return Err(violation(format!(
                    "Member {} lists item {} twice",
                    member.id, item_id
                )));
            }
            let item = state.items.get(item_id).ok_or_else(|| {
                violation(format!(
                    "Member {} borrowed unknown item {}",
                    member.id, item_id
                ))
            })?;
            if !item.is_held_by(member.id) {
                return Err(violation(format!(
                    "Member {} borrowed item {} which does not list them",
                    member.id, item_id
                )));
            }
        }
    }

    for (item_id, record) in &state.loan_records {
        let item = state.items.get(item_id).ok_or_else(|| {
            violation(format!("Loan record for unknown item {}", item_id))
        })?;
        if !item.is_held_by(record.member_id) {
            return Err(violation(format!(
                "Loan record for item {} names member {} who does not hold it",
                item_id, record.member_id
            )));
        }
    }

    Ok(())
}
