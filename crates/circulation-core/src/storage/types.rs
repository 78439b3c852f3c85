//! Core data types for the circulation store.
//!
//! These are the entities persisted by every [`StateStore`](super::StateStore)
//! backend. Field names match the on-disk document.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier of a catalog item. Allocated sequentially from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

/// Identifier of a registered member. Allocated sequentially from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A circulating catalog entry with one or more copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,

    pub title: String,

    /// Author or creator
    pub author: String,

    /// External catalog code (e.g. ISBN)
    pub code: String,

    /// Number of copies owned; fixed at creation
    pub total_copies: u32,

    /// Copies currently on the shelf
    pub available_copies: u32,

    /// Members currently holding a copy
    #[serde(default)]
    pub holders: Vec<MemberId>,
}

impl Item {
    /// Whether at least one copy can be lent right now.
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Copies currently out on loan.
    pub fn copies_on_loan(&self) -> u32 {
        self.total_copies - self.available_copies
    }

    pub fn is_held_by(&self, member_id: MemberId) -> bool {
        self.holders.contains(&member_id)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {} (ID: {})", self.title, self.author, self.id)
    }
}

/// A registered borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,

    /// Display name
    pub name: String,

    /// Contact string (email, phone, ...)
    pub contact: String,

    /// Items currently borrowed, in borrowing order
    #[serde(default)]
    pub borrowed: Vec<ItemId>,

    /// Outstanding late fees; never negative
    #[serde(default)]
    pub fine_balance: Decimal,
}

impl Member {
    pub fn has_borrowed(&self, item_id: ItemId) -> bool {
        self.borrowed.contains(&item_id)
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ID: {})", self.name, self.id)
    }
}

/// The ledger entry tracking who holds an item and when it is due.
///
/// There is at most one record per item id, even for multi-copy items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub member_id: MemberId,

    /// Serialized as an RFC 3339 timestamp
    pub due_date: DateTime<Utc>,
}

impl LoanRecord {
    pub fn is_overdue_at(&self, at: DateTime<Utc>) -> bool {
        self.due_date < at
    }
}

/// Builder for catalog items.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub author: String,
    pub code: String,
    pub copies: u32,
}

impl NewItem {
    pub fn new(title: impl Into<String>, author: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            code: code.into(),
            copies: 1,
        }
    }

    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies = copies;
        self
    }
}

/// Complete persisted state: entities, id counters and active loans.
///
/// Maps are ordered by id, which is also insertion order since ids are
/// allocated sequentially and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryState {
    pub items: BTreeMap<ItemId, Item>,
    pub members: BTreeMap<MemberId, Member>,
    pub next_item_id: u64,
    pub next_member_id: u64,
    pub loan_records: BTreeMap<ItemId, LoanRecord>,
}

impl Default for LibraryState {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            members: BTreeMap::new(),
            next_item_id: 1,
            next_member_id: 1,
            loan_records: BTreeMap::new(),
        }
    }
}

impl LibraryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.members.is_empty() && self.loan_records.is_empty()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.get(&id)
    }

    pub fn loan_record(&self, item_id: ItemId) -> Option<&LoanRecord> {
        self.loan_records.get(&item_id)
    }

    pub(crate) fn allocate_item_id(&mut self) -> ItemId {
        let id = ItemId(self.next_item_id);
        self.next_item_id += 1;
        id
    }

    pub(crate) fn allocate_member_id(&mut self) -> MemberId {
        let id = MemberId(self.next_member_id);
        self.next_member_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_builder() {
        let item = NewItem::new("Clean Code", "Robert Martin", "978-0132350886").with_copies(2);

        assert_eq!(item.title, "Clean Code");
        assert_eq!(item.author, "Robert Martin");
        assert_eq!(item.code, "978-0132350886");
        assert_eq!(item.copies, 2);
    }

    #[test]
    fn test_new_item_defaults_to_one_copy() {
        assert_eq!(NewItem::new("A", "B", "C").copies, 1);
    }

    #[test]
    fn test_empty_state_counters_start_at_one() {
        let mut state = LibraryState::new();
        assert!(state.is_empty());
        assert_eq!(state.allocate_item_id(), ItemId(1));
        assert_eq!(state.allocate_item_id(), ItemId(2));
        assert_eq!(state.allocate_member_id(), MemberId(1));
    }

    #[test]
    fn test_map_keys_serialize_as_strings() {
        let mut state = LibraryState::new();
        let id = state.allocate_item_id();
        state.items.insert(
            id,
            Item {
                id,
                title: "T".to_string(),
                author: "A".to_string(),
                code: "C".to_string(),
                total_copies: 1,
                available_copies: 1,
                holders: Vec::new(),
            },
        );

        let json = serde_json::to_value(&state).unwrap();
        assert!(json["items"].get("1").is_some());
        assert_eq!(json["items"]["1"]["id"], 1);
        assert_eq!(json["next_item_id"], 2);

        let back: LibraryState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_item_display() {
        let item = Item {
            id: ItemId(3),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            code: "X".to_string(),
            total_copies: 1,
            available_copies: 1,
            holders: Vec::new(),
        };
        assert_eq!(item.to_string(), "Dune by Frank Herbert (ID: 3)");
    }
}
