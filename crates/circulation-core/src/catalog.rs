//! Entity store operations: registering items and members, catalog search.
//!
//! These mutate [`LibraryState`] only; persistence is the caller's job.

use rust_decimal::Decimal;

use crate::error::{CirculationError, Result};
use crate::storage::types::{Item, LibraryState, Member, NewItem};

impl LibraryState {
    /// Add a catalog item with a freshly allocated id.
    ///
    /// # Errors
    ///
    /// Returns `CirculationError::Validation` if `copies` is zero.
    pub fn add_item(&mut self, new_item: NewItem) -> Result<&Item> {
        if new_item.copies == 0 {
            return Err(CirculationError::Validation(
                "An item needs at least one copy".to_string(),
            ));
        }

        let id = self.allocate_item_id();
        let item = Item {
            id,
            title: new_item.title,
            author: new_item.author,
            code: new_item.code,
            total_copies: new_item.copies,
            available_copies: new_item.copies,
            holders: Vec::new(),
        };
        Ok(&*self.items.entry(id).or_insert(item))
    }

    /// Register a member with a zero balance and nothing borrowed.
    pub fn register_member(
        &mut self,
        name: impl Into<String>,
        contact: impl Into<String>,
    ) -> &Member {
        let id = self.allocate_member_id();
        let member = Member {
            id,
            name: name.into(),
            contact: contact.into(),
            borrowed: Vec::new(),
            fine_balance: Decimal::ZERO,
        };
        self.members.entry(id).or_insert(member)
    }

    /// Items whose title, author or code contains `query`, ignoring case.
    ///
    /// Results are in id order. A blank query matches every item.
    pub fn search_items(&self, query: &str) -> Vec<&Item> {
        let needle = query.trim().to_lowercase();
        self.items
            .values()
            .filter(|item| {
                needle.is_empty()
                    || item.title.to_lowercase().contains(&needle)
                    || item.author.to_lowercase().contains(&needle)
                    || item.code.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::{ItemId, MemberId};

    fn sample_state() -> LibraryState {
        let mut state = LibraryState::new();
        state
            .add_item(NewItem::new("Python Crash Course", "Eric Matthes", "978-1593279285").with_copies(3))
            .unwrap();
        state
            .add_item(NewItem::new("Clean Code", "Robert Martin", "978-0132350886").with_copies(2))
            .unwrap();
        state
    }

    #[test]
    fn test_add_item_assigns_sequential_ids() {
        let state = sample_state();
        let ids: Vec<ItemId> = state.items.keys().copied().collect();
        assert_eq!(ids, vec![ItemId(1), ItemId(2)]);
        assert_eq!(state.next_item_id, 3);

        let item = state.item(ItemId(1)).unwrap();
        assert_eq!(item.total_copies, 3);
        assert_eq!(item.available_copies, 3);
        assert!(item.holders.is_empty());
    }

    #[test]
    fn test_add_item_rejects_zero_copies() {
        let mut state = LibraryState::new();
        let result = state.add_item(NewItem::new("T", "A", "C").with_copies(0));
        assert!(matches!(result, Err(CirculationError::Validation(_))));
        assert!(state.items.is_empty());
        assert_eq!(state.next_item_id, 1);
    }

    #[test]
    fn test_register_member() {
        let mut state = LibraryState::new();
        let member = state.register_member("Alice Johnson", "alice@example.com").clone();
        assert_eq!(member.id, MemberId(1));
        assert_eq!(member.fine_balance, Decimal::ZERO);
        assert!(member.borrowed.is_empty());
        assert_eq!(state.register_member("Bob", "bob@example.com").id, MemberId(2));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let state = sample_state();
        let titles: Vec<&str> = state
            .search_items("CLEAN")
            .iter()
            .map(|item| item.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Clean Code"]);
        assert_eq!(state.search_items("matthes").len(), 1);
    }

    #[test]
    fn test_search_matches_code_substring() {
        let state = sample_state();
        let found = state.search_items("0132350886");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, ItemId(2));
        assert_eq!(state.search_items("978-").len(), 2);
    }

    #[test]
    fn test_empty_query_matches_everything_in_order() {
        let state = sample_state();
        let ids: Vec<ItemId> = state.search_items("").iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![ItemId(1), ItemId(2)]);
    }

    #[test]
    fn test_search_without_match() {
        assert!(sample_state().search_items("tolkien").is_empty());
    }
}
