//! The library facade: the public call surface of the circulation core.
//!
//! A [`Library`] owns the in-memory [`LibraryState`], the [`StateStore`] it
//! was loaded from, a [`Clock`] and the [`FeePolicy`]. Every successful
//! mutating call writes the full state back through the store before
//! returning. Refused calls change nothing and write nothing.

use chrono::Duration;
use rust_decimal::Decimal;

use crate::clock::{Clock, SystemClock};
use crate::config::{LibraryConfig, DEFAULT_LOAN_DAYS};
use crate::error::{CirculationError, Result};
use crate::fees::FeePolicy;
use crate::ledger::{LendOutcome, PaymentOutcome, ReturnOutcome};
use crate::storage::{
    check_integrity, Item, ItemId, JsonFileStore, LibraryState, LoadStatus, LoanRecord, Member,
    MemberId, NewItem, StateStore,
};

/// A lending library: in-memory state plus the store that keeps it durable.
pub struct Library<S: StateStore = JsonFileStore, C: Clock = SystemClock> {
    state: LibraryState,
    store: S,
    clock: C,
    fees: FeePolicy,
    default_loan_days: u32,
    load_status: LoadStatus,
}

impl Library<JsonFileStore, SystemClock> {
    /// Open the JSON-file library described by `config`, on wall-clock time.
    pub fn open_with_config(config: &LibraryConfig) -> Result<Self> {
        config.validate()?;
        Ok(
            Library::open(JsonFileStore::new(&config.data_path), SystemClock)?
                .with_fee_policy(config.fee_policy())
                .with_default_loan_days(config.default_loan_days),
        )
    }
}

impl<S: StateStore, C: Clock> Library<S, C> {
    /// Load state from `store`.
    ///
    /// Missing data yields an empty library with [`LoadStatus::Fresh`].
    /// Unusable data yields an empty library with [`LoadStatus::Recovered`].
    pub fn open(store: S, clock: C) -> Result<Self> {
        let loaded = store.load()?;
        let (state, load_status) = match (loaded.status, check_integrity(&loaded.state)) {
            (status, Ok(())) => (loaded.state, status),
            (_, Err(err)) => {
                log::warn!("Loaded state failed integrity check, starting empty: {}", err);
                (
                    LibraryState::new(),
                    LoadStatus::Recovered {
                        reason: err.to_string(),
                        quarantined: None,
                    },
                )
            }
        };

        log::info!(
            "Library opened ({:?}): {} items, {} members",
            load_status,
            state.items.len(),
            state.members.len()
        );

        Ok(Self {
            state,
            store,
            clock,
            fees: FeePolicy::default(),
            default_loan_days: DEFAULT_LOAN_DAYS,
            load_status,
        })
    }

    pub fn with_fee_policy(mut self, fees: FeePolicy) -> Self {
        self.fees = fees;
        self
    }

    /// Loan period used by [`Library::lend_default`].
    pub fn with_default_loan_days(mut self, days: u32) -> Self {
        self.default_loan_days = days;
        self
    }

    /// Whether this library started fresh, from saved data, or after discarding bad data.
    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    pub fn state(&self) -> &LibraryState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn fee_policy(&self) -> &FeePolicy {
        &self.fees
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.state.item(id)
    }

    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.state.member(id)
    }

    pub fn loan_record(&self, item_id: ItemId) -> Option<&LoanRecord> {
        self.state.loan_record(item_id)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.state.items.values()
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.state.members.values()
    }

    /// Write the current state through the store.
    ///
    /// Called after every mutation; callers only need it to retry after a
    /// [`CirculationError::Persistence`].
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.state).map_err(|err| {
            log::error!("Failed to persist library state: {}", err);
            if matches!(err, CirculationError::Persistence(_)) {
                err
            } else {
                CirculationError::Persistence(err.to_string())
            }
        })
    }

    // --- Entity store ---

    /// Add a catalog item and persist.
    ///
    /// # Errors
    ///
    /// `Validation` for zero copies (nothing is changed), `Persistence` if
    /// the save failed (the item was added in memory).
    pub fn add_item(&mut self, new_item: NewItem) -> Result<Item> {
        let item = self.state.add_item(new_item)?.clone();
        log::debug!("Added item {}", item);
        self.save()?;
        Ok(item)
    }

    /// Register a member and persist.
    pub fn register_member(
        &mut self,
        name: impl Into<String>,
        contact: impl Into<String>,
    ) -> Result<Member> {
        let member = self.state.register_member(name, contact).clone();
        log::debug!("Registered member {}", member);
        self.save()?;
        Ok(member)
    }

    /// Case-insensitive search over title, author and code; blank matches all.
    pub fn search_items(&self, query: &str) -> Vec<Item> {
        self.state
            .search_items(query)
            .into_iter()
            .cloned()
            .collect()
    }

    // --- Loan ledger ---

    /// Lend `item_id` to `member_id` for `loan_days` days from now.
    ///
    /// # Errors
    ///
    /// `Validation` for a zero-day loan or a due date past the representable
    /// range, `Persistence` if the save failed.
    /// Domain refusals come back as [`LendOutcome::Refused`].
    pub fn lend(
        &mut self,
        member_id: MemberId,
        item_id: ItemId,
        loan_days: u32,
    ) -> Result<LendOutcome> {
        if loan_days == 0 {
            return Err(CirculationError::Validation(
                "Loan period must be at least one day".to_string(),
            ));
        }

        let due_date = Duration::try_days(i64::from(loan_days))
            .and_then(|period| self.clock.now().checked_add_signed(period))
            .ok_or_else(|| {
                CirculationError::Validation(format!(
                    "Loan period of {} days is out of range",
                    loan_days
                ))
            })?;
        let outcome = LendOutcome::from(self.state.lend(member_id, item_id, due_date));
        match &outcome {
            LendOutcome::Lent(record) => {
                log::debug!(
                    "Member {} borrowed item {}, due {}",
                    member_id,
                    item_id,
                    record.due_date.format("%Y-%m-%d")
                );
                self.save()?;
            }
            LendOutcome::Refused(refusal) => log::warn!("Lend refused: {}", refusal),
        }
        Ok(outcome)
    }

    /// Lend for the configured default period (14 days unless configured).
    pub fn lend_default(&mut self, member_id: MemberId, item_id: ItemId) -> Result<LendOutcome> {
        self.lend(member_id, item_id, self.default_loan_days)
    }

    /// Take an item back, charging any late fee, and persist.
    ///
    /// # Errors
    ///
    /// `Validation` if the fee overflows (nothing is changed), `Persistence`
    /// if the save failed.
    pub fn return_item(&mut self, member_id: MemberId, item_id: ItemId) -> Result<ReturnOutcome> {
        let now = self.clock.now();
        let outcome = self
            .state
            .return_item(member_id, item_id, now, &self.fees)?;
        match &outcome {
            ReturnOutcome::Returned { fee } => {
                if *fee > Decimal::ZERO {
                    log::info!(
                        "Member {} returned item {} late, fee {}",
                        member_id,
                        item_id,
                        fee
                    );
                } else {
                    log::debug!("Member {} returned item {}", member_id, item_id);
                }
                self.save()?;
            }
            ReturnOutcome::Refused(refusal) => log::warn!("Return refused: {}", refusal),
        }
        Ok(outcome)
    }

    /// Items the member currently holds, in borrowing order.
    pub fn list_borrowed(&self, member_id: MemberId) -> Vec<Item> {
        self.state
            .list_borrowed(member_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Loans whose due date has passed, in item id order.
    pub fn overdue_loans(&self) -> Vec<(ItemId, LoanRecord)> {
        self.state
            .overdue_loans(self.clock.now())
            .into_iter()
            .map(|(item_id, record)| (item_id, record.clone()))
            .collect()
    }

    // --- Fees ---

    /// Pay down a member's balance. Overpayment is clamped to what is owed.
    ///
    /// # Errors
    ///
    /// `Validation` if `amount` is not positive, `Persistence` if the save
    /// failed.
    pub fn pay_fine(&mut self, member_id: MemberId, amount: Decimal) -> Result<PaymentOutcome> {
        if amount <= Decimal::ZERO {
            return Err(CirculationError::Validation(format!(
                "Payment must be positive, got {}",
                amount
            )));
        }

        let outcome = PaymentOutcome::from(self.state.pay_fine(member_id, amount));
        match &outcome {
            PaymentOutcome::Paid(payment) => {
                log::debug!(
                    "Member {} paid {}, remaining {}",
                    member_id,
                    payment.paid,
                    payment.remaining
                );
                self.save()?;
            }
            PaymentOutcome::Refused(refusal) => log::warn!("Payment refused: {}", refusal),
        }
        Ok(outcome)
    }

    // --- Maintenance ---

    /// Verify every store invariant against the in-memory state.
    pub fn check_integrity(&self) -> Result<()> {
        check_integrity(&self.state)
    }
}
