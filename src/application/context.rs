use super::presenter::billing::{BILLING_DETAILS, BillingDetailsPresenter};
use super::presenter::card::{CARD_DETAILS, CardDetailsPresenter};
use super::presenter::date::{DateInputPresenter, DatePart, MONTH_INPUT, YEAR_INPUT};
use super::presenter::registry::PresenterRegistry;
use crate::domain::country::CountryList;
use crate::domain::ports::FormStoreRef;
use crate::domain::validation::{Validator, YearMonth};
use crate::error::Result;
use crate::infrastructure::in_memory::InMemoryFormStore;
use std::sync::Arc;

/// Everything one checkout flow shares: the form store, the validator and
/// the presenters that survive view recreation.
///
/// Handed explicitly to whoever needs it; there is no process-wide instance.
pub struct CheckoutContext {
    store: FormStoreRef,
    validator: Arc<Validator>,
    registry: PresenterRegistry,
}

impl CheckoutContext {
    pub fn new(store: FormStoreRef, validator: Validator) -> Self {
        Self {
            store,
            validator: Arc::new(validator),
            registry: PresenterRegistry::new(),
        }
    }

    /// An in-memory store validated against the current month.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryFormStore::new()),
            Validator::new(YearMonth::current(), CountryList::default()),
        )
    }

    pub fn store(&self) -> &FormStoreRef {
        &self.store
    }

    pub fn validator(&self) -> &Arc<Validator> {
        &self.validator
    }

    pub fn registry(&self) -> &PresenterRegistry {
        &self.registry
    }

    pub fn month_input(&self) -> Result<Arc<DateInputPresenter>> {
        self.date_input(DatePart::Month)
    }

    pub fn year_input(&self) -> Result<Arc<DateInputPresenter>> {
        self.date_input(DatePart::Year)
    }

    fn date_input(&self, part: DatePart) -> Result<Arc<DateInputPresenter>> {
        let key = match part {
            DatePart::Month => MONTH_INPUT,
            DatePart::Year => YEAR_INPUT,
        };
        self.registry.get_or_create(key, || {
            DateInputPresenter::new(part, Arc::clone(&self.store), Arc::clone(&self.validator))
        })
    }

    pub fn billing_details(&self) -> Result<Arc<BillingDetailsPresenter>> {
        self.registry.get_or_create(BILLING_DETAILS, || {
            BillingDetailsPresenter::new(Arc::clone(&self.store), Arc::clone(&self.validator))
        })
    }

    pub fn card_details(&self) -> Result<Arc<CardDetailsPresenter>> {
        self.registry.get_or_create(CARD_DETAILS, || {
            CardDetailsPresenter::new(Arc::clone(&self.store), Arc::clone(&self.validator))
        })
    }

    /// Tears the flow down: presenters are dropped and the form is emptied.
    pub fn end_flow(&self) {
        tracing::info!(presenters = self.registry.len(), "checkout flow ended");
        self.registry.clear();
        self.store.reset();
    }
}
