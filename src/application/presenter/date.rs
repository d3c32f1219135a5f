use super::registry::PresenterKey;
use super::{Presenter, PresenterCore};
use crate::application::use_case::{
    Outcome, UseCase, YEAR_PICKER_SPAN, month_for_position, year_for_position,
};
use crate::domain::form::Field;
use crate::domain::ports::{FieldCompletionListener, FormStoreRef};
use crate::domain::validation::Validator;
use std::sync::{Arc, Mutex, PoisonError};

pub const MONTH_INPUT: PresenterKey<DateInputPresenter> = PresenterKey::new("month_input");
pub const YEAR_INPUT: PresenterKey<DateInputPresenter> = PresenterKey::new("year_input");

/// Which half of the expiry date a picker edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Month,
    Year,
}

impl DatePart {
    pub fn field(&self) -> Field {
        match self {
            DatePart::Month => Field::ExpiryMonth,
            DatePart::Year => Field::ExpiryYear,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateInputUiState {
    /// Picker entries; index 0 is the empty placeholder.
    pub entries: Vec<String>,
    pub position: usize,
    /// True once a real entry is selected.
    pub finished: bool,
    /// Normalized value of the selection, empty while unfinished.
    pub value: String,
}

/// Expiry month / year picker.
pub struct DateInputPresenter {
    core: PresenterCore<DateInputUiState>,
    part: DatePart,
    store: FormStoreRef,
    validator: Arc<Validator>,
    listener: Mutex<Option<Arc<dyn FieldCompletionListener>>>,
}

impl DateInputPresenter {
    pub fn new(part: DatePart, store: FormStoreRef, validator: Arc<Validator>) -> Self {
        let entries = std::iter::once(String::new())
            .chain((1..=picker_len(part)).filter_map(|p| entry_at(part, &validator, p)))
            .collect();
        let initial = DateInputUiState {
            entries,
            position: 0,
            finished: false,
            value: String::new(),
        };
        let presenter = Self {
            core: PresenterCore::new(initial),
            part,
            store,
            validator,
            listener: Mutex::new(None),
        };
        let state = presenter.recompute(&presenter.core.state());
        presenter.core.publish(state);
        presenter
    }

    pub fn part(&self) -> DatePart {
        self.part
    }

    pub fn set_completion_listener(&self, listener: Arc<dyn FieldCompletionListener>) {
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    pub fn selected(&self, position: usize) -> Option<String> {
        let use_case = match self.part {
            DatePart::Month => UseCase::MonthSelected { position },
            DatePart::Year => UseCase::YearSelected { position },
        };
        let value = match use_case.execute(self.store.as_ref(), &self.validator) {
            Outcome::DateSelected { value } => value,
            _ => None,
        };

        self.core.update(|current| DateInputUiState {
            position: if value.is_some() { position } else { 0 },
            finished: value.is_some(),
            value: value.clone().unwrap_or_default(),
            ..current.clone()
        });

        if let Some(value) = &value {
            let listener = self
                .listener
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(listener) = listener {
                listener.on_field_completed(self.part.field(), value);
            }
        }
        value
    }
}

impl Presenter for DateInputPresenter {
    type UiState = DateInputUiState;

    fn core(&self) -> &PresenterCore<DateInputUiState> {
        &self.core
    }

    fn recompute(&self, current: &DateInputUiState) -> DateInputUiState {
        let stored = self.store.get(self.part.field()).parse::<u32>().ok();
        let position = stored.and_then(|stored| {
            current
                .entries
                .iter()
                .skip(1)
                .position(|entry| entry.parse::<u32>().ok() == Some(stored))
                .map(|i| i + 1)
        });
        match position {
            Some(position) => DateInputUiState {
                position,
                finished: true,
                value: current.entries[position].clone(),
                ..current.clone()
            },
            None => DateInputUiState {
                position: 0,
                finished: false,
                value: String::new(),
                ..current.clone()
            },
        }
    }
}

fn picker_len(part: DatePart) -> usize {
    match part {
        DatePart::Month => 12,
        DatePart::Year => YEAR_PICKER_SPAN,
    }
}

fn entry_at(part: DatePart, validator: &Validator, position: usize) -> Option<String> {
    match part {
        DatePart::Month => month_for_position(position),
        DatePart::Year => year_for_position(validator, position),
    }
}
