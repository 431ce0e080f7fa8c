//! Search filter controls: browse mode, collection, action and the chosen
//! datasets, validated into a `search` request.

use peakview_protocol::{Action, BrowseMode, CollectionScope, DatasetId, SearchRequest};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    MissingAction,
    NoDatasets,
    MissingCustomTarget,
    MissingCustomRange,
    InvalidCustomRange,
    ComplementNeedsTwoDatasets,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingAction => "no action selected",
            Self::NoDatasets => "no dataset selected",
            Self::MissingCustomTarget => "customized browsing needs a target",
            Self::MissingCustomRange => "customized browsing needs a range",
            Self::InvalidCustomRange => "customized range must be a positive number of bp",
            Self::ComplementNeedsTwoDatasets => "complement needs exactly two datasets",
        };
        f.write_str(text)
    }
}

impl Error for ValidationError {}

/// Target window of a customized-range search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomWindow {
    pub target: String,
    pub range: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSearch {
    pub request: SearchRequest,
    pub custom: Option<CustomWindow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchForm {
    pub browse: BrowseMode,
    pub collection: CollectionScope,
    pub action: Option<Action>,
    /// Checked datasets in the order they were checked.
    pub datasets: Vec<DatasetId>,
    pub custom_target: String,
    pub custom_range: String,
}

impl SearchForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choose_browse(&mut self, browse: BrowseMode) {
        self.browse = browse;
    }

    pub fn choose_collection(&mut self, collection: CollectionScope) {
        self.collection = collection;
    }

    pub fn set_custom_window(&mut self, target: &str, range: &str) {
        self.custom_target = target.to_string();
        self.custom_range = range.to_string();
    }

    pub fn is_checked(&self, dataset: &str) -> bool {
        self.datasets.iter().any(|d| d == dataset)
    }

    /// Flips the checkbox of `dataset` and returns its new state. Leaving the
    /// two-dataset selection drops a chosen complement.
    pub fn toggle_dataset(&mut self, dataset: &str) -> bool {
        let checked = if let Some(idx) = self.datasets.iter().position(|d| d == dataset) {
            self.datasets.remove(idx);
            false
        } else {
            self.datasets.push(dataset.to_string());
            true
        };
        if !self.complement_enabled() && self.action == Some(Action::Complement) {
            self.action = None;
        }
        checked
    }

    pub fn complement_enabled(&self) -> bool {
        Action::Complement.required_dataset_count() == Some(self.datasets.len())
    }

    /// Actions are exclusive: choosing one replaces the previous choice.
    pub fn choose_action(&mut self, action: Action) -> Result<(), ValidationError> {
        if action == Action::Complement && !self.complement_enabled() {
            return Err(ValidationError::ComplementNeedsTwoDatasets);
        }
        self.action = Some(action);
        Ok(())
    }

    /// Unchecks the action and every dataset. Browse mode, collection and
    /// the custom window stay as they are.
    pub fn reset_selection(&mut self) {
        self.action = None;
        self.datasets.clear();
    }

    pub fn validate(&self) -> Result<ValidatedSearch, ValidationError> {
        let action = self.action.ok_or(ValidationError::MissingAction)?;
        if self.datasets.is_empty() {
            return Err(ValidationError::NoDatasets);
        }
        if let Some(required) = action.required_dataset_count() {
            if self.datasets.len() != required {
                return Err(ValidationError::ComplementNeedsTwoDatasets);
            }
        }
        let custom = match self.browse {
            BrowseMode::Global => None,
            BrowseMode::Customized => {
                let target = self.custom_target.trim();
                let range = self.custom_range.trim();
                if target.is_empty() {
                    return Err(ValidationError::MissingCustomTarget);
                }
                if range.is_empty() {
                    return Err(ValidationError::MissingCustomRange);
                }
                let range = range
                    .parse::<u64>()
                    .ok()
                    .filter(|r| *r > 0)
                    .ok_or(ValidationError::InvalidCustomRange)?;
                Some(CustomWindow {
                    target: target.to_string(),
                    range,
                })
            }
        };
        Ok(ValidatedSearch {
            request: SearchRequest {
                browse: self.browse,
                collection: self.collection,
                action,
                datasets: self.datasets.clone(),
            },
            custom,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with(datasets: &[&str]) -> SearchForm {
        let mut form = SearchForm::new();
        for d in datasets {
            form.toggle_dataset(d);
        }
        form
    }

    #[test]
    fn test_validate_requires_action_and_datasets() {
        let mut form = SearchForm::new();
        assert_eq!(form.validate(), Err(ValidationError::MissingAction));
        form.choose_action(Action::Union).unwrap();
        assert_eq!(form.validate(), Err(ValidationError::NoDatasets));
        form.toggle_dataset("D1");
        let search = form.validate().unwrap();
        assert_eq!(search.request.action, Action::Union);
        assert_eq!(search.request.datasets, vec!["D1".to_string()]);
        assert!(search.custom.is_none());
    }

    #[test]
    fn test_customized_needs_target_and_range() {
        let mut form = form_with(&["D1", "D4"]);
        form.choose_action(Action::Intersection).unwrap();
        form.choose_browse(BrowseMode::Customized);
        assert_eq!(form.validate(), Err(ValidationError::MissingCustomTarget));
        form.set_custom_window("chr17:7571720", "");
        assert_eq!(form.validate(), Err(ValidationError::MissingCustomRange));
        form.set_custom_window("chr17:7571720", "abc");
        assert_eq!(form.validate(), Err(ValidationError::InvalidCustomRange));
        form.set_custom_window("chr17:7571720", "5000");
        let search = form.validate().unwrap();
        assert_eq!(
            search.custom,
            Some(CustomWindow {
                target: "chr17:7571720".to_string(),
                range: 5000
            })
        );
    }

    #[test]
    fn test_complement_only_with_two_datasets() {
        let mut form = form_with(&["D1"]);
        assert!(!form.complement_enabled());
        assert_eq!(
            form.choose_action(Action::Complement),
            Err(ValidationError::ComplementNeedsTwoDatasets)
        );
        form.toggle_dataset("D10");
        assert!(form.complement_enabled());
        form.choose_action(Action::Complement).unwrap();
        assert!(form.validate().is_ok());
        // a third dataset disables and clears the complement
        form.toggle_dataset("D11");
        assert_eq!(form.action, None);
        assert_eq!(form.validate(), Err(ValidationError::MissingAction));
    }

    #[test]
    fn test_actions_are_exclusive_and_reset() {
        let mut form = form_with(&["D1", "D2"]);
        form.choose_action(Action::Union).unwrap();
        form.choose_action(Action::Intersection).unwrap();
        assert_eq!(form.action, Some(Action::Intersection));
        assert!(!form.toggle_dataset("D2"));
        assert!(form.is_checked("D1"));
        form.choose_browse(BrowseMode::Customized);
        form.reset_selection();
        assert_eq!(form.action, None);
        assert!(form.datasets.is_empty());
        assert_eq!(form.browse, BrowseMode::Customized);
    }
}
