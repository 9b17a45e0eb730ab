use crate::automation::AutomationError;
use crate::hierarchy::HierarchyError;
use crate::preferences::PreferenceError;

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
    #[error(transparent)]
    Preference(#[from] PreferenceError),
    #[error(transparent)]
    Automation(#[from] AutomationError),
}
