//! Page-scoped application state
//!
//! The original pages kept the current user, the open conversation, and the
//! active filters in page-global variables. Here that state is an explicit
//! value with defined reset points: `reset_navigation` when switching views,
//! `clear_session` at logout.

use uuid::Uuid;

use crate::auth::User;
use crate::catalog::ListingFilter;
use crate::models::Profile;

/// Load state of a remote-backed view.
///
/// Every fetch in the sites followed the same implicit loading/loaded-or-
/// errored pattern; this makes it a value rendering can switch on.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    /// Whether a fetch is currently outstanding
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    /// Whether the last fetch failed
    pub fn is_failed(&self) -> bool {
        matches!(self, LoadState::Failed(_))
    }

    /// The loaded value, if any
    pub fn as_loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Fold a fetch result into a load state
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => LoadState::Loaded(value),
            Err(e) => LoadState::Failed(e.to_string()),
        }
    }
}

/// State for the lifetime of one page load
#[derive(Debug, Clone, Default)]
pub struct PageState {
    /// The signed-in user, if any
    pub current_user: Option<User>,

    /// The signed-in user's profile row, once fetched
    pub profile: Option<Profile>,

    /// Conversation currently open in the messages view
    pub open_conversation_id: Option<Uuid>,

    /// Listing currently open in the detail view
    pub open_listing_id: Option<Uuid>,

    /// Active catalog filter
    pub filter: ListingFilter,
}

impl PageState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset view-local state on navigation; the session survives
    pub fn reset_navigation(&mut self) {
        self.open_conversation_id = None;
        self.open_listing_id = None;
        self.filter = ListingFilter::default();
    }

    /// Clear everything at logout
    pub fn clear_session(&mut self) {
        self.current_user = None;
        self.profile = None;
        self.reset_navigation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_state_folds_results() {
        let ok: LoadState<i32> = LoadState::from_result(Ok::<_, String>(7));
        assert_eq!(ok.as_loaded(), Some(&7));

        let err: LoadState<i32> = LoadState::from_result(Err::<i32, _>("boom"));
        assert!(err.is_failed());
    }

    #[test]
    fn navigation_reset_keeps_session() {
        let mut state = PageState::new();
        state.open_conversation_id = Some(Uuid::new_v4());
        state.profile = Some(Profile::default());

        state.reset_navigation();
        assert!(state.open_conversation_id.is_none());
        assert!(state.profile.is_some());

        state.clear_session();
        assert!(state.profile.is_none());
    }
}
