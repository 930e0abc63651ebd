//! Lifecycle action logging
//!
//! [`ActionLogger`] reports every action a store reduces to `tracing`.
//! Failure actions (`error: true`) are logged at `warn` with their payload,
//! everything else at `debug`. Names are filtered with glob patterns, and
//! the most recent entries can be kept in memory for inspection.
//!
//! ```ignore
//! use api_dispatch_core::{ActionFilter, ActionLogger, StoreWithMiddleware};
//!
//! let logger = ActionLogger::with_history(ActionFilter::new(Some("USERS_*"), None), 50);
//! let store = StoreWithMiddleware::new(AppState::default(), reducer).with_logger(logger);
//! ```

use std::collections::VecDeque;

use crate::action::ActionSummary;

/// Glob include/exclude filter on action type names.
///
/// `*` matches any run of characters and `?` exactly one. Without explicit
/// excludes, host-internal actions (`@@*`) are skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl Default for ActionFilter {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl ActionFilter {
    /// Build a filter from comma-separated pattern lists
    ///
    /// ```
    /// use api_dispatch_core::ActionFilter;
    ///
    /// let filter = ActionFilter::new(Some("USERS_*, LOGOUT"), Some("*_REQUEST"));
    /// assert!(filter.allows("USERS_SUCCESS"));
    /// assert!(filter.allows("LOGOUT"));
    /// assert!(!filter.allows("USERS_REQUEST"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include: include.map(patterns).unwrap_or_default(),
            exclude: patterns(exclude.unwrap_or("@@*")),
        }
    }

    /// A filter letting every action through
    pub fn all() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Whether an action with this name is logged
    pub fn allows(&self, name: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| glob_match(p, name));
        included && !self.exclude.iter().any(|p| glob_match(p, name))
    }
}

fn patterns(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// One reduced action, as remembered by an [`ActionLogger`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggedAction {
    /// Position among all logged actions, starting at 0
    pub sequence: u64,
    /// Action type name
    pub name: String,
    /// Serialized action
    pub summary: String,
    /// Whether the action is a failure
    pub error: bool,
    /// Whether the reducer reported a change
    pub state_changed: bool,
}

/// Logs reduced actions to tracing, optionally keeping recent ones
#[derive(Clone, Debug, Default)]
pub struct ActionLogger {
    filter: ActionFilter,
    capacity: usize,
    history: VecDeque<LoggedAction>,
    next_sequence: u64,
}

impl ActionLogger {
    /// Log to tracing only
    pub fn new(filter: ActionFilter) -> Self {
        Self::with_history(filter, 0)
    }

    /// Log to tracing and keep the last `capacity` entries
    pub fn with_history(filter: ActionFilter, capacity: usize) -> Self {
        Self {
            filter,
            capacity,
            history: VecDeque::with_capacity(capacity),
            next_sequence: 0,
        }
    }

    /// Log an action after the reducer ran.
    ///
    /// Returns `false` when the filter skipped it.
    pub fn record<A: ActionSummary>(&mut self, action: &A, state_changed: bool) -> bool {
        let name = action.name();
        if !self.filter.allows(&name) {
            return false;
        }

        let summary = action.summary();
        let error = action.is_error();
        if error {
            tracing::warn!(action = %name, %summary, state_changed, "Failure action");
        } else {
            tracing::debug!(action = %name, state_changed, "Action");
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        if self.capacity == 0 {
            return true;
        }
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(LoggedAction {
            sequence,
            name: name.into_owned(),
            summary,
            error,
            state_changed,
        });
        true
    }

    /// Remembered entries, oldest first
    pub fn history(&self) -> impl Iterator<Item = &LoggedAction> {
        self.history.iter()
    }

    /// Remembered failure actions, oldest first
    pub fn failures(&self) -> impl Iterator<Item = &LoggedAction> {
        self.history.iter().filter(|entry| entry.error)
    }

    /// Forget remembered entries
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

/// Match `text` against a glob pattern with `*` and `?` wildcards
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Last `*` seen, and the text position it currently absorbs up to
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(&'*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => {
                let Some((star, absorbed)) = backtrack else {
                    return false;
                };
                backtrack = Some((star, absorbed + 1));
                p = star + 1;
                t = absorbed + 1;
            }
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::StandardAction;
    use crate::error::CallError;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("USERS_REQUEST", "USERS_REQUEST"));
        assert!(!glob_match("USERS_REQUEST", "USERS_REQUESTS"));
        assert!(glob_match("USERS_*", "USERS_"));
        assert!(!glob_match("USERS_*", "LOAD_USERS_SUCCESS"));
        assert!(glob_match("*_FAILURE", "USERS_FAILURE"));
        assert!(glob_match("*S_*_E?", "USERS_FAILURE_EX"));
        assert!(!glob_match("USER?", "USER"));
    }

    #[test]
    fn test_filter_patterns() {
        let filter = ActionFilter::new(Some(" USERS_* , "), None);
        assert!(filter.allows("USERS_SUCCESS"));
        assert!(!filter.allows("POSTS_SUCCESS"));

        let filter = ActionFilter::default();
        assert!(!filter.allows("@@INIT"));
        assert!(filter.allows("USERS_REQUEST"));
        assert!(ActionFilter::all().allows("@@INIT"));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut logger = ActionLogger::with_history(ActionFilter::all(), 2);
        for _ in 0..3 {
            assert!(logger.record(&StandardAction::new("USERS_REQUEST"), true));
        }
        let sequences: Vec<_> = logger.history().map(|entry| entry.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);

        logger.clear();
        assert_eq!(logger.history().count(), 0);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut logger = ActionLogger::with_history(ActionFilter::all(), 0);
        assert!(logger.record(&StandardAction::new("USERS_REQUEST"), true));
        assert!(logger.record(&StandardAction::new("USERS_SUCCESS"), true));
        assert_eq!(logger.history().count(), 0);

        let mut logger = ActionLogger::new(ActionFilter::all());
        logger.record(&StandardAction::new("USERS_REQUEST"), false);
        assert_eq!(logger.history().count(), 0);
    }

    #[test]
    fn test_failures_and_filtered_actions() {
        let mut logger = ActionLogger::with_history(ActionFilter::default(), 10);
        logger.record(&StandardAction::new("USERS_REQUEST"), true);
        assert!(!logger.record(&StandardAction::new("@@INIT"), false));
        logger.record(
            &StandardAction::error("USERS_FAILURE", CallError::request("offline")),
            false,
        );

        assert_eq!(logger.history().count(), 2);
        let failures: Vec<_> = logger.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "USERS_FAILURE");
        assert!(failures[0].summary.contains("RequestError"));
        assert!(!failures[0].state_changed);
    }
}
