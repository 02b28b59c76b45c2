use {dashmap::DashMap, tracing::debug};

use crate::{
    error::Result,
    session::{Session, checked_delimiter},
};

/// Messaging-platform user identifier.
pub type UserId = u64;

/// In-memory map of user id to [`Session`].
///
/// Entries are sharded, so concurrent updates for different users never
/// contend on a single lock. Updates replace the whole record.
pub struct SessionStore {
    defaults: Session,
    sessions: DashMap<UserId, Session>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Session::default())
    }
}

impl SessionStore {
    /// Create a store whose new sessions start from `defaults`.
    pub fn new(defaults: Session) -> Self {
        Self {
            defaults,
            sessions: DashMap::new(),
        }
    }

    pub fn defaults(&self) -> &Session {
        &self.defaults
    }

    /// Return the user's session, creating it from defaults on first access.
    pub fn get(&self, user_id: UserId) -> Session {
        self.sessions
            .entry(user_id)
            .or_insert_with(|| self.defaults.clone())
            .clone()
    }

    /// Discard the user's settings and start over from defaults.
    pub fn reset(&self, user_id: UserId) -> Session {
        let session = self.defaults.clone();
        self.sessions.insert(user_id, session.clone());
        debug!(user_id, "session reset to defaults");
        session
    }

    /// Set the field index. Command text goes through
    /// [`parse_field_index`](crate::parse_field_index) first, so a rejected
    /// argument never reaches the store. Any `usize` is accepted; indexes past
    /// the end of every line simply match nothing.
    pub fn set_field_index(&self, user_id: UserId, field_index: usize) -> Session {
        let session = self.update(user_id, |current| Session {
            field_index,
            ..current.clone()
        });
        debug!(user_id, field_index, "field index updated");
        session
    }

    /// Set the delimiter. The empty string is rejected and leaves the
    /// session untouched.
    pub fn set_delimiter(&self, user_id: UserId, value: &str) -> Result<Session> {
        let delimiter = checked_delimiter(value)?;
        let session = self.update(user_id, |current| Session {
            delimiter: delimiter.clone(),
            ..current.clone()
        });
        debug!(user_id, delimiter = %session.delimiter, "delimiter updated");
        Ok(session)
    }

    /// Number of users with a session.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn update(&self, user_id: UserId, f: impl FnOnce(&Session) -> Session) -> Session {
        let mut entry = self
            .sessions
            .entry(user_id)
            .or_insert_with(|| self.defaults.clone());
        let next = f(&entry);
        *entry = next.clone();
        next
    }
}
