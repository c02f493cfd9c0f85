// In-memory user and session stores
//
// Used for tests and for running without a database (STORE_BACKEND=memory).
// Each operation holds the table lock for its whole duration, so bulk
// invalidation is atomic with respect to other callers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{
    models::{Session, User},
    store::{NewUser, SessionFilter, SessionStore, StoreError, UserPatch, UserStore},
};

/// Rows keyed by id, plus insertion order for newest-first listings
#[derive(Debug)]
struct Table<T> {
    rows: HashMap<Uuid, T>,
    order: Vec<Uuid>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T> Table<T> {
    fn insert(&mut self, id: Uuid, row: T) {
        self.rows.insert(id, row);
        self.order.push(id);
    }

    fn remove(&mut self, id: Uuid) -> Option<T> {
        let row = self.rows.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(row)
    }

    fn newest_first(&self) -> impl Iterator<Item = &T> {
        self.order.iter().rev().filter_map(|id| self.rows.get(id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<Table<User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = email.to_lowercase();
        let users = self.users.read().await;
        Ok(users.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.rows.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let email = user.email.to_lowercase();
        let mut users = self.users.write().await;
        if users.rows.values().any(|u| u.email == email) {
            return Err(StoreError::Duplicate("email"));
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            gender: user.gender,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_by_id(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        let Some(user) = users.rows.get_mut(&id) else {
            return Ok(None);
        };

        patch.apply(user);
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(id).is_some())
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .newest_first()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.users.read().await.rows.len() as u64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<Table<Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: Uuid, user_agent: &str) -> Result<Session, StoreError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            user_agent: user_agent.to_string(),
            valid: true,
            created_at: now,
            updated_at: now,
        };
        self.sessions.write().await.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.rows.get(&id).cloned())
    }

    async fn invalidate_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().await;
        match sessions.rows.get_mut(&id) {
            Some(session) if session.valid => {
                session.valid = false;
                session.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn invalidate_many(&self, filter: SessionFilter) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let mut affected = 0;

        for session in sessions.rows.values_mut() {
            if filter.matches(session) {
                session.valid = false;
                session.updated_at = now;
                affected += 1;
            }
        }

        Ok(affected)
    }

    async fn list_valid_for_user(&self, user_id: Uuid) -> Result<Vec<Session>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .newest_first()
            .filter(|s| s.valid && s.user_id == user_id)
            .cloned()
            .collect())
    }
}
