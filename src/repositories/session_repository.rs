use crate::errors::ServiceError;
use crate::models::SessionUser;

use super::JsonStore;

/// Storage key of the persisted current user.
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Persists the signed-in user between CLI invocations.
#[derive(Clone, Debug)]
pub struct CurrentUserRepository {
    store: JsonStore,
}

impl CurrentUserRepository {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    pub async fn current(&self) -> Result<Option<SessionUser>, ServiceError> {
        self.store.read(CURRENT_USER_KEY).await
    }

    pub async fn set(&self, user: &SessionUser) -> Result<(), ServiceError> {
        self.store.write(CURRENT_USER_KEY, user).await
    }

    pub async fn clear(&self) -> Result<(), ServiceError> {
        self.store.remove(CURRENT_USER_KEY).await
    }
}
