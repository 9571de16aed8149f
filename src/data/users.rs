//! User directory operations.

use super::DataService;
use crate::error::DataError;
use crate::types::AppUser;

impl DataService {
    pub async fn get_users(&self) -> Vec<AppUser> {
        self.fetch(None).await
    }

    pub async fn add_user(&self, user: AppUser) -> Result<AppUser, DataError> {
        self.create(user).await
    }

    pub async fn update_user(&self, user: AppUser) -> Result<AppUser, DataError> {
        self.replace(user).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), DataError> {
        self.remove::<AppUser>(id).await
    }
}
