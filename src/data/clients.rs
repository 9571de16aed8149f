//! Client directory operations.

use super::DataService;
use crate::error::DataError;
use crate::types::Client;

impl DataService {
    pub async fn get_clients(&self) -> Vec<Client> {
        self.fetch(None).await
    }

    pub async fn add_client(&self, client: Client) -> Result<Client, DataError> {
        self.create(client).await
    }

    pub async fn update_client(&self, client: Client) -> Result<Client, DataError> {
        self.replace(client).await
    }

    pub async fn delete_client(&self, id: &str) -> Result<(), DataError> {
        self.remove::<Client>(id).await
    }
}
