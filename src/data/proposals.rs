//! Proposal operations.

use super::DataService;
use crate::error::DataError;
use crate::types::Proposal;

impl DataService {
    pub async fn get_proposals(&self) -> Vec<Proposal> {
        self.fetch(None).await
    }

    pub async fn add_proposal(&self, proposal: Proposal) -> Result<Proposal, DataError> {
        self.create(proposal).await
    }

    pub async fn update_proposal(&self, proposal: Proposal) -> Result<Proposal, DataError> {
        self.replace(proposal).await
    }

    pub async fn delete_proposal(&self, id: &str) -> Result<(), DataError> {
        self.remove::<Proposal>(id).await
    }
}
