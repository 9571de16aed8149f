//! Lead pipeline operations.

use super::DataService;
use crate::error::DataError;
use crate::types::{Lead, LeadStatus};

impl DataService {
    /// Leads visible to `requester`, newest first.
    pub async fn get_leads(&self, requester: Option<&str>) -> Vec<Lead> {
        self.fetch(requester).await
    }

    pub async fn add_lead(&self, lead: Lead) -> Result<Lead, DataError> {
        self.create(lead).await
    }

    pub async fn update_lead(&self, lead: Lead) -> Result<Lead, DataError> {
        self.replace(lead).await
    }

    pub async fn delete_lead(&self, id: &str) -> Result<(), DataError> {
        self.remove::<Lead>(id).await
    }

    /// Set a lead's pipeline status directly.
    pub async fn update_lead_status(
        &self,
        id: &str,
        status: LeadStatus,
    ) -> Result<Lead, DataError> {
        self.patch::<Lead>(id, |lead| lead.status = status).await
    }

    /// Move a lead one stage forward along the pipeline. `Proposal Sent` is
    /// the last stage reachable this way; Won, Lost, and unrecognized
    /// statuses are rejected.
    pub async fn advance_lead(&self, id: &str) -> Result<Lead, DataError> {
        let lead = self.find_record::<Lead>(id).await?;
        let next = lead
            .status
            .next()
            .ok_or_else(|| DataError::StatusNotAdvanceable(lead.status.to_string()))?;
        self.patch::<Lead>(id, |lead| lead.status = next).await
    }

    /// Close a lead as lost, recording why in its notes. The reason is
    /// required.
    pub async fn mark_lead_lost(&self, id: &str, reason: &str) -> Result<Lead, DataError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DataError::Invalid("a lost reason is required".to_string()));
        }
        self.patch::<Lead>(id, |lead| {
            lead.status = LeadStatus::Lost;
            lead.notes.push_str(&format!("\n[Lost reason] {reason}"));
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::data::test_support::local_service;
    use crate::error::DataError;
    use crate::types::{Lead, LeadStatus, Visibility};

    fn lead(id: &str, status: LeadStatus) -> Lead {
        Lead {
            id: id.to_string(),
            name: "Asha".to_string(),
            company: "Mehta Traders".to_string(),
            email: String::new(),
            phone: String::new(),
            state: String::new(),
            status,
            value: 45000.0,
            notes: "First call went well.".to_string(),
            last_contact: String::new(),
            interest: Vec::new(),
            visibility: Visibility::Public,
            shared_with: Vec::new(),
            owner_id: "u1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_advance_walks_pipeline_and_stops_at_proposal_sent() {
        let (_dir, service) = local_service();
        service.add_lead(lead("l1", LeadStatus::New)).await.unwrap();

        for expected in [
            LeadStatus::Contacted,
            LeadStatus::Qualified,
            LeadStatus::ProposalSent,
        ] {
            let advanced = service.advance_lead("l1").await.unwrap();
            assert_eq!(advanced.status, expected);
        }

        // Proposal Sent does not auto-advance to Won.
        let err = service.advance_lead("l1").await.unwrap_err();
        assert!(matches!(err, DataError::StatusNotAdvanceable(_)));
    }

    #[tokio::test]
    async fn test_advance_rejects_terminal_and_unknown_statuses() {
        let (_dir, service) = local_service();
        service.add_lead(lead("won", LeadStatus::Won)).await.unwrap();
        service
            .add_lead(lead("odd", LeadStatus::Other("On Hold".to_string())))
            .await
            .unwrap();

        assert!(service.advance_lead("won").await.is_err());
        let err = service.advance_lead("odd").await.unwrap_err();
        assert!(matches!(err, DataError::StatusNotAdvanceable(s) if s == "On Hold"));
    }

    #[tokio::test]
    async fn test_mark_lost_requires_reason_and_appends_note() {
        let (_dir, service) = local_service();
        service
            .add_lead(lead("l1", LeadStatus::Qualified))
            .await
            .unwrap();

        assert!(matches!(
            service.mark_lead_lost("l1", "  ").await,
            Err(DataError::Invalid(_))
        ));

        let lost = service
            .mark_lead_lost("l1", "Chose a competitor")
            .await
            .unwrap();
        assert_eq!(lost.status, LeadStatus::Lost);
        assert_eq!(
            lost.notes,
            "First call went well.\n[Lost reason] Chose a competitor"
        );

        // The failed attempt above must not have changed anything.
        let stored = service.get_leads(Some("u1")).await;
        assert_eq!(stored[0].status, LeadStatus::Lost);
    }

    #[tokio::test]
    async fn test_update_lead_status_sets_directly() {
        let (_dir, service) = local_service();
        service.add_lead(lead("l1", LeadStatus::New)).await.unwrap();
        let updated = service
            .update_lead_status("l1", LeadStatus::Won)
            .await
            .unwrap();
        assert_eq!(updated.status, LeadStatus::Won);
    }

    #[tokio::test]
    async fn test_status_ops_on_missing_lead() {
        let (_dir, service) = local_service();
        assert!(matches!(
            service.advance_lead("ghost").await,
            Err(DataError::NotFound { .. })
        ));
        assert!(matches!(
            service.mark_lead_lost("ghost", "reason").await,
            Err(DataError::NotFound { .. })
        ));
    }
}
