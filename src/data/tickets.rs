//! Support ticket operations.

use chrono::Utc;
use uuid::Uuid;

use super::DataService;
use crate::error::DataError;
use crate::types::{Ticket, TicketComment, TicketStatus};

impl DataService {
    pub async fn get_tickets(&self) -> Vec<Ticket> {
        self.fetch(None).await
    }

    pub async fn add_ticket(&self, ticket: Ticket) -> Result<Ticket, DataError> {
        self.create(ticket).await
    }

    pub async fn update_ticket(&self, ticket: Ticket) -> Result<Ticket, DataError> {
        self.replace(ticket).await
    }

    pub async fn delete_ticket(&self, id: &str) -> Result<(), DataError> {
        self.remove::<Ticket>(id).await
    }

    pub async fn update_ticket_status(
        &self,
        id: &str,
        status: TicketStatus,
    ) -> Result<Ticket, DataError> {
        self.patch::<Ticket>(id, |ticket| ticket.status = status)
            .await
    }

    /// Append a comment to a ticket's thread, stamped with the current time.
    pub async fn add_ticket_comment(
        &self,
        id: &str,
        author: &str,
        text: &str,
    ) -> Result<Ticket, DataError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DataError::Invalid("a comment needs text".to_string()));
        }
        let comment = TicketComment {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            author: author.to_string(),
            date: Utc::now().to_rfc3339(),
        };
        self.patch::<Ticket>(id, |ticket| ticket.comments.push(comment))
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::data::test_support::local_service;
    use crate::error::DataError;
    use crate::types::{Ticket, TicketStatus};

    fn ticket(id: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            subject: "Printer down".to_string(),
            client_name: "Patel Exports".to_string(),
            priority: "High".to_string(),
            status: TicketStatus::Open,
            date: "2024-03-15".to_string(),
            comments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_comments_accumulate_in_order() {
        let (_dir, service) = local_service();
        service.add_ticket(ticket("t1")).await.unwrap();

        service
            .add_ticket_comment("t1", "Priya", "Looking into it")
            .await
            .unwrap();
        let after = service
            .add_ticket_comment("t1", "Priya", "Replaced the fuser")
            .await
            .unwrap();

        assert_eq!(after.comments.len(), 2);
        assert_eq!(after.comments[0].text, "Looking into it");
        assert_eq!(after.comments[1].text, "Replaced the fuser");
        assert_ne!(after.comments[0].id, after.comments[1].id);
        assert!(!after.comments[1].date.is_empty());
    }

    #[tokio::test]
    async fn test_blank_comment_is_rejected() {
        let (_dir, service) = local_service();
        service.add_ticket(ticket("t1")).await.unwrap();
        assert!(matches!(
            service.add_ticket_comment("t1", "Priya", "   ").await,
            Err(DataError::Invalid(_))
        ));
        assert!(service.get_tickets().await[0].comments.is_empty());
    }

    #[tokio::test]
    async fn test_resolving_keeps_the_thread() {
        let (_dir, service) = local_service();
        service.add_ticket(ticket("t1")).await.unwrap();
        service
            .add_ticket_comment("t1", "Priya", "Fixed")
            .await
            .unwrap();
        let resolved = service
            .update_ticket_status("t1", TicketStatus::Resolved)
            .await
            .unwrap();
        assert_eq!(resolved.status, TicketStatus::Resolved);
        assert_eq!(resolved.comments.len(), 1);
    }
}
