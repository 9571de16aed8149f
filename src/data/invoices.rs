//! Invoice operations.

use super::DataService;
use crate::error::DataError;
use crate::types::{Invoice, InvoiceStatus};

impl DataService {
    pub async fn get_invoices(&self) -> Vec<Invoice> {
        self.fetch(None).await
    }

    pub async fn add_invoice(&self, invoice: Invoice) -> Result<Invoice, DataError> {
        self.create(invoice).await
    }

    pub async fn update_invoice(&self, invoice: Invoice) -> Result<Invoice, DataError> {
        self.replace(invoice).await
    }

    pub async fn delete_invoice(&self, id: &str) -> Result<(), DataError> {
        self.remove::<Invoice>(id).await
    }

    /// Move an invoice through its lifecycle (Draft, Sent, Paid, Overdue).
    /// Any transition is allowed; marking an overdue invoice Paid is normal.
    pub async fn update_invoice_status(
        &self,
        id: &str,
        status: InvoiceStatus,
    ) -> Result<Invoice, DataError> {
        self.patch::<Invoice>(id, |invoice| invoice.status = status)
            .await
    }
}
