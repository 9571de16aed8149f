//! Purchase order operations.

use super::DataService;
use crate::error::DataError;
use crate::types::{PurchaseOrder, PurchaseOrderStatus};

impl DataService {
    pub async fn get_purchase_orders(&self) -> Vec<PurchaseOrder> {
        self.fetch(None).await
    }

    pub async fn add_purchase_order(
        &self,
        order: PurchaseOrder,
    ) -> Result<PurchaseOrder, DataError> {
        if order.quantity == 0 {
            return Err(DataError::Invalid(
                "purchase order quantity must be at least 1".to_string(),
            ));
        }
        self.create(order).await
    }

    pub async fn update_purchase_order(
        &self,
        order: PurchaseOrder,
    ) -> Result<PurchaseOrder, DataError> {
        self.replace(order).await
    }

    pub async fn delete_purchase_order(&self, id: &str) -> Result<(), DataError> {
        self.remove::<PurchaseOrder>(id).await
    }

    pub async fn update_purchase_order_status(
        &self,
        id: &str,
        status: PurchaseOrderStatus,
    ) -> Result<PurchaseOrder, DataError> {
        self.patch::<PurchaseOrder>(id, |order| order.status = status)
            .await
    }

    /// Move an order one fulfilment stage forward. Arrived orders and
    /// unrecognized statuses are rejected.
    pub async fn advance_purchase_order(&self, id: &str) -> Result<PurchaseOrder, DataError> {
        let order = self.find_record::<PurchaseOrder>(id).await?;
        let next = order
            .status
            .next()
            .ok_or_else(|| DataError::StatusNotAdvanceable(order.status.as_str().to_string()))?;
        self.patch::<PurchaseOrder>(id, |order| order.status = next)
            .await
    }
}
