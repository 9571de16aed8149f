//! Product catalog operations.

use super::DataService;
use crate::error::DataError;
use crate::types::Product;

impl DataService {
    /// Catalog products visible to `requester`.
    pub async fn get_products(&self, requester: Option<&str>) -> Vec<Product> {
        self.fetch(requester).await
    }

    pub async fn add_product(&self, product: Product) -> Result<Product, DataError> {
        self.create(product).await
    }

    pub async fn update_product(&self, product: Product) -> Result<Product, DataError> {
        self.replace(product).await
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), DataError> {
        self.remove::<Product>(id).await
    }

    /// Adjust stock by a signed delta, clamping at zero.
    pub async fn adjust_product_stock(
        &self,
        id: &str,
        delta: i64,
    ) -> Result<Product, DataError> {
        self.patch::<Product>(id, |product| {
            let stock = product.stock as i64 + delta;
            product.stock = stock.max(0) as u32;
        })
        .await
    }
}
