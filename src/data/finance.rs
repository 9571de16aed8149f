//! Finance ledger operations.

use super::DataService;
use crate::error::DataError;
use crate::types::FinanceRecord;

impl DataService {
    pub async fn get_finance_records(&self) -> Vec<FinanceRecord> {
        self.fetch(None).await
    }

    pub async fn add_finance_record(
        &self,
        record: FinanceRecord,
    ) -> Result<FinanceRecord, DataError> {
        self.create(record).await
    }

    pub async fn update_finance_record(
        &self,
        record: FinanceRecord,
    ) -> Result<FinanceRecord, DataError> {
        self.replace(record).await
    }

    pub async fn delete_finance_record(&self, id: &str) -> Result<(), DataError> {
        self.remove::<FinanceRecord>(id).await
    }
}
