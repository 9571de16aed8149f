//! Timesheet operations.

use super::DataService;
use crate::error::DataError;
use crate::types::TimesheetEntry;

impl DataService {
    pub async fn get_timesheet_entries(&self) -> Vec<TimesheetEntry> {
        self.fetch(None).await
    }

    pub async fn add_timesheet_entry(
        &self,
        entry: TimesheetEntry,
    ) -> Result<TimesheetEntry, DataError> {
        if entry.hours < 0.0 {
            return Err(DataError::Invalid("hours cannot be negative".to_string()));
        }
        self.create(entry).await
    }

    pub async fn update_timesheet_entry(
        &self,
        entry: TimesheetEntry,
    ) -> Result<TimesheetEntry, DataError> {
        self.replace(entry).await
    }

    pub async fn delete_timesheet_entry(&self, id: &str) -> Result<(), DataError> {
        self.remove::<TimesheetEntry>(id).await
    }
}
