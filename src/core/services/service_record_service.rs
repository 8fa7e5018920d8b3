//! Helpers for the maintenance log.

use chrono::FixedOffset;
use uuid::Uuid;

use crate::core::services::ServiceResult;
use crate::domain::service_record::{ServiceRecord, ServiceRecordDraft};

pub struct ServiceRecordService;

impl ServiceRecordService {
    /// Validates the draft and appends the resulting record.
    pub fn add(
        records: &mut Vec<ServiceRecord>,
        draft: ServiceRecordDraft,
        offset: FixedOffset,
    ) -> ServiceResult<Uuid> {
        let record = draft.into_record(offset)?;
        let id = record.id;
        records.push(record);
        Ok(id)
    }

    /// Most recent service first.
    pub fn history(records: &[ServiceRecord]) -> Vec<ServiceRecord> {
        let mut sorted = records.to_vec();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }

    /// Highest odometer reading logged so far.
    pub fn latest_odometer(records: &[ServiceRecord]) -> Option<u64> {
        records.iter().map(|record| record.odometer).max()
    }
}
