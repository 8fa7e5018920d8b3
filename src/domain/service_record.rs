use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{Displayable, Identifiable};
use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceType {
    Servicing,
    Repairing,
    Tire,
}

/// Kind of work done when a tire service is logged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TireServiceType {
    #[serde(rename = "Tire New")]
    New,
    #[serde(rename = "Tire Resole")]
    Resole,
    #[serde(rename = "Tire Rotation")]
    Rotation,
}

impl TireServiceType {
    pub fn label(&self) -> &'static str {
        match self {
            TireServiceType::New => "Tire New",
            TireServiceType::Resole => "Tire Resole",
            TireServiceType::Rotation => "Tire Rotation",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TireSelection {
    pub fl: bool,
    pub fr: bool,
    pub rl: bool,
    pub rr: bool,
    pub spare: bool,
}

impl TireSelection {
    pub fn any_selected(&self) -> bool {
        self.fl || self.fr || self.rl || self.rr || self.spare
    }

    /// Abbreviations of the selected positions in fixed display order.
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.fl, "FL"),
            (self.fr, "FR"),
            (self.rl, "RL"),
            (self.rr, "RR"),
            (self.spare, "Spare"),
        ]
        .into_iter()
        .filter_map(|(selected, label)| selected.then_some(label))
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub odometer: u64,
    pub description: String,
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub service_types: BTreeSet<ServiceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tire_company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tires: Option<TireSelection>,
}

impl ServiceRecord {
    pub fn is_tire_service(&self) -> bool {
        self.service_types.contains(&ServiceType::Tire)
    }

    /// Description with tire positions and the tire company appended when present.
    pub fn display_description(&self) -> String {
        let mut text = self.description.clone();
        if self.is_tire_service() {
            let labels = self.tires.map(|tires| tires.labels()).unwrap_or_default();
            if !labels.is_empty() {
                text = format!("{} ({})", text, labels.join(", "));
            }
        }
        match &self.tire_company {
            Some(company) => format!("{} - {}", text, company),
            None => text,
        }
    }
}

impl Identifiable for ServiceRecord {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for ServiceRecord {
    fn display_label(&self) -> String {
        format!("{} @ {} km", self.display_description(), self.odometer)
    }
}

/// Raw input collected by the service log form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceRecordDraft {
    pub date: NaiveDate,
    pub odometer: i64,
    pub description: String,
    pub cost: f64,
    pub notes: String,
    pub service_types: BTreeSet<ServiceType>,
    pub tire_detail: Option<TireServiceType>,
    pub tire_company: String,
    pub tires: TireSelection,
}

impl ServiceRecordDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let is_tire = self.service_types.contains(&ServiceType::Tire);
        if self.service_types.is_empty() {
            return Err(ValidationError::NoServiceType);
        }
        if is_tire && self.tire_detail.is_none() {
            return Err(ValidationError::MissingTireDetail);
        }
        if is_tire && !self.tires.any_selected() {
            return Err(ValidationError::NoTireSelected);
        }
        if !is_tire && self.description.trim().is_empty() {
            return Err(ValidationError::MissingServiceDescription);
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(ValidationError::InvalidCost(self.cost));
        }
        if self.odometer < 0 {
            return Err(ValidationError::InvalidOdometer(self.odometer));
        }
        Ok(())
    }

    /// Validates the draft and builds a record dated at local midnight of the chosen day.
    pub fn into_record(self, offset: FixedOffset) -> Result<ServiceRecord, ValidationError> {
        self.validate()?;
        let midnight = self.date.and_hms_opt(0, 0, 0).unwrap_or_default();
        let date = offset
            .from_local_datetime(&midnight)
            .single()
            .map(|instant| instant.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight));
        let odometer = u64::try_from(self.odometer)
            .map_err(|_| ValidationError::InvalidOdometer(self.odometer))?;
        let notes = Some(self.notes.trim().to_string()).filter(|notes| !notes.is_empty());

        let (description, tires, tire_company) = match self.tire_detail {
            Some(detail) if self.service_types.contains(&ServiceType::Tire) => {
                let company = self.tire_company.trim();
                (
                    detail.label().to_string(),
                    Some(self.tires),
                    (!company.is_empty()).then(|| company.to_string()),
                )
            }
            _ => (self.description, None, None),
        };

        Ok(ServiceRecord {
            id: Uuid::new_v4(),
            date,
            odometer,
            description,
            cost: self.cost,
            notes,
            service_types: self.service_types,
            tire_company,
            tires,
        })
    }
}
