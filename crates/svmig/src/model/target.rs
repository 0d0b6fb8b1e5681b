//! 🎯 Target documents: Organisation, Location, HealthcareService, Endpoint.
//!
//! Serialised field names are the target schema's, camelCase with a few
//! legacy-flavoured identifiers that must stay byte-exact (`identifier_oldDoS_uid`,
//! `identifier_ODS_ODSCode`). The state-store diff runs on the serialised form,
//! so the audit fields below are the ones it knows to ignore.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditEventType {
    App,
    User,
}

/// 🕵️ Who touched the document. For us, always the migration app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    #[serde(rename = "type")]
    pub kind: AuditEventType,
    pub value: String,
    pub display: String,
}

impl AuditEvent {
    pub fn migration_user() -> Self {
        Self {
            kind: AuditEventType::App,
            value: "INTERNAL001".to_string(),
            display: "Data Migration".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStatus {
    Active,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthcareServiceCategory {
    #[serde(rename = "GP Services")]
    GpServices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthcareServiceType {
    #[serde(rename = "GP Consultation Service")]
    GpConsultationService,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Days,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub id: Uuid,
    #[serde(rename = "identifier_oldDoS_id")]
    pub identifier_old_dos_id: i64,
    pub status: EndpointStatus,
    pub connection_type: Option<String>,
    pub name: Option<String>,
    pub business_scenario: Option<String>,
    pub payload_type: Option<String>,
    pub payload_mime_type: Option<String>,
    pub address: Option<String>,
    pub managed_by_organisation: Uuid,
    pub service: Uuid,
    pub order: i64,
    pub is_compression_enabled: bool,
    pub comment: Option<String>,
    pub created_by: AuditEvent,
    pub created_time: DateTime<Utc>,
    pub last_updated_by: AuditEvent,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organisation {
    pub id: Uuid,
    #[serde(rename = "identifier_oldDoS_uid")]
    pub identifier_old_dos_uid: String,
    #[serde(rename = "identifier_ODS_ODSCode")]
    pub identifier_ods_ods_code: Option<String>,
    pub active: bool,
    pub name: String,
    #[serde(default)]
    pub telecom: Vec<String>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    pub created_by: AuditEvent,
    pub created_time: DateTime<Utc>,
    pub last_updated_by: AuditEvent,
    pub last_updated: DateTime<Utc>,
}

/// 🏠 Structured postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub county: Option<String>,
    pub town: Option<String>,
    pub postcode: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionGcs {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    #[serde(rename = "identifier_oldDoS_uid")]
    pub identifier_old_dos_uid: String,
    pub active: bool,
    pub managing_organisation: Uuid,
    pub address: Option<Address>,
    pub name: Option<String>,
    #[serde(rename = "positionGCS")]
    pub position_gcs: Option<PositionGcs>,
    pub primary_address: bool,
    pub created_by: AuditEvent,
    pub created_time: DateTime<Utc>,
    pub last_updated_by: AuditEvent,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Telecom {
    pub phone_public: Option<String>,
    pub phone_private: Option<String>,
    pub email: Option<String>,
    pub web: Option<String>,
}

/// 🕘 One availability slot, tagged by `category` in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OpeningTime {
    AvailableTime {
        day_of_week: String,
        start_time: NaiveTime,
        end_time: NaiveTime,
        all_day: bool,
    },
    AvailableTimePublicHolidays {
        start_time: NaiveTime,
        end_time: NaiveTime,
    },
    AvailableTimeVariation {
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    },
    NotAvailable {
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomGroupSymptomDiscriminatorPair {
    pub sg: i64,
    pub sd: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeRange {
    pub range_from: f64,
    pub range_to: f64,
    #[serde(rename = "type")]
    pub unit: TimeUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthcareService {
    pub id: Uuid,
    #[serde(rename = "identifier_oldDoS_uid")]
    pub identifier_old_dos_uid: String,
    pub active: bool,
    pub category: Option<HealthcareServiceCategory>,
    #[serde(rename = "type")]
    pub service_type: Option<HealthcareServiceType>,
    pub provided_by: Uuid,
    pub location: Uuid,
    pub name: String,
    pub telecom: Telecom,
    #[serde(default)]
    pub opening_time: Vec<OpeningTime>,
    #[serde(default)]
    pub symptom_group_symptom_discriminators: Vec<SymptomGroupSymptomDiscriminatorPair>,
    #[serde(default)]
    pub dispositions: Vec<String>,
    pub age_eligibility_criteria: Option<Vec<AgeRange>>,
    pub created_by: AuditEvent,
    pub created_time: DateTime<Utc>,
    pub last_updated_by: AuditEvent,
    pub last_updated: DateTime<Utc>,
}
