//! 🏚️ Legacy rows, as the source system hands them over.
//!
//! Field names are the source column names on purpose (`typeid`, `statusid`,
//! `publicphone`...). Renaming them would make every support conversation with the
//! source team a translation exercise.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// 🏥 One service row plus the related rows the migration needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyServiceRecord {
    pub id: i64,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub odscode: Option<String>,
    pub typeid: i64,
    #[serde(default)]
    pub statusid: Option<i64>,
    #[serde(default)]
    pub publicname: Option<String>,
    /// `$`-separated address segments. Yes, dollar signs.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub publicphone: Option<String>,
    #[serde(default)]
    pub nonpublicphone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub web: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<LegacyEndpoint>,
    #[serde(default)]
    pub scheduled_opening_times: Vec<LegacyDayOpening>,
    #[serde(default)]
    pub specified_opening_times: Vec<LegacySpecifiedOpeningDate>,
    #[serde(default)]
    pub sgsds: Vec<LegacySgsd>,
    #[serde(default)]
    pub dispositions: Vec<LegacyDisposition>,
    #[serde(default)]
    pub age_range: Vec<LegacyAgeRange>,
}

/// 🔌 A `serviceendpoints` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyEndpoint {
    pub id: i64,
    #[serde(default)]
    pub endpointorder: i64,
    #[serde(default)]
    pub transport: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub interaction: Option<String>,
    #[serde(default)]
    pub businessscenario: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub iscompressionenabled: Option<String>,
    #[serde(default)]
    pub serviceid: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyTimeRange {
    pub starttime: NaiveTime,
    pub endtime: NaiveTime,
    #[serde(default)]
    pub isclosed: bool,
}

/// 📅 Weekly schedule for one day id (day names live in the reference table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyDayOpening {
    pub dayid: i64,
    #[serde(default)]
    pub times: Vec<LegacyTimeRange>,
}

/// 🎄 One-off date with its own hours (or closure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacySpecifiedOpeningDate {
    pub date: NaiveDate,
    #[serde(default)]
    pub times: Vec<LegacyTimeRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacySgsd {
    pub sgid: i64,
    pub sdid: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyDisposition {
    pub dispositionid: i64,
}

/// 👶👵 Age band in days. Fractional because leap years exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyAgeRange {
    pub daysfrom: f64,
    pub daysto: f64,
}

// ===== Reference tables (served through the Cache) =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceType {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disposition {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub dxcode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningDay {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomGroup {
    pub id: i64,
    pub name: String,
}

/// 🗃️ A JSON snapshot of the source tables. What the file source loads and
/// what the in-memory source serves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyDataset {
    #[serde(default)]
    pub services: Vec<LegacyServiceRecord>,
    #[serde(default)]
    pub service_types: Vec<ServiceType>,
    #[serde(default)]
    pub dispositions: Vec<Disposition>,
    #[serde(default)]
    pub opening_days: Vec<OpeningDay>,
    #[serde(default)]
    pub symptom_groups: Vec<SymptomGroup>,
}
