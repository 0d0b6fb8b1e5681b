//! 🩺 HealthcareService mapper: the one with opinions about time.
//!
//! 🧠 Knowledge graph:
//! - **Scheduled** opening times: one slot per legacy time range. Day name comes from the
//!   opening-day lookup, shortened to three lowercase letters (`Monday` → `mon`).
//!   `BankHoliday` becomes a public-holiday slot with no weekday.
//! - **Specified** dates: each time range becomes a variation, or `notAvailable` when closed.
//! - **SG/SD pairs**: kept only when the symptom group is known.
//! - **Dispositions**: Dx codes via lookup; unknown ids drop out.
//! - **Age eligibility**: sorted by start, merged when consecutive (gap ≤ 1 day) or
//!   overlapping. No ranges at all → `None`, not an empty list.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::ids::{EntityKind, generate_uuid};
use crate::mapping::MappingContext;
use crate::model::{
    AgeRange, AuditEvent, HealthcareService, HealthcareServiceCategory, HealthcareServiceType,
    LegacyAgeRange, LegacyServiceRecord, OpeningTime, SymptomGroupSymptomDiscriminatorPair,
    Telecom, TimeUnit,
};

pub const BANK_HOLIDAY: &str = "BankHoliday";
pub const AGE_RANGE_TOLERANCE_DAYS: f64 = 1.0;

pub fn map(
    record: &LegacyServiceRecord,
    organisation_id: Uuid,
    location_id: Uuid,
    category: Option<HealthcareServiceCategory>,
    service_type: Option<HealthcareServiceType>,
    ctx: &MappingContext<'_>,
) -> HealthcareService {
    HealthcareService {
        id: generate_uuid(record.id, EntityKind::HealthcareService),
        identifier_old_dos_uid: record.uid.clone(),
        active: true,
        category,
        service_type,
        provided_by: organisation_id,
        location: location_id,
        name: record.name.clone(),
        telecom: Telecom {
            phone_public: record.publicphone.clone(),
            phone_private: record.nonpublicphone.clone(),
            email: record.email.clone(),
            web: record.web.clone(),
        },
        opening_time: opening_times(record, ctx),
        symptom_group_symptom_discriminators: sgsds(record, ctx),
        dispositions: dispositions(record, ctx),
        age_eligibility_criteria: age_eligibility_criteria(record.id, &record.age_range),
        created_by: AuditEvent::migration_user(),
        created_time: ctx.started_at,
        last_updated_by: AuditEvent::migration_user(),
        last_updated: ctx.started_at,
    }
}

fn opening_times(record: &LegacyServiceRecord, ctx: &MappingContext<'_>) -> Vec<OpeningTime> {
    let mut slots = Vec::new();

    for day_opening in &record.scheduled_opening_times {
        let Some(day) = ctx.lookups.opening_days.get(&day_opening.dayid) else {
            warn!(
                code = "SM_PROC_019",
                record_id = record.id,
                day_id = day_opening.dayid,
                "📅 opening day missing from lookups, slots skipped"
            );
            continue;
        };
        for range in &day_opening.times {
            if day.name == BANK_HOLIDAY {
                slots.push(OpeningTime::AvailableTimePublicHolidays {
                    start_time: range.starttime,
                    end_time: range.endtime,
                });
            } else {
                slots.push(OpeningTime::AvailableTime {
                    day_of_week: day.name.to_lowercase().chars().take(3).collect(),
                    start_time: range.starttime,
                    end_time: range.endtime,
                    all_day: false,
                });
            }
        }
    }

    for specified in &record.specified_opening_times {
        for range in &specified.times {
            let start_time = specified.date.and_time(range.starttime);
            let end_time = specified.date.and_time(range.endtime);
            slots.push(if range.isclosed {
                OpeningTime::NotAvailable { start_time, end_time }
            } else {
                OpeningTime::AvailableTimeVariation { start_time, end_time }
            });
        }
    }

    slots
}

fn sgsds(
    record: &LegacyServiceRecord,
    ctx: &MappingContext<'_>,
) -> Vec<SymptomGroupSymptomDiscriminatorPair> {
    record
        .sgsds
        .iter()
        .filter(|code| {
            let known = ctx.lookups.symptom_groups.contains_key(&code.sgid);
            if !known {
                warn!(
                    code = "SM_PROC_020",
                    record_id = record.id,
                    symptom_group_id = code.sgid,
                    "🔍 symptom group not found in reference data, pair dropped"
                );
            }
            known
        })
        .map(|code| SymptomGroupSymptomDiscriminatorPair {
            sg: code.sgid,
            sd: code.sdid,
        })
        .collect()
}

fn dispositions(record: &LegacyServiceRecord, ctx: &MappingContext<'_>) -> Vec<String> {
    record
        .dispositions
        .iter()
        .filter_map(|code| ctx.lookups.dispositions.get(&code.dispositionid))
        .map(|disposition| disposition.dxcode.clone())
        .collect()
}

/// 👶👵 Merge legacy age bands into as few ranges as the data allows.
pub fn age_eligibility_criteria(record_id: i64, ranges: &[LegacyAgeRange]) -> Option<Vec<AgeRange>> {
    if ranges.is_empty() {
        debug!(code = "SM_PROC_017", record_id, "👶 no age ranges on record");
        return None;
    }

    let mut sorted = ranges.to_vec();
    sorted.sort_by(|a, b| a.daysfrom.total_cmp(&b.daysfrom));

    let mut merged: Vec<AgeRange> = Vec::new();
    for range in sorted {
        match merged.last_mut() {
            Some(current) if (range.daysfrom - current.range_to).abs() <= AGE_RANGE_TOLERANCE_DAYS => {
                current.range_to = range.daysto;
            }
            Some(current) if range.daysfrom <= current.range_to => {
                current.range_to = current.range_to.max(range.daysto);
            }
            _ => merged.push(AgeRange {
                range_from: range.daysfrom,
                range_to: range.daysto,
                unit: TimeUnit::Days,
            }),
        }
    }
    Some(merged)
}
