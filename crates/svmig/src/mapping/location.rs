//! 📍 Location mapper.
//!
//! Address only when the legacy one formats (not blank, not "Not Available").
//! GCS position only when both coordinates are there.

use tracing::debug;
use uuid::Uuid;

use crate::formatting::format_address;
use crate::ids::{EntityKind, generate_uuid};
use crate::mapping::MappingContext;
use crate::model::{AuditEvent, LegacyServiceRecord, Location, PositionGcs};

pub fn map(record: &LegacyServiceRecord, organisation_id: Uuid, ctx: &MappingContext<'_>) -> Location {
    let position_gcs = match (record.latitude, record.longitude) {
        (Some(latitude), Some(longitude)) => Some(PositionGcs { latitude, longitude }),
        _ => None,
    };

    let address = format_address(
        record.address.as_deref(),
        record.town.as_deref(),
        record.postcode.as_deref(),
    );
    debug!(
        code = "SM_PROC_016",
        record_id = record.id,
        has_address = address.is_some(),
        "📍 location address resolved"
    );

    Location {
        id: generate_uuid(record.id, EntityKind::Location),
        identifier_old_dos_uid: record.uid.clone(),
        active: true,
        managing_organisation: organisation_id,
        address,
        name: None,
        position_gcs,
        primary_address: true,
        created_by: AuditEvent::migration_user(),
        created_time: ctx.started_at,
        last_updated_by: AuditEvent::migration_user(),
        last_updated: ctx.started_at,
    }
}
