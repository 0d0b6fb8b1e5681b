//! 🏢 Organisation mapper: ODS code, name, status, type name, and its endpoints.

use crate::ids::{EntityKind, generate_uuid};
use crate::mapping::{MappingContext, endpoint};
use crate::model::{AuditEvent, LegacyServiceRecord, Organisation};

pub const STATUS_ACTIVE: i64 = 1;

pub fn map(record: &LegacyServiceRecord, ctx: &MappingContext<'_>) -> Organisation {
    let organisation_id = generate_uuid(record.id, EntityKind::Organisation);
    let service_id = generate_uuid(record.id, EntityKind::HealthcareService);
    Organisation {
        id: organisation_id,
        identifier_old_dos_uid: record.uid.clone(),
        identifier_ods_ods_code: record.odscode.clone(),
        active: record.statusid == Some(STATUS_ACTIVE),
        name: record.name.clone(),
        telecom: vec![],
        type_name: ctx.lookups.service_type.as_ref().map(|t| t.name.clone()),
        endpoints: record
            .endpoints
            .iter()
            .map(|e| endpoint::map(e, organisation_id, service_id, ctx))
            .collect(),
        created_by: AuditEvent::migration_user(),
        created_time: ctx.started_at,
        last_updated_by: AuditEvent::migration_user(),
        last_updated: ctx.started_at,
    }
}
