//! 🔌 Endpoint mapper.
//!
//! `telno` endpoints are phone lines, not message channels: no payload type,
//! no mime type. Everything else gets its legacy format translated to a mime type,
//! or passed through untouched if we've never heard of it.
//!
//! Every endpoint points back at the organisation that manages it and the
//! healthcare service it delivers for. Both ids are derived from the legacy
//! record id, so the mapper never has to wait for the other entities.

use uuid::Uuid;

use crate::ids::{EntityKind, generate_uuid};
use crate::mapping::MappingContext;
use crate::model::{AuditEvent, Endpoint, EndpointStatus, LegacyEndpoint};

pub const TELNO_TRANSPORT: &str = "telno";

/// 🏷️ Legacy payload format → mime type.
pub fn payload_mime_type(format: &str) -> &str {
    match format {
        "PDF" => "application/pdf",
        "HTML" => "text/html",
        "FHIR" => "application/fhir",
        "XML" => "xml",
        "EMAIL" => "message/rfc822",
        "TELNO" => "text/vcard",
        "CDA" => "application/hl7-cda+xml",
        unknown => unknown,
    }
}

pub fn map(
    endpoint: &LegacyEndpoint,
    organisation_id: Uuid,
    service_id: Uuid,
    ctx: &MappingContext<'_>,
) -> Endpoint {
    let is_telno = endpoint.transport.as_deref() == Some(TELNO_TRANSPORT);
    let (payload_type, payload_mime_type) = if is_telno {
        (None, None)
    } else {
        (
            endpoint.interaction.clone(),
            endpoint.format.as_deref().map(|f| payload_mime_type(f).to_string()),
        )
    };

    Endpoint {
        id: generate_uuid(endpoint.id, EntityKind::Endpoint),
        identifier_old_dos_id: endpoint.id,
        status: EndpointStatus::Active,
        connection_type: endpoint.transport.clone(),
        name: None,
        business_scenario: endpoint.businessscenario.clone(),
        payload_type,
        payload_mime_type,
        address: endpoint.address.clone(),
        managed_by_organisation: organisation_id,
        service: service_id,
        order: endpoint.endpointorder,
        is_compression_enabled: endpoint.iscompressionenabled.as_deref() == Some("compressed"),
        comment: endpoint.comment.clone(),
        created_by: AuditEvent::migration_user(),
        created_time: ctx.started_at,
        last_updated_by: AuditEvent::migration_user(),
        last_updated: ctx.started_at,
    }
}
