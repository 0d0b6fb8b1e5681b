//! 🪪 Deterministic ids: same legacy row in, same target id out. Every run. Every process.
//!
//! The State Store diff only works if re-mapping a record lands on the exact same
//! entity ids, so ids are UUID v5 (SHA-1, name-based) under a pinned namespace.
//! The name is `"<entity-type>-<legacy id>"`. Changing either constant re-keys
//! every entity ever migrated. Don't. 🦆

use uuid::Uuid;

/// 📌 Namespace all migration ids hang off. Contract constant.
pub const MIGRATION_UUID_NS: Uuid = Uuid::from_u128(0xfa3aaa15_9f83_4f4a_8f86_fd1315248bcb);

/// 🏷️ Entity-type discriminator folded into the id name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Organisation,
    Location,
    HealthcareService,
    Endpoint,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Organisation => "organisation",
            EntityKind::Location => "location",
            EntityKind::HealthcareService => "healthcare_service",
            EntityKind::Endpoint => "endpoint",
        }
    }
}

/// 🔑 Derive the target id for `(legacy_id, kind)`.
pub fn generate_uuid(legacy_id: i64, kind: EntityKind) -> Uuid {
    let name = format!("{}-{}", kind.as_str(), legacy_id);
    Uuid::new_v5(&MIGRATION_UUID_NS, name.as_bytes())
}
