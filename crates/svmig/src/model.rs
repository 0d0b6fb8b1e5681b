//! 📦 The data model: the nouns of the migration.
//!
//! 🧠 Knowledge graph:
//! - [`legacy`]: read-only snapshots of the source rows. Owned by the source, never mutated here
//!   (the validator sanitises a *clone*).
//! - [`target`]: the normalised documents we produce. Serde field names match the target
//!   document schema exactly (`identifier_ODS_ODSCode` and friends).
//! - [`state`]: the pipeline's own bookkeeping; one versioned [`MigrationState`] per source record.
//! - [`event`]: change events and queue batch envelopes, in and out.
//!
//! 🦆 The duck is modelled as `Option<Duck>`. It's usually `None`.

pub mod event;
pub mod legacy;
pub mod state;
pub mod target;

pub use event::{BatchItemFailure, BatchReport, ChangeEvent, ChangeMethod, QueueBatch, QueueMessage};
pub use legacy::{
    Disposition, LegacyAgeRange, LegacyDataset, LegacyDayOpening, LegacyDisposition,
    LegacyEndpoint, LegacyServiceRecord, LegacySgsd, LegacySpecifiedOpeningDate, LegacyTimeRange, OpeningDay,
    ServiceType, SymptomGroup,
};
pub use state::{MigrationState, TransformResult};
pub use target::{
    Address, AgeRange, AuditEvent, Endpoint, EndpointStatus, HealthcareService,
    HealthcareServiceCategory, HealthcareServiceType, Location, OpeningTime, Organisation,
    PositionGcs, SymptomGroupSymptomDiscriminatorPair, Telecom, TimeUnit,
};
