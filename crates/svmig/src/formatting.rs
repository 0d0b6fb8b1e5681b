//! 🖋️ Formatting helpers shared by the validators and the mappers.

pub mod address;

pub use address::format_address;
