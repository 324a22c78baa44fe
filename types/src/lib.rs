//! Fundamental types for the KYC verification flow.
//!
//! This crate defines the records the remote verification service returns and
//! the state enums the orchestrator dispatches on: customers, identity
//! verifications and the persona sub-state reported by the third-party widget.

pub mod customer;
pub mod guid;
pub mod identity;
pub mod locale;
pub mod state;

pub use customer::CustomerRecord;
pub use guid::Guid;
pub use identity::{IdentityVerificationPage, IdentityVerificationRecord};
pub use locale::persona_language_alias;
pub use state::{CustomerState, IdentityState, PersonaState};
