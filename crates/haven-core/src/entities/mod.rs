//! Entity structs for all Haven domain objects.
//!
//! Each entity maps to a table in the libSQL store. All structs derive
//! `Serialize`, `Deserialize`, and `JsonSchema` for JSON roundtrip and schema
//! validation.

mod contact;
mod event;
mod feedback;
mod place;
mod session;

pub use contact::{TrustedContact, normalize_phone};
pub use event::SessionEvent;
pub use feedback::FeedbackRecord;
pub use place::{Place, PlaceScore};
pub use session::{NewSession, Recipient, SessionPayload, TimedSession};
