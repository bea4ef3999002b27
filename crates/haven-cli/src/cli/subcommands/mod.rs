pub mod contact;
pub mod feedback;
pub mod location;
pub mod place;
pub mod session;

pub use contact::ContactCommands;
pub use feedback::FeedbackCommands;
pub use location::LocationArgs;
pub use place::{PlaceCategoryArg, PlaceCommands};
pub use session::{SessionCommands, SessionKindArg, SessionStartArgs};
