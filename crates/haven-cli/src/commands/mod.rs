pub mod contact;
pub mod dispatch;
pub mod events;
pub mod feedback;
pub mod place;
pub mod scan;
pub mod score;
pub mod session;
pub mod shared;
