pub mod change;
pub mod limit;
pub mod location;
pub mod parse;
