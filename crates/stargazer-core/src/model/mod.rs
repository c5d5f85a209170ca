pub mod entry;
pub mod rover;

pub use entry::{Entry, StoredEntry, DATE_FORMAT};
pub use rover::RoverPhoto;
