pub mod record;

pub use record::{normalize, NewHeritageRecord, NewImage};
