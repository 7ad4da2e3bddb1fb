pub mod diff;
pub mod table;

pub use diff::changed_paths;
pub use table::{Owner, OwnershipTable};
