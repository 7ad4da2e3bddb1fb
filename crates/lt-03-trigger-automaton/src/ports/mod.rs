pub mod script;

pub use script::LevelScript;
