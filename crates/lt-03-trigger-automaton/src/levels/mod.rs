//! # Shipped Levels
//!
//! | tab | script        | solved by                          |
//! |-----|---------------|------------------------------------|
//! | 1   | `DarkRoom`    | illumination from tab 3, then exit |
//! | 2   | `Flashlight`  | picking up the flashlight          |
//! | 3   | `Symbols`     | three symbols                      |
//! | 4   | `Terminal`    | four code fragments + sequence     |
//! | 5   | `Mind`        | three mind fragments + sequence    |

mod common;
mod dark_room;
mod flashlight;
mod mind;
mod symbols;
mod terminal;

pub use common::{finale, narration};
pub use dark_room::DarkRoom;
pub use flashlight::Flashlight;
pub use mind::Mind;
pub use symbols::Symbols;
pub use terminal::Terminal;

use crate::ports::LevelScript;
use shared_types::TabId;

/// Tile at the far edge of the dark room.
pub const DARK_ROOM_EDGE_TILE: u32 = 12;
/// Symbols needed to solve tab 3.
pub const SYMBOLS_REQUIRED: usize = 3;
/// Code fragments needed before tab 4's sequence is accepted.
pub const CODE_FRAGMENTS_REQUIRED: usize = 4;
/// Mind fragments that complete act two.
pub const MIND_FRAGMENTS_REQUIRED: usize = 3;

/// Script for `tab`, if the game ships one.
#[must_use]
pub fn script_for(tab: TabId) -> Option<Box<dyn LevelScript>> {
    match tab.get() {
        1 => Some(Box::new(DarkRoom)),
        2 => Some(Box::new(Flashlight)),
        3 => Some(Box::new(Symbols)),
        4 => Some(Box::new(Terminal)),
        5 => Some(Box::new(Mind)),
        _ => None,
    }
}
