//! Domain types for barwise

pub mod action;
pub mod bar;
pub mod trade;

pub use action::{Action, ActionParseError};
pub use bar::Bar;
pub use trade::{PositionSide, Trade};
