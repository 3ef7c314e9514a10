//! Rendering module
//!
//! The engine hands out `Frame` snapshots; a `RenderSurface` turns them into
//! pixels, characters, or anything else.

pub mod frame;
pub mod text;

pub use frame::{FlashBand, Frame, Hud, Overlay, RenderSurface, TileSprite};
pub use text::TextSurface;
