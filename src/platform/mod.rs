//! Platform layer
//!
//! Everything between the engine and the host:
//! - Fixed-cadence game loop thread
//! - Touch routing
//! - Wall-clock time

pub mod game_loop;
pub mod input;
pub mod time;

pub use game_loop::GameLoop;
pub use input::{TouchOutcome, dispatch_touch};
pub use time::{Clock, ManualClock, SystemClock};
