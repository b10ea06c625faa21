//! Frame timing.
//!
//! One `FrameClock` per main loop. The engine resets it at the end of
//! initialization so the first frame's delta is measured from that point, then
//! calls `tick()` once per loop iteration.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
