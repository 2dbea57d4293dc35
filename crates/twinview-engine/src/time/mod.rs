//! Time subsystem.
//!
//! Presentation-rate telemetry decoupled from the renderer so it can be
//! driven with synthetic timestamps in tests. Intended usage:
//! - one `FrameCounter` per renderer, reset on `init`
//! - call `record_frame()` once per presented frame

mod frame_counter;

pub use frame_counter::FrameCounter;
