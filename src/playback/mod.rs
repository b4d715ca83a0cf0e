pub mod driver;
pub mod timed;

pub use driver::{PlaybackDriver, PlaybackEvent, PlaybackHandle, PlaybackSource};
pub use timed::TimedPlaybackDriver;
