pub mod file;

pub use file::{probe, AudioInfo};
