pub mod clip;
pub mod decode;
pub mod device;

pub use clip::{ClipEvent, ClipHandle, play_clip};
