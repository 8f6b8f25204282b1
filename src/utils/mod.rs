pub mod directory;
pub mod progress;
pub mod timestamp;
