pub mod recording;
pub mod registry;
pub mod traits;
