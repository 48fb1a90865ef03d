pub mod bundle;
pub mod demo;

pub use bundle::{load_config, PickConfig};
