//! ML inference using Candle.
//!
//! Provides device selection, safetensors loading and the bundled binary
//! classifier network.

mod classifier;
mod device;
mod loader;

pub use classifier::{sigmoid, SieveNet};
pub use device::get_device;
pub use loader::{load_safetensors, LazyModel};
