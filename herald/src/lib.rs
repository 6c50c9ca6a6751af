pub mod controller;

pub use controller::{Herald, StoreConfig};
