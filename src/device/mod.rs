pub mod catalog;
pub mod class;

pub use catalog::{AudioDevice, DeviceCatalog};
pub use class::{classify, DeviceClass};
