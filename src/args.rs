//! Argument mini-languages used by container creation: port bindings, volume bindings,
//! and the nested `-o key=value` create-option tree.

pub mod options;
pub mod ports;
pub mod volumes;

pub use options::OptionTree;
pub use ports::{PortBinding, Protocol};
pub use volumes::VolumeBinding;
