//! apishape control — host lifecycle, metadata seam, and the builder shell.

pub mod control;
pub mod provider;
pub mod sample;

pub use control::{ControlError, ControlState, HostNotifier, SchemaBuilderControl};
pub use provider::MetadataProvider;
pub use sample::SampleMetadataProvider;
