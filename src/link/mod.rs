//! Linking declarative models to the engine and the toolchain.

pub mod application;
pub mod library;
pub mod linker;
pub mod naming;
pub mod projection;

pub use application::{ApplicationPlugin, APPLICATION_TYPE};
pub use library::{LibraryPlugin, LIBRARY_TYPE};
pub use linker::SoftwareTypePlugin;
pub use naming::SourceSetNames;
pub use projection::DependencyProjection;
