pub mod module;
pub mod platform;
pub mod source;

pub use module::{BuildFileDescriptor, Module, UhtFileCache};
pub use platform::Platform;
pub use source::{FileMetadata, SourceFile};
