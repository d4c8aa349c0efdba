pub mod build_tool;
pub mod config;
pub mod editor;
pub mod error;
pub mod indexing;
pub mod logging;
pub mod model;
pub mod project;

pub use build_tool::BuildToolRunner;
pub use config::ProjectConfig;
pub use editor::{Editor, EngineVersion};
pub use error::{IndexError, Result};
pub use indexing::{IndexOptions, build_index, build_index_with_cancel};
pub use model::{BuildFileDescriptor, Module, Platform, SourceFile};
pub use project::{Project, ProjectIndex};
