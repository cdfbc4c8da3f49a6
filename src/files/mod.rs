pub mod builder;
pub mod handle;
pub mod model;

pub use builder::FileBuilder;
pub use handle::{Error, FileHandle};
pub use model::{File, FileError, FileState};
