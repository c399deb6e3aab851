//! Local filesystem primitives for raptor model files
//!
//! [`LocalFiles`] implements the rollback subsystem's `FilePrimitives` on top
//! of `tokio::fs`; whole-file writes go through [`SafeWriter`].

pub mod error;
pub mod local;
pub mod writer;

pub use error::FileError;
pub use local::LocalFiles;
pub use writer::SafeWriter;
