//! Graphics backend implementations

pub mod headless;

pub use headless::{BackendCommand, HeadlessBackend, HeadlessWindow};
