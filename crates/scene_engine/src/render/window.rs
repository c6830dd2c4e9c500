//! Window surface abstraction
//!
//! The window, its GL/Vulkan context and the platform event pump live outside
//! the engine core. The core only needs the current resolution, a present call
//! and the per-frame event list.

/// Discrete window events consumed by the run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// The user asked to close the window
    CloseRequested,

    /// The drawable area changed size
    Resized {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },
}

/// Windowing collaborator
pub trait WindowSurface {
    /// Current drawable resolution `(width, height)` in pixels
    fn resolution(&self) -> (u32, u32);

    /// Drain events received since the last call
    fn poll_events(&mut self) -> Vec<WindowEvent>;

    /// Present the finished frame
    fn present(&mut self);
}
