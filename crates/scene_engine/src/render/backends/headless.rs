//! In-process graphics backend and window
//!
//! [`HeadlessBackend`] hands out handles and keeps the uploaded data, which is
//! enough to run the engine without a GPU. A backend built with
//! [`HeadlessBackend::recording`] also logs every call as a
//! [`BackendCommand`] for inspection in tests. Shader compilation is simulated: a
//! stage fails when its source is blank or contains an `#error` line, and the
//! text after `#error` becomes the diagnostic.

use std::collections::HashMap;

use crate::core::config::WindowConfig;
use crate::foundation::math::Mat4;
use crate::render::backend::{
    BackendError, BackendResult, BufferHandle, BufferKind, DrawConfigHandle, GraphicsBackend, ProgramHandle,
    ShaderStage, TextureDescriptor, TextureHandle, VertexAttribute,
};
use crate::render::camera::PixelViewport;
use crate::render::window::{WindowEvent, WindowSurface};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    /// Program compiled and linked
    CreateProgram(ProgramHandle),
    /// Program released
    DeleteProgram(ProgramHandle),
    /// Buffer uploaded
    CreateBuffer {
        /// New handle
        handle: BufferHandle,
        /// Buffer usage
        kind: BufferKind,
        /// Size in bytes
        size: usize,
    },
    /// Buffer released
    DeleteBuffer(BufferHandle),
    /// Draw configuration created
    CreateDrawConfig {
        /// New handle
        handle: DrawConfigHandle,
        /// Vertex buffer the layout refers to
        vertex_buffer: BufferHandle,
        /// Index buffer bound with the layout
        index_buffer: BufferHandle,
        /// Attribute slots
        attributes: Vec<VertexAttribute>,
    },
    /// Draw configuration released
    DeleteDrawConfig(DrawConfigHandle),
    /// Texture uploaded
    CreateTexture(TextureHandle),
    /// Texture released
    DeleteTexture(TextureHandle),
    /// Viewport set
    SetViewport(PixelViewport),
    /// Program made current
    UseProgram(ProgramHandle),
    /// Draw configuration bound
    BindDrawConfig(DrawConfigHandle),
    /// Vertex buffer bound
    BindVertexBuffer(BufferHandle),
    /// Texture bound to a unit
    BindTexture {
        /// Texture unit
        unit: u32,
        /// Texture bound
        texture: TextureHandle,
    },
    /// Matrix uniform uploaded
    SetUniformMatrix {
        /// Uniform location
        location: u32,
        /// Uploaded value
        matrix: Mat4,
    },
    /// Indexed draw issued
    DrawIndexed(u32),
}

/// Recording graphics backend with no GPU behind it
#[derive(Debug)]
pub struct HeadlessBackend {
    next_handle: u32,
    programs: HashMap<ProgramHandle, (String, String)>,
    buffers: HashMap<BufferHandle, (BufferKind, Vec<u8>)>,
    draw_configs: HashMap<DrawConfigHandle, Vec<VertexAttribute>>,
    textures: HashMap<TextureHandle, TextureDescriptor>,
    recording: bool,
    commands: Vec<BackendCommand>,
    draw_calls: usize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// Create a backend with no live objects that keeps no command log
    pub fn new() -> Self {
        Self {
            // 0 is never handed out
            next_handle: 1,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            draw_configs: HashMap::new(),
            textures: HashMap::new(),
            recording: false,
            commands: Vec::new(),
            draw_calls: 0,
        }
    }

    /// Create a backend that logs every call; see [`commands`](Self::commands)
    pub fn recording() -> Self {
        Self {
            recording: true,
            ..Self::new()
        }
    }

    /// Whether calls are being logged
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    fn record(&mut self, command: BackendCommand) {
        if self.recording {
            self.commands.push(command);
        }
    }

    fn allocate(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    /// Every call recorded since creation or the last [`clear_commands`](Self::clear_commands)
    ///
    /// Always empty unless the backend was built with [`recording`](Self::recording).
    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    /// Forget recorded calls and reset the draw counter; live objects are kept
    pub fn clear_commands(&mut self) {
        self.commands.clear();
        self.draw_calls = 0;
    }

    /// Draw calls issued since creation or the last [`clear_commands`](Self::clear_commands)
    pub fn draw_call_count(&self) -> usize {
        self.draw_calls
    }

    /// Programs not yet deleted
    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    /// Buffers not yet deleted
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Draw configurations not yet deleted
    pub fn live_draw_config_count(&self) -> usize {
        self.draw_configs.len()
    }

    /// Textures not yet deleted
    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Vertex and fragment source a live program was built from
    pub fn program_sources(&self, program: ProgramHandle) -> Option<(&str, &str)> {
        self.programs
            .get(&program)
            .map(|(vertex, fragment)| (vertex.as_str(), fragment.as_str()))
    }

    /// Bytes of a live buffer
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|(_, data)| data.as_slice())
    }

    /// Attribute layout of a live draw configuration
    pub fn draw_config_attributes(&self, config: DrawConfigHandle) -> Option<&[VertexAttribute]> {
        self.draw_configs.get(&config).map(Vec::as_slice)
    }
}

fn compile(stage: ShaderStage, source: &str) -> BackendResult<()> {
    if source.trim().is_empty() {
        return Err(BackendError::Compile {
            stage,
            log: "empty shader source".to_owned(),
        });
    }

    if let Some(message) = source
        .lines()
        .find_map(|line| line.trim_start().strip_prefix("#error"))
    {
        return Err(BackendError::Compile {
            stage,
            log: message.trim().to_owned(),
        });
    }

    Ok(())
}

impl GraphicsBackend for HeadlessBackend {
    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> BackendResult<ProgramHandle> {
        compile(ShaderStage::Vertex, vertex_source)?;
        compile(ShaderStage::Fragment, fragment_source)?;

        let handle = ProgramHandle(self.allocate());
        self.programs
            .insert(handle, (vertex_source.to_owned(), fragment_source.to_owned()));
        self.record(BackendCommand::CreateProgram(handle));
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program).is_none() {
            log::warn!("Deleting unknown program {program:?}");
        }
        self.record(BackendCommand::DeleteProgram(program));
    }

    fn create_buffer(&mut self, kind: BufferKind, data: &[u8]) -> BufferHandle {
        let handle = BufferHandle(self.allocate());
        self.buffers.insert(handle, (kind, data.to_vec()));
        self.record(BackendCommand::CreateBuffer {
            handle,
            kind,
            size: data.len(),
        });
        handle
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_none() {
            log::warn!("Deleting unknown buffer {buffer:?}");
        }
        self.record(BackendCommand::DeleteBuffer(buffer));
    }

    fn create_draw_config(
        &mut self,
        vertex_buffer: BufferHandle,
        index_buffer: BufferHandle,
        attributes: &[VertexAttribute],
    ) -> DrawConfigHandle {
        let handle = DrawConfigHandle(self.allocate());
        self.draw_configs.insert(handle, attributes.to_vec());
        self.record(BackendCommand::CreateDrawConfig {
            handle,
            vertex_buffer,
            index_buffer,
            attributes: attributes.to_vec(),
        });
        handle
    }

    fn delete_draw_config(&mut self, config: DrawConfigHandle) {
        if self.draw_configs.remove(&config).is_none() {
            log::warn!("Deleting unknown draw config {config:?}");
        }
        self.record(BackendCommand::DeleteDrawConfig(config));
    }

    fn create_texture(&mut self, descriptor: &TextureDescriptor, _data: &[u8]) -> TextureHandle {
        let handle = TextureHandle(self.allocate());
        self.textures.insert(handle, *descriptor);
        self.record(BackendCommand::CreateTexture(handle));
        handle
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_none() {
            log::warn!("Deleting unknown texture {texture:?}");
        }
        self.record(BackendCommand::DeleteTexture(texture));
    }

    fn set_viewport(&mut self, viewport: PixelViewport) {
        self.record(BackendCommand::SetViewport(viewport));
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.record(BackendCommand::UseProgram(program));
    }

    fn bind_draw_config(&mut self, config: DrawConfigHandle) {
        self.record(BackendCommand::BindDrawConfig(config));
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle) {
        self.record(BackendCommand::BindVertexBuffer(buffer));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.record(BackendCommand::BindTexture { unit, texture });
    }

    fn set_uniform_matrix(&mut self, location: u32, matrix: &Mat4) {
        self.record(BackendCommand::SetUniformMatrix {
            location,
            matrix: *matrix,
        });
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.draw_calls += 1;
        self.record(BackendCommand::DrawIndexed(index_count));
    }
}

/// Window surface with a fixed resolution and scripted events
#[derive(Debug)]
pub struct HeadlessWindow {
    resolution: (u32, u32),
    presented: u64,
    close_after: Option<u64>,
    pending: Vec<WindowEvent>,
}

impl HeadlessWindow {
    /// Create a window of `width` x `height` pixels
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: (width, height),
            presented: 0,
            close_after: None,
            pending: Vec::new(),
        }
    }

    /// Create a window sized from configuration
    pub fn from_config(config: &WindowConfig) -> Self {
        Self::new(config.width, config.height)
    }

    /// Request close once `frames` frames have been presented
    #[must_use]
    pub fn with_close_after(mut self, frames: u64) -> Self {
        self.close_after = Some(frames);
        self
    }

    /// Queue an event for the next poll; resize events apply immediately
    pub fn push_event(&mut self, event: WindowEvent) {
        if let WindowEvent::Resized { width, height } = event {
            self.resolution = (width, height);
        }
        self.pending.push(event);
    }

    /// Frames presented so far
    pub fn presented_frames(&self) -> u64 {
        self.presented
    }
}

impl WindowSurface for HeadlessWindow {
    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn poll_events(&mut self) -> Vec<WindowEvent> {
        let mut events = std::mem::take(&mut self.pending);
        if self.close_after.is_some_and(|frames| self.presented >= frames) {
            events.push(WindowEvent::CloseRequested);
        }
        events
    }

    fn present(&mut self) {
        self.presented += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_start_at_one_and_are_unique() {
        let mut backend = HeadlessBackend::new();
        let a = backend.create_buffer(BufferKind::Vertex, &[0; 4]);
        let b = backend.create_buffer(BufferKind::Index, &[0; 4]);

        assert_eq!(a, BufferHandle(1));
        assert_ne!(a, b);
        assert_eq!(backend.buffer_data(a), Some(&[0u8; 4][..]));
    }

    #[test]
    fn test_vertex_stage_is_checked_first() {
        let mut backend = HeadlessBackend::recording();
        let err = backend.create_program("", "#error also broken").unwrap_err();

        assert!(matches!(err, BackendError::Compile { stage: ShaderStage::Vertex, .. }));
        assert_eq!(backend.live_program_count(), 0);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn test_delete_tracks_live_objects() {
        let mut backend = HeadlessBackend::new();
        let program = backend.create_program("vs", "fs").unwrap();
        assert_eq!(backend.program_sources(program), Some(("vs", "fs")));

        backend.delete_program(program);
        assert_eq!(backend.live_program_count(), 0);
        assert_eq!(backend.program_sources(program), None);
    }

    #[test]
    fn test_window_closes_after_frame_count() {
        let mut window = HeadlessWindow::new(320, 240).with_close_after(2);

        assert!(window.poll_events().is_empty());
        window.present();
        assert!(window.poll_events().is_empty());
        window.present();
        assert_eq!(window.presented_frames(), 2);
        assert_eq!(window.poll_events(), vec![WindowEvent::CloseRequested]);
    }

    #[test]
    fn test_resize_event_updates_resolution() {
        let mut window = HeadlessWindow::new(320, 240);
        window.push_event(WindowEvent::Resized { width: 640, height: 480 });

        assert_eq!(window.resolution(), (640, 480));
        assert_eq!(window.poll_events().len(), 1);
        assert!(window.poll_events().is_empty());
    }

    #[test]
    fn test_plain_backend_keeps_no_command_log() {
        let mut backend = HeadlessBackend::new();
        let program = backend.create_program("vs", "fs").unwrap();
        for _ in 0..3 {
            backend.set_viewport(PixelViewport {
                x: 0,
                y: 0,
                width: 64,
                height: 64,
            });
            backend.use_program(program);
            backend.set_uniform_matrix(0, &Mat4::identity());
            backend.draw_indexed(6);
        }

        assert!(!backend.is_recording());
        assert!(backend.commands().is_empty());
        assert_eq!(backend.draw_call_count(), 3);
        assert_eq!(backend.live_program_count(), 1);
    }

    #[test]
    fn test_recording_backend_logs_calls_in_order() {
        let mut backend = HeadlessBackend::recording();
        let program = backend.create_program("vs", "fs").unwrap();
        backend.use_program(program);
        backend.draw_indexed(6);

        assert_eq!(
            backend.commands(),
            &[
                BackendCommand::CreateProgram(program),
                BackendCommand::UseProgram(program),
                BackendCommand::DrawIndexed(6),
            ]
        );

        backend.clear_commands();
        assert!(backend.commands().is_empty());
        assert_eq!(backend.draw_call_count(), 0);
        assert_eq!(backend.live_program_count(), 1);
    }
}
