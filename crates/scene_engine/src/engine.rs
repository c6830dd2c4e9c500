//! Core engine implementation
//!
//! [`Engine`] is the explicit context object that owns the scene, the
//! renderer, the resource manager and the frame timer, plus the graphics
//! backend and window collaborators. One call to [`Engine::frame`] advances
//! the timer, drains window events, walks the scene and submits the frame.

use thiserror::Error;

use crate::assets::material::Material;
use crate::assets::mesh::MeshId;
use crate::assets::resource_manager::{ResourceError, ResourceManager};
use crate::assets::shader::{ShaderId, ShaderSource};
use crate::core::config::{ConfigError, EngineConfig};
use crate::foundation::logging;
use crate::foundation::time::Timer;
use crate::render::backend::GraphicsBackend;
use crate::render::backends::headless::{HeadlessBackend, HeadlessWindow};
use crate::render::renderable::Renderable;
use crate::render::renderer::{FrameStats, Renderer};
use crate::render::window::{WindowEvent, WindowSurface};
use crate::scene::Scene;

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization error
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Main engine struct
///
/// The engine coordinates all subsystems and manages the main loop.
pub struct Engine {
    config: EngineConfig,
    scene: Scene,
    renderer: Renderer,
    resources: ResourceManager,
    timer: Timer,
    backend: Box<dyn GraphicsBackend>,
    window: Box<dyn WindowSurface>,
    running: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("scene", &self.scene)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create a new engine instance around the given collaborators
    pub fn new(
        config: EngineConfig,
        backend: Box<dyn GraphicsBackend>,
        window: Box<dyn WindowSurface>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        logging::init_with_level(&config.log_level);
        log::info!("Initializing engine...");

        let (width, height) = window.resolution();
        if width == 0 || height == 0 {
            return Err(EngineError::InitializationFailed(format!(
                "Window reports an empty drawable area ({width}x{height})"
            )));
        }

        Ok(Self {
            scene: Scene::new(),
            renderer: Renderer::new(config.renderer),
            resources: ResourceManager::new(config.resources),
            timer: Timer::new(),
            backend,
            window,
            config,
            running: true,
        })
    }

    /// Create an engine on the in-process headless backend
    pub fn headless(config: EngineConfig) -> Result<Self, EngineError> {
        let window = HeadlessWindow::from_config(&config.window);
        Self::new(config, Box::new(HeadlessBackend::new()), Box::new(window))
    }

    /// Run one frame
    ///
    /// Advances the timer, handles window events (a close request stops the
    /// run loop after this frame), walks the scene and renders.
    pub fn frame(&mut self) -> FrameStats {
        self.timer.update();

        for event in self.window.poll_events() {
            match event {
                WindowEvent::CloseRequested => {
                    log::info!("Window close requested");
                    self.running = false;
                }
                WindowEvent::Resized { width, height } => {
                    log::debug!("Window resized to {width}x{height}");
                }
            }
        }

        self.scene.frame(&mut self.renderer);

        let resolution = self.window.resolution();
        let stats = if resolution.0 == 0 || resolution.1 == 0 {
            // Minimized: nothing can be drawn, but registrations must not leak
            self.renderer.clear();
            FrameStats::default()
        } else {
            self.renderer.frame(self.backend.as_mut(), resolution)
        };

        self.window.present();
        stats
    }

    /// Run frames until the window asks to close or `max_frames` is reached
    ///
    /// Returns the number of frames run.
    pub fn run(&mut self, max_frames: Option<u64>) -> u64 {
        log::info!("Starting main loop...");
        let mut frames = 0;
        while self.running && max_frames.map_or(true, |max| frames < max) {
            self.frame();
            frames += 1;
        }
        log::info!(
            "Main loop finished after {frames} frames ({:.2}s)",
            self.timer.total_time()
        );
        frames
    }

    /// Request the run loop to stop
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the run loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Build a shader through the backend
    pub fn create_shader(
        &mut self,
        lexical_name: &str,
        vertex: &str,
        fragment: &str,
        source: ShaderSource,
    ) -> Result<ShaderId, ResourceError> {
        self.resources
            .create_shader(lexical_name, vertex, fragment, source, self.backend.as_mut())
    }

    /// Build a renderable, sharing draw configurations where possible
    pub fn create_renderable(&mut self, material: Material, mesh: MeshId) -> Result<Renderable, ResourceError> {
        self.resources
            .create_renderable(material, mesh, self.backend.as_mut())
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Get mutable access to the scene
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Get the renderer
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Get the resource manager
    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    /// Get mutable access to the resource manager
    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    /// Resource manager and backend together, for calls that need both
    pub fn resources_and_backend(&mut self) -> (&mut ResourceManager, &mut dyn GraphicsBackend) {
        (&mut self.resources, self.backend.as_mut())
    }

    /// Get the frame timer
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Get mutable access to the frame timer (pause, reset)
    pub fn timer_mut(&mut self) -> &mut Timer {
        &mut self.timer
    }

    /// Get the current frame delta time
    pub fn delta_time(&self) -> f32 {
        self.timer.delta_time()
    }

    /// Current window resolution
    pub fn resolution(&self) -> (u32, u32) {
        self.window.resolution()
    }

    /// Tear down: components are shut down, then every resource is released
    pub fn shutdown(self) {
        log::info!("Shutting down engine");
        drop(self);
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.scene.clear();
        self.resources.release_all(self.backend.as_mut());
        log::info!("Engine shutdown complete");
    }
}
