//! Frame-scoped draw aggregation
//!
//! The [`Renderer`] collects cameras and draw requests while the scene is
//! walked, then submits everything in [`Renderer::frame`]:
//!
//! 1. cameras are stably sorted by descending viewport area
//! 2. per camera, draw batches are visited in first-submission order; the
//!    program is bound and view/projection uploaded only when it changes,
//!    the model matrix is uploaded per drawable
//! 3. all registrations are cleared, so nothing carries over to the next frame
//!
//! Draw requests are batched by [`DrawConfigHandle`]. Renderables built from
//! the same `(shader, mesh)` pair share a handle and are drawn back to back.

use std::collections::HashMap;

use crate::core::config::RendererConfig;
use crate::foundation::math::Mat4;
use crate::render::backend::{DrawConfigHandle, GraphicsBackend, ProgramHandle};
use crate::render::camera::Camera;
use crate::render::renderable::DrawRequest;

/// Camera snapshot registered for the current frame
#[derive(Debug, Clone)]
pub struct RegisteredCamera {
    /// Camera settings at registration time
    pub camera: Camera,
    /// World transform of the camera's node
    pub world: Mat4,
}

/// Draw requests sharing one draw configuration
#[derive(Debug, Clone)]
pub struct DrawBatch {
    draw_config: DrawConfigHandle,
    program: ProgramHandle,
    requests: Vec<DrawRequest>,
}

impl DrawBatch {
    fn new(draw_config: DrawConfigHandle, program: ProgramHandle) -> Self {
        Self {
            draw_config,
            program,
            requests: Vec::new(),
        }
    }

    /// Batch key
    pub fn draw_config(&self) -> DrawConfigHandle {
        self.draw_config
    }

    /// Program every request in this batch uses
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// Requests in submission order
    pub fn requests(&self) -> &[DrawRequest] {
        &self.requests
    }
}

/// Counters for one call to [`Renderer::frame`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Cameras rendered
    pub cameras: usize,
    /// Distinct draw batches
    pub batches: usize,
    /// Indexed draw calls issued across all cameras
    pub draw_calls: usize,
    /// `use_program` calls issued across all cameras
    pub program_binds: usize,
    /// Matrix uniforms uploaded across all cameras
    pub matrix_uploads: usize,
}

/// Per-frame camera and drawable aggregator
#[derive(Debug, Default)]
pub struct Renderer {
    config: RendererConfig,
    cameras: Vec<RegisteredCamera>,
    batches: Vec<DrawBatch>,
    batch_index: HashMap<DrawConfigHandle, usize>,
}

impl Renderer {
    /// Create an empty renderer
    pub fn new(config: RendererConfig) -> Self {
        log::debug!("Creating renderer with config: {config:?}");
        Self {
            config,
            ..Default::default()
        }
    }

    /// Register a camera for this frame
    ///
    /// No uniqueness check: registering twice renders the viewport twice.
    pub fn add_camera(&mut self, camera: Camera, world: Mat4) {
        self.cameras.push(RegisteredCamera { camera, world });
    }

    /// Append a draw request to the batch of its draw configuration
    pub fn add_renderable(&mut self, request: DrawRequest) {
        let index = match self.batch_index.get(&request.draw_config) {
            Some(&index) => index,
            None => {
                let index = self.batches.len();
                self.batches.push(DrawBatch::new(request.draw_config, request.program));
                self.batch_index.insert(request.draw_config, index);
                index
            }
        };
        self.batches[index].requests.push(request);
    }

    /// Cameras registered so far this frame
    pub fn cameras(&self) -> &[RegisteredCamera] {
        &self.cameras
    }

    /// Batches in first-submission order
    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    /// Number of draw requests registered so far this frame
    pub fn pending_drawables(&self) -> usize {
        self.batches.iter().map(|batch| batch.requests.len()).sum()
    }

    /// Renderer settings
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Submit every registered camera's view of the batches, then clear all registrations
    ///
    /// # Panics
    ///
    /// Panics if a camera's viewport covers no pixels at `resolution`; that is a
    /// camera misconfiguration, not a recoverable condition.
    pub fn frame(&mut self, backend: &mut dyn GraphicsBackend, resolution: (u32, u32)) -> FrameStats {
        if self.config.sort_cameras_by_area && self.cameras.len() > 1 {
            // sort_by is stable: equal areas keep registration order
            self.cameras
                .sort_by(|a, b| b.camera.viewport().area().total_cmp(&a.camera.viewport().area()));
        }

        if self.config.warn_on_empty_frame && self.cameras.is_empty() && !self.batches.is_empty() {
            log::warn!("{} drawables submitted but no camera registered", self.pending_drawables());
        }

        let mut stats = FrameStats {
            cameras: self.cameras.len(),
            batches: self.batches.len(),
            ..Default::default()
        };

        for registered in &self.cameras {
            let pixels = registered.camera.viewport().to_pixels(resolution);
            assert!(
                !pixels.is_degenerate(),
                "camera viewport {:?} is degenerate at resolution {resolution:?}",
                registered.camera.viewport()
            );
            backend.set_viewport(pixels);

            let view = registered.camera.view_matrix(&registered.world);
            let projection = registered.camera.projection_matrix(pixels);
            let mut current_program = None;

            for batch in &self.batches {
                let Some(first) = batch.requests.first() else {
                    continue;
                };

                if current_program != Some(batch.program) {
                    backend.use_program(batch.program);
                    current_program = Some(batch.program);
                    stats.program_binds += 1;

                    let uniforms = first.material.uniforms();
                    if let Some(location) = uniforms.view {
                        backend.set_uniform_matrix(location, &view);
                        stats.matrix_uploads += 1;
                    }
                    if let Some(location) = uniforms.projection {
                        backend.set_uniform_matrix(location, &projection);
                        stats.matrix_uploads += 1;
                    }
                }

                backend.bind_draw_config(batch.draw_config);
                for request in &batch.requests {
                    request.material.bind(backend);
                    backend.bind_vertex_buffer(request.vertex_buffer);
                    if let Some(location) = request.material.uniforms().model {
                        backend.set_uniform_matrix(location, &request.world);
                        stats.matrix_uploads += 1;
                    }
                    backend.draw_indexed(request.index_count);
                    stats.draw_calls += 1;
                }
            }
        }

        log::trace!("Rendered frame: {stats:?}");
        self.clear();
        stats
    }

    /// Drop all cameras and batches registered this frame
    pub fn clear(&mut self) {
        self.cameras.clear();
        self.batches.clear();
        self.batch_index.clear();
    }
}
