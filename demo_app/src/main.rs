//! Spinning cubes demo
//!
//! Builds a small scene on the headless backend: a ring of cubes under a
//! spinning pivot, a full-window camera and a picture-in-picture camera in
//! the top-right quadrant. Runs a fixed number of frames and logs the
//! renderer's per-frame statistics.
//!
//! Pass a `.toml` or `.ron` engine config path as the first argument to
//! override the defaults.

use std::any::Any;

use scene_engine::prelude::*;

const FRAMES: u64 = 120;
const CUBES: usize = 6;

const VERTEX_SHADER: &str = "
#version 330 core
layout(location = 0) in vec3 position;
layout(location = 1) in vec3 normal;
layout(location = 2) in vec3 colour;
layout(location = 3) in vec2 tex_coord;
uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;
out vec3 v_colour;
out vec2 v_uv;
void main() {
    v_colour = colour;
    v_uv = tex_coord;
    gl_Position = projection * view * model * vec4(position, 1.0);
}
";

const FRAGMENT_SHADER: &str = "
#version 330 core
in vec3 v_colour;
in vec2 v_uv;
uniform sampler2D albedo;
out vec4 colour;
void main() {
    colour = vec4(v_colour, 1.0) * texture(albedo, v_uv);
}
";

/// Logs its owner's world position every `interval` frames
#[derive(Debug, Clone)]
struct PositionReporter {
    interval: u64,
    frames: u64,
    owner: Option<NodeId>,
}

impl PositionReporter {
    fn new(interval: u64) -> Self {
        Self {
            interval,
            frames: 0,
            owner: None,
        }
    }
}

impl Component for PositionReporter {
    fn kind(&self) -> ComponentKind {
        Self::KIND
    }

    fn priority(&self) -> u32 {
        0
    }

    fn startup(&mut self, owner: NodeId) {
        log::debug!("PositionReporter attached to {owner:?}");
        self.owner = Some(owner);
    }

    fn shutdown(&mut self) {
        log::debug!("PositionReporter detached after {} frames", self.frames);
        self.owner = None;
    }

    fn frame_start(&mut self, ctx: &mut FrameContext<'_>) {
        if self.frames % self.interval == 0 {
            let world = ctx.world_transform();
            log::info!(
                "{:?} at ({:.2}, {:.2}, {:.2})",
                ctx.owner(),
                world[(0, 3)],
                world[(1, 3)],
                world[(2, 3)]
            );
        }
        self.frames += 1;
    }

    fn clone_box(&self) -> Box<dyn Component> {
        let mut copy = self.clone();
        copy.owner = None;
        Box::new(copy)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedComponent for PositionReporter {
    const KIND: ComponentKind = ComponentKind::Behavior("position_reporter");
}

fn load_config() -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(EngineConfig::load_from_file(path)?),
        None => Ok(EngineConfig::default().with_window(WindowConfig::new("Spinning Cubes", 1280, 720))),
    }
}

fn build_scene(engine: &mut Engine) -> Result<NodeId, Box<dyn std::error::Error>> {
    let shader = engine.create_shader("lit", VERTEX_SHADER, FRAGMENT_SHADER, ShaderSource::Raw)?;

    let (vertices, indices) = Mesh::cube_data();
    let cube = engine
        .resources_mut()
        .create_mesh("cube", Some(vertices), Some(indices), None)?;

    let checker: Vec<u8> = (0..16u8)
        .flat_map(|texel| {
            let shade = if (texel / 4 + texel % 4) % 2 == 0 { 255 } else { 64 };
            [shade, shade, shade, 255]
        })
        .collect();
    let texture = engine
        .resources_mut()
        .create_texture("checker", TextureDimensions::D2(4, 4), checker, None)?;
    let (resources, backend) = engine.resources_and_backend();
    let texture_handle = resources
        .texture_handle(texture, backend)
        .ok_or("checker texture was released")?;

    let material = Material::new("checker_lit", shader)
        .with_attributes(AttributeLocations {
            position: Some(0),
            normal: Some(1),
            colour: Some(2),
            tex_coord: Some(3),
        })
        .with_uniforms(UniformLocations {
            model: Some(0),
            view: Some(1),
            projection: Some(2),
        })
        .with_texture(0, texture_handle);

    let root = engine.scene().root();
    let pivot = engine.scene_mut().spawn_child(root, "pivot")?;

    #[allow(clippy::cast_precision_loss)]
    let step = std::f32::consts::TAU / CUBES as f32;
    for index in 0..CUBES {
        let renderable = engine.create_renderable(material.clone(), cube)?;
        let scene = engine.scene_mut();
        let node = scene.spawn_child(pivot, format!("cube_{index}"))?;
        #[allow(clippy::cast_precision_loss)]
        let angle = step * index as f32;
        if let Some(node) = scene.node_mut(node) {
            node.set_translation(Vec3::new(3.0 * angle.cos(), 0.0, 3.0 * angle.sin()));
            node.set_scale(Vec3::new(0.5, 0.5, 0.5));
        }
        scene.add_component(node, renderable)?;
    }

    // One cube gets a reporter, then a copy of it is hung above the ring
    let scene = engine.scene_mut();
    let first = scene.find_child(pivot, "cube_0").ok_or("cube_0 missing")?;
    scene.add_component(first, PositionReporter::new(30))?;
    let copy = scene.clone_subtree(first)?;
    let copy = scene.add_child(pivot, copy)?;
    if let Some(node) = scene.node_mut(copy) {
        node.set_name("cube_top");
        node.set_translation(Vec3::new(0.0, 2.0, 0.0));
    }

    let main_camera = scene.spawn_child(root, "main_camera")?;
    if let Some(node) = scene.node_mut(main_camera) {
        node.set_translation(Vec3::new(0.0, 2.0, 10.0));
    }
    let mut camera = Camera::default();
    camera.set_projection_mode(ProjectionMode::Perspective);
    scene.add_component(main_camera, camera)?;

    let inset_camera = scene.spawn_child(root, "inset_camera")?;
    if let Some(node) = scene.node_mut(inset_camera) {
        node.set_translation(Vec3::new(0.0, 12.0, 0.0));
        node.set_rotation(Quat::from_axis_angle(&Vec3::x_axis(), -std::f32::consts::FRAC_PI_2));
    }
    let inset = Camera::new(
        Viewport::new((0.75, 0.75), (1.0, 1.0))?,
        ProjectionMode::Perspective,
        50.0,
        0.5,
        std::f32::consts::FRAC_PI_3,
    )?;
    scene.add_component(inset_camera, inset)?;

    let nodes = scene.node_count();
    log::info!(
        "Scene built: {nodes} nodes, {} draw configs",
        engine.resources().draw_config_count()
    );
    Ok(pivot)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let mut engine = Engine::headless(config)?;
    log::info!("Starting spinning cubes demo");

    let pivot = build_scene(&mut engine)?;
    let spin = Quat::from_axis_angle(&Vec3::y_axis(), 0.02);

    let mut frames = 0;
    while engine.is_running() && frames < FRAMES {
        if let Some(node) = engine.scene_mut().node_mut(pivot) {
            node.rotate_by(spin);
        }

        let stats = engine.frame();
        if frames % 30 == 0 {
            log::info!(
                "frame {frames}: {} cameras, {} batches, {} draws, {} program binds, {} matrix uploads",
                stats.cameras,
                stats.batches,
                stats.draw_calls,
                stats.program_binds,
                stats.matrix_uploads
            );
        }
        frames += 1;
    }

    log::info!("Rendered {frames} frames in {:.3}s", engine.timer().total_time());
    engine.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloned_reporter_keeps_frame_count() {
        let mut scene = Scene::new();
        let node = scene.spawn_child(scene.root(), "cube").unwrap();
        scene.add_component(node, PositionReporter::new(30)).unwrap();

        let mut renderer = Renderer::default();
        for _ in 0..3 {
            scene.frame(&mut renderer);
        }

        let copy = scene.clone_subtree(node).unwrap();
        let copy_id = copy.id();
        let reporter = scene
            .node(copy_id)
            .and_then(SceneNode::get_component::<PositionReporter>)
            .unwrap();

        assert_eq!(reporter.frames, 3);
        assert_eq!(reporter.interval, 30);
        // Owner comes from the new node's startup, not from the source
        assert_eq!(reporter.owner, Some(copy_id));
        scene.destroy(copy);
    }
}
