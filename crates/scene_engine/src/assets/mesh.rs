//! Mesh representation for 3D models
//!
//! A [`Mesh`] starts life as a CPU-side placeholder owned by the
//! [`ResourceManager`](crate::assets::ResourceManager). Vertex and index data can
//! be assigned until the first time a caller asks for the GPU buffers; at that
//! point the data is uploaded and, unless the mesh was created with
//! [`MeshCacheOption::Cache`], the CPU copy is dropped.

use serde::{Deserialize, Serialize};
use std::mem::{offset_of, size_of};

use crate::assets::material::AttributeLocations;
use crate::render::backend::{BufferHandle, BufferKind, GraphicsBackend, VertexAttribute};

/// Interleaved vertex layout shared by every mesh
///
/// `#[repr(C)]` keeps the field order and offsets stable for GPU upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Vertex colour (RGB)
    pub colour: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], colour: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            colour,
            tex_coord,
        }
    }

    /// Attribute layout for the slots a material's shader actually consumes
    ///
    /// Attributes whose location is `None` are skipped.
    pub fn attribute_layout(locations: &AttributeLocations) -> Vec<VertexAttribute> {
        let stride = size_of::<Self>();
        [
            (locations.position, 3, offset_of!(Self, position)),
            (locations.normal, 3, offset_of!(Self, normal)),
            (locations.colour, 3, offset_of!(Self, colour)),
            (locations.tex_coord, 2, offset_of!(Self, tex_coord)),
        ]
        .into_iter()
        .filter_map(|(location, components, offset)| {
            location.map(|location| VertexAttribute {
                location,
                components,
                offset,
                stride,
            })
        })
        .collect()
    }
}

/// Numeric id of a mesh, unique within one resource manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

/// What happens to CPU-side mesh data once it reaches the GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeshCacheOption {
    /// Drop vertices and indices after upload
    #[default]
    DeleteOnUpload,
    /// Keep a CPU copy around
    Cache,
}

/// GPU buffers of an uploaded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuMesh {
    /// Interleaved vertex buffer
    pub vertex_buffer: BufferHandle,
    /// Index buffer
    pub index_buffer: BufferHandle,
    /// Number of indices to draw
    pub index_count: u32,
}

/// Mesh errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum MeshError {
    /// Data cannot change once the GPU buffers exist
    #[error("mesh {0:?} already uploaded; data is immutable")]
    AlreadyUploaded(MeshId),

    /// Upload requested before vertex and index data were assigned
    #[error("mesh {0:?} has no vertex/index data")]
    MissingData(MeshId),
}

/// Triangle mesh resource
#[derive(Debug)]
pub struct Mesh {
    id: MeshId,
    lexical_name: String,
    vertices: Option<Vec<Vertex>>,
    indices: Option<Vec<u32>>,
    vertex_count: usize,
    index_count: usize,
    cache_option: MeshCacheOption,
    gpu: Option<GpuMesh>,
}

impl Mesh {
    /// Create an empty placeholder mesh
    pub(crate) fn new(id: MeshId, lexical_name: impl Into<String>, cache_option: MeshCacheOption) -> Self {
        Self {
            id,
            lexical_name: lexical_name.into(),
            vertices: None,
            indices: None,
            vertex_count: 0,
            index_count: 0,
            cache_option,
            gpu: None,
        }
    }

    /// Id of this mesh
    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Lexical (lookup) name of this mesh
    pub fn lexical_name(&self) -> &str {
        &self.lexical_name
    }

    /// CPU-side vertices, if assigned and not yet dropped after upload
    pub fn vertices(&self) -> Option<&[Vertex]> {
        self.vertices.as_deref()
    }

    /// CPU-side indices, if assigned and not yet dropped after upload
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// Number of vertices last assigned
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of indices last assigned
    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// Cache option chosen at creation
    pub fn cache_option(&self) -> MeshCacheOption {
        self.cache_option
    }

    /// Whether the GPU buffers exist
    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Whether vertex and index data are present (or were, before upload)
    pub fn has_data(&self) -> bool {
        self.gpu.is_some() || (self.vertices.is_some() && self.indices.is_some())
    }

    /// GPU buffers without triggering an upload
    pub fn gpu_buffers(&self) -> Option<GpuMesh> {
        self.gpu
    }

    /// Assign vertex and index data
    ///
    /// Allowed any number of times until the mesh is uploaded; rejected afterwards.
    pub fn set_mesh_data(&mut self, vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<(), MeshError> {
        if self.gpu.is_some() {
            return Err(MeshError::AlreadyUploaded(self.id));
        }

        self.vertex_count = vertices.len();
        self.index_count = indices.len();
        self.vertices = Some(vertices);
        self.indices = Some(indices);
        Ok(())
    }

    /// GPU buffers, uploading on first access
    pub fn upload(&mut self, backend: &mut dyn GraphicsBackend) -> Result<GpuMesh, MeshError> {
        if let Some(gpu) = self.gpu {
            return Ok(gpu);
        }

        let (Some(vertices), Some(indices)) = (self.vertices.as_ref(), self.indices.as_ref()) else {
            return Err(MeshError::MissingData(self.id));
        };

        let vertex_buffer = backend.create_buffer(BufferKind::Vertex, bytemuck::cast_slice(vertices));
        let index_buffer = backend.create_buffer(BufferKind::Index, bytemuck::cast_slice(indices));

        #[allow(clippy::cast_possible_truncation)]
        let gpu = GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        };
        self.gpu = Some(gpu);

        if self.cache_option == MeshCacheOption::DeleteOnUpload {
            self.vertices = None;
            self.indices = None;
        }

        log::debug!(
            "Uploaded mesh '{}' ({} vertices, {} indices)",
            self.lexical_name,
            self.vertex_count,
            self.index_count
        );
        Ok(gpu)
    }

    /// Release GPU buffers
    pub(crate) fn release(&mut self, backend: &mut dyn GraphicsBackend) {
        if let Some(gpu) = self.gpu.take() {
            backend.delete_buffer(gpu.vertex_buffer);
            backend.delete_buffer(gpu.index_buffer);
        }
    }

    /// Unit cube centered at the origin with per-face normals
    pub fn cube_data() -> (Vec<Vertex>, Vec<u32>) {
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5]]),
            ([0.0, 0.0, -1.0], [[0.5, -0.5, -0.5], [-0.5, -0.5, -0.5], [-0.5, 0.5, -0.5], [0.5, 0.5, -0.5]]),
            ([1.0, 0.0, 0.0], [[0.5, -0.5, 0.5], [0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5]]),
            ([-1.0, 0.0, 0.0], [[-0.5, -0.5, -0.5], [-0.5, -0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5]]),
            ([0.0, 1.0, 0.0], [[-0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, 0.5, -0.5], [-0.5, 0.5, -0.5]]),
            ([0.0, -1.0, 0.0], [[-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5], [-0.5, -0.5, 0.5]]),
        ];
        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners) in faces {
            #[allow(clippy::cast_possible_truncation)]
            let base = vertices.len() as u32;
            for (corner, uv) in corners.into_iter().zip(uvs) {
                vertices.push(Vertex::new(corner, normal, [1.0, 1.0, 1.0], uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        (vertices, indices)
    }
}
