//! Texture resources
//!
//! Like meshes, textures keep their texel data on the CPU until the first call
//! to [`Texture::gpu_handle`], which uploads them through the backend.

use serde::{Deserialize, Serialize};

use crate::render::backend::{GraphicsBackend, TextureDescriptor, TextureHandle};

/// Numeric id of a texture, unique within one resource manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// What happens to CPU-side texel data once it reaches the GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextureCacheOption {
    /// Drop texel data after upload
    #[default]
    DeleteOnUpload,
    /// Keep a CPU copy around
    Cache,
}

/// Minification/magnification filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextureFilter {
    /// Linear filtering without mipmaps
    Bilinear,
    /// Linear filtering between mip levels
    Trilinear,
    /// Trilinear plus anisotropic filtering
    #[default]
    Anisotropic,
}

/// Coordinate wrapping outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextureWrap {
    /// Tile
    Repeat,
    /// Clamp to the edge texel
    #[default]
    Clamp,
    /// Tile, mirroring every other repetition
    Mirror,
}

/// Texture creation options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureOptions {
    /// CPU data retention after upload
    pub cache: TextureCacheOption,
    /// Filtering mode
    pub filter: TextureFilter,
    /// Wrapping mode
    pub wrap: TextureWrap,
    /// Requested anisotropy, clamped by the backend to what the device supports
    pub anisotropy: f32,
    /// Channels per texel (1 to 4, one byte each)
    pub channels: u8,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            cache: TextureCacheOption::DeleteOnUpload,
            filter: TextureFilter::Anisotropic,
            wrap: TextureWrap::Clamp,
            anisotropy: 2.0,
            channels: 4,
        }
    }
}

/// Texture extent in texels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureDimensions {
    /// 1D texture
    D1(u32),
    /// 2D texture
    D2(u32, u32),
    /// 3D texture
    D3(u32, u32, u32),
}

impl TextureDimensions {
    /// Total number of texels
    pub fn texel_count(&self) -> usize {
        match *self {
            Self::D1(w) => w as usize,
            Self::D2(w, h) => w as usize * h as usize,
            Self::D3(w, h, d) => w as usize * h as usize * d as usize,
        }
    }
}

/// Texture errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum TextureError {
    /// Channel count outside 1..=4
    #[error("unsupported channel count {0}")]
    InvalidChannels(u8),

    /// Texel data does not cover the declared extent
    #[error("texture data is {actual} bytes, expected {expected}")]
    DataSizeMismatch {
        /// Bytes required by dimensions * channels
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// Anisotropic filtering needs a positive anisotropy amount
    #[error("anisotropy must be positive, got {0}")]
    InvalidAnisotropy(f32),
}

/// Texture resource
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    lexical_name: String,
    dimensions: TextureDimensions,
    options: TextureOptions,
    data: Option<Vec<u8>>,
    gpu: Option<TextureHandle>,
}

impl Texture {
    /// Validate and wrap texel data
    pub(crate) fn new(
        id: TextureId,
        lexical_name: impl Into<String>,
        dimensions: TextureDimensions,
        data: Vec<u8>,
        options: TextureOptions,
    ) -> Result<Self, TextureError> {
        if !(1..=4).contains(&options.channels) {
            return Err(TextureError::InvalidChannels(options.channels));
        }
        if options.filter == TextureFilter::Anisotropic && options.anisotropy <= 0.0 {
            return Err(TextureError::InvalidAnisotropy(options.anisotropy));
        }

        let expected = dimensions.texel_count() * usize::from(options.channels);
        if data.len() != expected {
            return Err(TextureError::DataSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            id,
            lexical_name: lexical_name.into(),
            dimensions,
            options,
            data: Some(data),
            gpu: None,
        })
    }

    /// Id of this texture
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Lexical (lookup) name of this texture
    pub fn lexical_name(&self) -> &str {
        &self.lexical_name
    }

    /// Texture extent
    pub fn dimensions(&self) -> TextureDimensions {
        self.dimensions
    }

    /// Options given at creation
    pub fn options(&self) -> TextureOptions {
        self.options
    }

    /// Raw texel data, unless dropped after upload
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Whether the texture lives on the GPU
    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Backend handle, uploading on first access
    ///
    /// Returns `None` only when the texture was released.
    pub fn gpu_handle(&mut self, backend: &mut dyn GraphicsBackend) -> Option<TextureHandle> {
        if self.gpu.is_none() {
            let data = self.data.as_ref()?;
            let descriptor = TextureDescriptor {
                dimensions: self.dimensions,
                options: self.options,
            };
            self.gpu = Some(backend.create_texture(&descriptor, data));
            log::debug!("Uploaded texture '{}' ({:?})", self.lexical_name, self.dimensions);

            if self.options.cache == TextureCacheOption::DeleteOnUpload {
                self.data = None;
            }
        }

        self.gpu
    }

    pub(crate) fn release(&mut self, backend: &mut dyn GraphicsBackend) {
        if let Some(handle) = self.gpu.take() {
            backend.delete_texture(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::headless::HeadlessBackend;

    #[test]
    fn test_texel_count() {
        assert_eq!(TextureDimensions::D1(8).texel_count(), 8);
        assert_eq!(TextureDimensions::D2(4, 4).texel_count(), 16);
        assert_eq!(TextureDimensions::D3(2, 3, 4).texel_count(), 24);
    }

    #[test]
    fn test_data_size_is_validated() {
        let err = Texture::new(
            TextureId(0),
            "bad",
            TextureDimensions::D2(2, 2),
            vec![0; 15],
            TextureOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, TextureError::DataSizeMismatch { expected: 16, actual: 15 }));
    }

    #[test]
    fn test_channel_count_is_validated() {
        let options = TextureOptions {
            channels: 5,
            ..Default::default()
        };
        let err = Texture::new(TextureId(0), "bad", TextureDimensions::D1(1), vec![0; 5], options).unwrap_err();
        assert!(matches!(err, TextureError::InvalidChannels(5)));
    }

    #[test]
    fn test_upload_is_lazy() {
        let mut backend = HeadlessBackend::new();
        let mut texture = Texture::new(
            TextureId(0),
            "checker",
            TextureDimensions::D2(2, 2),
            vec![255; 16],
            TextureOptions::default(),
        )
        .unwrap();

        assert!(!texture.is_uploaded());
        assert_eq!(backend.live_texture_count(), 0);

        let handle = texture.gpu_handle(&mut backend);
        assert!(handle.is_some());
        assert_eq!(texture.gpu_handle(&mut backend), handle);
        assert_eq!(backend.live_texture_count(), 1);
        assert!(texture.data().is_none());

        texture.release(&mut backend);
        assert_eq!(backend.live_texture_count(), 0);
        assert!(texture.gpu_handle(&mut backend).is_none());
    }
}
