//! Shader programs
//!
//! A [`Shader`] is a linked vertex + fragment program. Construction goes through
//! the graphics backend; a failed compile or link never produces a `Shader`.

use std::path::PathBuf;

use crate::render::backend::{BackendError, GraphicsBackend, ProgramHandle};

/// Numeric id of a shader, unique within one resource manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

/// How the source strings passed to shader creation are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderSource {
    /// The strings are file paths to read
    File,
    /// The strings are the shader code itself
    Raw,
}

/// Shader creation errors
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    /// A source file could not be read
    #[error("failed to read shader source {path:?}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The backend rejected the program
    #[error("shader '{name}' failed to build: {source}")]
    Build {
        /// Lexical name of the shader
        name: String,
        /// Backend diagnostic
        #[source]
        source: BackendError,
    },
}

/// Linked shader program
#[derive(Debug)]
pub struct Shader {
    id: ShaderId,
    lexical_name: String,
    program: ProgramHandle,
}

impl Shader {
    /// Resolve sources and build the program through the backend
    pub(crate) fn build(
        id: ShaderId,
        lexical_name: &str,
        vertex: &str,
        fragment: &str,
        source: ShaderSource,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<Self, ShaderError> {
        let (vertex_code, fragment_code) = match source {
            ShaderSource::Raw => (vertex.to_owned(), fragment.to_owned()),
            ShaderSource::File => (read_source(vertex)?, read_source(fragment)?),
        };

        let program = backend
            .create_program(&vertex_code, &fragment_code)
            .map_err(|source| ShaderError::Build {
                name: lexical_name.to_owned(),
                source,
            })?;

        Ok(Self {
            id,
            lexical_name: lexical_name.to_owned(),
            program,
        })
    }

    /// Id of this shader
    pub fn id(&self) -> ShaderId {
        self.id
    }

    /// Lexical (lookup) name of this shader
    pub fn lexical_name(&self) -> &str {
        &self.lexical_name
    }

    /// Backend program handle
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    pub(crate) fn release(&self, backend: &mut dyn GraphicsBackend) {
        backend.delete_program(self.program);
    }
}

fn read_source(path: &str) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Read {
        path: PathBuf::from(path),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::ShaderStage;
    use crate::render::backends::headless::HeadlessBackend;

    const VS: &str = "void main() { gl_Position = vec4(0.0); }";
    const FS: &str = "void main() {}";

    #[test]
    fn test_build_raw_shader() {
        let mut backend = HeadlessBackend::new();
        let shader = Shader::build(ShaderId(3), "basic", VS, FS, ShaderSource::Raw, &mut backend).unwrap();

        assert_eq!(shader.id(), ShaderId(3));
        assert_eq!(shader.lexical_name(), "basic");
        assert_eq!(backend.live_program_count(), 1);
    }

    #[test]
    fn test_compile_failure_carries_diagnostic() {
        let mut backend = HeadlessBackend::new();
        let err = Shader::build(
            ShaderId(0),
            "broken",
            VS,
            "#error missing semicolon\nvoid main() {}",
            ShaderSource::Raw,
            &mut backend,
        )
        .unwrap_err();

        match err {
            ShaderError::Build { name, source: BackendError::Compile { stage, log } } => {
                assert_eq!(name, "broken");
                assert_eq!(stage, ShaderStage::Fragment);
                assert_eq!(log, "missing semicolon");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(backend.live_program_count(), 0);
    }

    #[test]
    fn test_file_sources_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let vs_path = dir.path().join("basic.vert");
        let fs_path = dir.path().join("basic.frag");
        std::fs::write(&vs_path, VS).unwrap();
        std::fs::write(&fs_path, FS).unwrap();

        let mut backend = HeadlessBackend::new();
        let shader = Shader::build(
            ShaderId(0),
            "from_file",
            vs_path.to_str().unwrap(),
            fs_path.to_str().unwrap(),
            ShaderSource::File,
            &mut backend,
        )
        .unwrap();

        assert_eq!(backend.program_sources(shader.program()), Some((VS, FS)));
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let mut backend = HeadlessBackend::new();
        let err = Shader::build(
            ShaderId(0),
            "missing",
            "/nonexistent/shader.vert",
            "/nonexistent/shader.frag",
            ShaderSource::File,
            &mut backend,
        )
        .unwrap_err();

        assert!(matches!(err, ShaderError::Read { .. }));
    }
}
