/// TOML configuration: window, camera, terrain and block sections
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    camera::CameraSettings,
    error::{ConfigError, Error, StlError},
    geometry::Mesh,
    stl,
    terrain::{generate_map, Terrain, TerrainParams},
};

/// Block mesh looked up in the working directory when none is configured
pub const DEFAULT_BLOCK_PATH: &str = "cube.stl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Background as linear RGB
    pub clear_color: [f32; 3],
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            title: "voxplay".to_owned(),
            clear_color: [0.0, 0.42, 0.52],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stl_path: Option<PathBuf>,
}

impl BlockSettings {
    /// Load the block mesh.
    ///
    /// A configured path must be readable. Without one, `cube.stl` in the
    /// working directory is used if present, else the built-in unit cube.
    pub fn load(&self) -> Result<Mesh, StlError> {
        if let Some(path) = &self.stl_path {
            return stl::load_stl(path);
        }

        let fallback = Path::new(DEFAULT_BLOCK_PATH);
        if fallback.is_file() {
            return stl::load_stl(fallback);
        }

        tracing::warn!(path = DEFAULT_BLOCK_PATH, "no block STL found, using built-in cube");
        Ok(Mesh::cube(1.0))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowSettings,
    pub camera: CameraSettings,
    pub terrain: TerrainParams,
    pub block: BlockSettings,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            source,
            path: path.to_owned(),
        })?;
        let config: Config = toml::from_str(&toml).map_err(|source| ConfigError::Parse {
            source,
            path: path.to_owned(),
        })?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate, load the block mesh and generate the terrain
    pub fn build_terrain(&self) -> Result<Terrain, Error> {
        self.validate()?;

        let block = self.block.load()?;
        if block.is_empty() {
            tracing::warn!(name = %block.name, "block mesh has no triangles");
        }
        Ok(generate_map(&self.terrain, &block)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.terrain.validate()?;

        let camera = &self.camera;
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            return Err(ConfigError::Invalid {
                field: "camera.fov",
                reason: format!("{} is outside 0..180 degrees", camera.fov),
            });
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(ConfigError::Invalid {
                field: "camera.near",
                reason: format!(
                    "clip range {}..{} must be positive and increasing",
                    camera.near, camera.far
                ),
            });
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid {
                field: "window",
                reason: format!("{}x{} is empty", self.window.width, self.window.height),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.terrain.seed, 123);
        assert_eq!(config.window.clear_color, [0.0, 0.42, 0.52]);
        config.validate().unwrap();
    }

    #[test]
    fn test_example_file_spells_out_defaults() {
        let config: Config = toml::from_str(include_str!("../../voxplay.example.toml")).unwrap();
        let expected = Config {
            block: BlockSettings {
                stl_path: Some(PathBuf::from(DEFAULT_BLOCK_PATH)),
            },
            ..Config::default()
        };
        assert_eq!(config, expected);
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [terrain]
            seed = 9
            width = 16

            [camera]
            fov = 60.0

            [block]
            stl_path = "blocks/stone.stl"
            "#,
        )
        .unwrap();

        assert_eq!(config.terrain.seed, 9);
        assert_eq!(config.terrain.width, 16);
        assert_eq!(config.terrain.depth, 60);
        assert_eq!(config.camera.fov, 60.0);
        assert_eq!(config.camera.speed, 30.0);
        assert_eq!(
            config.block.stl_path.as_deref(),
            Some(Path::new("blocks/stone.stl"))
        );
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load(&missing),
            Err(ConfigError::Read { .. })
        ));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[terrain]\nseed = \"abc\"\n").unwrap();
        assert!(matches!(
            Config::load(&broken),
            Err(ConfigError::Parse { path, .. }) if path == broken
        ));

        let invalid = dir.path().join("invalid.toml");
        std::fs::write(&invalid, "[camera]\nnear = 5.0\nfar = 1.0\n").unwrap();
        assert!(matches!(
            Config::load(&invalid),
            Err(ConfigError::Invalid { field: "camera.near", .. })
        ));
    }

    #[test]
    fn test_configured_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("block.stl");
        let mut data = Vec::new();
        stl::write_binary_stl(&Mesh::cube(2.0), &mut data).unwrap();
        std::fs::write(&path, data).unwrap();

        let block = BlockSettings {
            stl_path: Some(path),
        };
        assert_eq!(block.load().unwrap(), Mesh::cube(2.0));

        let missing = BlockSettings {
            stl_path: Some(dir.path().join("nope.stl")),
        };
        assert!(matches!(missing.load(), Err(StlError::Io { .. })));
    }

    #[test]
    fn test_build_terrain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("block.stl");
        let mut data = Vec::new();
        stl::write_ascii_stl(&Mesh::cube(1.0), &mut data).unwrap();
        std::fs::write(&path, data).unwrap();

        let mut config = Config::default();
        config.terrain.width = 4;
        config.terrain.depth = 4;
        config.block.stl_path = Some(path);

        let terrain = config.build_terrain().unwrap();
        assert_eq!(terrain.heightmap.columns().count(), 16);
        assert_eq!(terrain.buffer.triangle_count(), terrain.block_count() * 12);

        config.terrain.octaves = 0;
        assert!(matches!(
            config.build_terrain(),
            Err(Error::Config(ConfigError::Invalid { field: "terrain.octaves", .. }))
        ));

        config.terrain.octaves = 8;
        config.block.stl_path = Some(dir.path().join("missing.stl"));
        assert!(matches!(config.build_terrain(), Err(Error::Stl(_))));
    }
}
