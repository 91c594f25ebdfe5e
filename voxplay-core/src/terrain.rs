/// Perlin heightmap terrain built by stamping a block mesh per height level
use std::time::Instant;

use nalgebra::Vector3;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::{buffer::VertexBuffer, error::ConfigError, geometry::Mesh};

/// Bound on `|min_height|`, `|fill_depth|` and `|height_stretch|`
pub const MAX_LEVEL: i32 = 1024;

/// Most blocks a single map may stamp
pub const MAX_BLOCKS: u64 = 4_000_000;

/// Heightmap generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub width: u32,
    pub depth: u32,
    /// Noise periods across the map, 1 to 64
    pub frequency: f64,
    /// 1 to 16
    pub octaves: u32,
    pub seed: u32,
    /// Multiplier from noise value to block levels
    pub height_stretch: f64,
    /// Surface heights are clamped to at least this level
    pub min_height: i32,
    /// Columns are filled down to, but not including, this level
    pub fill_depth: i32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            width: 60,
            depth: 60,
            frequency: 3.0,
            octaves: 8,
            seed: 123,
            height_stretch: 10.0,
            min_height: -3,
            fill_depth: -4,
        }
    }
}

impl TerrainParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: String| Err(ConfigError::Invalid { field, reason });

        if self.width == 0 || self.depth == 0 {
            return invalid(
                "terrain size",
                format!("{}x{} has no columns", self.width, self.depth),
            );
        }
        if u64::from(self.width) * u64::from(self.depth) > MAX_BLOCKS {
            return invalid(
                "terrain size",
                format!("{}x{} exceeds {MAX_BLOCKS} columns", self.width, self.depth),
            );
        }
        if !(1.0..=64.0).contains(&self.frequency) {
            return invalid(
                "terrain.frequency",
                format!("{} is outside 1..=64", self.frequency),
            );
        }
        if !(1..=16).contains(&self.octaves) {
            return invalid(
                "terrain.octaves",
                format!("{} is outside 1..=16", self.octaves),
            );
        }
        if !(self.height_stretch.abs() <= f64::from(MAX_LEVEL)) {
            return invalid(
                "terrain.height_stretch",
                format!("{} is outside -{MAX_LEVEL}..={MAX_LEVEL}", self.height_stretch),
            );
        }
        if self.min_height.unsigned_abs() > MAX_LEVEL as u32 {
            return invalid(
                "terrain.min_height",
                format!("{} is outside -{MAX_LEVEL}..={MAX_LEVEL}", self.min_height),
            );
        }
        if self.fill_depth.unsigned_abs() > MAX_LEVEL as u32 {
            return invalid(
                "terrain.fill_depth",
                format!("{} is outside -{MAX_LEVEL}..={MAX_LEVEL}", self.fill_depth),
            );
        }
        Ok(())
    }
}

/// Sum of `octaves` noise samples, doubling frequency and halving amplitude each step.
///
/// Not normalized: the result can exceed the single-octave range.
pub fn accumulated_octave_noise(perlin: &Perlin, x: f64, y: f64, octaves: u32) -> f64 {
    let mut result = 0.0;
    let mut frequency = 1.0;
    let mut amplitude = 1.0;

    for _ in 0..octaves {
        result += perlin.get([x * frequency, y * frequency]) * amplitude;
        frequency *= 2.0;
        amplitude *= 0.5;
    }

    result
}

/// Integer surface height per column, row-major over `x`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightMap {
    width: u32,
    depth: u32,
    heights: Vec<i32>,
}

impl HeightMap {
    pub fn generate(params: &TerrainParams) -> Result<Self, ConfigError> {
        params.validate()?;

        let perlin = Perlin::new(params.seed);
        let fx = f64::from(params.width) / params.frequency;
        let fy = f64::from(params.depth) / params.frequency;

        let mut heights = Vec::with_capacity(params.width as usize * params.depth as usize);
        for x in 0..params.width {
            for y in 0..params.depth {
                let noise = accumulated_octave_noise(
                    &perlin,
                    f64::from(x) / fx,
                    f64::from(y) / fy,
                    params.octaves,
                );
                let height = (noise * params.height_stretch) as i32;
                heights.push(height.max(params.min_height));
            }
        }

        Ok(Self {
            width: params.width,
            depth: params.depth,
            heights,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn get(&self, x: u32, y: u32) -> Option<i32> {
        if x >= self.width || y >= self.depth {
            return None;
        }
        self.heights
            .get(x as usize * self.depth as usize + y as usize)
            .copied()
    }

    /// `(x, y, height)` for every column
    pub fn columns(&self) -> impl Iterator<Item = (u32, u32, i32)> + '_ {
        let depth = self.depth;
        self.heights
            .iter()
            .enumerate()
            .map(move |(i, &h)| ((i / depth as usize) as u32, (i % depth as usize) as u32, h))
    }

    /// Lowest and highest surface level
    pub fn range(&self) -> (i32, i32) {
        self.heights
            .iter()
            .fold((i32::MAX, i32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }
}

/// Generated terrain geometry
#[derive(Debug, Clone)]
pub struct Terrain {
    pub buffer: VertexBuffer,
    pub heightmap: HeightMap,
    blocks: usize,
}

impl Terrain {
    pub fn block_count(&self) -> usize {
        self.blocks
    }
}

/// Stamp `block` at the origin, then once per column at the surface and
/// once per level below it down to `fill_depth`.
pub fn generate_map(params: &TerrainParams, block: &Mesh) -> Result<Terrain, ConfigError> {
    let started = Instant::now();
    let heightmap = HeightMap::generate(params)?;
    let first_fill = params.fill_depth.saturating_add(1);

    let total = 1 + heightmap
        .columns()
        .map(|(_, _, height)| 1 + u64::try_from(height.saturating_sub(first_fill)).unwrap_or(0))
        .sum::<u64>();
    if total > MAX_BLOCKS {
        return Err(ConfigError::Invalid {
            field: "terrain",
            reason: format!("{total} blocks exceed the limit of {MAX_BLOCKS}"),
        });
    }

    let mut blocks = Vec::with_capacity(total as usize);
    blocks.push(Vector3::zeros());
    for (x, y, height) in heightmap.columns() {
        blocks.push(Vector3::new(x as f32, y as f32, height as f32));
        for level in (first_fill..height).rev() {
            blocks.push(Vector3::new(x as f32, y as f32, level as f32));
        }
    }

    let mut buffer = VertexBuffer::with_capacity(blocks.len() * block.len() * 3);
    for offset in &blocks {
        buffer.append_mesh(block, offset);
    }

    let (lowest, highest) = heightmap.range();
    tracing::info!(
        seed = params.seed,
        blocks = blocks.len(),
        vertices = buffer.len(),
        lowest,
        highest,
        elapsed = ?started.elapsed(),
        "generated terrain"
    );

    Ok(Terrain {
        buffer,
        heightmap,
        blocks: blocks.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> TerrainParams {
        TerrainParams {
            width: 12,
            depth: 9,
            ..TerrainParams::default()
        }
    }

    #[test]
    fn test_heightmap_is_deterministic() {
        let a = HeightMap::generate(&small()).unwrap();
        let b = HeightMap::generate(&small()).unwrap();
        assert_eq!(a, b);

        let other = HeightMap::generate(&TerrainParams {
            seed: 7,
            ..small()
        })
        .unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn test_heightmap_clamps_low_columns() {
        let params = TerrainParams {
            height_stretch: 1000.0,
            min_height: -3,
            ..small()
        };
        let map = HeightMap::generate(&params).unwrap();
        let (lowest, highest) = map.range();
        assert_eq!(lowest, -3);
        assert!(highest > 0);
        assert!(map.columns().all(|(_, _, h)| h >= -3));
    }

    #[test]
    fn test_origin_column_sits_on_zero() {
        // Perlin noise vanishes on integer lattice points
        let map = HeightMap::generate(&small()).unwrap();
        assert_eq!(map.get(0, 0), Some(0));
        assert_eq!(map.get(12, 0), None);
        assert_eq!(map.columns().count(), 12 * 9);
        assert_eq!(map.columns().nth(10), Some((1, 1, map.get(1, 1).unwrap())));
    }

    #[test]
    fn test_block_count_matches_fill() {
        let params = small();
        let terrain = generate_map(&params, &Mesh::cube(1.0)).unwrap();

        let expected = 1 + terrain
            .heightmap
            .columns()
            .map(|(_, _, h)| 1 + (h - 1 - params.fill_depth).max(0) as usize)
            .sum::<usize>();
        assert_eq!(terrain.block_count(), expected);
        assert_eq!(terrain.buffer.triangle_count(), expected * 12);
    }

    #[test]
    fn test_flat_terrain() {
        let params = TerrainParams {
            width: 3,
            depth: 2,
            height_stretch: 0.0,
            fill_depth: -2,
            ..TerrainParams::default()
        };
        let terrain = generate_map(&params, &Mesh::cube(1.0)).unwrap();
        // origin block, then per column the surface at 0 and one fill block at -1
        assert_eq!(terrain.block_count(), 1 + 6 * 2);

        let lowest = terrain
            .buffer
            .positions()
            .iter()
            .map(|p| p.z)
            .fold(f32::INFINITY, f32::min);
        assert_eq!(lowest, -1.0);
    }

    #[test]
    fn test_invalid_params() {
        for params in [
            TerrainParams { width: 0, ..small() },
            TerrainParams { width: u32::MAX, depth: 2, ..small() },
            TerrainParams { frequency: 0.5, ..small() },
            TerrainParams { octaves: 17, ..small() },
            TerrainParams { height_stretch: f64::NAN, ..small() },
        ] {
            assert!(matches!(
                generate_map(&params, &Mesh::cube(1.0)),
                Err(ConfigError::Invalid { .. })
            ));
        }
    }

    #[test]
    fn test_extreme_levels_are_rejected() {
        let cases = [
            (TerrainParams { fill_depth: i32::MAX, ..small() }, "terrain.fill_depth"),
            (TerrainParams { fill_depth: i32::MIN, ..small() }, "terrain.fill_depth"),
            (TerrainParams { min_height: i32::MAX, ..small() }, "terrain.min_height"),
            (TerrainParams { height_stretch: 1e300, ..small() }, "terrain.height_stretch"),
        ];
        for (params, expected) in cases {
            match generate_map(&params, &Mesh::cube(1.0)) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_block_limit() {
        // every column filled from -1024 up to at least -3
        let params = TerrainParams {
            width: 100,
            depth: 100,
            fill_depth: -MAX_LEVEL,
            ..TerrainParams::default()
        };
        params.validate().unwrap();
        assert!(matches!(
            generate_map(&params, &Mesh::cube(1.0)),
            Err(ConfigError::Invalid { field: "terrain", .. })
        ));
    }

    #[test]
    fn test_fill_above_surface_adds_nothing() {
        let params = TerrainParams {
            width: 2,
            depth: 2,
            height_stretch: 0.0,
            fill_depth: MAX_LEVEL,
            ..TerrainParams::default()
        };
        let terrain = generate_map(&params, &Mesh::cube(1.0)).unwrap();
        assert_eq!(terrain.block_count(), 1 + 4);
    }
}
