/// voxplay - Perlin voxel terrain fly-through in the terminal
///
/// Controls:
///   - WASD: Move (Shift or caps for 3x speed)
///   - Mouse / Arrow Keys: Look around
///   - Q/ESC: Quit
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Error, WrapErr};
use tracing_subscriber::EnvFilter;
use voxplay_core::{stl, Config, Terrain};
use voxplay_terminal::TerminalApp;

/// Procedural voxel terrain viewer
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML config file; built-in defaults when omitted
    #[arg(long, short, global = true, env = "VOXPLAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate the terrain and fly around it (default)
    Run(TerrainArgs),
    /// Print what an STL file contains
    Info {
        path: PathBuf,
    },
    /// Generate the terrain and save it as an STL file
    Export {
        output: PathBuf,
        /// Write ASCII instead of binary STL
        #[arg(long)]
        ascii: bool,
        #[command(flatten)]
        terrain: TerrainArgs,
    },
}

/// Overrides for the `[terrain]` and `[block]` config sections
#[derive(Debug, Default, clap::Args)]
struct TerrainArgs {
    #[arg(long)]
    seed: Option<u32>,
    /// Columns along both horizontal axes
    #[arg(long)]
    size: Option<u32>,
    /// STL mesh stamped for every block
    #[arg(long)]
    block: Option<PathBuf>,
}

impl TerrainArgs {
    fn apply(self, config: &mut Config) {
        if let Some(seed) = self.seed {
            config.terrain.seed = seed;
        }
        if let Some(size) = self.size {
            config.terrain.width = size;
            config.terrain.depth = size;
        }
        if let Some(block) = self.block {
            config.block.stl_path = Some(block);
        }
    }
}

impl Args {
    /// Config file plus command line overrides
    fn config(path: Option<&Path>, overrides: TerrainArgs) -> Result<Config, Error> {
        let mut config = Config::load_or_default(path)?;
        overrides.apply(&mut config);
        Ok(config)
    }

    fn run(self) -> Result<(), Error> {
        let path = self.config.as_deref();

        match self.command.unwrap_or(Command::Run(TerrainArgs::default())) {
            Command::Run(overrides) => {
                let config = Self::config(path, overrides)?;
                let terrain = config.build_terrain()?;
                let mut app = TerminalApp::new(terrain, &config)?;
                app.run()?;
            }
            Command::Info { path } => info(&path)?,
            Command::Export {
                output,
                ascii,
                terrain: overrides,
            } => {
                let config = Self::config(path, overrides)?;
                let terrain = config.build_terrain()?;
                export(&terrain, &output, ascii)?;
            }
        }

        Ok(())
    }
}

fn info(path: &Path) -> Result<(), Error> {
    let mesh = stl::load_stl(path)?;
    let degenerate = mesh.triangles.iter().filter(|t| t.is_degenerate()).count();

    println!("file:       {}", path.display());
    println!("name:       {}", mesh.name);
    println!("triangles:  {}", mesh.len());
    println!("degenerate: {degenerate}");
    if let Some(bounds) = mesh.bounds() {
        let size = bounds.size();
        println!(
            "bounds:     ({}, {}, {}) .. ({}, {}, {})",
            bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
        );
        println!("size:       {} x {} x {}", size.x, size.y, size.z);
    }
    Ok(())
}

fn export(terrain: &Terrain, output: &Path, ascii: bool) -> Result<(), Error> {
    let mesh = terrain.buffer.to_mesh("voxplay terrain");
    let file = File::create(output)
        .wrap_err_with(|| format!("Could not create {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    if ascii {
        stl::write_ascii_stl(&mesh, &mut writer)?;
    } else {
        stl::write_binary_stl(&mesh, &mut writer)?;
    }
    writer.flush()?;

    tracing::info!(path = %output.display(), triangles = mesh.len(), ascii, "exported terrain");
    println!("wrote {} triangles to {}", mesh.len(), output.display());
    Ok(())
}

fn main() -> Result<(), Error> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    args.run()?;

    Ok(())
}
