// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use building_map::{Building, EdgeType, LoadedBuilding};

mod drawings;

use drawings::ImageDrawings;

#[derive(Parser)]
#[command(name = "building-map")]
#[command(version)]
#[command(about = "Inspect and convert building map files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize every level: scale, size and element counts
    Info {
        path: PathBuf,
    },

    /// List the model names placed anywhere in the building
    Models {
        path: PathBuf,
    },

    /// Load a building map and write it back out
    Convert {
        path: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Output format; inferred from the output extension if omitted
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Format {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

fn load(path: &Path) -> Result<LoadedBuilding> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let drawings = ImageDrawings::new(base_dir);

    let loaded = match Format::from_path(path) {
        Format::Json => Building::from_json_str(&text, &drawings),
        Format::Yaml => Building::from_yaml_str(&text, &drawings),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "loaded {} with {} levels ({} warnings)",
        path.display(),
        loaded.building.levels.len(),
        loaded.warnings.len()
    );
    Ok(loaded)
}

fn write_info(building: &Building, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "building {}", building.name)?;
    for level in building.levels.iter() {
        write!(out, "{}: elevation {} m, ", level.name, level.elevation)?;
        match level.drawing_filename() {
            Some(filename) => writeln!(
                out,
                "drawing {filename} ({} x {} px)",
                level.drawing_width(),
                level.drawing_height()
            )?,
            None => writeln!(out, "no drawing")?,
        }
        writeln!(
            out,
            "  {:.5} m/px, {:.2} x {:.2} m",
            level.meters_per_pixel(),
            level.x_meters(),
            level.y_meters()
        )?;
        write!(out, "  {} vertices", level.vertices().len())?;
        for edge_type in EdgeType::ALL {
            write!(
                out,
                ", {} {}",
                level.edges_of_type(edge_type).count(),
                edge_type.container_name()
            )?;
        }
        writeln!(
            out,
            ", {} floors, {} models, {} fiducials, {} tags, {} layers",
            level.polygons().len(),
            level.models().len(),
            level.fiducials().len(),
            level.tags().len(),
            level.layers().len()
        )?;
    }
    Ok(())
}

fn write_models(building: &Building, out: &mut dyn Write) -> io::Result<()> {
    for name in building.model_names() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

fn convert(path: &Path, output: &Path, format: Option<Format>) -> Result<()> {
    let building = load(path)?.building;
    let format = format.unwrap_or_else(|| Format::from_path(output));
    let contents = match format {
        Format::Yaml => building.to_yaml_string(),
        Format::Json => building.to_json_string(),
    }
    .context("serializing building")?;
    fs::write(output, contents).with_context(|| format!("writing {}", output.display()))?;
    log::info!("wrote {} as {format:?}", output.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Info { path } => write_info(&load(&path)?.building, &mut out)?,
        Commands::Models { path } => write_models(&load(&path)?.building, &mut out)?,
        Commands::Convert {
            path,
            output,
            format,
        } => convert(&path, &output, format)?,
    }
    Ok(())
}
