/// SR3D Terminal - software-rasterized scenes in the terminal
///
/// Controls:
///   - WASD / Arrow Keys: Rotate the meshes
///   - E/R: Roll rotation
///   - M: Cycle wireframe / fill / both
///   - Q/ESC: Quit
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, LevelFilter};
use nalgebra::Vector3;
use sr3d_core::scene::{CameraDesc, MeshDesc, MeshShape};
use sr3d_core::{Color4, RotationState, SceneDescription};
use sr3d_terminal::config::USAGE;
use sr3d_terminal::logging::{default_log_file, init_logging, LoggingConfig};
use sr3d_terminal::{render_snapshot, save_png, AppConfig, TerminalApp};

/// Snapshot size when `--size` is not given
const SNAPSHOT_SIZE: (usize, usize) = (640, 480);

fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    if config.help {
        println!("{USAGE}");
        return Ok(());
    }

    // The interactive view owns the terminal, so its records go to a file
    let interactive = config.snapshot.is_none() && config.save_scene.is_none();
    let log_file = match &config.log_file {
        Some(path) => Some(path.clone()),
        None if interactive => Some(default_log_file()),
        None => None,
    };
    init_logging(LoggingConfig {
        default_level: if interactive { LevelFilter::Warn } else { LevelFilter::Info },
        log_file: log_file.clone(),
        ..LoggingConfig::default()
    })
    .with_context(|| match &log_file {
        Some(path) => format!("failed to open log file {}", path.display()),
        None => "failed to set up logging".to_string(),
    })?;

    let description = match &config.input {
        Some(path) => describe_input(path)?,
        None => SceneDescription::demo(),
    };

    if let Some(path) = &config.save_scene {
        description
            .save(path)
            .with_context(|| format!("failed to save scene to {}", path.display()))?;
        return Ok(());
    }

    let scene = description.build().context("failed to build scene")?;

    if let Some(path) = &config.snapshot {
        let (width, height) = config.size.unwrap_or(SNAPSHOT_SIZE);
        let surface = render_snapshot(&scene, config.render_config(scene.render), width, height);
        return save_png(&surface, path);
    }

    let mut app = TerminalApp::new(scene, &config).context("failed to query the terminal")?;
    app.run().context("terminal session failed")?;
    Ok(())
}

/// A `.stl` path becomes a one-mesh scene, anything else is read as JSON
fn describe_input(path: &Path) -> Result<SceneDescription> {
    let is_stl = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("stl"));

    if !is_stl {
        return SceneDescription::load(path)
            .with_context(|| format!("failed to load scene {}", path.display()));
    }

    info!("viewing STL model {}", path.display());
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    Ok(SceneDescription::new(
        CameraDesc::default(),
        vec![MeshDesc {
            name,
            shape: MeshShape::Stl {
                path: path.to_path_buf(),
            },
            position: Vector3::zeros(),
            rotation: RotationState::new(0.3, 0.3, 0.0),
            color: Color4::WHITE,
        }],
    ))
}
