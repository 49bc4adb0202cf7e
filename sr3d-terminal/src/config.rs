/// Command-line and environment configuration
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use sr3d_core::{RenderConfig, RenderMode};

/// Default timer interval between frames
pub const DEFAULT_FRAME_MS: u64 = 50;

/// Environment variable overriding the frame interval, in milliseconds
pub const FRAME_MS_ENV: &str = "SR3D_FRAME_MS";

pub const USAGE: &str = "\
Usage: sr3d-terminal [SCENE.json | MODEL.stl] [options]

Options:
  --snapshot <out.png>   Render one frame to a PNG file and exit
  --size <WxH>           Surface size in pixels (default: terminal size)
  --mode <mode>          wireframe | fill | both (default: the scene's mode)
  --parallel             Fill triangle rows on the rayon pool
  --spin                 Rotate every mesh a little each frame
  --save-scene <out>     Write the scene description as JSON and exit
  --log-file <path>      Where the interactive view writes its log
                         (default: sr3d-terminal.log in the temp directory)
  -h, --help             Show this help

Without a scene argument the built-in demo scene is shown.";

/// What the user asked for
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Scene description (`.json`) or a single STL model
    pub input: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    pub save_scene: Option<PathBuf>,
    /// Pixel size; the terminal size is used when absent
    pub size: Option<(usize, usize)>,
    pub frame_interval: Duration,
    /// Overrides the scene's render mode
    pub mode: Option<RenderMode>,
    pub parallel: bool,
    pub spin: bool,
    pub log_file: Option<PathBuf>,
    pub help: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: None,
            snapshot: None,
            save_scene: None,
            size: None,
            frame_interval: Duration::from_millis(DEFAULT_FRAME_MS),
            mode: None,
            parallel: false,
            spin: false,
            log_file: None,
            help: false,
        }
    }
}

impl AppConfig {
    /// Read the process arguments and environment
    pub fn from_env() -> Result<Self> {
        let frame_ms = std::env::var(FRAME_MS_ENV).ok();
        Self::parse(std::env::args().skip(1), frame_ms.as_deref())
    }

    /// Parse arguments (without the program name) and the optional
    /// `SR3D_FRAME_MS` value
    pub fn parse(args: impl IntoIterator<Item = String>, frame_ms: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(ms) = frame_ms {
            let ms: u64 = ms
                .trim()
                .parse()
                .with_context(|| format!("{FRAME_MS_ENV} must be a whole number, got '{ms}'"))?;
            if ms == 0 {
                bail!("{FRAME_MS_ENV} must be greater than zero");
            }
            config.frame_interval = Duration::from_millis(ms);
        }

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => config.help = true,
                "--parallel" => config.parallel = true,
                "--spin" => config.spin = true,
                "--snapshot" => config.snapshot = Some(value(&mut args, &arg)?.into()),
                "--save-scene" => config.save_scene = Some(value(&mut args, &arg)?.into()),
                "--size" => config.size = Some(parse_size(&value(&mut args, &arg)?)?),
                "--mode" => config.mode = Some(parse_mode(&value(&mut args, &arg)?)?),
                "--log-file" => config.log_file = Some(value(&mut args, &arg)?.into()),
                flag if flag.starts_with("--") => bail!("unknown option '{flag}'"),
                path => {
                    if config.input.is_some() {
                        bail!("only one scene or model may be given");
                    }
                    config.input = Some(PathBuf::from(path));
                }
            }
        }

        Ok(config)
    }

    /// The scene's render settings with the command-line overrides applied
    pub fn render_config(&self, scene: RenderConfig) -> RenderConfig {
        RenderConfig {
            mode: self.mode.unwrap_or(scene.mode),
            parallel: scene.parallel || self.parallel,
            ..scene
        }
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next().ok_or_else(|| anyhow!("{flag} needs a value"))
}

fn parse_size(text: &str) -> Result<(usize, usize)> {
    let (w, h) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("size must look like 320x200, got '{text}'"))?;
    let width: usize = w.parse().with_context(|| format!("bad width '{w}'"))?;
    let height: usize = h.parse().with_context(|| format!("bad height '{h}'"))?;
    if width == 0 || height == 0 {
        bail!("size must be non-zero, got '{text}'");
    }
    Ok((width, height))
}

fn parse_mode(text: &str) -> Result<RenderMode> {
    match text {
        "wireframe" | "wire" => Ok(RenderMode::Wireframe),
        "fill" => Ok(RenderMode::Fill),
        "both" | "fill_and_wireframe" => Ok(RenderMode::FillAndWireframe),
        other => bail!("unknown render mode '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::parse(Vec::new(), None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.frame_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_full_command_line() {
        let config = AppConfig::parse(
            args(&[
                "scene.json", "--snapshot", "out.png", "--size", "320x200", "--mode", "both", "--parallel",
                "--spin", "--log-file", "run.log",
            ]),
            Some("20"),
        )
        .unwrap();
        assert_eq!(config.input, Some(PathBuf::from("scene.json")));
        assert_eq!(config.snapshot, Some(PathBuf::from("out.png")));
        assert_eq!(config.size, Some((320, 200)));
        assert_eq!(config.mode, Some(RenderMode::FillAndWireframe));
        assert!(config.parallel && config.spin);
        assert_eq!(config.log_file, Some(PathBuf::from("run.log")));
        assert_eq!(config.frame_interval, Duration::from_millis(20));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(AppConfig::parse(args(&["--size", "0x10"]), None).is_err());
        assert!(AppConfig::parse(args(&["--size", "wide"]), None).is_err());
        assert!(AppConfig::parse(args(&["--mode", "solid"]), None).is_err());
        assert!(AppConfig::parse(args(&["--snapshot"]), None).is_err());
        assert!(AppConfig::parse(args(&["--bogus"]), None).is_err());
        assert!(AppConfig::parse(args(&["a.json", "b.json"]), None).is_err());
        assert!(AppConfig::parse(Vec::new(), Some("0")).is_err());
        assert!(AppConfig::parse(Vec::new(), Some("fast")).is_err());
        assert!(AppConfig::parse(args(&["--log-file"]), None).is_err());
    }

    #[test]
    fn test_render_config_overrides_scene() {
        let scene = RenderConfig {
            mode: RenderMode::Fill,
            projection: sr3d_core::Projection {
                fov_y: 1.2,
                ..Default::default()
            },
            parallel: false,
        };

        // Nothing on the command line keeps the scene's settings
        let plain = AppConfig::default();
        assert_eq!(plain.render_config(scene), scene);

        let overridden = AppConfig::parse(args(&["--mode", "wire", "--parallel"]), None).unwrap();
        let config = overridden.render_config(scene);
        assert_eq!(config.mode, RenderMode::Wireframe);
        assert!(config.parallel);
        assert_eq!(config.projection, scene.projection);
    }
}
