//! Entry point for Astrocat.
//! Logging + CLI, then hands over to the platform event loop.

use anyhow::{Context, Result, bail};
use asset::MeshResolution;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use platform::PlatformConfig;

fn cli() -> Command {
    Command::new("astrocat")
        .about("Articulated space-suit cat, posed and animated in a window")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("gpu-backend")
                .long("gpu-backend")
                .help("auto, vulkan, dx12, metal or gl")
                .default_value("auto")
                .action(ArgAction::Set)
                .num_args(1),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .help("Window size as WIDTHxHEIGHT")
                .action(ArgAction::Set)
                .num_args(1),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .help("Window width, overrides --size")
                .value_parser(value_parser!(u32))
                .action(ArgAction::Set)
                .num_args(1),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .help("Window height, overrides --size")
                .value_parser(value_parser!(u32))
                .action(ArgAction::Set)
                .num_args(1),
        )
        .arg(
            Arg::new("show-fps")
                .long("show-fps")
                .help("Show frames per second in the panel and the title bar")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("walk")
                .long("walk")
                .help("Start with the walk cycle running")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("cylinder-sides")
                .long("cylinder-sides")
                .help("Sides of the cylinder mesh")
                .value_parser(value_parser!(u32))
                .default_value("20")
                .action(ArgAction::Set)
                .num_args(1),
        )
        .arg(
            Arg::new("sphere-bands")
                .long("sphere-bands")
                .help("Sphere tessellation as LATxLONG bands")
                .default_value("20x20")
                .action(ArgAction::Set)
                .num_args(1),
        )
}

fn parse_backend(val: &str) -> wgpu::Backends {
    match val.to_ascii_lowercase().as_str() {
        "auto" => wgpu::Backends::all(),
        "vulkan" | "vk" => wgpu::Backends::VULKAN,
        "dx12" | "d3d12" => wgpu::Backends::DX12,
        "metal" | "mtl" => wgpu::Backends::METAL,
        "gl" | "opengl" | "gles" => wgpu::Backends::GL,
        other => {
            log::warn!("Unknown backend '{}', falling back to auto.", other);
            wgpu::Backends::all()
        }
    }
}

/// `"1280x720"` (or `X`) into a pair.
fn parse_pair(val: &str) -> Result<(u32, u32)> {
    let Some((a, b)) = val.split_once('x').or_else(|| val.split_once('X')) else {
        bail!("expected AxB, got '{val}'");
    };
    let a = a.trim().parse().with_context(|| format!("bad number in '{val}'"))?;
    let b = b.trim().parse().with_context(|| format!("bad number in '{val}'"))?;
    Ok((a, b))
}

fn config_from(matches: &ArgMatches) -> Result<PlatformConfig> {
    let defaults = PlatformConfig::default();

    let (mut width, mut height) = (defaults.width, defaults.height);
    if let Some(size) = matches.get_one::<String>("size") {
        (width, height) = parse_pair(size).context("invalid --size")?;
    }
    if let Some(&w) = matches.get_one::<u32>("width") {
        width = w;
    }
    if let Some(&h) = matches.get_one::<u32>("height") {
        height = h;
    }

    let (sphere_lat, sphere_long) = matches
        .get_one::<String>("sphere-bands")
        .map(|bands| parse_pair(bands))
        .transpose()
        .context("invalid --sphere-bands")?
        .unwrap_or((defaults.resolution.sphere_lat, defaults.resolution.sphere_long));
    let resolution = MeshResolution {
        cylinder_sides: matches
            .get_one::<u32>("cylinder-sides")
            .copied()
            .unwrap_or(defaults.resolution.cylinder_sides),
        sphere_lat,
        sphere_long,
    };
    resolution.validate()?;

    Ok(PlatformConfig {
        backends: matches
            .get_one::<String>("gpu-backend")
            .map_or(defaults.backends, |b| parse_backend(b)),
        show_fps: matches.get_flag("show-fps"),
        width: width.max(1),
        height: height.max(1),
        start_walking: matches.get_flag("walk"),
        resolution,
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config_from(&cli().get_matches())?;
    log::info!(
        "Starting Astrocat. Backend: {:?}, show_fps={}, window_size={}x{}, walk={}, mesh={:?}",
        config.backends,
        config.show_fps,
        config.width,
        config.height,
        config.start_walking,
        config.resolution
    );

    platform::run(config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<PlatformConfig> {
        let matches = cli().try_get_matches_from(std::iter::once("astrocat").chain(args.iter().copied()))?;
        config_from(&matches)
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.backends, wgpu::Backends::all());
        assert_eq!((config.width, config.height), (1280, 720));
        assert!(!config.show_fps);
        assert!(!config.start_walking);
        assert_eq!(config.resolution, MeshResolution::default());
    }

    #[test]
    fn size_then_single_axis_override() {
        let config = parse(&["--size", "800X600", "--height", "0"]).unwrap();
        assert_eq!((config.width, config.height), (800, 1));
    }

    #[test]
    fn flags_and_backend() {
        let config = parse(&["--gpu-backend", "VK", "--show-fps", "--walk"]).unwrap();
        assert_eq!(config.backends, wgpu::Backends::VULKAN);
        assert!(config.show_fps);
        assert!(config.start_walking);
        assert_eq!(parse_backend("nonsense"), wgpu::Backends::all());
    }

    #[test]
    fn mesh_resolution_options() {
        let config = parse(&["--cylinder-sides", "8", "--sphere-bands", "6x12"]).unwrap();
        assert_eq!(
            config.resolution,
            MeshResolution {
                cylinder_sides: 8,
                sphere_lat: 6,
                sphere_long: 12,
            }
        );
        assert!(parse(&["--cylinder-sides", "2"]).is_err());
        assert!(parse(&["--sphere-bands", "20"]).is_err());
        assert!(parse(&["--sphere-bands", "4294967295x4294967295"]).is_err());
        assert!(parse(&["--size", "wide"]).is_err());
    }
}
