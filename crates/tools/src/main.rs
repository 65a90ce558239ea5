use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use formats::FeatureCollection;
use foundation::Viewport;
use foundation::math::LonLat;
use layers::TissotGrid;
use runtime::{Frame, Timers};
use tracing::info;
use tracing_subscriber::EnvFilter;
use viewer::projection::{EqualArea, MapProjection, Mercator};
use viewer::world::{BundledSource, HttpSource, WORLD_BUNDLE_PATH, WORLD_CDN_URL};
use viewer::{MapControls, MapKind, MapRenderer, WorldCache, WorldSource, render_svg};

#[derive(Parser, Debug)]
#[command(name = "perspective")]
#[command(version, about = "Render equal-area and Mercator views of the world", long_about = None)]
struct Cli {
    /// TopoJSON world file tried first
    #[arg(long, global = true, default_value = WORLD_BUNDLE_PATH)]
    world: PathBuf,

    /// Fallback download when the world file is unreadable
    #[arg(long, global = true, default_value = WORLD_CDN_URL)]
    cdn: String,

    /// Never fall back to the download
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write one SVG per map centered on a point
    Render {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, value_enum, default_value_t = KindArg::Both)]
        kind: KindArg,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Write the frames of an animated recenter
    Frames {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, allow_hyphen_values = true)]
        to_lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        to_lat: f64,
        #[arg(long, value_enum, default_value_t = KindArg::EqualArea)]
        kind: KindArg,
        #[arg(long, default_value_t = 30.0)]
        fps: f64,
        /// Output directory
        #[arg(short, long, default_value = "frames")]
        out: PathBuf,
    },
    /// Dump the distortion indicator grid as GeoJSON
    Tissot {
        #[arg(long, default_value_t = 20.0)]
        spacing: f64,
        #[arg(long, default_value_t = 4.5)]
        radius: f64,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct ViewArgs {
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    lon: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, default_value_t = 960.0)]
    width: f64,
    #[arg(long, default_value_t = 600.0)]
    height: f64,
    /// Draw the distortion circles
    #[arg(long)]
    tissot: bool,
    /// Hide the graticule
    #[arg(long)]
    no_graticule: bool,
}

impl ViewArgs {
    fn viewport(&self) -> Result<Viewport, String> {
        let valid = |side: f64| side.is_finite() && side >= 1.0;
        if !valid(self.width) || !valid(self.height) {
            return Err(format!("invalid size {}x{}", self.width, self.height));
        }
        Ok(Viewport::new(self.width, self.height))
    }

    fn center(&self) -> Result<LonLat, String> {
        check_lon_lat(self.lon, self.lat)
    }

    fn controls(&self) -> MapControls {
        MapControls {
            show_tissot: self.tissot,
            show_graticule: !self.no_graticule,
        }
    }
}

#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
enum KindArg {
    EqualArea,
    Mercator,
    Both,
}

impl KindArg {
    fn kinds(self) -> &'static [MapKind] {
        match self {
            KindArg::EqualArea => &[MapKind::EqualArea],
            KindArg::Mercator => &[MapKind::Mercator],
            KindArg::Both => &MapKind::ALL,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main(Cli::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn real_main(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Render { view, kind, out } => {
            let world = load_world(&cli.world, &cli.cdn, cli.offline).await;
            cmd_render(&world, view, kind, &out)
        }
        Command::Frames {
            view,
            to_lon,
            to_lat,
            kind,
            fps,
            out,
        } => {
            let target = check_lon_lat(to_lon, to_lat)?;
            let world = load_world(&cli.world, &cli.cdn, cli.offline).await;
            cmd_frames(world, view, target, kind, fps, &out)
        }
        Command::Tissot {
            spacing,
            radius,
            out,
        } => cmd_tissot(spacing, radius, out.as_deref()),
    }
}

async fn load_world(path: &Path, cdn: &str, offline: bool) -> Arc<FeatureCollection> {
    let mut sources: Vec<Arc<dyn WorldSource>> = vec![Arc::new(BundledSource::new(path))];
    if !offline {
        sources.push(Arc::new(HttpSource::new(cdn, reqwest::Client::new())));
    }
    WorldCache::new(sources).load_or_empty().await
}

fn cmd_render(
    world: &Arc<FeatureCollection>,
    view: ViewArgs,
    kind: KindArg,
    out: &Path,
) -> Result<(), String> {
    let viewport = view.viewport()?;
    let center = view.center()?;
    fs::create_dir_all(out).map_err(|e| format!("create {out:?}: {e}"))?;
    for &map in kind.kinds() {
        let svg = render_svg(
            map,
            viewport,
            center,
            view.controls(),
            TissotGrid::default(),
            world.clone(),
        );
        let path = out.join(format!("{}.svg", map.as_str()));
        fs::write(&path, svg).map_err(|e| format!("write {path:?}: {e}"))?;
        info!(map = map.as_str(), path = %path.display(), "rendered");
    }
    Ok(())
}

fn cmd_frames(
    world: Arc<FeatureCollection>,
    view: ViewArgs,
    target: LonLat,
    kind: KindArg,
    fps: f64,
    out: &Path,
) -> Result<(), String> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(format!("invalid fps {fps}"));
    }
    let viewport = view.viewport()?;
    let center = view.center()?;
    fs::create_dir_all(out).map_err(|e| format!("create {out:?}: {e}"))?;

    for &map in kind.kinds() {
        let frames = match map {
            MapKind::EqualArea => {
                animation_frames::<EqualArea>(&world, viewport, center, view.controls(), target, fps)
            }
            MapKind::Mercator => {
                animation_frames::<Mercator>(&world, viewport, center, view.controls(), target, fps)
            }
        };
        for (i, svg) in frames.iter().enumerate() {
            let path = out.join(frame_name(map, i));
            fs::write(&path, svg).map_err(|e| format!("write {path:?}: {e}"))?;
        }
        eprintln!("wrote {} frames for {} to {}", frames.len(), map.as_str(), out.display());
    }
    Ok(())
}

/// Every frame from the starting view until the map settles on `target`.
fn animation_frames<M: MapProjection>(
    world: &Arc<FeatureCollection>,
    viewport: Viewport,
    center: LonLat,
    controls: MapControls,
    target: LonLat,
    fps: f64,
) -> Vec<String> {
    let mut map = MapRenderer::<M>::mount(viewport, center, controls, Timers::new());
    map.attach_world(world.clone());
    let mut frame = Frame::new(0, 1.0 / fps);
    let mut frames = vec![map.to_svg()];
    if !map.recenter(target, frame.time) {
        return frames;
    }
    while map.is_animating() {
        frame = frame.next();
        map.advance(frame.time);
        frames.push(map.to_svg());
    }
    frames
}

fn frame_name(kind: MapKind, index: usize) -> String {
    format!("{}-{index:04}.svg", kind.as_str())
}

fn cmd_tissot(spacing: f64, radius: f64, out: Option<&Path>) -> Result<(), String> {
    if !spacing.is_finite() || spacing <= 0.0 {
        return Err(format!("invalid spacing {spacing}"));
    }
    if !radius.is_finite() || radius <= 0.0 || radius >= 90.0 {
        return Err(format!("invalid radius {radius}"));
    }
    let grid = TissotGrid::uniform(spacing, radius);
    let payload = serde_json::to_string_pretty(&grid.to_feature_collection().to_geojson_value())
        .map_err(|e| format!("json: {e}"))?;
    match out {
        Some(path) => {
            fs::write(path, payload).map_err(|e| format!("write {path:?}: {e}"))?;
            eprintln!("wrote {} ({} indicators)", path.display(), grid.generate().len());
        }
        None => println!("{payload}"),
    }
    Ok(())
}

fn check_lon_lat(lon: f64, lat: f64) -> Result<LonLat, String> {
    if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
        return Err(format!("invalid coordinate {lon}, {lat}"));
    }
    Ok(LonLat::new(lon, lat))
}
