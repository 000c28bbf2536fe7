//! Parallax CLI
//!
//! Inspect configurations, validate layer shaders, dump frame plans and
//! render layered RGBD panoramas to PNG without a headset.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use parallax_core::math::{Mat4, Quat, Vec3};
use parallax_core::{
    EyeView, FrameContext, FramePlan, FrameSequence, LayerRole, RgbdPlayer, Scene, VideoStream,
    ViewerConfig, Viewport,
};
use parallax_gpu::{request_device, LayerRenderer, OffscreenTarget, RendererConfig};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod media;

use media::LoadedMedia;

/// Interpupillary distance used for stereo frames, in meters
const DEFAULT_IPD: f32 = 0.064;

/// Headroom beyond the farthest warped vertex
const FAR_PLANE_MARGIN: f32 = 1.1;

#[derive(Parser)]
#[command(name = "parallax")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Layered RGBD panorama tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved viewer configuration as TOML
    Config {
        /// Configuration file (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate the WGSL of every layer
    Shaders,

    /// Run one update and print the frame plan as JSON
    Plan {
        #[command(flatten)]
        frame: FrameArgs,
    },

    /// Render one frame offscreen and save it as PNG
    Render {
        #[command(flatten)]
        frame: FrameArgs,

        /// Output image
        #[arg(short, long, default_value = "frame.png")]
        output: PathBuf,

        /// Output width in pixels
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Output height in pixels
        #[arg(long, default_value = "720")]
        height: u32,
    },
}

/// Options shared by every command that drives the player
#[derive(Args)]
struct FrameArgs {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Media directory; a procedural panorama is used when omitted
    #[arg(short, long)]
    media: Option<PathBuf>,

    /// Frame rate of image-sequence video slots
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Render a single full-viewport eye instead of a stereo pair
    #[arg(long)]
    mono: bool,

    /// Head position in world space
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    head: Option<Vec<f32>>,

    /// Head yaw in degrees
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    yaw: f32,

    /// Number of visible layers, clamped to 1..=3
    #[arg(short, long, allow_negative_numbers = true)]
    layers: Option<i32>,

    /// Desaturation amount in [0, 1]
    #[arg(long, default_value = "0")]
    desaturation: f32,

    /// Tint each layer with its debug color
    #[arg(long)]
    tint: bool,

    /// Start playback and advance the video clocks by this many seconds
    #[arg(long)]
    time: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Config { config } => cmd_config(config.as_deref()),

        Commands::Shaders => cmd_shaders(),

        Commands::Plan { frame } => cmd_plan(&frame),

        Commands::Render {
            frame,
            output,
            width,
            height,
        } => cmd_render(&frame, &output, width, height),
    }
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ViewerConfig::default()),
    }
}

fn cmd_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    config.validate()?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_shaders() -> Result<()> {
    let mut failed = 0;
    for role in LayerRole::ALL {
        match parallax_gpu::shaders::validate(role) {
            Ok(module) => info!(
                "{}: ok ({} entry points)",
                role.name(),
                module.entry_points.len()
            ),
            Err(e) => {
                warn!("{}: {}", role.name(), e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} layer shaders failed validation", failed, LayerRole::ALL.len());
    }
    Ok(())
}

/// Player, scene and frame context for one frame
struct Session {
    player: RgbdPlayer<FrameSequence>,
    scene: Scene,
    context: FrameContext,
}

impl Session {
    fn new(args: &FrameArgs, aspect: f32) -> Result<Self> {
        let config = load_config(args.config.as_deref())?;

        let LoadedMedia { media, mut streams } = match &args.media {
            Some(dir) => media::load_dir(dir, args.fps)?,
            None => media::synthetic(512, 256)?,
        };

        if let Some(time) = args.time {
            // Clocks only move while playing
            for stream in [&mut streams.color, &mut streams.depth, &mut streams.alpha] {
                stream.play();
                stream.advance(time);
            }
        }

        let mut player = RgbdPlayer::new(config, media, streams)?;
        let mut scene = Scene::new();
        player.add_to_scene(&mut scene);

        if let Some(count) = args.layers {
            player.set_layer_count(count);
        }
        player.set_visual_effects(args.desaturation, args.tint);

        let head = match args.head.as_deref() {
            Some([x, y, z]) => Vec3::new(*x, *y, *z),
            _ => player.config().group.position,
        };
        let orientation = Quat::from_axis_angle(Vec3::UP, args.yaw.to_radians());
        let far = far_plane(player.config(), head);

        let context = if args.mono {
            let projection = perspective(aspect, far);
            FrameContext::Mono(EyeView::from_pose(
                head,
                orientation,
                projection,
                Viewport::FULL,
            ))
        } else {
            let projection = perspective(aspect * 0.5, far);
            FrameContext::stereo_from_head(head, orientation, DEFAULT_IPD, projection)
        };

        Ok(Self {
            player,
            scene,
            context,
        })
    }

    fn update(&mut self) -> FramePlan {
        self.player.update(&mut self.scene, &self.context)
    }
}

fn perspective(aspect: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(90f32.to_radians(), aspect, 0.05, far)
}

/// Far clip distance that keeps the most distant warped vertex visible
fn far_plane(config: &ViewerConfig, head: Vec3) -> f32 {
    let offset = if config.group.recenter_on_first_frame {
        0.0
    } else {
        (head - config.group.position).length()
    };
    (config.max_warp_radius() + offset) * FAR_PLANE_MARGIN
}

fn cmd_plan(args: &FrameArgs) -> Result<()> {
    let mut session = Session::new(args, 16.0 / 9.0)?;
    let plan = session.update();
    info!(
        "{} draws for {} eye(s)",
        plan.len(),
        session.context.eye_count()
    );
    println!("{}", plan.to_json()?);
    Ok(())
}

fn cmd_render(args: &FrameArgs, output: &Path, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        anyhow::bail!("output size must be non-zero, got {}x{}", width, height);
    }

    let mut session = Session::new(args, width as f32 / height as f32)?;
    let plan = session.update();

    let (device, queue) =
        pollster::block_on(request_device()).context("failed to acquire a GPU device")?;

    let player = &session.player;
    let mut renderer = LayerRenderer::new(
        &device,
        &queue,
        RendererConfig {
            color_format: OffscreenTarget::FORMAT,
            ..Default::default()
        },
        player.proxy(),
        player.media(),
        player.frames(),
    )?;

    let target = OffscreenTarget::new(&device, width, height);
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Parallax Frame Encoder"),
    });
    renderer.render(
        &device,
        &queue,
        &mut encoder,
        target.view(),
        target.size(),
        &plan,
        player.frames(),
    );
    queue.submit(std::iter::once(encoder.finish()));

    let pixels = target.read_rgba(&device, &queue)?;
    let image = image::RgbaImage::from_raw(width, height, pixels)
        .context("readback size does not match the target")?;
    image
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!("wrote {} ({} draws)", output.display(), plan.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_core::alpha::DisocclusionCurve;
    use parallax_core::warp::DepthSamples;
    use parallax_core::{Eye, LayerParams, TransformUpdater};

    fn background_clip(config: &ViewerConfig, head: Vec3, direction: Vec3) -> [f32; 4] {
        let projection = perspective(16.0 / 9.0, far_plane(config, head));
        let eye = EyeView::from_pose(head, Quat::IDENTITY, projection, Viewport::FULL);
        let world = Mat4::translation(head);
        let transform = TransformUpdater::compute(&world, Eye::Mono, &eye, head);

        let mut params = LayerParams::new(
            config.depth.epsilon(LayerRole::Background),
            config.depth.scale,
            DisocclusionCurve::default(),
        );
        params.mvp = transform.mvp;
        params.clip_position(
            LayerRole::Background,
            direction * config.proxy.radius,
            DepthSamples::new(0.0, 0.0, 0.0),
        )
    }

    #[test]
    fn test_zero_depth_background_is_not_clipped() {
        let config = ViewerConfig::default();
        let head = config.group.position;
        let clip = background_clip(&config, head, Vec3::new(0.0, 0.0, -1.0));
        assert!(clip[3] > 1700.0);
        assert!(clip[2] >= 0.0 && clip[2] <= clip[3], "clip {:?}", clip);
    }

    #[test]
    fn test_far_plane_follows_config() {
        let mut config = ViewerConfig::default();
        config.proxy.radius = 10.0;
        let far = far_plane(&config, config.group.position);
        assert!(far > config.max_warp_radius());

        config.group.recenter_on_first_frame = false;
        let moved = far_plane(&config, config.group.position + Vec3::new(0.0, 0.0, 50.0));
        assert!(moved > far + 50.0);
    }
}
