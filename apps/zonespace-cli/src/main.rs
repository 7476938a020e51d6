mod scene_file;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use glam::Vec3;
use tracing_subscriber::EnvFilter;
use zonespace_common::{mask, ObjectId};
use zonespace_scene::TraversalKeys;
use zonespace_scope::{scope_scene, ScopeConnection};
use zonespace_visibility::{render_scene, CameraState, RenderPass, Viewport};

use scene_file::BuiltScene;

#[derive(Parser)]
#[command(name = "zonespace-cli", about = "CLI tool for zonespace operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene file (JSON); the built-in demo scene when omitted
    #[arg(short, long)]
    scene: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and scene statistics
    Info,
    /// Dump zones, their owners, and their members
    Zones,
    /// Run a portal-frustum visibility pass from a camera position
    Visibility {
        /// Camera position as x,y,z
        #[arg(short, long, value_parser = parse_vec3, default_value = "5,5,-5")]
        eye: Vec3,
        /// Look-at target as x,y,z
        #[arg(short, long, value_parser = parse_vec3, default_value = "5,5,5")]
        target: Vec3,
        /// Vertical field of view in degrees
        #[arg(long, default_value = "60")]
        fov: f32,
    },
    /// Run a network scoping pass from a point
    Scope {
        /// Scope center as x,y,z
        #[arg(short, long, value_parser = parse_vec3, default_value = "5,5,5")]
        point: Vec3,
        /// Scope distance
        #[arg(short, long, default_value = "20")]
        distance: f32,
    },
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z, got {s:?}"));
    }
    let mut v = [0.0f32; 3];
    for (slot, part) in v.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse()
            .map_err(|e| format!("bad component {part:?}: {e}"))?;
    }
    Ok(Vec3::from(v))
}

struct PrintConnection<'a> {
    scene: &'a BuiltScene,
    count: usize,
}

impl ScopeConnection for PrintConnection<'_> {
    fn object_in_scope(&mut self, object: ObjectId) {
        println!("  in scope: {}", self.scene.object_name(object));
        self.count += 1;
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let desc = match &cli.scene {
        Some(path) => scene_file::load(path)?,
        None => scene_file::demo_scene(),
    };
    let scene = scene_file::build(&desc)?;

    match cli.command {
        Commands::Info => {
            println!("zonespace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("zones:   {}", scene.graph.zone_count());
            println!("portals: {}", scene.graph.portals().count());
            println!(
                "objects: {} ({} refs outstanding)",
                scene.graph.object_ids().count(),
                scene.graph.outstanding_refs()
            );
        }
        Commands::Zones => {
            for zone in 0..scene.graph.zone_count() {
                let owner = scene
                    .graph
                    .zone_owner_of(zone)
                    .map(|id| scene.object_name(id))
                    .unwrap_or_else(|| "<freed>".to_string());
                println!("zone {zone} ({}) owned by {owner}:", scene.zone_name(zone));
                for id in scene.graph.objects_in_zone(zone) {
                    println!("  {}", scene.object_name(id));
                }
            }
            for (pid, portal) in scene.graph.portals() {
                let [a, b] = portal.zones();
                println!(
                    "portal {} connects {} <-> {}",
                    pid.0,
                    scene.zone_name(a),
                    scene.zone_name(b)
                );
            }
        }
        Commands::Visibility { eye, target, fov } => {
            let camera = CameraState {
                position: eye,
                frustum: zonespace_geom::Frustum::perspective(
                    eye,
                    target,
                    Vec3::Y,
                    fov.to_radians(),
                    16.0 / 9.0,
                    0.1,
                    1000.0,
                ),
                viewport: Viewport::new(1280, 720),
            };
            let mut keys = TraversalKeys::new();
            let (state, visible) = render_scene(
                &scene.graph,
                &mut keys,
                camera,
                RenderPass::Standard,
                mask::ALL,
            );

            println!("Visibility from {eye} toward {target}:");
            for zone in state.rendered_zones() {
                let exact = if state.zone_state(zone).clip_planes_valid {
                    "exact"
                } else {
                    "conservative"
                };
                println!("  rendered: {} ({exact} clip planes)", scene.zone_name(zone));
            }
            for id in &visible {
                println!("  visible: {}", scene.object_name(*id));
            }
            println!("{} objects visible", visible.len());
        }
        Commands::Scope { point, distance } => {
            println!("Scoping around {point} within {distance}:");
            let mut keys = TraversalKeys::new();
            let mut conn = PrintConnection {
                scene: &scene,
                count: 0,
            };
            scope_scene(&scene.graph, &mut keys, point, distance, &mut conn);
            println!("{} objects in scope", conn.count);
        }
    }

    Ok(())
}
