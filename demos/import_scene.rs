//! Import a scene file into a fresh world and print what was created.
//!
//! ```text
//! cargo run --example import_scene -- assets/room.gltf --verbose --scale 2
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::{Quat, Vec3};
use scene_registry::import::ParserPreset;
use scene_registry::sync::SyncSink;
use scene_registry::{
    ComponentKind, ImportOptions, Placement, RegistryConfig, SceneImporter, SyncView, World,
};

/// Scene import demo.
#[derive(Parser, Debug)]
#[command(
    name = "import_scene",
    about = "Import a scene file and print the created components",
    version
)]
struct Args {
    /// Scene file to import (.gltf or .glb).
    path: PathBuf,

    /// Report every per-resource note at info level.
    #[arg(long)]
    verbose: bool,

    /// Ask the parser for extra processing (generated normals).
    #[arg(long)]
    max_quality: bool,

    /// Translation applied to the imported root.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    position: Option<Vec<f32>>,

    /// Rotation about the Y axis, in degrees.
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    yaw: f32,

    /// Uniform scale applied to the imported root.
    #[arg(long, default_value = "1")]
    scale: f32,
}

impl Args {
    fn placement(&self) -> Placement {
        let position = match self.position.as_deref() {
            Some([x, y, z]) => Vec3::new(*x, *y, *z),
            _ => Vec3::ZERO,
        };
        Placement::default()
            .with_position(position)
            .with_rotation(Quat::from_rotation_y(self.yaw.to_radians()))
            .with_scale(Vec3::splat(self.scale))
    }

    fn options(&self) -> ImportOptions {
        let preset = if self.max_quality {
            ParserPreset::MaxQuality
        } else {
            ParserPreset::Fast
        };
        ImportOptions::default()
            .with_verbose(self.verbose)
            .with_preset(preset)
    }
}

/// Counts the bytes each registry would upload
#[derive(Default)]
struct UploadStats {
    uploads: Vec<(ComponentKind, usize, usize)>,
}

impl UploadStats {
    fn record<C: scene_registry::Component>(&mut self, view: SyncView<'_, C>) {
        self.uploads
            .push((view.kind(), view.dirty_ids().count(), view.as_bytes().len()));
    }
}

impl SyncSink for UploadStats {
    fn transforms(&mut self, view: SyncView<'_, scene_registry::scene::Transform>) {
        self.record(view);
    }

    fn meshes(&mut self, view: SyncView<'_, scene_registry::resources::Mesh>) {
        self.record(view);
    }

    fn textures(&mut self, view: SyncView<'_, scene_registry::resources::Texture>) {
        self.record(view);
    }

    fn materials(&mut self, view: SyncView<'_, scene_registry::resources::Material>) {
        self.record(view);
    }

    fn lights(&mut self, view: SyncView<'_, scene_registry::scene::Light>) {
        self.record(view);
    }

    fn entities(&mut self, view: SyncView<'_, scene_registry::scene::Entity>) {
        self.record(view);
    }
}

fn main() -> ExitCode {
    scene_registry::init_logging();
    let args = Args::parse();

    let world = World::new(&RegistryConfig::default());
    let scene = match SceneImporter::new().import_scene(
        &world,
        &args.path,
        &args.placement(),
        &args.options(),
    ) {
        Ok(scene) => scene,
        Err(err) => {
            log::error!("Import failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("Imported {}:", args.path.display());
    for handle in &scene.materials {
        if let Some(name) = world.materials.name_of(*handle) {
            println!("  material  {name}");
        }
    }
    for handle in &scene.textures {
        let name = world.textures.name_of(*handle).unwrap_or_default();
        let (width, height) = world
            .textures
            .read(*handle, |t| t.dimensions())
            .unwrap_or_default();
        println!("  texture   {name} ({width}x{height})");
    }
    for handle in &scene.meshes {
        let name = world.meshes.name_of(*handle).unwrap_or_default();
        let triangles = world
            .meshes
            .read(*handle, |m| m.triangle_count())
            .unwrap_or_default();
        println!("  mesh      {name} ({triangles} triangles)");
    }
    for handle in &scene.entities {
        let name = world.entities.name_of(*handle).unwrap_or_default();
        let origin = world
            .entity_world_matrix(*handle)
            .map(|m| m.transform_point3(Vec3::ZERO))
            .unwrap_or_default();
        println!("  entity    {name} at {origin}");
    }
    for handle in &scene.lights {
        if let Some(name) = world.lights.name_of(*handle) {
            println!("  light     {name}");
        }
    }

    let mut stats = UploadStats::default();
    world.synchronize(&mut stats);
    for (kind, dirty, bytes) in stats.uploads {
        println!("  sync      {kind}: {dirty} dirty, {bytes} bytes");
    }

    ExitCode::SUCCESS
}
