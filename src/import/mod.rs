//! Scene import: parse an asset file and compose it into a [`World`].
//!
//! Parsing is delegated to an [`AssetParser`] picked by file extension. The
//! resulting [`AssetScene`] is composed into the registries in two passes:
//! flat resources first (materials, deduplicated textures, meshes), then the
//! node hierarchy (transforms and entities), then explicit lights.
//!
//! A failing resource is logged and skipped; only an unsupported or
//! unparseable file fails the whole import.

mod asset;
mod compose;
mod error;
#[cfg(feature = "gltf")]
mod gltf;
mod parser;

pub use asset::{
    AssetLight, AssetMaterial, AssetMesh, AssetNode, AssetScene, AssetTexture, LightKind,
    TextureSlot,
};
pub use error::{ImportError, ImportResult};
#[cfg(feature = "gltf")]
pub use gltf::GltfParser;
pub use parser::{AssetParser, ParseError, ParserPreset};

use std::fmt;
use std::path::Path;

use crate::scene::{Placement, Scene};
use crate::World;
use compose::Composer;

/// Options controlling one import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportOptions {
    /// Report per-resource diagnostics at info level instead of debug
    pub verbose: bool,
    pub preset: ParserPreset,
}

impl ImportOptions {
    /// Build options from textual flags: `verbose`, `max_quality`.
    ///
    /// Unknown flags are logged and ignored.
    pub fn from_flags<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        for flag in flags {
            match flag.as_ref() {
                "verbose" => options.verbose = true,
                "max_quality" => options.preset = ParserPreset::MaxQuality,
                other => log::warn!("Ignoring unknown import flag \"{other}\""),
            }
        }
        options
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_preset(mut self, preset: ParserPreset) -> Self {
        self.preset = preset;
        self
    }
}

/// Import-time logging. Notes follow the verbose flag; problems always warn.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Diagnostics {
    verbose: bool,
}

impl Diagnostics {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn note(&self, message: impl fmt::Display) {
        if self.verbose {
            log::info!("{message}");
        } else {
            log::debug!("{message}");
        }
    }

    pub fn problem(&self, error: &ImportError) {
        log::warn!("{error}");
    }
}

/// Picks a parser for a file and composes its contents into a [`World`]
pub struct SceneImporter {
    parsers: Vec<Box<dyn AssetParser>>,
}

impl Default for SceneImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneImporter {
    /// Importer with every built-in parser registered
    pub fn new() -> Self {
        let importer = Self::empty();
        #[cfg(feature = "gltf")]
        let importer = importer.with_parser(GltfParser);
        importer
    }

    /// Importer without any parser
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parser(mut self, parser: impl AssetParser + 'static) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }

    /// Parser registered for the extension of `path`
    pub fn parser_for(&self, path: &Path) -> Option<&dyn AssetParser> {
        let extension = path.extension()?.to_str()?;
        self.parsers
            .iter()
            .find(|parser| parser.accepts(extension))
            .map(|parser| &**parser)
    }

    /// Parse the file at `path` and compose it into `world`.
    ///
    /// The placement is applied once, to the root of the imported hierarchy.
    pub fn import_scene(
        &self,
        world: &World,
        path: impl AsRef<Path>,
        placement: &Placement,
        options: &ImportOptions,
    ) -> ImportResult<Scene> {
        let path = path.as_ref();
        let Some(parser) = self.parser_for(path) else {
            return Err(ImportError::UnsupportedAsset {
                path: path.to_path_buf(),
            });
        };

        log::info!("Importing \"{}\" with {} parser", path.display(), parser.name());
        let asset = parser
            .parse(path, options.preset)
            .map_err(|err| ImportError::ExternalParseFailure {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;

        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(self.import_asset(world, &asset, directory, placement, options))
    }

    /// Compose an already parsed asset into `world`.
    ///
    /// Texture references are resolved against `directory`.
    pub fn import_asset(
        &self,
        world: &World,
        asset: &AssetScene,
        directory: &Path,
        placement: &Placement,
        options: &ImportOptions,
    ) -> Scene {
        let scene = Composer::new(world, directory, Diagnostics::new(options.verbose))
            .compose(asset, placement);
        log::info!(
            "Imported {} materials, {} textures, {} meshes, {} transforms, {} entities, {} lights",
            scene.materials.len(),
            scene.textures.len(),
            scene.meshes.len(),
            scene.transforms.len(),
            scene.entities.len(),
            scene.lights.len(),
        );
        scene
    }
}

/// Import `path` into `world` with the built-in parsers
pub fn import_scene(
    world: &World,
    path: impl AsRef<Path>,
    placement: &Placement,
    options: &ImportOptions,
) -> ImportResult<Scene> {
    SceneImporter::new().import_scene(world, path, placement, options)
}
