//! Parser front-ends that turn files into [`AssetScene`]s

use std::path::Path;

use super::AssetScene;

/// Post-processing effort requested from a parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserPreset {
    /// Minimal processing
    #[default]
    Fast,
    /// Generate missing data such as smooth normals
    MaxQuality,
}

/// Error produced by a parser, reported to the caller as-is
pub type ParseError = Box<dyn std::error::Error + Send + Sync>;

/// A file format front-end
pub trait AssetParser: Send + Sync {
    fn name(&self) -> &str;

    /// Lowercase file extensions handled by this parser, without the dot
    fn extensions(&self) -> &[&str];

    fn accepts(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    fn parse(&self, path: &Path, preset: ParserPreset) -> Result<AssetScene, ParseError>;
}
