//! Synchronization boundary between the registries and a renderer.
//!
//! [`World::synchronize`](crate::World::synchronize) regenerates the GPU
//! records of every dirty registry and hands a [`SyncView`] per type to a
//! [`SyncSink`]. Dirty state is cleared once the sink returns.

use crate::registry::SyncView;
use crate::resources::{Material, Mesh, Texture, Volume};
use crate::scene::{Camera, Entity, Light, Transform};

/// Receives GPU data for each component type that changed.
///
/// Every method defaults to a no-op so a sink only implements the types it
/// uploads. Methods are called in lock order, one registry at a time.
#[allow(unused_variables)]
pub trait SyncSink {
    fn cameras(&mut self, view: SyncView<'_, Camera>) {}
    fn transforms(&mut self, view: SyncView<'_, Transform>) {}
    fn meshes(&mut self, view: SyncView<'_, Mesh>) {}
    fn textures(&mut self, view: SyncView<'_, Texture>) {}
    fn materials(&mut self, view: SyncView<'_, Material>) {}
    fn lights(&mut self, view: SyncView<'_, Light>) {}
    fn volumes(&mut self, view: SyncView<'_, Volume>) {}
    fn entities(&mut self, view: SyncView<'_, Entity>) {}
}

/// Sink that ignores everything; used to flush dirty state
pub struct DiscardSink;

impl SyncSink for DiscardSink {}
