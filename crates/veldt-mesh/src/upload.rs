//! The seam between mesh construction and the graphics collaborator.
//!
//! The core never touches graphics-API state: it hands finished mesh data to
//! a [`MeshUpload`] backend exactly once and afterwards only holds the opaque
//! handle until told to release it.

use std::collections::HashSet;

use crate::data::{FeatureMeshData, TerrainMeshData};

/// Opaque identifier for an uploaded mesh, issued by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Mesh upload/release backend provided by the rendering collaborator.
pub trait MeshUpload {
    /// Consume a finished terrain mesh and return its handle.
    fn upload_terrain(&mut self, data: TerrainMeshData) -> MeshHandle;

    /// Consume a finished feature mesh and return its handle.
    fn upload_feature(&mut self, data: FeatureMeshData) -> MeshHandle;

    /// Release a previously issued handle. Each handle is released at most
    /// once.
    fn release(&mut self, handle: MeshHandle);
}

/// Headless backend for tests and the demo binary.
///
/// Issues sequential handles and keeps upload/release accounting so tests
/// can assert the exactly-once release discipline.
#[derive(Debug, Default)]
pub struct NullUpload {
    next_id: u64,
    live: HashSet<u64>,
    uploads: u64,
    releases: u64,
    double_releases: u64,
    vertices_uploaded: u64,
}

impl NullUpload {
    /// Total meshes uploaded so far.
    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    /// Total handles released so far.
    pub fn releases(&self) -> u64 {
        self.releases
    }

    /// Handles currently live (uploaded and not released).
    pub fn live(&self) -> usize {
        self.live.len()
    }

    /// Release calls for handles that were not live. Always zero under the
    /// store contracts.
    pub fn double_releases(&self) -> u64 {
        self.double_releases
    }

    /// Total vertices across all uploads, for throughput reporting.
    pub fn vertices_uploaded(&self) -> u64 {
        self.vertices_uploaded
    }

    fn issue(&mut self, vertex_count: usize) -> MeshHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        self.uploads += 1;
        self.vertices_uploaded += vertex_count as u64;
        MeshHandle(id)
    }
}

impl MeshUpload for NullUpload {
    fn upload_terrain(&mut self, data: TerrainMeshData) -> MeshHandle {
        self.issue(data.vertices.len())
    }

    fn upload_feature(&mut self, data: FeatureMeshData) -> MeshHandle {
        self.issue(data.vertices.len())
    }

    fn release(&mut self, handle: MeshHandle) {
        if self.live.remove(&handle.0) {
            self.releases += 1;
        } else {
            self.double_releases += 1;
        }
    }
}
