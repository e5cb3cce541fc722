use std::sync::Arc;
use std::thread;

use tessera_blocks::{BlockRegistry, Orientation, Voxel};
use tessera_chunk::{
    ChunkPersistence, ChunkSnapshot, CrossChunkLight, MemoryPersistence, WorldStore,
};
use tessera_blocks::LightChannel;
use tessera_world::{ChunkCoord, LocalPos, VoxelPos, WorldDims};

const BLOCKS: &str = r#"
[[blocks]]
name = "air"
solid = false
[[blocks]]
name = "stone"
[[blocks]]
name = "glowstone"
emission = 15
"#;

fn dims() -> WorldDims {
    WorldDims::new(8, 16, 4)
}

fn registry() -> Arc<BlockRegistry> {
    Arc::new(BlockRegistry::from_toml_str(BLOCKS).unwrap())
}

// Stone below y = 4, air above.
fn layered() -> Vec<Voxel> {
    let d = dims();
    (0..d.voxel_count())
        .map(|i| {
            let id = if d.local_at(i).y < 4 { 1 } else { 0 };
            Voxel::pack(id, 0, 0, Orientation::North)
        })
        .collect()
}

fn populated_store(persistence: Option<Arc<dyn ChunkPersistence>>) -> WorldStore {
    let store = WorldStore::new(dims(), registry(), persistence);
    for cx in 0..2 {
        for cz in 0..2 {
            let c = ChunkCoord::new(cx, cz);
            store.request(c, true).unwrap();
            store.install_generated(c, layered()).unwrap();
        }
    }
    store
}

#[test]
fn request_without_create_returns_none() {
    let store = WorldStore::new(dims(), registry(), None);
    assert!(store.request(ChunkCoord::new(1, 1), false).is_none());
    assert!(store.request(ChunkCoord::new(9, 1), true).is_none(), "outside world");
    let h = store.request(ChunkCoord::new(1, 1), true).unwrap();
    assert!(!h.read().is_populated());
    assert!(store.get(ChunkCoord::new(1, 1)).is_some());
}

#[test]
fn concurrent_creation_yields_one_instance() {
    let store = Arc::new(WorldStore::new(dims(), registry(), None));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let s = Arc::clone(&store);
            thread::spawn(move || s.request(ChunkCoord::new(2, 3), true).unwrap())
        })
        .collect();
    let chunks: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for c in &chunks[1..] {
        assert!(Arc::ptr_eq(&chunks[0], c));
    }
    assert_eq!(store.stats().created, 1);
}

#[test]
fn point_queries() {
    let store = populated_store(None);
    assert_eq!(store.get_voxel(VoxelPos::new(-1, 0, 0)), None);
    assert_eq!(store.get_voxel(VoxelPos::new(0, 16, 0)), None);
    assert_eq!(store.get_voxel(VoxelPos::new(20, 1, 1)), None, "chunk not loaded");
    assert_eq!(store.get_voxel(VoxelPos::new(9, 2, 9)).map(|v| v.id()), Some(1));
    assert!(store.is_voxel_solid(VoxelPos::new(9, 3, 9)));
    assert!(!store.is_voxel_solid(VoxelPos::new(9, 4, 9)));
    assert_eq!(store.get_light(VoxelPos::new(9, 4, 9)), Some(0));
}

#[test]
fn idle_edit_applies_and_notifies_border_neighbors() {
    let store = populated_store(None);
    let p = VoxelPos::new(7, 5, 3);
    assert!(store.modify_voxel(p, 2, Orientation::North));
    let v = store.get_voxel(p).unwrap();
    assert_eq!(v.id(), 2);
    assert_eq!(v.blocklight(), 15);
    assert!(store.is_modified(ChunkCoord::new(0, 0)));
    let mut rebuild = store.take_rebuild_requests();
    rebuild.sort();
    assert_eq!(rebuild, vec![ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)]);
    assert!(store.take_rebuild_requests().is_empty());
    assert!(!store.modify_voxel(p, 2, Orientation::North), "same id is a no-op");
}

#[test]
fn edit_during_build_is_queued() {
    let store = populated_store(None);
    let c = ChunkCoord::new(1, 1);
    let rev = store.begin_build(c).unwrap();
    assert!(store.begin_build(c).is_none());
    let p = VoxelPos::new(10, 6, 10);
    assert!(store.modify_voxel(p, 1, Orientation::North));
    assert_eq!(store.get_voxel(p).unwrap().id(), 0, "not applied yet");
    let handle = store.get(c).unwrap();
    assert!(handle.read().has_pending_edits());
    store.finish_build(c, rev);
    assert!(store.needs_rebuild(c));
    let reg = registry();
    assert_eq!(handle.write().apply_pending_edits(&reg), 1);
    assert_eq!(store.get_voxel(p).unwrap().id(), 1);
}

#[test]
fn structure_edits_create_missing_chunks() {
    let store = populated_store(None);
    let p = VoxelPos::new(20, 6, 4);
    assert!(store.queue_structure_edit(p, 1));
    let h = store.get(ChunkCoord::new(2, 0)).unwrap();
    assert!(!h.read().is_populated());
    assert!(h.read().has_pending_edits());
    assert!(!store.queue_structure_edit(VoxelPos::new(-3, 6, 4), 1));
}

#[test]
fn neighborhood_holds_populated_sides_only() {
    let store = populated_store(None);
    store.request(ChunkCoord::new(2, 1), true).unwrap();
    let n = store.neighborhood(ChunkCoord::new(1, 1));
    assert!(n.has_side(0), "-X populated");
    assert!(!n.has_side(1), "+X unpopulated");
    assert!(n.has_side(2), "-Z populated");
    assert!(!n.has_side(3), "+Z missing");
}

#[test]
fn light_delivery_skips_unlit_targets() {
    let store = populated_store(None);
    let m = CrossChunkLight {
        pos: VoxelPos::new(8, 5, 2),
        channel: LightChannel::Block,
        level: 9,
        previous: 0,
    };
    assert!(store.deliver_light(vec![m]).is_empty());
    let c = ChunkCoord::new(1, 0);
    let snap = store.get(c).unwrap().read().snapshot();
    assert!(store.install_lit(c, snap));
    assert_eq!(store.deliver_light(vec![m]), vec![c]);
    let h = store.get(c).unwrap();
    assert_eq!(h.write().take_inbound_light(), vec![m]);
}

#[test]
fn unload_saves_modified_and_reload_restores() {
    let mem = Arc::new(MemoryPersistence::new());
    let store = populated_store(Some(mem.clone()));
    let p = VoxelPos::new(3, 8, 3);
    store.modify_voxel(p, 1, Orientation::West);
    assert!(store.unload(ChunkCoord::new(0, 1)).unwrap());
    assert!(mem.is_empty(), "unmodified chunk is not written");
    assert!(store.unload(ChunkCoord::new(0, 0)).unwrap());
    assert_eq!(mem.len(), 1);
    assert!(store.get_voxel(p).is_none());

    let h = store.request(ChunkCoord::new(0, 0), true).unwrap();
    assert!(h.read().is_populated());
    let v = store.get_voxel(p).unwrap();
    assert_eq!(v.id(), 1);
    assert_eq!(v.orientation(), Orientation::West);
    assert_eq!(store.stats().restored, 1);
}

#[test]
fn corrupt_snapshot_falls_back_to_generation() {
    let mem = Arc::new(MemoryPersistence::new());
    mem.insert(ChunkSnapshot {
        coord: ChunkCoord::new(1, 1),
        voxels: vec![0; 5],
    });
    let mut bad_ids = vec![0u32; dims().voxel_count()];
    bad_ids[3] = 200;
    mem.insert(ChunkSnapshot {
        coord: ChunkCoord::new(2, 2),
        voxels: bad_ids,
    });
    let store = WorldStore::new(dims(), registry(), Some(mem));
    for c in [ChunkCoord::new(1, 1), ChunkCoord::new(2, 2)] {
        let h = store.request(c, true).unwrap();
        assert!(!h.read().is_populated());
    }
    assert_eq!(store.stats().restored, 0);
}

#[test]
fn save_modified_flushes_everything() {
    let mem = Arc::new(MemoryPersistence::new());
    let store = populated_store(Some(mem.clone()));
    store.modify_voxel(VoxelPos::new(1, 9, 1), 1, Orientation::North);
    store.modify_voxel(VoxelPos::new(12, 9, 12), 1, Orientation::North);
    assert_eq!(store.save_modified().unwrap(), 2);
    assert_eq!(mem.len(), 2);
    assert_eq!(store.save_modified().unwrap(), 0);
    let snap = mem.load(ChunkCoord::new(1, 1)).unwrap().unwrap();
    let d = dims();
    let w = snap.voxels[d.index(LocalPos::new(4, 9, 4))];
    assert_eq!(Voxel::from_raw(w).id(), 1);
}
