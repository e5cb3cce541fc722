use proptest::prelude::*;
use tessera_blocks::config::{BlockDef, BlocksConfig};
use tessera_blocks::{BlockRegistry, MaterialClass};

const BLOCKS: &str = r#"
atlas_size_in_blocks = 4

[[blocks]]
name = "air"
solid = false

[[blocks]]
name = "grass"
active = true
textures = { side = 2, top = 7, bottom = 1 }

[[blocks]]
name = "water"
solid = false
transparent = true
opacity = 2
material = "water"

[[blocks]]
name = "glowstone"
emission = 15
stack_size = 16
"#;

fn def(name: &str, id: Option<u16>) -> BlockDef {
    BlockDef {
        name: name.into(),
        id,
        solid: None,
        transparent: None,
        opacity: None,
        material: None,
        textures: None,
        stack_size: None,
        emission: None,
        active: None,
    }
}

#[test]
fn loads_sample_registry() {
    let reg = BlockRegistry::from_toml_str(BLOCKS).expect("registry");
    assert_eq!(reg.atlas_size_in_blocks, 4);
    assert_eq!(reg.id_by_name("glowstone"), Some(3));
    let grass = reg.ty(1);
    assert!(grass.active);
    assert_eq!(grass.textures, [2, 2, 7, 1, 2, 2]);
    let water = reg.ty(2);
    assert_eq!(water.material, MaterialClass::Water);
    assert_eq!(water.opacity, 2);
    assert!(!water.solid);
    assert_eq!(reg.emission(3), 15);
    assert_eq!(reg.ty(3).stack_size, 16);
    assert!(reg.require("lava").is_err());
}

#[test]
fn rejects_ids_above_255() {
    let cfg = BlocksConfig {
        atlas_size_in_blocks: 16,
        blocks: vec![def("air", Some(0)), def("huge", Some(256))],
    };
    let err = BlockRegistry::from_config(cfg).unwrap_err();
    assert!(err.to_string().contains("<= 255"));
}

#[test]
fn rejects_unknown_material_and_gaps() {
    let bad = r#"
        [[blocks]]
        name = "x"
        material = "lava"
    "#;
    assert!(BlockRegistry::from_toml_str(bad).is_err());

    let cfg = BlocksConfig {
        atlas_size_in_blocks: 16,
        blocks: vec![def("air", Some(0)), def("far", Some(5))],
    };
    assert!(BlockRegistry::from_config(cfg).is_err());
}

#[test]
fn rejects_duplicates() {
    let cfg = BlocksConfig {
        atlas_size_in_blocks: 16,
        blocks: vec![def("air", None), def("air", None)],
    };
    assert!(BlockRegistry::from_config(cfg).is_err());
    let cfg = BlocksConfig {
        atlas_size_in_blocks: 16,
        blocks: vec![def("a", Some(0)), def("b", Some(0))],
    };
    assert!(BlockRegistry::from_config(cfg).is_err());
}

proptest! {
    // Ids given in any order still produce a dense, id-indexed table.
    #[test]
    fn explicit_ids_in_any_order(perm in Just((0u16..12).collect::<Vec<_>>()).prop_shuffle()) {
        let blocks = perm.iter().map(|&id| def(&format!("b{id}"), Some(id))).collect();
        let reg = BlockRegistry::from_config(BlocksConfig { atlas_size_in_blocks: 16, blocks }).unwrap();
        prop_assert_eq!(reg.blocks.len(), 12);
        for (i, ty) in reg.blocks.iter().enumerate() {
            prop_assert_eq!(ty.id as usize, i);
            prop_assert_eq!(reg.id_by_name(&ty.name), Some(ty.id));
        }
    }
}
