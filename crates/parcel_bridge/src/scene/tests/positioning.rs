//! Parcel placement through the registry

use super::debug_registry;
use crate::core::DEBUG_FLOOR_HEIGHT;
use crate::foundation::math::Vec3;
use crate::scene::parse_manifests;
use approx::assert_relative_eq;

fn three_parcel_scene(base: (i32, i32)) -> String {
    let (bx, by) = base;
    format!(
        r#"{{"parcelsToLoad":[{{"id":"xxx","basePosition":{{"x":{bx},"y":{by}}},"parcels":[{{"x":{},"y":{by}}},{{"x":{bx},"y":{by}}},{{"x":{},"y":{}}}],"baseUrl":"http://localhost:8080/local-ipfs/contents/","contents":[],"owner":"0x0f5d2fb29fb7d3cfee444a200298f468908cc942"}}]}}"#,
        bx - 1,
        bx - 1,
        by + 1
    )
}

fn offsets_for(base: (i32, i32)) -> Vec<Vec3> {
    let mut registry = debug_registry();
    let manifests = parse_manifests(&three_parcel_scene(base)).expect("fixture parses");
    registry.load_parcel_scenes(&manifests);
    let scene = registry.get("xxx").expect("loaded");
    let offsets = scene.read().parcel_offsets().to_vec();
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parcels_are_placed_around_the_origin() {
        let h = DEBUG_FLOOR_HEIGHT;
        let offsets = offsets_for((0, 0));
        assert_eq!(offsets.len(), 3);
        assert_relative_eq!(offsets[0], Vec3::new(-5.0, h, 5.0));
        assert_relative_eq!(offsets[1], Vec3::new(5.0, h, 5.0));
        assert_relative_eq!(offsets[2], Vec3::new(-5.0, h, 15.0));
    }

    #[test]
    fn placement_does_not_depend_on_the_base_parcel() {
        let h = DEBUG_FLOOR_HEIGHT;
        let offsets = offsets_for((90, 90));
        assert_relative_eq!(offsets[0], Vec3::new(-5.0, h, 5.0));
        assert_relative_eq!(offsets[1], Vec3::new(5.0, h, 5.0));
        assert_relative_eq!(offsets[2], Vec3::new(-5.0, h, 15.0));
        assert_eq!(offsets, offsets_for((0, 0)));
    }

    #[test]
    fn scene_origin_follows_the_base_parcel() {
        let mut registry = debug_registry();
        registry.load_parcel_scenes(&parse_manifests(&three_parcel_scene((90, 90))).expect("fixture parses"));
        let scene = registry.get("xxx").expect("loaded");
        assert_relative_eq!(scene.read().origin(), Vec3::new(900.0, 0.0, 900.0));
    }
}
