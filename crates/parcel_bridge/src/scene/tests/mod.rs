//! Cross-module scene scenarios
//!
//! Registry, scenes, host and renderer mirror exercised together.

mod positioning;
mod registry_reload;

use crate::core::BridgeConfig;
use crate::scene::{parse_manifests, SceneManifest, SceneRegistry};

/// Manifest set in the shape discovery services send
fn manifest_json(scenes: &[(i32, i32)]) -> String {
    let entries: Vec<String> = scenes
        .iter()
        .map(|(x, y)| {
            format!(
                r#"{{"id":"{x},{y}","basePosition":{{"x":{x},"y":{y}}},"parcels":[{{"x":{x},"y":{y}}}],"baseUrl":"http://localhost:8080/local-ipfs/contents/","contents":[{{"file":"game.js","hash":"Qm{x}{y}game"}},{{"file":"scene.json","hash":"Qm{x}{y}scene"}}],"owner":"0x0f5d2fb29fb7d3cfee444a200298f468908cc942"}}"#
            )
        })
        .collect();
    format!(r#"{{"parcelsToLoad":[{}]}}"#, entries.join(","))
}

/// Eleven single-parcel scenes along the x = -100 column plus one at -102
fn eleven_scenes() -> Vec<SceneManifest> {
    let mut coords = vec![(-102, 100)];
    coords.extend((100..110).map(|y| (-100, y)));
    parse_manifests(&manifest_json(&coords)).expect("fixture parses")
}

fn debug_registry() -> SceneRegistry {
    SceneRegistry::new(&BridgeConfig::default().with_debug(true))
}
