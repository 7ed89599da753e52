//! Parcel host demo
//!
//! Loads a manifest set, runs a short scripted scene against the first scene
//! and mirrors everything into an in-process renderer over the loopback
//! transport.
//!
//! ```text
//! parcel_host [config.toml|config.ron] [manifests.json]
//! ```

use parcel_bridge::core::{BridgeConfig, Config};
use parcel_bridge::foundation::logging;
use parcel_bridge::foundation::math::Vec3;
use parcel_bridge::parcel::ParcelCoord;
use parcel_bridge::protocol::{LocalLoopbackTransport, QueryType, Ray, RaycastQuery};
use parcel_bridge::renderer::RendererMirror;
use parcel_bridge::scene::{
    parse_manifests, LifecycleState, ParcelScene, SceneError, SceneManifest,
    TEXTURE_CLASS_ID,
};
use parcel_bridge::{HostCommand, HostError, RendererEvent, SceneHost};

/// Ticks to run before giving up on readiness
const MAX_TICKS: usize = 16;

#[derive(thiserror::Error, Debug)]
enum AppError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("no scenes to run")]
    NoScenes,
}

impl From<SceneError> for AppError {
    fn from(err: SceneError) -> Self {
        Self::Host(err.into())
    }
}

struct Args {
    config: Option<String>,
    manifests: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let mut args = Self {
            config: None,
            manifests: None,
        };
        for arg in std::env::args().skip(1) {
            if arg.ends_with(".toml") || arg.ends_with(".ron") {
                args.config = Some(arg);
            } else {
                args.manifests = Some(arg);
            }
        }
        args
    }
}

fn load_config(path: Option<&str>) -> Result<BridgeConfig, AppError> {
    let Some(path) = path else {
        return Ok(BridgeConfig::default().with_debug(true));
    };
    let config = BridgeConfig::load_from_file(path).map_err(HostError::from)?;
    Ok(config)
}

fn load_manifests(path: Option<&str>) -> Result<Vec<SceneManifest>, AppError> {
    let Some(path) = path else {
        log::info!("no manifest given, using a single demo scene");
        return Ok(vec![SceneManifest::new("demo", ParcelCoord::new(0, 0))
            .with_parcels([ParcelCoord::new(0, 0), ParcelCoord::new(1, 0)])
            .with_base_url("http://localhost:8080/contents/")
            .with_content("images/tile.png", "QmTile")]);
    };
    let json = std::fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_string(),
        source,
    })?;
    let manifests = parse_manifests(&json).map_err(HostError::from)?;
    Ok(manifests)
}

/// A small scene: a parented pair, a textured floor tile and a ray cast
fn demo_script(scene: &mut ParcelScene) -> Result<(), SceneError> {
    scene.create_entity("floor")?;
    scene.update_entity_component("floor", "plane", "{}")?;
    scene.update_entity_component(
        "floor",
        "transform",
        r#"{"position":{"x":8,"y":0,"z":8},"rotation":{"x":0.7071068,"y":0,"z":0,"w":0.7071068},"scale":{"x":16,"y":16,"z":1}}"#,
    )?;

    scene.create_entity("lamp")?;
    scene.create_entity("bulb")?;
    scene.set_entity_parent("bulb", "lamp")?;
    scene.update_entity_component(
        "lamp",
        "transform",
        r#"{"position":{"x":4,"y":0,"z":4},"rotation":{"x":0,"y":0,"z":0,"w":1},"scale":{"x":1,"y":1,"z":1}}"#,
    )?;
    scene.update_entity_component("bulb", "sphere", r#"{"withCollisions":false}"#)?;

    scene.component_created("tile", TEXTURE_CLASS_ID, "texture")?;
    scene.component_updated("tile", r#"{"src":"images/tile.png"}"#)?;
    scene.attach_entity_component("floor", "texture", "tile")?;

    scene.query(RaycastQuery {
        query_id: "look-down".into(),
        query_type: QueryType::HitFirst,
        ray: Ray::new(Vec3::new(4.0, 10.0, 4.0), Vec3::new(0.0, -1.0, 0.0), 20.0),
    })?;
    scene.start()
}

fn run() -> Result<(), AppError> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    logging::init_with_level(&config.log_level);

    let manifests = load_manifests(args.manifests.as_deref())?;
    let mut host = SceneHost::new(&config)?;
    let (near, far) = LocalLoopbackTransport::new(config.transport.loopback_capacity);
    host.attach_transport(Box::new(near));

    host.submit(HostCommand::LoadParcelScenes(manifests))?;
    host.tick();

    let ids = host.registry().scene_ids();
    let first = ids.first().ok_or(AppError::NoScenes)?;
    log::info!("{} scenes loaded, scripting '{first}'", ids.len());

    let mut mirror = RendererMirror::new();
    for id in &ids {
        mirror.open_scene(id);
    }

    if let Some(scene) = host.registry().get(first) {
        demo_script(&mut scene.write())?;
    }

    for tick in 0..MAX_TICKS {
        let report = host.tick();
        let applied = mirror.pump(&far);
        log::debug!("tick {tick}: {report:?}, {applied} records applied");
        if let Some(message) = host.loading_message() {
            log::info!("{message}");
        }

        for event in mirror.complete_loads() {
            host.report(event)?;
        }
        let ready = host
            .registry()
            .get(first)
            .is_some_and(|scene| scene.read().readiness() == Some(LifecycleState::Ready));
        if ready {
            log::info!("'{first}' ready after {} ticks", tick + 1);
            break;
        }
    }
    host.report(RendererEvent::RenderingActivated)?;
    host.tick();

    let stats = mirror.stats();
    log::info!(
        "mirror applied {} records, rejected {}, discarded {}, corrupt {}",
        stats.applied,
        stats.rejected,
        stats.discarded,
        stats.corrupt
    );
    if let Some(scene) = mirror.scene(first) {
        log::info!(
            "'{first}' mirrored {} entities, {} pending queries",
            scene.graph().len(),
            scene.queries().len()
        );
        if let Some(position) = scene.graph().world_position("bulb") {
            log::info!("bulb sits at {position:?}");
        }
    }

    host.submit(HostCommand::UnloadAllScenes)?;
    host.tick();
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        log::error!("{err}");
        eprintln!("parcel_host: {err}");
        std::process::exit(1);
    }
}
