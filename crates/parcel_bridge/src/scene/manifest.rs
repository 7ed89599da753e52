//! Scene manifests
//!
//! Descriptors handed to the registry by whatever discovers scenes. Accepted
//! either as a bare JSON array or wrapped as `{"parcelsToLoad": [...]}`.

use crate::parcel::ParcelCoord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Manifest parse and validation failures
#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    /// Not valid manifest JSON
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A scene lists the same parcel twice
    #[error("scene '{scene_id}' lists parcel {parcel} more than once")]
    DuplicateParcel {
        /// Offending scene
        scene_id: String,
        /// Repeated coordinate
        parcel: ParcelCoord,
    },
}

/// Content file to hash mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMapping {
    /// Path inside the scene
    pub file: String,
    /// Content hash appended to the base url
    pub hash: String,
}

/// One scene descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneManifest {
    /// Scene id; derived from the base position when empty
    #[serde(default)]
    pub id: String,
    /// Parcel the scene is anchored to
    pub base_position: ParcelCoord,
    /// Parcels the scene occupies
    #[serde(default)]
    pub parcels: Vec<ParcelCoord>,
    /// Prefix for content urls
    #[serde(default)]
    pub base_url: String,
    /// Content mappings
    #[serde(default)]
    pub contents: Vec<ContentMapping>,
    /// Owner address
    #[serde(default)]
    pub owner: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestSet {
    Wrapped {
        #[serde(rename = "parcelsToLoad")]
        parcels_to_load: Vec<SceneManifest>,
    },
    Bare(Vec<SceneManifest>),
}

impl SceneManifest {
    /// Descriptor with only a base position
    pub fn new(id: impl Into<String>, base_position: ParcelCoord) -> Self {
        Self {
            id: id.into(),
            base_position,
            parcels: Vec::new(),
            base_url: String::new(),
            contents: Vec::new(),
            owner: String::new(),
        }
    }

    /// Builder pattern: Set parcels
    pub fn with_parcels(mut self, parcels: impl IntoIterator<Item = ParcelCoord>) -> Self {
        self.parcels = parcels.into_iter().collect();
        self
    }

    /// Builder pattern: Set base url
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builder pattern: Add a content mapping
    pub fn with_content(mut self, file: impl Into<String>, hash: impl Into<String>) -> Self {
        self.contents.push(ContentMapping {
            file: file.into(),
            hash: hash.into(),
        });
        self
    }

    /// Registry key of the scene
    pub fn scene_id(&self) -> String {
        if self.id.is_empty() {
            self.base_position.to_string()
        } else {
            self.id.clone()
        }
    }

    /// Reject parcels listed more than once
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = HashSet::with_capacity(self.parcels.len());
        for parcel in &self.parcels {
            if !seen.insert(*parcel) {
                return Err(ManifestError::DuplicateParcel {
                    scene_id: self.scene_id(),
                    parcel: *parcel,
                });
            }
        }
        Ok(())
    }

    /// Hash of a content file (case-insensitive path match)
    pub fn content_hash(&self, file: &str) -> Option<&str> {
        self.contents
            .iter()
            .find(|c| c.file.eq_ignore_ascii_case(file))
            .map(|c| c.hash.as_str())
    }

    /// Url of a content file
    pub fn content_url(&self, file: &str) -> Option<String> {
        self.content_hash(file)
            .map(|hash| format!("{}{hash}", self.base_url))
    }
}

/// Parse a manifest set
pub fn parse_manifests(json: &str) -> Result<Vec<SceneManifest>, ManifestError> {
    Ok(match serde_json::from_str(json)? {
        ManifestSet::Wrapped { parcels_to_load } => parcels_to_load,
        ManifestSet::Bare(manifests) => manifests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_shapes() {
        let bare = r#"[{"id":"a","basePosition":{"x":1,"y":2},"parcels":[{"x":1,"y":2}]}]"#;
        let wrapped = format!(r#"{{"parcelsToLoad":{bare}}}"#);
        let a = parse_manifests(bare).expect("bare");
        let b = parse_manifests(&wrapped).expect("wrapped");
        assert_eq!(a, b);
        assert_eq!(a[0].base_position, ParcelCoord::new(1, 2));
        assert_eq!(a[0].parcels, vec![ParcelCoord::new(1, 2)]);
    }

    #[test]
    fn empty_id_derives_from_base_position() {
        let manifest = SceneManifest::new("", ParcelCoord::new(-3, 7));
        assert_eq!(manifest.scene_id(), "-3,7");
        assert_eq!(SceneManifest::new("x", ParcelCoord::new(0, 0)).scene_id(), "x");
    }

    #[test]
    fn repeated_parcels_are_rejected() {
        let manifest = SceneManifest::new("a", ParcelCoord::new(0, 0))
            .with_parcels([(0, 0), (0, 1), (0, 0)].map(ParcelCoord::from));
        assert!(matches!(
            manifest.validate(),
            Err(ManifestError::DuplicateParcel { parcel, .. }) if parcel == ParcelCoord::new(0, 0)
        ));
    }

    #[test]
    fn content_urls() {
        let manifest = SceneManifest::new("a", ParcelCoord::new(0, 0))
            .with_base_url("https://content/")
            .with_content("models/Tree.glb", "QmTree");
        assert_eq!(manifest.content_url("models/tree.glb").as_deref(), Some("https://content/QmTree"));
        assert_eq!(manifest.content_url("missing.png"), None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(parse_manifests("{"), Err(ManifestError::Json(_))));
        assert!(parse_manifests(r#"[{"id":"no-base"}]"#).is_err());
    }
}
