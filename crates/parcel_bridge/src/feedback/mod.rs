//! Loading feedback
//!
//! Turns scene readiness notifications and renderer download counts into the
//! loading percentages shown while the world is not yet presented. Each metric
//! keeps its own high-water mark; both marks reset when rendering becomes
//! active.

use crate::events::{EventHandler, EventType, SceneEvent};
use crate::scene::LifecycleState;
use std::collections::BTreeMap;

/// High-water-mark progress of one counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressMetric {
    max: usize,
}

impl ProgressMetric {
    /// Percentage done for the current outstanding count.
    ///
    /// A new high-water mark reads as 0%.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn percentage(&mut self, current: usize) -> u8 {
        if current > self.max {
            self.max = current;
            return 0;
        }
        if self.max == 0 {
            return 100;
        }
        let done = 100.0 - (current as f64 * 100.0 / self.max as f64);
        done.floor().clamp(0.0, 100.0) as u8
    }

    /// Highest count observed since the last reset
    pub const fn high_water_mark(&self) -> usize {
        self.max
    }

    /// Forget the high-water mark
    pub fn reset(&mut self) {
        self.max = 0;
    }
}

/// Aggregates loading progress across scenes
#[derive(Debug, Default)]
pub struct LoadingFeedback {
    scenes: BTreeMap<String, usize>,
    components: ProgressMetric,
    downloads: ProgressMetric,
    active_downloads: usize,
    rendering_active: bool,
    message: Option<String>,
}

impl LoadingFeedback {
    /// Event types this handler listens to
    pub const INTERESTS: [EventType; 4] = [
        EventType::StateRefreshed,
        EventType::SceneUnloaded,
        EventType::AssetDownloadsChanged,
        EventType::RenderingStateChanged,
    ];

    /// Fresh aggregator, rendering inactive
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest feedback text, if anything is loading
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Components loading across every tracked scene
    pub fn components_loading(&self) -> usize {
        self.scenes.values().sum()
    }

    /// Renderer is presenting the world
    pub const fn rendering_active(&self) -> bool {
        self.rendering_active
    }

    fn refresh(&mut self) {
        if self.rendering_active {
            return;
        }
        let mut lines = Vec::new();
        let loading = self.components_loading();
        if loading > 0 {
            let pct = self.components.percentage(loading);
            lines.push(format!("Loading scenes {pct}%"));
        }
        if self.active_downloads > 0 {
            let pct = self.downloads.percentage(self.active_downloads);
            lines.push(format!("Downloading images, 3D models, and sounds {pct}%"));
        }
        if !lines.is_empty() {
            let text = lines.join("\n");
            log::debug!("loading feedback: {text}");
            self.message = Some(text);
        }
    }
}

impl EventHandler for LoadingFeedback {
    fn on_event(&mut self, event: &SceneEvent) -> bool {
        match event {
            SceneEvent::StateRefreshed {
                scene_id,
                pending,
                state,
            } => {
                match state {
                    LifecycleState::WaitingForComponents => {
                        self.scenes.insert(scene_id.clone(), *pending);
                    }
                    LifecycleState::Ready => {
                        self.scenes.remove(scene_id);
                    }
                }
                self.refresh();
            }
            SceneEvent::SceneUnloaded { scene_id } => {
                self.scenes.remove(scene_id);
            }
            SceneEvent::AssetDownloadsChanged { active } => {
                self.active_downloads = *active;
                self.refresh();
            }
            SceneEvent::RenderingStateChanged { active } => {
                self.rendering_active = *active;
                if *active {
                    self.scenes.clear();
                    self.components.reset();
                    self.downloads.reset();
                    self.message = None;
                }
            }
            SceneEvent::SceneLoaded { .. } | SceneEvent::SceneReady { .. } => {}
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refreshed(scene: &str, pending: usize) -> SceneEvent {
        SceneEvent::StateRefreshed {
            scene_id: scene.to_string(),
            pending,
            state: if pending == 0 {
                LifecycleState::Ready
            } else {
                LifecycleState::WaitingForComponents
            },
        }
    }

    #[test]
    fn percentage_formula() {
        let mut metric = ProgressMetric::default();
        assert_eq!(metric.percentage(4), 0);
        assert_eq!(metric.percentage(3), 25);
        assert_eq!(metric.percentage(1), 75);
        assert_eq!(metric.percentage(6), 0);
        assert_eq!(metric.percentage(5), 16);
        assert_eq!(metric.high_water_mark(), 6);
    }

    #[test]
    fn components_are_summed_across_scenes() {
        let mut feedback = LoadingFeedback::new();
        feedback.on_event(&refreshed("a", 2));
        feedback.on_event(&refreshed("b", 2));
        assert_eq!(feedback.components_loading(), 4);
        assert_eq!(feedback.message(), Some("Loading scenes 0%"));

        feedback.on_event(&refreshed("a", 1));
        assert_eq!(feedback.message(), Some("Loading scenes 25%"));

        feedback.on_event(&refreshed("a", 0));
        assert_eq!(feedback.components_loading(), 2);
    }

    #[test]
    fn downloads_are_tracked_separately() {
        let mut feedback = LoadingFeedback::new();
        feedback.on_event(&refreshed("a", 1));
        feedback.on_event(&SceneEvent::AssetDownloadsChanged { active: 10 });
        feedback.on_event(&SceneEvent::AssetDownloadsChanged { active: 5 });
        assert_eq!(
            feedback.message(),
            Some("Loading scenes 0%\nDownloading images, 3D models, and sounds 50%")
        );
    }

    #[test]
    fn rendering_activation_resets_high_water_marks() {
        let mut feedback = LoadingFeedback::new();
        feedback.on_event(&refreshed("a", 8));
        feedback.on_event(&SceneEvent::RenderingStateChanged { active: true });
        assert_eq!(feedback.message(), None);
        assert_eq!(feedback.components_loading(), 0);

        feedback.on_event(&refreshed("b", 2));
        assert_eq!(feedback.message(), None);

        feedback.on_event(&SceneEvent::RenderingStateChanged { active: false });
        feedback.on_event(&refreshed("b", 2));
        assert_eq!(feedback.message(), Some("Loading scenes 0%"));
        assert_eq!(feedback.components.high_water_mark(), 2);
    }
}
