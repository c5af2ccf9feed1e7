mod scenes;
mod surface;

use crate::analysis::OnsetResult;
use thiserror::Error;

pub use scenes::{make_scenes, GridTunnel, OrbField, StarField, WaveTerrain, MAX_SCENE_DT};
pub use surface::{hsv_to_rgb, lerp_rgb, scale_rgb, smoothstep, Camera, Surface};

/// One self-contained animated visual style.
///
/// `update` is the only place animation state changes. `render` takes
/// `&self`, so drawing the same state twice always yields the same pixels.
pub trait Scene {
    fn name(&self) -> &'static str;
    /// Advance animation state by `dt` seconds using this frame's onset result.
    fn update(&mut self, dt: f32, audio: &OnsetResult);
    /// Draw the current state onto `surface`.
    fn render(&self, surface: &mut Surface);
    /// Adapt to the surface's dimensions, rebuilding resources released by
    /// `dispose` if needed, then draw immediately.
    fn resize(&mut self, surface: &mut Surface);
    /// Release every resource this scene owns.
    fn dispose(&mut self);
    fn is_disposed(&self) -> bool;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("scene registry needs at least one scene")]
    Empty,
}

type ChangeListener = Box<dyn FnMut(usize, usize)>;

/// Ordered set of scenes with exactly one live entry.
pub struct SceneRegistry {
    scenes: Vec<Box<dyn Scene>>,
    current: usize,
    on_change: Option<ChangeListener>,
}

/// Index of `query` in `names`: a plain index, then an exact
/// case-insensitive name, then a substring.
pub fn find_scene(names: &[&str], query: &str) -> Option<usize> {
    let q = query.trim();
    if let Ok(i) = q.parse::<usize>() {
        return (i < names.len()).then_some(i);
    }
    let q = q.to_lowercase();
    names
        .iter()
        .position(|n| n.to_lowercase() == q)
        .or_else(|| names.iter().position(|n| n.to_lowercase().contains(&q)))
}

impl SceneRegistry {
    pub fn new(scenes: Vec<Box<dyn Scene>>) -> Result<Self, RegistryError> {
        Self::with_start(scenes, 0)
    }

    /// Like `new`, but starts on `start` (falls back to 0 when out of range).
    /// The initial activation does not notify any listener.
    pub fn with_start(scenes: Vec<Box<dyn Scene>>, start: usize) -> Result<Self, RegistryError> {
        if scenes.is_empty() {
            return Err(RegistryError::Empty);
        }
        let current = if start < scenes.len() { start } else { 0 };
        Ok(Self {
            scenes,
            current,
            on_change: None,
        })
    }

    /// Called with `(index, count)` after every effective switch.
    pub fn set_listener(&mut self, listener: impl FnMut(usize, usize) + 'static) {
        self.on_change = Some(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_name(&self) -> &'static str {
        self.scenes[self.current].name()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.scenes.iter().map(|s| s.name()).collect()
    }

    /// Case-insensitive lookup by name, or a plain index.
    pub fn find(&self, query: &str) -> Option<usize> {
        find_scene(&self.names(), query)
    }

    /// Switch to scene `index`. Returns false (and does nothing) when the
    /// index is out of range or already current.
    pub fn set_scene(&mut self, index: usize, surface: &mut Surface) -> bool {
        if index >= self.scenes.len() || index == self.current {
            return false;
        }
        let from = self.current;
        self.scenes[from].dispose();
        self.current = index;
        self.scenes[index].resize(surface);
        tracing::info!(
            from = self.scenes[from].name(),
            to = self.scenes[index].name(),
            index,
            "scene switched"
        );
        let count = self.scenes.len();
        if let Some(listener) = self.on_change.as_mut() {
            listener(index, count);
        }
        true
    }

    pub fn next(&mut self, surface: &mut Surface) -> bool {
        let n = self.scenes.len();
        self.set_scene((self.current + 1) % n, surface)
    }

    pub fn prev(&mut self, surface: &mut Surface) -> bool {
        let n = self.scenes.len();
        self.set_scene((self.current + n - 1) % n, surface)
    }

    pub fn update(&mut self, dt: f32, audio: &OnsetResult) {
        self.scenes[self.current].update(dt, audio);
    }

    pub fn render(&self, surface: &mut Surface) {
        self.scenes[self.current].render(surface);
    }

    pub fn resize(&mut self, surface: &mut Surface) {
        self.scenes[self.current].resize(surface);
    }

    /// Shutdown teardown for the live scene.
    pub fn dispose_current(&mut self) {
        let scene = &mut self.scenes[self.current];
        if !scene.is_disposed() {
            scene.dispose();
        }
    }
}
