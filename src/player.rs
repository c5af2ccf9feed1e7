use crate::analysis::{OnsetAnalyzer, OnsetResult};
use crate::audio::SpectrumSource;
use crate::visual::{SceneRegistry, Surface};

/// Brightness kept per idle frame, so the last picture fades out.
const IDLE_FADE: f32 = 0.92;

/// An attached input together with the analyzer reading it.
///
/// The analyzer owns the source; dropping the pipeline stops the stream.
pub struct AudioPipeline {
    label: String,
    analyzer: OnsetAnalyzer,
}

impl AudioPipeline {
    pub fn new(source: Box<dyn SpectrumSource>) -> Self {
        let label = source.label();
        tracing::info!(source = %label, bins = source.bin_count(), "audio source attached");
        Self {
            label,
            analyzer: OnsetAnalyzer::new(source),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn analyzer(&self) -> &OnsetAnalyzer {
        &self.analyzer
    }

    pub fn failure(&self) -> Option<String> {
        self.analyzer.source().failure()
    }

    pub fn teardown(self) {
        tracing::info!(source = %self.label, "audio source torn down");
        drop(self.analyzer);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// No source attached; nothing was analysed or animated.
    Idle,
    /// The source reported a fatal error and was torn down.
    SourceLost(String),
    Rendered(OnsetResult),
}

/// Frame driver: at most one pipeline feeding the live scene.
pub struct Player {
    pipeline: Option<AudioPipeline>,
    registry: SceneRegistry,
    surface: Surface,
    last_result: OnsetResult,
}

impl Player {
    /// Activates the registry's current scene at `w` x `h`.
    pub fn new(mut registry: SceneRegistry, w: usize, h: usize) -> Self {
        let mut surface = Surface::new(w, h);
        registry.resize(&mut surface);
        Self {
            pipeline: None,
            registry,
            surface,
            last_result: OnsetResult::default(),
        }
    }

    /// Replace the current input. The old pipeline is torn down first and the
    /// new one starts with a fresh analyzer.
    pub fn attach(&mut self, source: Box<dyn SpectrumSource>) {
        self.detach();
        self.pipeline = Some(AudioPipeline::new(source));
    }

    /// Tear down the current input, then open its replacement with `open`.
    ///
    /// At most one source is alive at any point. On error or `Ok(None)` the
    /// player is left idle. Returns whether a source was attached.
    pub fn reattach<F>(&mut self, open: F) -> anyhow::Result<bool>
    where
        F: FnOnce() -> anyhow::Result<Option<Box<dyn SpectrumSource>>>,
    {
        self.detach();
        let Some(source) = open()? else {
            return Ok(false);
        };
        self.pipeline = Some(AudioPipeline::new(source));
        Ok(true)
    }

    pub fn detach(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.teardown();
        }
        self.last_result = OnsetResult::default();
    }

    pub fn is_idle(&self) -> bool {
        self.pipeline.is_none()
    }

    pub fn pipeline(&self) -> Option<&AudioPipeline> {
        self.pipeline.as_ref()
    }

    pub fn source_label(&self) -> Option<&str> {
        self.pipeline.as_ref().map(AudioPipeline::label)
    }

    /// Adaptive threshold of the attached analyzer.
    pub fn threshold(&self) -> Option<f32> {
        self.pipeline
            .as_ref()
            .map(|p| p.analyzer().detector().threshold())
    }

    pub fn last_result(&self) -> OnsetResult {
        self.last_result
    }

    pub fn frame(&mut self, dt: f32) -> FrameOutcome {
        let Some(pipeline) = self.pipeline.as_mut() else {
            self.surface.dim(IDLE_FADE);
            return FrameOutcome::Idle;
        };

        if let Some(msg) = pipeline.failure() {
            tracing::warn!(source = %pipeline.label(), error = %msg, "audio source lost");
            self.detach();
            self.surface.dim(IDLE_FADE);
            return FrameOutcome::SourceLost(msg);
        }

        let result = pipeline.analyzer.update(dt);
        if result.event {
            tracing::debug!(flux = result.flux, mean_flux = result.mean_flux, "beat");
        }
        self.last_result = result;
        self.registry.update(dt, &result);
        self.registry.render(&mut self.surface);
        FrameOutcome::Rendered(result)
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.surface.resize(w, h);
        self.registry.resize(&mut self.surface);
    }

    pub fn next_scene(&mut self) -> bool {
        self.registry.next(&mut self.surface)
    }

    pub fn prev_scene(&mut self) -> bool {
        self.registry.prev(&mut self.surface)
    }

    pub fn set_scene(&mut self, index: usize) -> bool {
        self.registry.set_scene(index, &mut self.surface)
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SceneRegistry {
        &mut self.registry
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Detach the source and release the live scene.
    pub fn shutdown(&mut self) {
        self.detach();
        self.registry.dispose_current();
    }
}
