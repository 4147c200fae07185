use crate::config::VisualizerConfig;
use crate::graphics::{FrameView, RenderInstance, Renderer};
use crate::remote::{FetchKind, FetchOutcome, SnapshotSource};
use crate::scene::{SceneComposer, SceneList};
use crate::simulation::{
    Category, InterpolationClock, PerformanceTracker, ReconcileReport, SimulationState, WorldSnapshot,
};
use log::{debug, info, warn};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    /// Waiting for the clock to call for the next snapshot. This is also the
    /// interpolating steady state; there is no separate phase for it.
    Idle,
    /// A fetch cycle is in flight; rendering continues on the last good state.
    Fetching,
    /// Applying a fetched world to the registries.
    Reconciling,
}

/// What happened during one tick, for the caller's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSummary {
    pub frame: u64,
    pub phase: DriverPhase,
    pub interpolation_factor: f32,
    pub instances: usize,
    pub fetch_started: bool,
    pub reconciled: Option<ReconcileReport>,
    pub fetch_failed: bool,
}

/// Per-frame loop tying the clock, the registries, the composer and the
/// renderer to one asynchronous snapshot source.
///
/// At most one fetch cycle is outstanding. Registries are only mutated while
/// reconciling, which happens between resolutions, never during one.
pub struct FrameDriver<S: SnapshotSource> {
    state: SimulationState,
    clock: InterpolationClock,
    composer: SceneComposer,
    scene: SceneList,
    source: S,
    phase: DriverPhase,
    poll_categories: Vec<Category>,
    /// Render at the current position until a fresh snapshot lands, so a
    /// slow or failed fetch does not replay the previous interval. Failed
    /// fetches keep the hold, so entities stay frozen until one succeeds.
    hold_at_current: bool,
    instances: Vec<RenderInstance>,
    tracker: PerformanceTracker,
    frame: u64,
}

impl<S: SnapshotSource> FrameDriver<S> {
    pub fn new(config: &VisualizerConfig, source: S) -> Self {
        Self {
            state: SimulationState::new(),
            clock: InterpolationClock::new(config.timing.snapshot_interval()),
            composer: SceneComposer::new(config.scene.clone()),
            scene: SceneList::default(),
            source,
            phase: DriverPhase::Idle,
            poll_categories: config.sync.poll_categories.clone(),
            hold_at_current: false,
            instances: Vec::new(),
            tracker: PerformanceTracker::new(config.performance.timing_samples as usize),
            frame: 0,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn clock(&self) -> &InterpolationClock {
        &self.clock
    }

    pub fn scene(&self) -> &SceneList {
        &self.scene
    }

    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Instances handed to the renderer on the most recent tick.
    pub fn last_instances(&self) -> &[RenderInstance] {
        &self.instances
    }

    /// Pulls every category without stepping the model. Used right after
    /// the model has been initialized.
    pub fn request_initial_sync(&mut self) -> bool {
        self.begin_fetch(FetchKind::Initial)
    }

    /// Drops all session state ahead of a model re-initialization. A cycle
    /// already in flight still resolves, into the fresh state.
    pub fn reset(&mut self) {
        self.state.clear();
        self.composer.reset();
        self.scene = SceneList::default();
        self.clock.reset();
        self.hold_at_current = false;
        self.instances.clear();
        info!("Visualization state reset");
    }

    /// Runs one frame: resolves a finished fetch, advances the clock,
    /// possibly starts the next fetch, then renders unconditionally.
    pub fn tick(&mut self, delta: Duration, renderer: &mut dyn Renderer) -> FrameSummary {
        self.tracker.start_frame();
        self.frame += 1;

        let mut reconciled = None;
        let mut fetch_failed = false;

        if self.phase == DriverPhase::Fetching {
            if let Some(outcome) = self.source.poll() {
                match self.finish_fetch(outcome) {
                    Some(report) => reconciled = Some(report),
                    None => fetch_failed = true,
                }
            }
        }

        let clock_tick = self.clock.tick(delta);
        let mut fetch_started = false;
        if clock_tick.should_fetch_snapshot {
            if self.phase == DriverPhase::Idle {
                fetch_started = self.begin_fetch(FetchKind::Advance(self.poll_categories.clone()));
            } else {
                debug!("Snapshot interval elapsed while {:?}, skipping trigger", self.phase);
            }
        }

        let interpolation_factor = if self.hold_at_current {
            1.0
        } else {
            clock_tick.interpolation_factor
        };

        self.render(renderer, interpolation_factor);
        self.tracker.end_frame();

        FrameSummary {
            frame: self.frame,
            phase: self.phase,
            interpolation_factor,
            instances: self.instances.len(),
            fetch_started,
            reconciled,
            fetch_failed,
        }
    }

    fn begin_fetch(&mut self, kind: FetchKind) -> bool {
        if self.phase != DriverPhase::Idle || self.source.in_flight() {
            debug!("Fetch requested while {:?}, ignoring", self.phase);
            return false;
        }

        debug!("Requesting snapshot ({:?}) from {}", kind, self.source.get_name());
        self.source.request(kind);
        self.phase = DriverPhase::Fetching;
        self.hold_at_current = true;
        true
    }

    fn finish_fetch(&mut self, outcome: FetchOutcome) -> Option<ReconcileReport> {
        self.tracker.record_fetch(outcome.is_ok());
        match outcome {
            Ok(world) => {
                self.phase = DriverPhase::Reconciling;
                let report = self.apply_world(&world);
                self.phase = DriverPhase::Idle;
                Some(report)
            }
            Err(e) => {
                // Registries and clock stay exactly as they were; the next
                // interval simply tries again.
                warn!("Snapshot fetch failed: {}", e);
                self.phase = DriverPhase::Idle;
                None
            }
        }
    }

    fn apply_world(&mut self, world: &WorldSnapshot) -> ReconcileReport {
        self.tracker.start_reconcile();
        let mut report = ReconcileReport::default();
        for snapshot in &world.snapshots {
            report.merge(self.state.reconcile(snapshot));
        }
        if world.step.is_some() {
            self.state.step = world.step;
        }
        self.tracker.end_reconcile();

        if report.membership_changed() || (self.scene.is_empty() && self.state.total_entities() > 0) {
            self.tracker.start_compose();
            self.scene = self.composer.compose(&self.state);
            self.tracker.end_compose();
        }

        if report.rejected > 0 || report.partial > 0 {
            warn!(
                "Snapshot had {} rejected and {} incomplete records",
                report.rejected, report.partial
            );
        }

        debug!(
            "Applied step {:?}: +{} -{} ~{} ({} entities)",
            world.step,
            report.created,
            report.removed,
            report.updated,
            self.state.total_entities()
        );

        self.clock.reset();
        self.hold_at_current = false;
        report
    }

    fn render(&mut self, renderer: &mut dyn Renderer, interpolation_factor: f32) {
        self.tracker.start_render();
        self.composer
            .resolve_into(&self.scene, &self.state, interpolation_factor, &mut self.instances);

        let frame = FrameView {
            instances: &self.instances,
            interpolation_factor,
            frame: self.frame,
            step: self.state.step,
        };
        if let Err(e) = renderer.render(&frame) {
            log::error!("Render error: {}", e);
        }
        self.tracker.end_render(self.instances.len());
    }
}
