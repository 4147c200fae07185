use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::time::Duration;
use traffic_viz::config::VisualizerConfig;
use traffic_viz::driver::{DriverPhase, FrameDriver};
use traffic_viz::graphics::{FrameView, HeadlessRenderer, MaterialFlags, RenderInstance, Renderer};
use traffic_viz::remote::{FetchKind, FetchOutcome, RemoteError, SnapshotSource};
use traffic_viz::simulation::{
    Attributes, Category, EntityId, EntityRecord, SignalState, Snapshot, Vec3, WorldSnapshot,
};

/// Resolves each request with the next scripted outcome, but only once the
/// test releases it, so in-flight behaviour can be observed.
#[derive(Default)]
struct ScriptedSource {
    outcomes: VecDeque<FetchOutcome>,
    requests: Vec<FetchKind>,
    pending: bool,
    released: bool,
}

impl ScriptedSource {
    fn push_ok(&mut self, world: WorldSnapshot) {
        self.outcomes.push_back(Ok(world));
    }

    fn push_err(&mut self) {
        self.outcomes.push_back(Err(RemoteError::Status {
            endpoint: "update".to_string(),
            status: 500,
        }));
    }

    fn release(&mut self) {
        self.released = true;
    }
}

impl SnapshotSource for ScriptedSource {
    fn request(&mut self, kind: FetchKind) {
        assert!(!self.pending, "second fetch issued while one is in flight");
        self.requests.push(kind);
        self.pending = true;
        self.released = false;
    }

    fn poll(&mut self) -> Option<FetchOutcome> {
        if !self.pending || !self.released {
            return None;
        }
        self.pending = false;
        Some(self.outcomes.pop_front().unwrap_or(Err(RemoteError::Cancelled)))
    }

    fn in_flight(&self) -> bool {
        self.pending
    }

    fn get_name(&self) -> &'static str {
        "Scripted"
    }
}

#[derive(Default)]
struct RecordingRenderer {
    frames: Vec<(f32, Vec<RenderInstance>)>,
    fail: bool,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, frame: &FrameView<'_>) -> Result<()> {
        self.frames.push((frame.interpolation_factor, frame.instances.to_vec()));
        if self.fail {
            return Err(anyhow!("device lost"));
        }
        Ok(())
    }

    fn get_name(&self) -> &'static str {
        "Recording"
    }
}

fn config() -> VisualizerConfig {
    let mut config = VisualizerConfig::default();
    config.timing.snapshot_interval_ms = 1000;
    config.scene.buildings.max_count = 0;
    config.scene.ground.enabled = false;
    config
}

fn cars_world(step: u64, cars: &[(&str, f32)]) -> WorldSnapshot {
    let records = cars
        .iter()
        .map(|(id, x)| EntityRecord::new(*id, Vec3::new(*x, 0.0, 0.0), Attributes::Car))
        .collect();
    WorldSnapshot::new(Some(step), vec![Snapshot::new(Category::Car, records)])
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Drives the clock up to the next trigger and lets the fetch resolve.
fn complete_cycle(driver: &mut FrameDriver<ScriptedSource>, renderer: &mut RecordingRenderer) {
    let summary = driver.tick(ms(1000), renderer);
    assert!(summary.fetch_started);
    driver.source_mut().release();
    driver.tick(Duration::ZERO, renderer);
}

#[test]
fn test_initial_sync_populates_registries() {
    let mut source = ScriptedSource::default();
    source.push_ok(cars_world(0, &[("c1", 0.0), ("c2", 3.0)]));
    let mut driver = FrameDriver::new(&config(), source);
    let mut renderer = RecordingRenderer::default();

    assert!(driver.request_initial_sync());
    assert_eq!(driver.phase(), DriverPhase::Fetching);
    assert_eq!(driver.source().requests[0], FetchKind::Initial);

    // Nothing to draw yet, but the frame is still rendered.
    driver.tick(ms(16), &mut renderer);
    assert_eq!(renderer.frames.len(), 1);
    assert!(renderer.frames[0].1.is_empty());

    driver.source_mut().release();
    let summary = driver.tick(ms(16), &mut renderer);
    assert_eq!(summary.reconciled.unwrap().created, 2);
    assert_eq!(driver.phase(), DriverPhase::Idle);
    assert_eq!(driver.state().cars.len(), 2);
    assert_eq!(driver.scene().len(), 2);
    assert_eq!(summary.instances, 2);
}

#[test]
fn test_scenario_through_the_frame_loop() {
    let mut source = ScriptedSource::default();
    source.push_ok(cars_world(1, &[("c1", 0.0)]));
    source.push_ok(cars_world(2, &[("c1", 5.0)]));
    source.push_ok(cars_world(3, &[]));
    let mut driver = FrameDriver::new(&config(), source);
    let mut renderer = RecordingRenderer::default();

    complete_cycle(&mut driver, &mut renderer);
    let car = driver.state().get(Category::Car, &EntityId::from("c1")).unwrap();
    assert_eq!(car.transform.previous_position, car.transform.current_position);

    complete_cycle(&mut driver, &mut renderer);
    assert_eq!(driver.state().step, Some(2));
    assert_eq!(driver.clock().accumulated(), Duration::ZERO);

    // Half an interval after the update lands the car is halfway there.
    let summary = driver.tick(ms(500), &mut renderer);
    assert_eq!(summary.interpolation_factor, 0.5);
    assert_eq!(driver.last_instances()[0].position(), [2.5, 0.0, 0.0]);

    driver.tick(ms(500), &mut renderer);
    driver.source_mut().release();
    driver.tick(Duration::ZERO, &mut renderer);
    assert!(driver.state().cars.is_empty());
    assert!(driver.scene().is_empty());
    assert!(driver.last_instances().is_empty());
}

#[test]
fn test_fetch_failure_leaves_state_untouched() {
    let mut source = ScriptedSource::default();
    source.push_ok(cars_world(1, &[("a", 1.0), ("b", 2.0)]));
    source.push_err();
    let mut driver = FrameDriver::new(&config(), source);
    let mut renderer = RecordingRenderer::default();
    complete_cycle(&mut driver, &mut renderer);
    driver.tick(ms(400), &mut renderer);

    let summary = driver.tick(ms(600), &mut renderer);
    assert!(summary.fetch_started);
    let state_before = driver.state().clone();
    let clock_before = driver.clock().clone();
    let scene_before = driver.scene().clone();
    let instances_before = driver.last_instances().to_vec();

    driver.source_mut().release();
    let summary = driver.tick(Duration::ZERO, &mut renderer);

    assert!(summary.fetch_failed);
    assert_eq!(driver.phase(), DriverPhase::Idle);
    assert_eq!(driver.state(), &state_before);
    assert_eq!(driver.clock(), &clock_before);
    assert_eq!(driver.scene(), &scene_before);
    assert_eq!(driver.last_instances(), instances_before.as_slice());
    assert_eq!(driver.tracker().fetches_failed(), 1);

    // Still drawable, and the next interval tries again.
    let summary = driver.tick(ms(1000), &mut renderer);
    assert_eq!(summary.instances, 2);
    assert!(summary.fetch_started);
}

#[test]
fn test_at_most_one_fetch_in_flight() {
    let mut source = ScriptedSource::default();
    source.push_ok(cars_world(1, &[("a", 0.0)]));
    let mut driver = FrameDriver::new(&config(), source);
    let mut renderer = RecordingRenderer::default();

    assert!(driver.tick(ms(1000), &mut renderer).fetch_started);
    // Several intervals pass without the fetch resolving.
    for _ in 0..5 {
        let summary = driver.tick(ms(1000), &mut renderer);
        assert!(!summary.fetch_started);
        assert_eq!(summary.phase, DriverPhase::Fetching);
    }
    assert!(!driver.request_initial_sync());
    assert_eq!(driver.source().requests.len(), 1);
    assert_eq!(renderer.frames.len(), 6);
}

#[test]
fn test_rendering_holds_at_current_position_while_fetching() {
    let mut source = ScriptedSource::default();
    source.push_ok(cars_world(1, &[("a", 0.0)]));
    source.push_ok(cars_world(2, &[("a", 4.0)]));
    let mut driver = FrameDriver::new(&config(), source);
    let mut renderer = RecordingRenderer::default();
    complete_cycle(&mut driver, &mut renderer);
    complete_cycle(&mut driver, &mut renderer);

    driver.tick(ms(250), &mut renderer);
    assert_eq!(driver.last_instances()[0].position(), [1.0, 0.0, 0.0]);

    // Trigger the next fetch and keep it in flight.
    driver.tick(ms(750), &mut renderer);
    let summary = driver.tick(ms(300), &mut renderer);
    assert_eq!(summary.phase, DriverPhase::Fetching);
    assert_eq!(summary.interpolation_factor, 1.0);
    assert_eq!(driver.last_instances()[0].position(), [4.0, 0.0, 0.0]);
}

#[test]
fn test_advance_requests_use_polled_categories() {
    let mut config = config();
    config.sync.poll_categories = vec![Category::Car, Category::TrafficLight];
    let mut driver = FrameDriver::new(&config, ScriptedSource::default());
    let mut renderer = RecordingRenderer::default();

    driver.tick(ms(1000), &mut renderer);
    assert_eq!(
        driver.source().requests,
        vec![FetchKind::Advance(vec![Category::Car, Category::TrafficLight])]
    );
}

#[test]
fn test_attribute_only_changes_keep_the_scene_list() {
    let light = |green: bool| WorldSnapshot::new(
        Some(1),
        vec![Snapshot::new(
            Category::TrafficLight,
            vec![EntityRecord::new(
                "s",
                Vec3::new(0.0, 1.0, 0.0),
                Attributes::TrafficLight { signal: SignalState::from_green(green) },
            )],
        )],
    );
    let mut source = ScriptedSource::default();
    source.push_ok(light(true));
    source.push_ok(light(false));
    let mut driver = FrameDriver::new(&config(), source);
    let mut renderer = RecordingRenderer::default();

    complete_cycle(&mut driver, &mut renderer);
    let compositions = driver.composer().compositions();
    let green = driver.last_instances()[0].color;

    complete_cycle(&mut driver, &mut renderer);
    assert_eq!(driver.composer().compositions(), compositions);
    assert_ne!(driver.last_instances()[0].color, green);
    assert_eq!(driver.last_instances()[0].material(), MaterialFlags::TRAFFIC_LIGHT);
}

#[test]
fn test_renderer_errors_do_not_stop_the_loop() {
    let mut source = ScriptedSource::default();
    source.push_ok(cars_world(1, &[("a", 0.0)]));
    let mut driver = FrameDriver::new(&config(), source);
    let mut renderer = RecordingRenderer { fail: true, ..Default::default() };

    complete_cycle(&mut driver, &mut renderer);
    driver.tick(ms(16), &mut renderer);

    assert_eq!(renderer.frames.len(), 3);
    assert_eq!(driver.frame(), 3);
    assert_eq!(driver.state().cars.len(), 1);
}

#[test]
fn test_reset_discards_session_state() {
    let mut source = ScriptedSource::default();
    source.push_ok(cars_world(9, &[("a", 0.0), ("b", 1.0)]));
    let mut driver = FrameDriver::new(&config(), source);
    let mut renderer = RecordingRenderer::default();
    complete_cycle(&mut driver, &mut renderer);
    assert_eq!(driver.state().total_entities(), 2);

    driver.reset();
    driver.tick(ms(10), &mut renderer);

    assert_eq!(driver.state().total_entities(), 0);
    assert_eq!(driver.state().step, None);
    assert!(driver.scene().is_empty());
    assert!(driver.last_instances().is_empty());
}

#[test]
fn test_headless_renderer_tallies_materials() {
    let mut source = ScriptedSource::default();
    source.push_ok(cars_world(1, &[("a", 0.0), ("b", 2.0), ("c", 4.0)]));
    let mut driver = FrameDriver::new(&config(), source);
    let mut renderer = HeadlessRenderer::new(1);

    driver.tick(ms(1000), &mut renderer);
    driver.source_mut().release();
    driver.tick(Duration::ZERO, &mut renderer);

    assert_eq!(renderer.frames_rendered(), 2);
    assert_eq!(renderer.last_counts().get("cars"), Some(&3));
    assert_eq!(renderer.last_counts().len(), 1);

    let world = driver.last_instances()[2].world_matrix();
    assert_eq!(world[(0, 3)], 4.0);
    assert_eq!(driver.last_instances()[2].material(), MaterialFlags::VEHICLE);
}

#[test]
fn test_consecutive_failures_keep_entities_at_current_position() {
    let mut source = ScriptedSource::default();
    source.push_ok(cars_world(1, &[("a", 0.0)]));
    source.push_ok(cars_world(2, &[("a", 6.0)]));
    for _ in 0..3 {
        source.push_err();
    }
    source.push_ok(cars_world(6, &[("a", 8.0)]));
    let mut driver = FrameDriver::new(&config(), source);
    let mut renderer = RecordingRenderer::default();
    complete_cycle(&mut driver, &mut renderer);
    complete_cycle(&mut driver, &mut renderer);

    driver.tick(ms(500), &mut renderer);
    assert_eq!(driver.last_instances()[0].position(), [3.0, 0.0, 0.0]);
    driver.tick(ms(500), &mut renderer);

    for _ in 0..3 {
        driver.source_mut().release();
        let summary = driver.tick(ms(250), &mut renderer);
        assert!(summary.fetch_failed);
        assert_eq!(summary.interpolation_factor, 1.0);
        assert_eq!(driver.last_instances()[0].position(), [6.0, 0.0, 0.0]);

        let summary = driver.tick(ms(250), &mut renderer);
        assert_eq!(summary.phase, DriverPhase::Idle);
        assert_eq!(summary.interpolation_factor, 1.0);
        assert_eq!(driver.last_instances()[0].position(), [6.0, 0.0, 0.0]);

        let summary = driver.tick(ms(500), &mut renderer);
        assert!(summary.fetch_started);
        assert_eq!(driver.last_instances()[0].position(), [6.0, 0.0, 0.0]);
    }
    assert_eq!(driver.tracker().fetches_failed(), 3);
    assert_eq!(driver.state().step, Some(2));

    // The first success releases the hold and interpolation resumes.
    driver.source_mut().release();
    driver.tick(Duration::ZERO, &mut renderer);
    let summary = driver.tick(ms(500), &mut renderer);
    assert_eq!(summary.interpolation_factor, 0.5);
    assert_eq!(driver.last_instances()[0].position(), [7.0, 0.0, 0.0]);
    assert_eq!(driver.state().step, Some(6));
}
