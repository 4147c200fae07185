use instant::Instant;
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct PerformanceMetrics {
    pub frame_time: Duration,
    pub reconcile_time: Duration,
    pub compose_time: Duration,
    pub render_time: Duration,
    pub instance_count: usize,
}

/// Rolling per-frame timings over the last `max_samples` frames.
#[derive(Debug)]
pub struct PerformanceTracker {
    samples: VecDeque<PerformanceMetrics>,
    max_samples: usize,
    current: PerformanceMetrics,
    current_frame_start: Option<Instant>,
    current_reconcile_start: Option<Instant>,
    current_compose_start: Option<Instant>,
    current_render_start: Option<Instant>,
    total_frames: u64,
    fetches_completed: u64,
    fetches_failed: u64,
}

impl PerformanceTracker {
    pub fn new(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
            current: PerformanceMetrics::default(),
            current_frame_start: None,
            current_reconcile_start: None,
            current_compose_start: None,
            current_render_start: None,
            total_frames: 0,
            fetches_completed: 0,
            fetches_failed: 0,
        }
    }

    pub fn start_frame(&mut self) {
        self.current = PerformanceMetrics::default();
        self.current_frame_start = Some(Instant::now());
    }

    pub fn start_reconcile(&mut self) {
        self.current_reconcile_start = Some(Instant::now());
    }

    pub fn end_reconcile(&mut self) {
        if let Some(start) = self.current_reconcile_start.take() {
            self.current.reconcile_time = start.elapsed();
        }
    }

    pub fn start_compose(&mut self) {
        self.current_compose_start = Some(Instant::now());
    }

    pub fn end_compose(&mut self) {
        if let Some(start) = self.current_compose_start.take() {
            self.current.compose_time = start.elapsed();
        }
    }

    pub fn start_render(&mut self) {
        self.current_render_start = Some(Instant::now());
    }

    pub fn end_render(&mut self, instance_count: usize) {
        if let Some(start) = self.current_render_start.take() {
            self.current.render_time = start.elapsed();
        }
        self.current.instance_count = instance_count;
    }

    pub fn end_frame(&mut self) {
        if let Some(start) = self.current_frame_start.take() {
            let mut metrics = std::mem::take(&mut self.current);
            metrics.frame_time = start.elapsed();

            if self.samples.len() >= self.max_samples {
                self.samples.pop_front();
            }
            self.samples.push_back(metrics);
            self.total_frames += 1;
        }
    }

    pub fn record_fetch(&mut self, success: bool) {
        if success {
            self.fetches_completed += 1;
        } else {
            self.fetches_failed += 1;
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn fetches_completed(&self) -> u64 {
        self.fetches_completed
    }

    pub fn fetches_failed(&self) -> u64 {
        self.fetches_failed
    }

    fn average(&self, field: impl Fn(&PerformanceMetrics) -> Duration) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }

        let total: Duration = self.samples.iter().map(field).sum();
        total / self.samples.len() as u32
    }

    pub fn average_frame_time(&self) -> Duration {
        self.average(|s| s.frame_time)
    }

    pub fn average_reconcile_time(&self) -> Duration {
        self.average(|s| s.reconcile_time)
    }

    pub fn average_compose_time(&self) -> Duration {
        self.average(|s| s.compose_time)
    }

    pub fn average_render_time(&self) -> Duration {
        self.average(|s| s.render_time)
    }

    pub fn fps(&self) -> f32 {
        let avg_frame_time = self.average_frame_time();
        if avg_frame_time.is_zero() {
            return 0.0;
        }
        1.0 / avg_frame_time.as_secs_f32()
    }
}
