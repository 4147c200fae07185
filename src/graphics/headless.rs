use anyhow::Result;
use log::info;
use std::collections::BTreeMap;
use super::{FrameView, MaterialFlags, Renderer};

/// Renderer without a display. Tallies what would be drawn and reports it
/// every `log_interval` frames.
#[derive(Debug)]
pub struct HeadlessRenderer {
    log_interval: u64,
    frames_rendered: u64,
    last_counts: BTreeMap<&'static str, usize>,
}

impl HeadlessRenderer {
    pub fn new(log_interval: u64) -> Self {
        Self {
            log_interval: log_interval.max(1),
            frames_rendered: 0,
            last_counts: BTreeMap::new(),
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Instance counts per material from the most recent frame.
    pub fn last_counts(&self) -> &BTreeMap<&'static str, usize> {
        &self.last_counts
    }

    fn material_name(flags: MaterialFlags) -> &'static str {
        if flags.contains(MaterialFlags::GROUND) {
            "ground"
        } else if flags.contains(MaterialFlags::BUILDING) {
            "buildings"
        } else if flags.contains(MaterialFlags::ROAD) {
            "roads"
        } else if flags.contains(MaterialFlags::TRAFFIC_LIGHT) {
            "traffic lights"
        } else if flags.contains(MaterialFlags::DESTINATION) {
            "destinations"
        } else if flags.contains(MaterialFlags::OBSTACLE) {
            "obstacles"
        } else if flags.contains(MaterialFlags::VEHICLE) {
            "cars"
        } else {
            "other"
        }
    }
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, frame: &FrameView<'_>) -> Result<()> {
        self.last_counts.clear();
        for instance in frame.instances {
            *self.last_counts.entry(Self::material_name(instance.material())).or_insert(0) += 1;
        }
        self.frames_rendered += 1;

        if frame.frame % self.log_interval == 0 {
            let summary: Vec<String> = self
                .last_counts
                .iter()
                .map(|(name, count)| format!("{} {}", count, name))
                .collect();
            info!(
                "Frame {} (step {}): {} instances [{}], t={:.2}",
                frame.frame,
                frame.step.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                frame.instances.len(),
                summary.join(", "),
                frame.interpolation_factor
            );
        }

        Ok(())
    }

    fn get_name(&self) -> &'static str {
        "Headless"
    }
}
