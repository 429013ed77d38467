use std::collections::VecDeque;

use foundation::math::Quat;
use tracing::{debug, info, warn};

use crate::config::{HeadingEstimator, SensorOptions};
use crate::platform::XrPlatform;

/// One orientation reading and the heading derived from it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrientationSample {
    pub quaternion: Quat,
    pub heading_rad: f64,
}

impl OrientationSample {
    pub fn from_quaternion(quaternion: Quat) -> Self {
        Self {
            quaternion,
            heading_rad: quaternion.heading(),
        }
    }
}

/// Fixed-capacity FIFO of the most recent samples, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingHistory {
    capacity: usize,
    samples: VecDeque<OrientationSample>,
}

impl HeadingHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn push(&mut self, sample: OrientationSample) {
        if self.capacity == 0 {
            return;
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn get(&self, index: usize) -> Option<&OrientationSample> {
        self.samples.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrientationSample> {
        self.samples.iter()
    }

    pub fn headings(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.heading_rad)
    }

    /// Plain numeric median; angles are not unwrapped across +/-PI.
    pub fn median_heading(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut headings: Vec<f64> = self.headings().collect();
        headings.sort_by(|a, b| a.total_cmp(b));
        let mid = headings.len() / 2;
        if headings.len() % 2 == 0 {
            Some((headings[mid - 1] + headings[mid]) / 2.0)
        } else {
            Some(headings[mid])
        }
    }

    /// Direction of the summed unit vectors; `None` when they cancel out.
    pub fn circular_mean_heading(&self) -> Option<f64> {
        let (sin, cos) = self
            .headings()
            .fold((0.0, 0.0), |(s, c), h| (s + h.sin(), c + h.cos()));
        if sin.hypot(cos) < 1e-9 {
            return None;
        }
        Some(sin.atan2(cos))
    }

    pub fn estimate(&self, estimator: HeadingEstimator) -> Option<f64> {
        match estimator {
            HeadingEstimator::RingIndex(index) => self.get(index).map(|s| s.heading_rad),
            HeadingEstimator::Median => self.median_heading(),
            HeadingEstimator::CircularMean => self.circular_mean_heading(),
        }
    }
}

/// Orientation sensor subscription plus its rolling heading history.
#[derive(Debug)]
pub struct OrientationSampler {
    options: SensorOptions,
    capacity: usize,
    history: Option<HeadingHistory>,
    running: bool,
    readings: u64,
}

impl OrientationSampler {
    pub fn new(options: SensorOptions, capacity: usize) -> Self {
        Self {
            options,
            capacity,
            history: None,
            running: false,
            readings: 0,
        }
    }

    pub fn options(&self) -> &SensorOptions {
        &self.options
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn readings(&self) -> u64 {
        self.readings
    }

    pub fn history(&self) -> Option<&HeadingHistory> {
        self.history.as_ref()
    }

    /// Starts the sensor and allocates a fresh history. A sensor error is
    /// logged; the sampler then simply never receives readings.
    pub fn start<P: XrPlatform + ?Sized>(&mut self, platform: &mut P) -> bool {
        self.history = Some(HeadingHistory::with_capacity(self.capacity));
        match platform.start_orientation_sensor(&self.options) {
            Ok(()) => {
                self.running = true;
                info!(
                    frequency_hz = self.options.frequency_hz,
                    reference_frame = self.options.reference_frame.as_str(),
                    "orientation sensor started"
                );
                true
            }
            Err(err) => {
                warn!(error = %err, "orientation sensor unavailable");
                false
            }
        }
    }

    pub fn stop<P: XrPlatform + ?Sized>(&mut self, platform: &mut P) {
        if self.running {
            platform.stop_orientation_sensor();
            self.running = false;
            debug!(readings = self.readings, "orientation sensor stopped");
        }
    }

    pub fn on_reading(&mut self, quaternion: Quat) {
        let Some(history) = self.history.as_mut() else {
            debug!("orientation reading before sampler start; dropped");
            return;
        };
        if !quaternion.is_finite() {
            debug!(?quaternion, "non-finite orientation reading; dropped");
            return;
        }
        history.push(OrientationSample::from_quaternion(quaternion));
        self.readings += 1;
    }
}
