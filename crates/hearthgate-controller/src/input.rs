//! Debounced input tracking.
//!
//! Two debouncers are provided:
//!
//! - [`MajorityTracker`] for capacitive touch pads: every sample takes `N`
//!   raw reads spread over a short, bounded window and counts the active
//!   ones. The input is considered active when the count reaches the
//!   threshold. The threshold may be below `N / 2`, which favours
//!   sensitivity over noise rejection.
//! - [`RefractoryTracker`] for mechanical switches: an edge is accepted
//!   only if the previous accepted edge is older than the refractory window.
//!
//! Both report edges only, never levels, so one physical transition yields
//! at most one event.

use hearthgate_hardware::traits::DigitalInput;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Became active.
    Rising,
    /// Became inactive.
    Falling,
}

/// Majority-vote debouncer.
#[derive(Debug, Clone)]
pub struct MajorityTracker {
    samples: usize,
    threshold: usize,
    spacing: Duration,
    active_high: bool,
    /// Raw reads of the most recent sample.
    raw: VecDeque<bool>,
    settled: bool,
    last_edge_at: Option<Instant>,
}

impl MajorityTracker {
    /// `window` is the total time one sample may take; reads are spaced
    /// evenly inside it.
    pub fn new(samples: usize, threshold: usize, window: Duration) -> Self {
        let samples = samples.max(1);
        let spacing = window / u32::try_from(samples).unwrap_or(u32::MAX);
        Self {
            samples,
            threshold,
            spacing,
            active_high: true,
            raw: VecDeque::with_capacity(samples),
            settled: false,
            last_edge_at: None,
        }
    }

    /// Treat a low level as active.
    pub fn active_low(mut self) -> Self {
        self.active_high = false;
        self
    }

    pub fn settled(&self) -> bool {
        self.settled
    }

    pub fn last_edge_at(&self) -> Option<Instant> {
        self.last_edge_at
    }

    /// Active reads in the most recent sample.
    pub fn active_count(&self) -> usize {
        self.raw.iter().filter(|&&active| active).count()
    }

    /// Take one sample and report a settled edge, if any.
    ///
    /// Blocks for at most the configured window.
    pub fn sample(&mut self, input: &mut dyn DigitalInput, now: Instant) -> Option<Edge> {
        self.raw.clear();
        for i in 0..self.samples {
            if i > 0 && !self.spacing.is_zero() {
                std::thread::sleep(self.spacing);
            }
            self.raw.push_back(input.is_high() == self.active_high);
        }

        let active = self.active_count() >= self.threshold;
        self.settle(active, now)
    }

    fn settle(&mut self, active: bool, now: Instant) -> Option<Edge> {
        if active == self.settled {
            return None;
        }
        self.settled = active;
        self.last_edge_at = Some(now);
        Some(if active { Edge::Rising } else { Edge::Falling })
    }
}

/// Time-based debouncer for push buttons.
#[derive(Debug, Clone)]
pub struct RefractoryTracker {
    refractory: Duration,
    active_high: bool,
    settled: bool,
    last_edge_at: Option<Instant>,
}

impl RefractoryTracker {
    pub fn new(refractory: Duration) -> Self {
        Self {
            refractory,
            active_high: true,
            settled: false,
            last_edge_at: None,
        }
    }

    pub fn active_low(mut self) -> Self {
        self.active_high = false;
        self
    }

    pub fn settled(&self) -> bool {
        self.settled
    }

    /// Read the input once and report an accepted edge, if any.
    pub fn sample(&mut self, input: &mut dyn DigitalInput, now: Instant) -> Option<Edge> {
        let level = input.is_high();
        self.update(level, now)
    }

    /// Feed one raw level.
    pub fn update(&mut self, level: bool, now: Instant) -> Option<Edge> {
        let active = level == self.active_high;
        if active == self.settled {
            return None;
        }
        if let Some(last) = self.last_edge_at
            && now.saturating_duration_since(last) < self.refractory
        {
            return None;
        }

        self.settled = active;
        self.last_edge_at = Some(now);
        Some(if active { Edge::Rising } else { Edge::Falling })
    }
}
