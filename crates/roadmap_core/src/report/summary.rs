//! Roadmap summary statistics over main projects.

use crate::model::project::Project;
use crate::report::delay::end_delay;
use serde::Serialize;

/// Aggregate delay and completion figures for main projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SummaryStats {
    pub total: usize,
    /// End delay > 0.
    pub delayed: usize,
    /// End delay == 0.
    pub on_time: usize,
    /// End delay < 0.
    pub early: usize,
    /// Rounded share of delayed projects, in percent.
    pub delayed_ratio: u32,
    /// Rounded share of on-time and early projects, in percent.
    pub on_time_ratio: u32,
    /// Rounded mean completion percentage.
    pub average_completion: u32,
    /// Largest end delay; `0` when there are no main projects.
    pub max_end_delay: i32,
}

impl SummaryStats {
    /// Computes statistics over the main projects of `projects`.
    pub fn from_projects(projects: &[Project]) -> Self {
        let main_projects: Vec<&Project> = projects
            .iter()
            .filter(|project| !project.is_sub_project)
            .collect();
        let total = main_projects.len();
        if total == 0 {
            return Self::default();
        }

        let end_delays: Vec<i32> = main_projects.iter().map(|project| end_delay(project)).collect();
        let delayed = end_delays.iter().filter(|delay| **delay > 0).count();
        let on_time = end_delays.iter().filter(|delay| **delay == 0).count();
        let early = end_delays.iter().filter(|delay| **delay < 0).count();
        let completion_sum: u32 = main_projects
            .iter()
            .map(|project| u32::from(project.completion_percentage))
            .sum();

        Self {
            total,
            delayed,
            on_time,
            early,
            delayed_ratio: rounded_percent(delayed, total),
            on_time_ratio: rounded_percent(on_time + early, total),
            average_completion: rounded_div(completion_sum, total as u32),
            max_end_delay: end_delays.iter().copied().max().unwrap_or(0),
        }
    }
}

fn rounded_percent(part: usize, total: usize) -> u32 {
    rounded_div((part * 100) as u32, total as u32)
}

fn rounded_div(numerator: u32, denominator: u32) -> u32 {
    (numerator + denominator / 2) / denominator
}
