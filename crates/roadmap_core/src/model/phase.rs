//! Completion phases.
//!
//! Maps a completion percentage onto one of five delivery phases used for
//! colour-coding and phase captions.

use serde::Serialize;

/// One delivery phase with an inclusive percentage range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectPhase {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub min_percentage: u8,
    pub max_percentage: u8,
}

impl ProjectPhase {
    pub fn contains(&self, completion_percentage: u8) -> bool {
        (self.min_percentage..=self.max_percentage).contains(&completion_percentage)
    }
}

pub static PROJECT_PHASES: [ProjectPhase; 5] = [
    ProjectPhase {
        id: "planning",
        name: "Initiation and Planning",
        description: "Scope definition, requirements analysis, resource planning",
        min_percentage: 0,
        max_percentage: 15,
    },
    ProjectPhase {
        id: "design",
        name: "Design and Analysis",
        description: "Technical design, architecture planning, prototyping",
        min_percentage: 16,
        max_percentage: 30,
    },
    ProjectPhase {
        id: "development",
        name: "Development and Implementation",
        description: "Main development, coding, integrations",
        min_percentage: 31,
        max_percentage: 75,
    },
    ProjectPhase {
        id: "testing",
        name: "Testing and Verification",
        description: "System tests, user acceptance tests, bug fixing",
        min_percentage: 76,
        max_percentage: 90,
    },
    ProjectPhase {
        id: "delivery",
        name: "Delivery and Closure",
        description: "Final checks, documentation, user training",
        min_percentage: 91,
        max_percentage: 100,
    },
];

/// Returns the phase covering `completion_percentage`.
///
/// Values outside every range fall back to the first phase.
pub fn phase_for(completion_percentage: u8) -> &'static ProjectPhase {
    PROJECT_PHASES
        .iter()
        .find(|phase| phase.contains(completion_percentage))
        .unwrap_or(&PROJECT_PHASES[0])
}
