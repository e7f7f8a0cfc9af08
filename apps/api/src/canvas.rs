//! Canvas state machine: picks the single visualization the client renders.
//!
//! Stateless: every call recomputes from the snapshot, first matching rule wins.

use serde::{Deserialize, Serialize};

use crate::insights::{Insight, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CanvasState {
    GenerationProgress,
    Research,
    GeneratingScenarios,
    Scenarios,
    Confidence,
    PhaseProgress,
}

/// Snapshot of UI-level flags, built fresh for every render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasStateMachine {
    #[serde(default)]
    pub is_generating: bool,
    #[serde(default)]
    pub is_researching: bool,
    #[serde(default)]
    pub is_generating_scenarios: bool,
    #[serde(default)]
    pub has_scenarios: bool,
    pub current_phase: Phase,
    pub confidence: u8,
    #[serde(default)]
    pub insights: Vec<Insight>,
}

pub fn get_active_canvas_state(machine: &CanvasStateMachine) -> CanvasState {
    if machine.is_generating {
        CanvasState::GenerationProgress
    } else if machine.is_researching {
        CanvasState::Research
    } else if machine.is_generating_scenarios {
        CanvasState::GeneratingScenarios
    } else if machine.has_scenarios && machine.current_phase == Phase::SolutionDesign {
        CanvasState::Scenarios
    } else if machine.confidence < 100 && !machine.insights.is_empty() {
        CanvasState::Confidence
    } else {
        CanvasState::PhaseProgress
    }
}
