use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseType {
    Inhale,
    Hold,
    Exhale,
    Pause,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub phase_type: PhaseType,
    pub duration_secs: u32,
    #[serde(default)]
    pub label: String,
}

impl Phase {
    pub fn new(phase_type: PhaseType, duration_secs: u32) -> Self {
        let label = match phase_type {
            PhaseType::Inhale => "Breathe in",
            PhaseType::Hold => "Hold",
            PhaseType::Exhale => "Breathe out",
            PhaseType::Pause => "Rest",
        };
        Self {
            phase_type,
            duration_secs,
            label: label.into(),
        }
    }
}

/// An ordered list of phases repeated for `cycles` rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub phases: Vec<Phase>,
    pub cycles: u32,
}

impl Technique {
    pub fn new(id: impl Into<String>, name: impl Into<String>, phases: Vec<Phase>, cycles: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            phases,
            cycles,
        }
    }

    pub fn cycle_secs(&self) -> u64 {
        self.phases.iter().map(|p| u64::from(p.duration_secs)).sum()
    }

    pub fn total_secs(&self) -> u64 {
        self.cycle_secs().saturating_mul(u64::from(self.cycles))
    }

    pub fn total_phases(&self) -> u64 {
        (self.phases.len() as u64).saturating_mul(u64::from(self.cycles))
    }
}

fn with_description(mut technique: Technique, description: &str) -> Technique {
    technique.description = description.into();
    technique
}

/// Built-in techniques, in display order.
pub fn builtin_techniques() -> Vec<Technique> {
    use PhaseType::*;
    vec![
        with_description(
            Technique::new(
                "box",
                "Box Breathing",
                vec![
                    Phase::new(Inhale, 4),
                    Phase::new(Hold, 4),
                    Phase::new(Exhale, 4),
                    Phase::new(Pause, 4),
                ],
                4,
            ),
            "Equal counts in, hold, out, hold. Steadies attention.",
        ),
        with_description(
            Technique::new(
                "four-seven-eight",
                "4-7-8 Breathing",
                vec![
                    Phase::new(Inhale, 4),
                    Phase::new(Hold, 7),
                    Phase::new(Exhale, 8),
                ],
                4,
            ),
            "A long exhale to wind down before sleep.",
        ),
        with_description(
            Technique::new(
                "calm",
                "Calm Breath",
                vec![Phase::new(Inhale, 4), Phase::new(Exhale, 6)],
                6,
            ),
            "Exhale longer than you inhale.",
        ),
        with_description(
            Technique::new(
                "energize",
                "Energizing Breath",
                vec![Phase::new(Inhale, 2), Phase::new(Exhale, 2)],
                10,
            ),
            "Short, even breaths for a quick lift.",
        ),
    ]
}

pub fn technique_by_id(id: &str) -> Option<Technique> {
    builtin_techniques().into_iter().find(|t| t.id == id)
}
