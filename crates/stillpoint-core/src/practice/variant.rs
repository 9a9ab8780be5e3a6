use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Inhale,
    Hold,
    Exhale,
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Inhale => "inhale",
            PhaseKind::Hold => "hold",
            PhaseKind::Exhale => "exhale",
        }
    }
}

/// Visual endpoint a breathing animation moves towards (circle scale).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualTarget {
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub kind: PhaseKind,
    pub seconds: u32,
    /// `None` keeps the current visual in place (hold phases).
    #[serde(default)]
    pub visual: Option<VisualTarget>,
    /// Two phrasings, alternated on completed-cycle parity.
    pub guidance: [String; 2],
}

/// A named guided-exercise configuration. Never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeVariant {
    pub id: String,
    pub title: String,
    pub phases: Vec<PhaseSpec>,
    /// Asset reference handed to the audio backend.
    pub audio_asset: String,
    /// Target practice length in seconds.
    pub session_secs: u64,
}

pub const INHALE_SCALE: f32 = 1.0;
pub const EXHALE_SCALE: f32 = 0.5;

fn phase(kind: PhaseKind, seconds: u32, first: &str, second: &str) -> PhaseSpec {
    let visual = match kind {
        PhaseKind::Inhale => Some(VisualTarget { scale: INHALE_SCALE }),
        PhaseKind::Exhale => Some(VisualTarget { scale: EXHALE_SCALE }),
        PhaseKind::Hold => None,
    };
    PhaseSpec {
        kind,
        seconds,
        visual,
        guidance: [first.into(), second.into()],
    }
}

impl PracticeVariant {
    /// Validate a variant definition.
    ///
    /// # Errors
    /// Returns an error if the variant has no phases or a zero-length phase.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        phases: Vec<PhaseSpec>,
        audio_asset: impl Into<String>,
        session_secs: u64,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        if phases.is_empty() {
            return Err(ValidationError::InvalidVariant {
                id,
                message: "at least one phase is required".into(),
            });
        }
        if let Some(p) = phases.iter().find(|p| p.seconds == 0) {
            return Err(ValidationError::InvalidVariant {
                id,
                message: format!("{} phase has zero length", p.kind.as_str()),
            });
        }
        Ok(Self {
            id,
            title: title.into(),
            phases,
            audio_asset: audio_asset.into(),
            session_secs,
        })
    }

    /// Length of one full breathing cycle in seconds.
    pub fn cycle_secs(&self) -> u64 {
        self.phases.iter().map(|p| u64::from(p.seconds)).sum()
    }

    /// Offset of each phase's start within the cycle.
    pub fn phase_offsets(&self) -> Vec<u64> {
        self.phases
            .iter()
            .scan(0u64, |acc, p| {
                let start = *acc;
                *acc += u64::from(p.seconds);
                Some(start)
            })
            .collect()
    }

    /// Inhale 4 s, exhale 6 s.
    pub fn four_six() -> Self {
        Self {
            id: "4-6-breathing".into(),
            title: "4-6 Calming Breath".into(),
            phases: vec![
                phase(PhaseKind::Inhale, 4, "Breathe in slowly", "Fill your lungs gently"),
                phase(PhaseKind::Exhale, 6, "Breathe out slowly", "Let the air flow out"),
            ],
            audio_asset: "audio/breathing_4_6.mp3".into(),
            session_secs: 5 * 60,
        }
    }

    /// Inhale 4 s, hold 4 s, exhale 4 s.
    pub fn four_four_four() -> Self {
        Self {
            id: "4-4-4-breathing".into(),
            title: "4-4-4 Square Breath".into(),
            phases: vec![
                phase(PhaseKind::Inhale, 4, "Breathe in", "Draw the breath in"),
                phase(PhaseKind::Hold, 4, "Hold", "Stay with the stillness"),
                phase(PhaseKind::Exhale, 4, "Breathe out", "Release the breath"),
            ],
            audio_asset: "audio/breathing_4_4_4.mp3".into(),
            session_secs: 6 * 60,
        }
    }

    /// Inhale 4 s, hold 7 s, exhale 8 s.
    pub fn four_seven_eight() -> Self {
        Self {
            id: "4-7-8-breathing".into(),
            title: "4-7-8 Relaxing Breath".into(),
            phases: vec![
                phase(PhaseKind::Inhale, 4, "Breathe in through the nose", "Inhale quietly"),
                phase(PhaseKind::Hold, 7, "Hold the breath", "Rest at the top"),
                phase(PhaseKind::Exhale, 8, "Exhale through the mouth", "Empty completely"),
            ],
            audio_asset: "audio/breathing_4_7_8.mp3".into(),
            session_secs: 19 * 8,
        }
    }
}

/// All built-in variants, in menu order.
pub fn builtin_variants() -> Vec<PracticeVariant> {
    vec![
        PracticeVariant::four_six(),
        PracticeVariant::four_four_four(),
        PracticeVariant::four_seven_eight(),
    ]
}

/// Look up a built-in variant by id.
///
/// # Errors
/// Returns `UnknownVariant` if no built-in has this id.
pub fn find_variant(id: &str) -> Result<PracticeVariant, ValidationError> {
    builtin_variants()
        .into_iter()
        .find(|v| v.id == id)
        .ok_or_else(|| ValidationError::UnknownVariant(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_lengths() {
        assert_eq!(PracticeVariant::four_six().cycle_secs(), 10);
        assert_eq!(PracticeVariant::four_four_four().cycle_secs(), 12);
        assert_eq!(PracticeVariant::four_seven_eight().cycle_secs(), 19);
    }

    #[test]
    fn phase_offsets_for_square_breath() {
        assert_eq!(PracticeVariant::four_four_four().phase_offsets(), vec![0, 4, 8]);
    }

    #[test]
    fn hold_has_no_visual_target() {
        let v = PracticeVariant::four_four_four();
        assert!(v.phases[1].visual.is_none());
        assert!(v.phases[0].visual.is_some());
    }

    #[test]
    fn rejects_zero_length_phase() {
        let err = PracticeVariant::new(
            "broken",
            "Broken",
            vec![phase(PhaseKind::Inhale, 0, "a", "b")],
            "audio/none.mp3",
            60,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidVariant { .. }));
    }

    #[test]
    fn find_unknown_variant() {
        assert_eq!(
            find_variant("nope"),
            Err(ValidationError::UnknownVariant("nope".into()))
        );
        assert_eq!(find_variant("4-6-breathing").unwrap().id, "4-6-breathing");
    }
}
