//! Pure phase arithmetic.
//!
//! `phase_at` is the single source of truth for where a practice is inside
//! its breathing cycle. The countdown display and the animation driver both
//! read from its result.

use serde::{Deserialize, Serialize};

use super::variant::{PhaseKind, PracticeVariant, VisualTarget};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseInfo {
    pub kind: PhaseKind,
    pub phase_index: usize,
    /// Seconds left in this phase, counting the current second.
    pub seconds_remaining: u64,
    /// Seconds already spent in this phase.
    pub offset_in_phase: u64,
    /// Number of fully completed cycles.
    pub cycle_index: u64,
    pub guidance: String,
    pub visual: Option<VisualTarget>,
}

/// Where `elapsed_secs` falls within the variant's repeating cycle.
///
/// Returns `None` only for an empty or zero-length cycle, which
/// `PracticeVariant::new` rejects.
pub fn phase_at(elapsed_secs: u64, variant: &PracticeVariant) -> Option<PhaseInfo> {
    let cycle = variant.cycle_secs();
    if cycle == 0 {
        return None;
    }
    let cycle_index = elapsed_secs / cycle;
    let mut within = elapsed_secs % cycle;

    for (phase_index, spec) in variant.phases.iter().enumerate() {
        let len = u64::from(spec.seconds);
        if within < len {
            let guidance = &spec.guidance[(cycle_index % 2) as usize];
            return Some(PhaseInfo {
                kind: spec.kind,
                phase_index,
                seconds_remaining: len - within,
                offset_in_phase: within,
                cycle_index,
                guidance: guidance.clone(),
                visual: spec.visual,
            });
        }
        within -= len;
    }
    None
}

/// True when `elapsed_secs` is the first second of a phase.
pub fn is_phase_boundary(elapsed_secs: u64, variant: &PracticeVariant) -> bool {
    phase_at(elapsed_secs, variant).is_some_and(|p| p.offset_in_phase == 0)
}
