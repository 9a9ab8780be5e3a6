mod driver;
mod phase;
mod variant;

pub use driver::{Animation, DriverState, PhaseDriver};
pub use phase::{is_phase_boundary, phase_at, PhaseInfo};
pub use variant::{
    builtin_variants, find_variant, PhaseKind, PhaseSpec, PracticeVariant, VisualTarget,
    EXHALE_SCALE, INHALE_SCALE,
};
