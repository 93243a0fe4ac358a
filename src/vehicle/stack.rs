use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Staging: what is still attached below the lander
// ---------------------------------------------------------------------------

/// The altitude marking radar (AMR) sits in the retro nozzle and is blown off
/// at ignition; the spent retro case is dropped at burnout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum StackStatus {
    #[default]
    Full,
    AmrJettisoned,
    RetroJettisoned,
}

impl StackStatus {
    /// Advance the stack after a step given the remaining retro propellant.
    /// Returns the new status when something was jettisoned.
    pub fn check_jettison(self, retro_prop: f64, retro_load: f64) -> Option<StackStatus> {
        match self {
            StackStatus::Full if retro_prop < 0.999 * retro_load => Some(StackStatus::AmrJettisoned),
            StackStatus::AmrJettisoned if retro_prop < 1e-4 => Some(StackStatus::RetroJettisoned),
            _ => None,
        }
    }

    pub fn has_amr(self) -> bool {
        self == StackStatus::Full
    }

    pub fn has_retro(self) -> bool {
        self != StackStatus::RetroJettisoned
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StackStatus::Full => "full stack",
            StackStatus::AmrJettisoned => "AMR jettisoned",
            StackStatus::RetroJettisoned => "retro case jettisoned",
        };
        f.write_str(s)
    }
}
