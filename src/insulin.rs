//! Insulin-on-board and activity model.
//!
//! Every treatment decays along an [`ActionCurve`] evaluated over its
//! normalised elapsed time `x = elapsed / duration`:
//!
//! ```text
//!   IOB fraction f(x)                activity density a(x) = -f'(x)
//!   1 ┤●                             2 ┤      ●              (bilinear)
//!     │  ●●                            │    ●   ●
//!     │      ●●                        │  ●       ●
//!     │          ●●●                   │●           ●
//!   0 ┼──────────────●─▶ x           0 ┼──────────────●─▶ x
//!     0      0.5      1                0      0.5      1
//! ```
//!
//! `a(x)` integrates to 1 over `[0, 1]`, so a treatment's activity
//! (`dose · a(x) / duration`, units per minute) integrates to exactly its
//! dose over the action window.  Outside `[0, duration]` a treatment
//! contributes nothing.

use core::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ledger::InsulinTreatment;

/// Largest exponential peak position accepted by validation.  Beyond it the
/// normalising constant of the exponential model becomes ill-conditioned.
pub const MAX_PEAK_FRACTION: f32 = 0.4;

// ---------------------------------------------------------------------------
// Action curve
// ---------------------------------------------------------------------------

/// Shape of the insulin-action curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum ActionCurve {
    /// Triangular activity peaking at the midpoint of the action window.
    /// IOB is exactly one half at the midpoint.
    #[default]
    Bilinear,
    /// Exponential model used for rapid-acting analogues.  `peak_fraction`
    /// is the time of peak activity as a fraction of the action window.
    Exponential { peak_fraction: f32 },
}

impl ActionCurve {
    /// Rapid-acting analogue preset (peak at a quarter of the window).
    pub const RAPID_ACTING: Self = Self::Exponential {
        peak_fraction: 0.25,
    };

    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Bilinear => Ok(()),
            Self::Exponential { peak_fraction } => {
                if peak_fraction.is_finite()
                    && peak_fraction > 0.0
                    && peak_fraction <= MAX_PEAK_FRACTION
                {
                    Ok(())
                } else {
                    Err(Error::InvalidConfiguration(
                        "curve peak_fraction must be within (0, 0.4]",
                    ))
                }
            }
        }
    }

    /// Fraction of the dose still on board at normalised time `x`.
    ///
    /// Clamped to `[0, 1]`; `f(0) = 1` and `f(x) = 0` for `x >= 1`.
    pub fn iob_fraction(&self, x: f32) -> f32 {
        if x <= 0.0 {
            return 1.0;
        }
        if x >= 1.0 {
            return 0.0;
        }
        let f = match *self {
            Self::Bilinear => {
                if x <= 0.5 {
                    1.0 - 2.0 * x * x
                } else {
                    let r = 1.0 - x;
                    2.0 * r * r
                }
            }
            Self::Exponential { peak_fraction } => {
                let k = ExpConstants::new(peak_fraction);
                let x = f64::from(x);
                let e = (-x / k.tau).exp();
                let bracket =
                    x * x / k.tau * e + (1.0 - k.a) * (1.0 - (x / k.tau + 1.0) * e);
                (1.0 - k.s * bracket) as f32
            }
        };
        f.clamp(0.0, 1.0)
    }

    /// Normalised activity density `-f'(x)` at normalised time `x`.
    ///
    /// Zero outside `[0, 1]`; integrates to 1 over the window.
    pub fn activity_density(&self, x: f32) -> f32 {
        if !(0.0..=1.0).contains(&x) {
            return 0.0;
        }
        let a = match *self {
            Self::Bilinear => {
                if x <= 0.5 {
                    4.0 * x
                } else {
                    4.0 * (1.0 - x)
                }
            }
            Self::Exponential { peak_fraction } => {
                let k = ExpConstants::new(peak_fraction);
                let x = f64::from(x);
                (k.s / (k.tau * k.tau) * x * (1.0 - x) * (-x / k.tau).exp()) as f32
            }
        };
        a.max(0.0)
    }
}

/// Derived constants of the exponential model, in normalised time.
///
/// Evaluated in `f64`: near the upper peak bound `s` is large and the
/// bracket cancels heavily, which `f32` cannot resolve.
struct ExpConstants {
    /// Time constant of the exponential decay.
    tau: f64,
    /// Rise-time factor.
    a: f64,
    /// Auxiliary scale factor normalising the window to unit area.
    s: f64,
}

impl ExpConstants {
    fn new(peak_fraction: f32) -> Self {
        let p = f64::from(peak_fraction);
        let tau = p * (1.0 - p) / (1.0 - 2.0 * p);
        let a = 2.0 * tau;
        let s = 1.0 / (1.0 - a + (1.0 + a) * (-1.0 / tau).exp());
        Self { tau, a, s }
    }
}

// ---------------------------------------------------------------------------
// Aggregate state
// ---------------------------------------------------------------------------

/// Instantaneous insulin state at a query time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InsulinState {
    /// Rate of BG-lowering insulin effect (U/min).  Positive means active
    /// insulin is currently lowering BG.
    pub activity: f32,
    /// Insulin on board (U).
    pub iob: f32,
}

impl Add for InsulinState {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            activity: self.activity + rhs.activity,
            iob: self.iob + rhs.iob,
        }
    }
}

impl AddAssign for InsulinState {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl InsulinTreatment {
    /// This treatment's contribution at time `t`, or `None` if it has not
    /// started yet or has fully decayed.
    pub fn contribution(&self, t: i64, curve: &ActionCurve) -> Option<InsulinState> {
        if self.duration <= 0 {
            return None;
        }
        let elapsed = t.checked_sub(self.time)?;
        if elapsed < 0 || elapsed > i64::from(self.duration) {
            return None;
        }
        let duration = self.duration as f32;
        let x = elapsed as f32 / duration;
        Some(InsulinState {
            activity: self.dose * curve.activity_density(x) / duration,
            iob: self.dose * curve.iob_fraction(x),
        })
    }
}

/// Sum the contributions of `treatments` at time `t`.
///
/// Pure: depends only on the treatments, the curve and `t`.
pub fn insulin_calculations<'a, I>(treatments: I, curve: &ActionCurve, t: i64) -> InsulinState
where
    I: IntoIterator<Item = &'a InsulinTreatment>,
{
    treatments
        .into_iter()
        .filter_map(|tr| tr.contribution(t, curve))
        .fold(InsulinState::default(), |acc, c| acc + c)
}
