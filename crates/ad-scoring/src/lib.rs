//! Activity score computation for `AssemblyDash`
//!
//! A member's activity score is a weighted sum of four sub-scores, each
//! capped at 100 before weighting:
//!
//! - bills sponsored: 40% (full marks at [`MAX_BILLS`])
//! - plenary attendance rate: 30%
//! - speeches given: 20% (full marks at [`MAX_SPEECHES`])
//! - bill pass rate: 10%
//!
//! The score is a pure function of its inputs. It is recomputed wholesale
//! after every sync pass and never stored independently of the fields it is
//! derived from.

/// Number of sponsored bills that earns a full bill sub-score.
pub const MAX_BILLS: f64 = 50.0;

/// Number of speeches that earns a full speech sub-score.
pub const MAX_SPEECHES: f64 = 200.0;

const WEIGHT_BILLS: f64 = 0.4;
const WEIGHT_ATTENDANCE: f64 = 0.3;
const WEIGHT_SPEECHES: f64 = 0.2;
const WEIGHT_PASS_RATE: f64 = 0.1;

/// Statistical inputs to the activity score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActivityInputs {
    /// Number of bills the member has sponsored.
    pub num_bills: i64,
    /// Plenary attendance rate in percent (0-100).
    pub attendance_rate: f64,
    /// Number of recorded speeches.
    pub speech_count: i64,
    /// Share of sponsored bills that passed, in percent (0-100).
    pub bill_pass_rate: f64,
}

/// Compute the weighted activity score from member statistics.
///
/// Deterministic and idempotent: the same inputs always yield the same
/// score, and the result is clamped to `[0, 100]`.
#[must_use]
pub fn activity_score(inputs: ActivityInputs) -> f64 {
    let bills_score = sub_score(inputs.num_bills as f64 / MAX_BILLS * 100.0);
    let attendance_score = sub_score(inputs.attendance_rate);
    let speeches_score = sub_score(inputs.speech_count as f64 / MAX_SPEECHES * 100.0);
    let pass_rate_score = sub_score(inputs.bill_pass_rate);

    bills_score * WEIGHT_BILLS
        + attendance_score * WEIGHT_ATTENDANCE
        + speeches_score * WEIGHT_SPEECHES
        + pass_rate_score * WEIGHT_PASS_RATE
}

/// Clamp a raw sub-score into `[0, 100]`, treating NaN as zero.
fn sub_score(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 100.0)
    }
}
