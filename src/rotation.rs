use crate::config::RotationConfig;
use crate::status::QualificationStatus;

/// Squad-rotation risk in `[cfg.min, cfg.max]` (1.0–2.3 by default).
///
/// Settled teams start from a higher base; any remaining motivation pulls the
/// index back down.
pub fn rotation_risk(status: QualificationStatus, motivation: f64, cfg: &RotationConfig) -> f64 {
    let bump = match status {
        QualificationStatus::Out => cfg.out_bump,
        QualificationStatus::LockedDirectRo16 => cfg.locked_direct_bump,
        QualificationStatus::LockedPlayoffs => cfg.locked_playoffs_bump,
        QualificationStatus::InPlay => 0.0,
    };
    let m = (motivation / 100.0).clamp(0.0, 1.0);
    let risk = (1.0 + bump) * (cfg.slope_base - cfg.slope * m);
    if risk.is_nan() {
        cfg.min
    } else {
        risk.clamp(cfg.min, cfg.max)
    }
}
