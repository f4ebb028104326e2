use crate::config::MotivationConfig;
use crate::model::StageProbabilityRow;

/// Uncertainty around a transition threshold: 1 when `p` is a coin flip,
/// falling to 0 at certainty either way. `p` is a fraction.
pub fn pressure(p: f64, beta: f64) -> f64 {
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    (2.0 * p.min(1.0 - p)).powf(beta)
}

/// Pressure index in `[0, 100]`.
///
/// Two boundary terms (survival past 24/25, direct qualification past 8/9)
/// peak when the team's chances are balanced on that cutoff. A smaller
/// seeding term rewards mid-table sides still chasing a seeded play-off slot.
pub fn motivation(row: &StageProbabilityRow, top24_probability: f64, cfg: &MotivationConfig) -> f64 {
    let p_survive = top24_probability / 100.0;
    let p_top8 = row.direct_qualify / 100.0;

    let survival = cfg.survival_weight * pressure(p_survive, cfg.beta);
    let top8 = cfg.top8_weight * pressure(p_top8, cfg.beta);
    let seed = seed_term(row, cfg);

    let score = cfg.base + survival + top8 + seed;
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) }
}

fn seed_term(row: &StageProbabilityRow, cfg: &MotivationConfig) -> f64 {
    let xpos = row.expected_position;
    if xpos < cfg.seed_min_pos || xpos > cfg.seed_max_pos {
        return 0.0;
    }
    if row.playoff_qualify <= cfg.seed_playoff_floor {
        return 0.0;
    }
    let z = (xpos - cfg.seed_center) / cfg.seed_width;
    cfg.seed_weight * (-(z * z)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressure_peaks_at_coin_flip() {
        assert!((pressure(0.5, 0.35) - 1.0).abs() < 1e-12);
        assert!(pressure(0.3, 0.35) < 1.0);
        assert!(pressure(0.3, 0.35) > pressure(0.1, 0.35));
    }

    #[test]
    fn pressure_is_zero_at_certainty() {
        assert_eq!(pressure(0.0, 0.35), 0.0);
        assert_eq!(pressure(1.0, 0.35), 0.0);
        assert_eq!(pressure(1.4, 0.35), 0.0);
        assert_eq!(pressure(f64::NAN, 0.35), 0.0);
    }

    #[test]
    fn pressure_is_symmetric() {
        assert!((pressure(0.2, 0.35) - pressure(0.8, 0.35)).abs() < 1e-12);
    }

    #[test]
    fn locked_team_sits_at_base() {
        let cfg = MotivationConfig::default();
        let row = StageProbabilityRow {
            direct_qualify: 100.0,
            expected_position: 1.2,
            ..StageProbabilityRow::new("A", "a", 1)
        };
        assert_eq!(motivation(&row, 100.0, &cfg), cfg.base);
    }

    #[test]
    fn balanced_on_both_cutoffs_is_highest() {
        let cfg = MotivationConfig::default();
        let row = StageProbabilityRow {
            direct_qualify: 50.0,
            playoff_qualify: 10.0,
            expected_position: 8.5,
            ..StageProbabilityRow::new("A", "a", 8)
        };
        let m = motivation(&row, 50.0, &cfg);
        // 12 + 65 + 45 clamps at the top.
        assert_eq!(m, 100.0);
    }

    #[test]
    fn seed_term_needs_playoff_mass_and_mid_table() {
        let cfg = MotivationConfig::default();
        let mid = StageProbabilityRow {
            playoff_qualify: 90.0,
            expected_position: 12.5,
            ..StageProbabilityRow::new("A", "a", 12)
        };
        let base = motivation(&mid, 100.0, &cfg);
        assert!((base - (cfg.base + cfg.seed_weight)).abs() < 1e-9);

        let thin = StageProbabilityRow {
            playoff_qualify: 30.0,
            ..mid.clone()
        };
        assert_eq!(motivation(&thin, 100.0, &cfg), cfg.base);

        let far = StageProbabilityRow {
            expected_position: 20.0,
            ..mid
        };
        assert_eq!(motivation(&far, 100.0, &cfg), cfg.base);
    }
}
