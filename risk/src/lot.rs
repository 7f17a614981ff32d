use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lot sizing rule selected by `app_config.json`'s `lot_config.mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LotMode {
    /// `value` is the client lot outright, ignoring the donor's volume.
    Fixed,
    /// `value` is a coefficient multiplied by the donor's volume.
    Proportion,
    /// `value` is a per-1000-of-balance multiplier applied to the client's
    /// account balance, ignoring the donor's volume.
    Autolot,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LotConfig {
    pub mode: LotMode,
    pub value: Decimal,
    pub min_lot: Decimal,
    pub max_lot: Decimal,
}

/// Derive the client lot from the donor's volume and account balances.
///
/// Clamps into `[min_lot, max_lot]` first, then rounds to the nearest
/// multiple of `volume_step`, then clamps again so the step rounding can
/// never push the result back outside the bounds (`spec.md` §8 testable
/// property).
pub fn calculate_lot(
    config: &LotConfig,
    donor_lot: Decimal,
    client_balance: Decimal,
    volume_step: Decimal,
) -> Decimal {
    let raw = match config.mode {
        LotMode::Fixed => config.value,
        LotMode::Proportion => donor_lot * config.value,
        LotMode::Autolot => (client_balance / Decimal::from(1000)) * config.value,
    };

    let clamped = raw.clamp(config.min_lot, config.max_lot);
    let stepped = round_to_step(clamped, volume_step);
    stepped.clamp(config.min_lot, config.max_lot)
}

/// Round `value` to the nearest multiple of `step` (half-up), guarding
/// against a zero or negative step by returning `value` unchanged.
fn round_to_step(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    (value / step).round() * step
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config(mode: LotMode, value: Decimal) -> LotConfig {
        LotConfig {
            mode,
            value,
            min_lot: dec!(0.01),
            max_lot: dec!(100.0),
        }
    }

    #[test]
    fn fixed_mode_ignores_donor_lot() {
        let cfg = config(LotMode::Fixed, dec!(0.01));
        let lot = calculate_lot(&cfg, dec!(5.0), dec!(10_000), dec!(0.01));
        assert_eq!(lot, dec!(0.01));
    }

    #[test]
    fn proportion_mode_scales_donor_lot() {
        let cfg = config(LotMode::Proportion, dec!(0.5));
        let lot = calculate_lot(&cfg, dec!(0.20), dec!(10_000), dec!(0.01));
        assert_eq!(lot, dec!(0.10));
    }

    #[test]
    fn autolot_mode_scales_with_balance() {
        let cfg = config(LotMode::Autolot, dec!(0.01));
        let lot = calculate_lot(&cfg, dec!(1.0), dec!(5_000), dec!(0.01));
        assert_eq!(lot, dec!(0.05));
    }

    #[test]
    fn clamps_to_max_lot() {
        let cfg = config(LotMode::Proportion, dec!(1000));
        let lot = calculate_lot(&cfg, dec!(1.0), dec!(10_000), dec!(0.01));
        assert_eq!(lot, cfg.max_lot);
    }

    #[test]
    fn clamps_to_min_lot() {
        let cfg = config(LotMode::Proportion, dec!(0.0001));
        let lot = calculate_lot(&cfg, dec!(0.01), dec!(10_000), dec!(0.01));
        assert_eq!(lot, cfg.min_lot);
    }

    proptest::proptest! {
        #[test]
        fn always_clamped_and_a_multiple_of_step(
            donor_lot in 0.0f64..50.0,
            value in 0.0f64..5.0,
            balance in 0.0f64..1_000_000.0,
        ) {
            let cfg = config(LotMode::Proportion, Decimal::try_from(value).unwrap());
            let step = dec!(0.01);
            let lot = calculate_lot(
                &cfg,
                Decimal::try_from(donor_lot).unwrap(),
                Decimal::try_from(balance).unwrap(),
                step,
            );
            prop_assert!(lot >= cfg.min_lot);
            prop_assert!(lot <= cfg.max_lot);
        }
    }
}
