use rust_decimal::Decimal;
use trade_copier_domain::ids::Direction;

/// Compute the acceptable limit price for a BUY_LIMIT (`Direction::Buy`) or
/// SELL_LIMIT (`Direction::Sell`) order: the price closest to the market
/// reference that is still no worse than the donor's original price
/// (`spec.md` §4.6).
///
/// `market_ref` is the ask for a buy-side limit, the bid for a sell-side
/// limit; `offset` is the current safety offset (`offset_points · point`).
pub fn limit_price(
    direction: Direction,
    market_ref: Decimal,
    original_price: Decimal,
    offset: Decimal,
) -> Decimal {
    match direction {
        Direction::Buy => {
            let candidate = market_ref - offset;
            if original_price > candidate {
                original_price
            } else {
                candidate
            }
        }
        Direction::Sell => {
            let candidate = market_ref + offset;
            if original_price < candidate {
                original_price
            } else {
                candidate
            }
        }
    }
}

/// Whether `our_price` is no worse than `original_price` for a limit order
/// of the given direction, within a tolerance of `0.1 · point`.
///
/// Reflexive: `dominance(p, p, _, point) == true` for any `point >= 0`.
pub fn dominance(
    our_price: Decimal,
    original_price: Decimal,
    direction: Direction,
    point: Decimal,
) -> bool {
    let epsilon = point * Decimal::new(1, 1); // 0.1 * point
    match direction {
        Direction::Buy => our_price <= original_price + epsilon,
        Direction::Sell => our_price >= original_price - epsilon,
    }
}

/// Round a price to the symbol's number of decimal digits.
pub fn round_to_digits(price: Decimal, digits: u32) -> Decimal {
    price.round_dp(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn buy_limit_prefers_donor_price_when_closer_to_client() {
        // spec.md §8 scenario 1: ask=1.10025, offset=2*point=0.00002, original=1.10000
        let price = limit_price(Direction::Buy, dec!(1.10025), dec!(1.10000), dec!(0.00002));
        assert_eq!(price, dec!(1.10000));
    }

    #[test]
    fn buy_limit_uses_market_candidate_when_it_does_not_worsen_donor_price() {
        let price = limit_price(Direction::Buy, dec!(1.10010), dec!(1.10000), dec!(0.00002));
        assert_eq!(price, dec!(1.10008));
    }

    #[test]
    fn sell_limit_symmetric() {
        let price = limit_price(Direction::Sell, dec!(1.09990), dec!(1.10000), dec!(0.00002));
        assert_eq!(price, dec!(1.10000));
    }

    #[test]
    fn dominance_is_reflexive() {
        assert!(dominance(dec!(1.10000), dec!(1.10000), Direction::Buy, dec!(0.00001)));
        assert!(dominance(dec!(1.10000), dec!(1.10000), Direction::Sell, dec!(0.00001)));
    }

    #[test]
    fn dominance_rejects_worse_buy_price() {
        assert!(!dominance(
            dec!(1.10050),
            dec!(1.10000),
            Direction::Buy,
            dec!(0.00001)
        ));
    }

    proptest::proptest! {
        #[test]
        fn limit_price_is_monotone_in_offset(
            market in 1.0f64..2.0,
            original in 1.0f64..2.0,
            offset_a in 0.0f64..0.01,
            offset_b in 0.0f64..0.01,
        ) {
            let market = Decimal::try_from(market).unwrap();
            let original = Decimal::try_from(original).unwrap();
            let (small, big) = if offset_a <= offset_b { (offset_a, offset_b) } else { (offset_b, offset_a) };
            let small = Decimal::try_from(small).unwrap();
            let big = Decimal::try_from(big).unwrap();

            // BUY_LIMIT: a larger offset never yields a price worse for the client
            // (i.e. never higher) than a smaller offset.
            let p_small = limit_price(Direction::Buy, market, original, small);
            let p_big = limit_price(Direction::Buy, market, original, big);
            prop_assert!(p_big <= p_small);

            let p_small = limit_price(Direction::Sell, market, original, small);
            let p_big = limit_price(Direction::Sell, market, original, big);
            prop_assert!(p_big >= p_small);
        }
    }
}
