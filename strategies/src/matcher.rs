use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use trade_copier_domain::ids::{DonorKey, Ticket};
use trade_copier_domain::position::{ClientPosition, DonorPosition};

/// A donor/client position must score at least this much to be accepted
/// (`spec.md` §4.10).
pub const ACCEPT_THRESHOLD: Decimal = dec!(20);

/// Score one donor/client candidate pairing. `None` means the pair is
/// rejected outright (symbol/direction mismatch, a strict magic-tag
/// mismatch when `copy_donor_magic` is set, or a net score below zero).
pub fn score_candidate(
    donor: &DonorPosition,
    client: &ClientPosition,
    point: Decimal,
    copy_donor_magic: bool,
    previously_paired: bool,
) -> Option<Decimal> {
    if donor.symbol != client.symbol || donor.direction != client.direction {
        return None;
    }

    let mut score = dec!(20);

    match (copy_donor_magic, donor.magic_tag) {
        (true, Some(donor_magic)) => {
            if client.magic_tag != Some(donor_magic) {
                return None;
            }
            score += dec!(30);
        }
        _ => {
            if let (Some(d), Some(c)) = (donor.magic_tag, client.magic_tag) {
                if d == c {
                    score += dec!(15);
                }
            }
        }
    }

    let delta_secs = donor
        .time_opened
        .signed_duration_since(client.time_opened)
        .num_seconds()
        .abs();
    score += time_proximity_score(delta_secs);

    let tolerance = (point * dec!(100)).max(dec!(0.01));
    let diff = (donor.price_open - client.price_open).abs();
    score += price_proximity_score(diff, tolerance);

    if previously_paired {
        score += dec!(10);
    }

    if score < Decimal::ZERO {
        return None;
    }

    Some(score)
}

fn time_proximity_score(delta_secs: i64) -> Decimal {
    let d = Decimal::from(delta_secs);
    if delta_secs <= 60 {
        dec!(20) * (Decimal::ONE - d / dec!(60))
    } else if delta_secs <= 300 {
        dec!(15) * (Decimal::ONE - (d - dec!(60)) / dec!(240))
    } else if delta_secs <= 3600 {
        dec!(10) * (Decimal::ONE - (d - dec!(300)) / dec!(3300))
    } else if delta_secs <= 86400 {
        dec!(5) * (Decimal::ONE - (d - dec!(3600)) / dec!(82800))
    } else {
        Decimal::ZERO
    }
}

fn price_proximity_score(diff: Decimal, tolerance: Decimal) -> Decimal {
    if diff <= tolerance {
        dec!(10) * (Decimal::ONE - diff / tolerance)
    } else {
        let over = ((diff - tolerance) / tolerance).min(Decimal::ONE);
        -(dec!(10) * over)
    }
}

/// Greedily pair unlinked donor positions with unlinked client positions,
/// highest score first, consuming each ticket at most once (`spec.md`
/// §4.10). `points` supplies each symbol's point size; a donor or client
/// position whose symbol is absent from it cannot be matched.
pub fn run_matcher(
    donors: &[(DonorKey, DonorPosition)],
    clients: &[ClientPosition],
    points: &HashMap<trade_copier_domain::ids::Symbol, Decimal>,
    copy_donor_magic: bool,
    saved_pairs: &HashMap<DonorKey, Ticket>,
) -> Vec<(DonorKey, Ticket)> {
    let mut candidates: Vec<(usize, usize, Decimal)> = Vec::new();

    for (donor_index, (donor_key, donor)) in donors.iter().enumerate() {
        let Some(&point) = points.get(&donor.symbol) else {
            continue;
        };
        for (client_index, client) in clients.iter().enumerate() {
            let previously_paired = saved_pairs.get(donor_key) == Some(&client.ticket);
            if let Some(score) =
                score_candidate(donor, client, point, copy_donor_magic, previously_paired)
            {
                if score >= ACCEPT_THRESHOLD {
                    candidates.push((donor_index, client_index, score));
                }
            }
        }
    }

    candidates.sort_by(|a, b| b.2.cmp(&a.2));

    let mut used_donors = HashSet::new();
    let mut used_clients = HashSet::new();
    let mut accepted = Vec::new();

    for (donor_index, client_index, _score) in candidates {
        if used_donors.contains(&donor_index) || used_clients.contains(&client_index) {
            continue;
        }
        used_donors.insert(donor_index);
        used_clients.insert(client_index);
        accepted.push((donors[donor_index].0.clone(), clients[client_index].ticket));
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use trade_copier_domain::ids::{Direction, MagicTag, SourceId, Symbol};

    fn donor(symbol: &str, direction: Direction, price: Decimal, magic: Option<u32>) -> DonorPosition {
        DonorPosition {
            ticket: Ticket(1),
            source_id: SourceId::new("donor-a"),
            symbol: Symbol::new(symbol),
            direction,
            volume: dec!(0.1),
            price_open: price,
            price_current: price,
            profit: Decimal::ZERO,
            time_opened: Utc::now(),
            magic_tag: magic.map(MagicTag),
            comment: None,
            sl: None,
            tp: None,
        }
    }

    fn client(symbol: &str, direction: Direction, price: Decimal, magic: Option<u32>, ticket: u64) -> ClientPosition {
        ClientPosition {
            ticket: Ticket(ticket),
            symbol: Symbol::new(symbol),
            direction,
            volume: dec!(0.1),
            price_open: price,
            price_current: price,
            profit: Decimal::ZERO,
            time_opened: Utc::now(),
            magic_tag: magic.map(MagicTag),
            comment: None,
            sl: None,
            tp: None,
        }
    }

    #[test]
    fn rejects_symbol_mismatch() {
        let d = donor("EURUSD", Direction::Buy, dec!(1.1), None);
        let c = client("GBPUSD", Direction::Buy, dec!(1.1), None, 1);
        assert_eq!(score_candidate(&d, &c, dec!(0.00001), false, false), None);
    }

    #[test]
    fn exact_same_price_and_time_scores_near_maximum() {
        let d = donor("EURUSD", Direction::Buy, dec!(1.10000), Some(5));
        let c = client("EURUSD", Direction::Buy, dec!(1.10000), Some(5), 1);
        let score = score_candidate(&d, &c, dec!(0.00001), false, false).unwrap();
        assert_eq!(score, dec!(20) + dec!(15) + dec!(20) + dec!(10));
    }

    #[test]
    fn strict_magic_requirement_rejects_mismatch() {
        let d = donor("EURUSD", Direction::Buy, dec!(1.1), Some(5));
        let c = client("EURUSD", Direction::Buy, dec!(1.1), Some(6), 1);
        assert_eq!(score_candidate(&d, &c, dec!(0.00001), true, false), None);
    }

    #[test]
    fn greedy_matcher_picks_highest_scorer_and_does_not_reuse_tickets() {
        let donor_key_a = DonorKey::new(SourceId::new("donor-a"), Ticket(1));
        let donor_key_b = DonorKey::new(SourceId::new("donor-a"), Ticket(2));
        let donors = vec![
            (donor_key_a.clone(), donor("EURUSD", Direction::Buy, dec!(1.10000), None)),
            (donor_key_b.clone(), donor("EURUSD", Direction::Buy, dec!(1.10050), None)),
        ];
        let clients = vec![client("EURUSD", Direction::Buy, dec!(1.10001), None, 100)];
        let mut points = HashMap::new();
        points.insert(Symbol::new("EURUSD"), dec!(0.00001));

        let result = run_matcher(&donors, &clients, &points, false, &HashMap::new());
        assert_eq!(result, vec![(donor_key_a, Ticket(100))]);
    }
}
