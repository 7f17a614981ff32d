//! Position Monitor (`spec.md` §4.3): tracks donor/client position state
//! across cycles and derives the three event kinds the Order Planner and
//! strategies crates act on. SL/TP and price drift are not tracked — only
//! presence (new/closed) and volume changes are actionable here.

use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use trade_copier_domain::ids::{DonorKey, Ticket};
use trade_copier_domain::position::{ClientPosition, DonorPosition};

/// Volume delta threshold below which a change is considered noise rather
/// than a reportable lot adjustment (`spec.md` §4.3).
const VOLUME_CHANGE_THRESHOLD: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

#[derive(Debug, Clone)]
pub struct VolumeChange<Key, Item> {
    pub key: Key,
    pub previous: Item,
    pub current: Item,
    pub delta: Decimal,
}

/// A donor ticket that disappeared from the current snapshot, carrying the
/// last known state needed to close its client-side copy.
#[derive(Debug, Clone)]
pub struct ClosedDonor {
    pub donor_key: DonorKey,
    pub last_known: DonorPosition,
}

#[derive(Debug, Default)]
pub struct PositionMonitor {
    last_donor_state: HashMap<DonorKey, DonorPosition>,
    last_client_state: HashMap<Ticket, ClientPosition>,
    tracked_donor_tickets: HashSet<DonorKey>,
}

impl PositionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn donor_key(position: &DonorPosition) -> DonorKey {
        DonorKey::new(position.source_id.clone(), position.ticket)
    }

    /// Mark a donor position as already accounted for (linked by the
    /// restart-time matcher, or deliberately excluded by
    /// `copy_existing_positions = false`) without reporting it through
    /// [`Self::new_donor_positions`].
    pub fn adopt(&mut self, position: &DonorPosition) {
        let key = Self::donor_key(position);
        self.tracked_donor_tickets.insert(key.clone());
        self.last_donor_state.insert(key, position.clone());
    }

    /// Donor positions present this cycle that weren't tracked last cycle.
    /// Adds them to `tracked_donor_tickets` and `last_donor_state`.
    pub fn new_donor_positions(&mut self, current: &[DonorPosition]) -> Vec<DonorPosition> {
        let mut fresh = Vec::new();
        for position in current {
            let key = Self::donor_key(position);
            if self.tracked_donor_tickets.insert(key.clone()) {
                self.last_donor_state.insert(key, position.clone());
                fresh.push(position.clone());
            }
        }
        fresh
    }

    /// Tracked donor tickets absent from the current snapshot. Removes them
    /// from `tracked_donor_tickets` and `last_donor_state`.
    pub fn closed_donor_tickets(&mut self, current: &[DonorPosition]) -> Vec<ClosedDonor> {
        let present: HashSet<DonorKey> = current.iter().map(Self::donor_key).collect();
        let vanished: Vec<DonorKey> = self
            .tracked_donor_tickets
            .difference(&present)
            .cloned()
            .collect();

        let mut closed = Vec::with_capacity(vanished.len());
        for donor_key in vanished {
            self.tracked_donor_tickets.remove(&donor_key);
            if let Some(last_known) = self.last_donor_state.remove(&donor_key) {
                closed.push(ClosedDonor {
                    donor_key,
                    last_known,
                });
            }
        }
        closed
    }

    /// Per-donor-ticket volume deltas exceeding the threshold, overwriting
    /// `last_donor_state` with the fresh snapshot.
    pub fn volume_changes_donor(
        &mut self,
        current: &[DonorPosition],
    ) -> Vec<VolumeChange<DonorKey, DonorPosition>> {
        let mut changes = Vec::new();
        for position in current {
            let key = Self::donor_key(position);
            if let Some(previous) = self.last_donor_state.get(&key) {
                let delta = position.volume_delta(previous);
                if delta.abs() > VOLUME_CHANGE_THRESHOLD {
                    changes.push(VolumeChange {
                        key: key.clone(),
                        previous: previous.clone(),
                        current: position.clone(),
                        delta,
                    });
                }
            }
            self.last_donor_state.insert(key, position.clone());
        }
        changes
    }

    /// Per-ticket volume deltas on the client account, overwriting
    /// `last_client_state` with the fresh snapshot.
    pub fn volume_changes_client(
        &mut self,
        current: &[ClientPosition],
    ) -> Vec<VolumeChange<Ticket, ClientPosition>> {
        let mut changes = Vec::new();
        for position in current {
            if let Some(previous) = self.last_client_state.get(&position.ticket) {
                let delta = position.volume_delta(previous);
                if delta.abs() > VOLUME_CHANGE_THRESHOLD {
                    changes.push(VolumeChange {
                        key: position.ticket,
                        previous: previous.clone(),
                        current: position.clone(),
                        delta,
                    });
                }
            }
            self.last_client_state
                .insert(position.ticket, position.clone());
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use trade_copier_domain::ids::{Direction, SourceId, Symbol};

    fn donor(ticket: u64, volume: Decimal) -> DonorPosition {
        DonorPosition {
            ticket: Ticket(ticket),
            source_id: SourceId::new("donor-a"),
            symbol: Symbol::new("EURUSD"),
            direction: Direction::Buy,
            volume,
            price_open: dec!(1.1),
            price_current: dec!(1.1),
            profit: dec!(0),
            time_opened: Utc::now(),
            magic_tag: None,
            comment: None,
            sl: None,
            tp: None,
        }
    }

    #[test]
    fn a_position_is_new_exactly_once() {
        let mut monitor = PositionMonitor::new();
        let fresh = monitor.new_donor_positions(&[donor(1, dec!(0.1))]);
        assert_eq!(fresh.len(), 1);

        let fresh_again = monitor.new_donor_positions(&[donor(1, dec!(0.1))]);
        assert!(fresh_again.is_empty());
    }

    #[test]
    fn a_vanished_ticket_is_reported_closed_once() {
        let mut monitor = PositionMonitor::new();
        monitor.new_donor_positions(&[donor(1, dec!(0.1))]);

        let closed = monitor.closed_donor_tickets(&[]);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].last_known.ticket, Ticket(1));

        let closed_again = monitor.closed_donor_tickets(&[]);
        assert!(closed_again.is_empty());
    }

    #[test]
    fn volume_change_below_threshold_is_not_reported() {
        let mut monitor = PositionMonitor::new();
        monitor.new_donor_positions(&[donor(1, dec!(0.100))]);
        let changes = monitor.volume_changes_donor(&[donor(1, dec!(0.1005))]);
        assert!(changes.is_empty());
    }

    #[test]
    fn volume_change_above_threshold_is_reported() {
        let mut monitor = PositionMonitor::new();
        monitor.new_donor_positions(&[donor(1, dec!(0.10))]);
        let changes = monitor.volume_changes_donor(&[donor(1, dec!(0.20))]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].delta, dec!(0.10));
    }
}
