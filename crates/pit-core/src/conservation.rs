//! Conservation check over a collected snapshot.
//!
//! Cards are never created or destroyed by a trade, only moved. A consistent
//! snapshot therefore holds, per commodity, exactly the number of cards that
//! were dealt:
//!
//! ```text
//! sum(report.holdings[C] for every player) == dealt[C]
//! ```
//!
//! The recorded holdings already include cards that were in flight when the
//! snapshot was cut, so no separate channel accounting is needed here.
//!
//! A mismatch is reported as a [`SnapshotAnomaly`]. Known causes are a
//! snapshot cut across a trade cutoff or a HALT, both of which drop the card
//! in the message being answered.

use std::collections::{BTreeMap, BTreeSet};

use pit_types::{Commodity, PeerId, SnapshotReport};

/// The result of a conservation check for one epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// Every commodity adds up.
    Balanced,
    /// The reports do not add up to what was dealt.
    Anomaly(SnapshotAnomaly),
}

impl ConservationResult {
    /// Whether the check passed.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Details of a failed conservation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotAnomaly {
    /// Epoch of the reports that were checked.
    pub epoch: u64,
    /// Per commodity: (dealt, recorded), only where they differ.
    pub imbalances: BTreeMap<Commodity, (u64, u64)>,
    /// Players that reported more than once.
    pub duplicate_reports: Vec<PeerId>,
    /// Human-readable summary.
    pub message: String,
}

/// Check that the reports of one epoch account for every dealt card.
///
/// `dealt` maps each commodity to the number of copies in play. The epoch
/// of the first report is used to label the result.
pub fn verify_snapshot(
    reports: &[SnapshotReport],
    dealt: &BTreeMap<Commodity, u64>,
) -> ConservationResult {
    let epoch = reports.first().map_or(0, |r| r.epoch);

    let mut recorded: BTreeMap<Commodity, u64> = BTreeMap::new();
    let mut seen = BTreeSet::new();
    let mut duplicate_reports = Vec::new();

    for report in reports {
        if !seen.insert(report.player) {
            duplicate_reports.push(report.player);
        }
        for (commodity, count) in &report.holdings {
            let total = recorded.entry(commodity.clone()).or_insert(0);
            *total = total.saturating_add(u64::from(*count));
        }
    }

    let commodities: BTreeSet<&Commodity> = dealt.keys().chain(recorded.keys()).collect();
    let imbalances: BTreeMap<Commodity, (u64, u64)> = commodities
        .into_iter()
        .filter_map(|commodity| {
            let want = dealt.get(commodity).copied().unwrap_or(0);
            let have = recorded.get(commodity).copied().unwrap_or(0);
            (want != have).then(|| (commodity.clone(), (want, have)))
        })
        .collect();

    if imbalances.is_empty() && duplicate_reports.is_empty() {
        return ConservationResult::Balanced;
    }

    let count = imbalances.len();
    let dupes = duplicate_reports.len();
    ConservationResult::Anomaly(SnapshotAnomaly {
        epoch,
        imbalances,
        duplicate_reports,
        message: format!(
            "SNAPSHOT_ANOMALY at epoch {epoch}: {count} commodity(ies) out of balance, \
             {dupes} duplicate report(s)",
        ),
    })
}

/// Count the copies of each commodity in a deck.
pub fn tally<'a>(cards: impl IntoIterator<Item = &'a Commodity>) -> BTreeMap<Commodity, u64> {
    let mut totals = BTreeMap::new();
    for card in cards {
        let total: &mut u64 = totals.entry(card.clone()).or_insert(0);
        *total = total.saturating_add(1);
    }
    totals
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn report(player: u32, holdings: &[(&str, u32)]) -> SnapshotReport {
        SnapshotReport {
            player: PeerId(player),
            epoch: 2,
            holdings: holdings
                .iter()
                .map(|(name, n)| (Commodity::from(*name), *n))
                .collect(),
        }
    }

    fn dealt() -> BTreeMap<Commodity, u64> {
        let deck: Vec<Commodity> = ["Corn", "Corn", "Corn", "Rye", "Rye", "Rye"]
            .iter()
            .map(|n| Commodity::from(*n))
            .collect();
        tally(&deck)
    }

    #[test]
    fn balanced_when_totals_match() {
        let reports = [
            report(0, &[("Corn", 2), ("Rye", 1)]),
            report(1, &[("Corn", 1), ("Rye", 2)]),
        ];
        assert_eq!(
            verify_snapshot(&reports, &dealt()),
            ConservationResult::Balanced
        );
    }

    #[test]
    fn missing_card_is_an_anomaly() {
        let reports = [
            report(0, &[("Corn", 2), ("Rye", 1)]),
            report(1, &[("Corn", 1), ("Rye", 1)]),
        ];
        let ConservationResult::Anomaly(anomaly) = verify_snapshot(&reports, &dealt()) else {
            panic!("expected an anomaly");
        };
        assert_eq!(anomaly.epoch, 2);
        assert_eq!(
            anomaly.imbalances.get(&Commodity::from("Rye")),
            Some(&(3, 2))
        );
        assert!(!anomaly.imbalances.contains_key(&Commodity::from("Corn")));
    }

    #[test]
    fn undealt_commodity_is_an_anomaly() {
        let reports = [
            report(0, &[("Corn", 3), ("Rye", 3)]),
            report(1, &[("Wheat", 1)]),
        ];
        let ConservationResult::Anomaly(anomaly) = verify_snapshot(&reports, &dealt()) else {
            panic!("expected an anomaly");
        };
        assert_eq!(
            anomaly.imbalances.get(&Commodity::from("Wheat")),
            Some(&(0, 1))
        );
    }

    #[test]
    fn duplicate_report_is_an_anomaly() {
        let reports = [
            report(0, &[("Corn", 3)]),
            report(0, &[("Rye", 3)]),
        ];
        let ConservationResult::Anomaly(anomaly) = verify_snapshot(&reports, &dealt()) else {
            panic!("expected an anomaly");
        };
        assert!(anomaly.imbalances.is_empty());
        assert_eq!(anomaly.duplicate_reports, vec![PeerId(0)]);
    }

    #[test]
    fn tally_counts_copies() {
        let totals = dealt();
        assert_eq!(totals.get(&Commodity::from("Corn")), Some(&3));
        assert_eq!(totals.get(&Commodity::from("Rye")), Some(&3));
        assert_eq!(totals.len(), 2);
    }
}
