//! Picks the consultant to dispatch.
//!
//! Lower occupancy wins; distance only breaks occupancy ties. Equal
//! `(occupancy, distance)` pairs keep roster order.

use crate::model::ConsultantRecord;

/// Every record was unresolved, or the roster was empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoCandidate;

/// Indices into the roster, best candidate first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    order: Vec<usize>,
}

impl Ranking {
    /// Roster index of the winner. A ranking is never empty.
    pub fn winner(&self) -> usize {
        self.order[0]
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Ranks routable records by `(occupancy, distance_km)`.
pub fn select(records: &[ConsultantRecord]) -> Result<Ranking, NoCandidate> {
    let mut order: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.is_routable())
        .map(|(index, _)| index)
        .collect();

    if order.is_empty() {
        return Err(NoCandidate);
    }

    // sort_by is stable, which is what keeps first-seen ahead on full ties
    order.sort_by(|&a, &b| {
        let (a, b) = (&records[a], &records[b]);
        a.occupancy()
            .total_cmp(&b.occupancy())
            .then_with(|| a.distance_km.total_cmp(&b.distance_km))
    });

    Ok(Ranking { order })
}
