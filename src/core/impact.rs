use crate::models::ImpactStats;

/// Paper in one reused textbook, kg
pub const PAPER_KG_PER_BOOK: f64 = 0.8;
/// Average price of a new textbook, INR
pub const INR_PER_BOOK: f64 = 450.0;
/// Paper produced from one tree, kg
pub const PAPER_KG_PER_TREE: f64 = 15.0;
/// CO2 emitted per kg of paper produced, kg
pub const CO2_KG_PER_PAPER_KG: f64 = 2.1;

/// Raw circulation counts for one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImpactCounts {
    /// Listings the user donated
    pub books_shared: u32,
    /// Requests the user made that were completed
    pub books_received: u32,
    /// Requests addressed to the user as donor
    pub requests_received: u32,
    pub pending_requests_received: u32,
    pub completed_requests_received: u32,
}

/// Turn circulation counts into impact estimates
///
/// Savings are estimated from the books the user put into circulation:
/// their listings plus the handovers they completed as donor.
pub fn impact_stats(counts: ImpactCounts) -> ImpactStats {
    let circulated = f64::from(counts.books_shared + counts.completed_requests_received);
    let paper_saved_kg = circulated * PAPER_KG_PER_BOOK;

    ImpactStats {
        books_shared: counts.books_shared,
        books_received: counts.books_received,
        total_requests_received: counts.requests_received,
        pending_requests_received: counts.pending_requests_received,
        completed_requests_received: counts.completed_requests_received,
        total_reused: counts.books_shared + counts.books_received,
        money_saved_inr: circulated * INR_PER_BOOK,
        paper_saved_kg: round2(paper_saved_kg),
        trees_protected: round2(paper_saved_kg / PAPER_KG_PER_TREE),
        co2_saved_kg: round2(paper_saved_kg * CO2_KG_PER_PAPER_KG),
    }
}

#[inline]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_activity() {
        let stats = impact_stats(ImpactCounts::default());

        assert_eq!(stats.total_reused, 0);
        assert_eq!(stats.money_saved_inr, 0.0);
        assert_eq!(stats.trees_protected, 0.0);
    }

    #[test]
    fn test_savings_follow_circulated_books() {
        let stats = impact_stats(ImpactCounts {
            books_shared: 3,
            books_received: 2,
            requests_received: 4,
            pending_requests_received: 1,
            completed_requests_received: 2,
        });

        // 3 listed + 2 handed over
        assert_eq!(stats.total_reused, 5);
        assert_eq!(stats.money_saved_inr, 2250.0);
        assert_eq!(stats.paper_saved_kg, 4.0);
        assert_eq!(stats.trees_protected, 0.27);
        assert_eq!(stats.co2_saved_kg, 8.4);
        assert_eq!(stats.total_requests_received, 4);
    }

    #[test]
    fn test_received_books_do_not_count_as_savings() {
        let stats = impact_stats(ImpactCounts {
            books_received: 7,
            ..Default::default()
        });

        assert_eq!(stats.total_reused, 7);
        assert_eq!(stats.paper_saved_kg, 0.0);
    }
}
