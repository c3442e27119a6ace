use std::collections::HashMap;

use crate::models::{Book, RankedBook, User, VisibilityPolicy};

/// The signed-in user a search is ranked for
#[derive(Debug, Clone, Copy)]
pub struct Viewer<'a> {
    pub uid: &'a str,
    pub blocked_uids: &'a [String],
}

impl<'a> Viewer<'a> {
    pub fn from_user(user: &'a User) -> Self {
        Self {
            uid: &user.uid,
            blocked_uids: &user.blocked_uids,
        }
    }

    fn hides(&self, owner_uid: &str) -> bool {
        owner_uid == self.uid || self.blocked_uids.iter().any(|b| b == owner_uid)
    }
}

/// Reputation-weighted listing ranker
///
/// Pure and request-scoped: owners are looked up in the map supplied by the
/// caller and nothing is written back to them.
#[derive(Debug, Clone)]
pub struct VisibilityRanker {
    policy: VisibilityPolicy,
}

impl VisibilityRanker {
    pub fn new(policy: VisibilityPolicy) -> Self {
        Self { policy }
    }

    pub fn with_default_policy() -> Self {
        Self {
            policy: VisibilityPolicy::default(),
        }
    }

    /// Visibility score for a listing owner
    ///
    /// Owners without a record or without a computed reputation count as neutral.
    pub fn score(&self, owner: Option<&User>) -> f64 {
        let reputation = owner
            .and_then(|o| o.reputation)
            .unwrap_or(self.policy.neutral_reputation);
        let mismatches = owner.map(|o| o.mismatch_count).unwrap_or(0);

        reputation - self.policy.mismatch_weight * mismatches as f64
    }

    /// Filter and order candidate listings for a viewer
    ///
    /// Listings owned by the viewer or by anyone they blocked are dropped,
    /// as is every listing whose owner scores below the cutoff. Survivors
    /// are sorted by score, highest first; equal scores keep input order.
    pub fn rank(
        &self,
        candidates: Vec<Book>,
        owners: &HashMap<String, User>,
        viewer: Option<Viewer<'_>>,
    ) -> Vec<RankedBook> {
        let mut ranked: Vec<RankedBook> = candidates
            .into_iter()
            .filter(|book| viewer.map_or(true, |v| !v.hides(&book.donor_uid)))
            .filter_map(|book| {
                let owner = owners.get(&book.donor_uid);
                let visibility_score = self.score(owner);

                if visibility_score < self.policy.min_score {
                    return None;
                }

                let owner_name = owner
                    .and_then(|o| o.public_name())
                    .map(str::to_string)
                    .or_else(|| book.donor_name.clone())
                    .unwrap_or_else(|| "Unknown User".to_string());

                Some(RankedBook {
                    visibility_score,
                    owner_reputation: owner.and_then(|o| o.reputation),
                    owner_name,
                    book,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.visibility_score
                .partial_cmp(&a.visibility_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        ranked
    }
}

impl Default for VisibilityRanker {
    fn default() -> Self {
        Self::with_default_policy()
    }
}
