use crate::models::{Feedback, ReputationPolicy, ReputationSnapshot};

/// Aggregate a user's full feedback history into a reputation snapshot
///
/// Each row contributes its rating, minus the mismatch penalty when the
/// received book did not match its listing. Every contribution is clamped
/// to the rating floor *before* averaging. Returns `None` for an empty
/// history so callers leave the stored values untouched.
pub fn aggregate_reputation(
    feedback: &[Feedback],
    policy: &ReputationPolicy,
) -> Option<ReputationSnapshot> {
    if feedback.is_empty() {
        return None;
    }

    let mut total = 0.0;
    let mut mismatch_count = 0u32;

    for row in feedback {
        let mut effective = row.rating;
        if row.condition_matched == Some(false) {
            effective -= policy.mismatch_penalty;
            mismatch_count += 1;
        }
        total += effective.max(policy.rating_floor);
    }

    let mean = total / feedback.len() as f64;

    Some(ReputationSnapshot {
        reputation: round2(mean),
        mismatch_count,
    })
}

#[inline]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn feedback(rating: f64, condition_matched: Option<bool>) -> Feedback {
        Feedback {
            id: String::new(),
            from_uid: "student".to_string(),
            to_uid: "donor".to_string(),
            rating,
            condition_matched,
            request_id: None,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_history_is_noop() {
        assert_eq!(aggregate_reputation(&[], &ReputationPolicy::default()), None);
    }

    #[test]
    fn test_mismatch_penalty() {
        let rows = vec![feedback(5.0, Some(true)), feedback(4.0, Some(false))];
        let snapshot = aggregate_reputation(&rows, &ReputationPolicy::default()).unwrap();

        assert_eq!(snapshot.reputation, 3.75);
        assert_eq!(snapshot.mismatch_count, 1);
    }

    #[test]
    fn test_clamp_before_average() {
        // 1 - 1.5 clamps to 1, so the mean is (1 + 5) / 2 rather than (-0.5 + 5) / 2
        let rows = vec![feedback(1.0, Some(false)), feedback(5.0, None)];
        let snapshot = aggregate_reputation(&rows, &ReputationPolicy::default()).unwrap();

        assert_eq!(snapshot.reputation, 3.0);
    }

    #[test]
    fn test_missing_condition_is_not_a_mismatch() {
        let rows = vec![feedback(3.0, None), feedback(4.0, None)];
        let snapshot = aggregate_reputation(&rows, &ReputationPolicy::default()).unwrap();

        assert_eq!(snapshot.reputation, 3.5);
        assert_eq!(snapshot.mismatch_count, 0);
    }

    #[test]
    fn test_rounds_to_two_decimals() {
        let rows = vec![feedback(5.0, None), feedback(4.0, None), feedback(4.0, None)];
        let snapshot = aggregate_reputation(&rows, &ReputationPolicy::default()).unwrap();

        assert_eq!(snapshot.reputation, 4.33);
    }
}
