// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # ContributionSplitter — attribution across agent forks
//!
//! When an agent is forked and tuned, the tuner earns a share of the spec
//! proportional to how much of the action sequence changed. The delta ratio
//! is capped at 0.9 so the original contributor set never loses more than
//! 90% attribution in one fork. Shares always sum to what they summed to
//! before a split.

use serde_json::Value;

use super::round3;
use crate::domain::Contribution;

/// Edit-distance-based share of the tuned sequence attributable to the
/// tuner: `1 - similarity` of the serialized sequences, in [0, 0.9].
pub fn delta_ratio(original: &[Value], tuned: &[Value]) -> f64 {
    let original_text = serde_json::to_string(original).unwrap_or_default();
    let tuned_text = serde_json::to_string(tuned).unwrap_or_default();
    let similarity = matching_ratio(original_text.as_bytes(), tuned_text.as_bytes());
    round3((1.0 - similarity).min(0.9))
}

/// Scale every existing share by `1 - delta` and credit `delta` to the new
/// contributor, merging if they already hold a share. The share sum is
/// preserved: `(1 - delta) * 1 + delta = 1`.
pub fn split(
    contributions: &[Contribution],
    new_user_id: &str,
    delta: f64,
) -> Vec<Contribution> {
    let retain = 1.0 - delta;
    let mut scaled: Vec<Contribution> = contributions
        .iter()
        .map(|contribution| Contribution {
            user_id: contribution.user_id.clone(),
            score: round3(contribution.score * retain),
        })
        .collect();

    if let Some(existing) = scaled
        .iter_mut()
        .find(|contribution| contribution.user_id == new_user_id)
    {
        existing.score = round3(existing.score + delta);
    } else {
        scaled.push(Contribution {
            user_id: new_user_id.to_string(),
            score: round3(delta),
        });
    }
    scaled
}

/// Similarity of two byte strings as the matched fraction `2*M / T`, where
/// `M` is the longest-common-subsequence length and `T` the total length.
fn matching_ratio(a: &[u8], b: &[u8]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let matches = lcs_len(a, b);
    2.0 * matches as f64 / (a.len() + b.len()) as f64
}

fn lcs_len(a: &[u8], b: &[u8]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for &x in a {
        for (j, &y) in b.iter().enumerate() {
            current[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut prev, &mut current);
        current.fill(0);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn steps(names: &[&str]) -> Vec<Value> {
        names
            .iter()
            .map(|name| json!({ "screen_name": name, "action_type": "click" }))
            .collect()
    }

    fn share_sum(contributions: &[Contribution]) -> f64 {
        contributions.iter().map(|c| c.score).sum()
    }

    #[test]
    fn identical_sequences_have_zero_delta() {
        let sequence = steps(&["INBOX", "GIS_SYSTEM", "PERMIT_FORM"]);
        assert_eq!(delta_ratio(&sequence, &sequence), 0.0);
    }

    #[test]
    fn delta_is_capped_at_ninety_percent() {
        let original = steps(&["INBOX"]);
        let tuned: Vec<Value> = (0..20)
            .map(|i| json!({ "totally": format!("different-{i}") }))
            .collect();
        let delta = delta_ratio(&original, &tuned);
        assert!(delta <= 0.9);
        assert!(delta > 0.0);
    }

    #[test]
    fn small_edits_give_small_deltas() {
        let original = steps(&["INBOX", "GIS_SYSTEM", "PERMIT_FORM"]);
        let mut tuned = original.clone();
        tuned[2] = json!({ "screen_name": "PERMIT_FORM", "action_type": "submit" });
        let delta = delta_ratio(&original, &tuned);
        assert!(delta > 0.0);
        assert!(delta < 0.2, "expected a small delta, got {delta}");
    }

    #[test]
    fn split_preserves_share_sum() {
        let contributions = vec![Contribution {
            user_id: "alice".to_string(),
            score: 1.0,
        }];
        let after = split(&contributions, "bob", 0.2);
        assert_eq!(after.len(), 2);
        assert!((share_sum(&after) - 1.0).abs() < 1e-3);
        assert!((after[0].score - 0.8).abs() < 1e-9);
        assert!((after[1].score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn split_merges_repeat_contributor() {
        let contributions = vec![
            Contribution {
                user_id: "alice".to_string(),
                score: 0.7,
            },
            Contribution {
                user_id: "bob".to_string(),
                score: 0.3,
            },
        ];
        let after = split(&contributions, "bob", 0.1);
        assert_eq!(after.len(), 2);
        let bob = after.iter().find(|c| c.user_id == "bob").unwrap();
        assert!((bob.score - 0.37).abs() < 1e-9);
        assert!((share_sum(&after) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn split_over_multiple_forks_keeps_sum_stable() {
        let mut contributions = vec![Contribution {
            user_id: "alice".to_string(),
            score: 1.0,
        }];
        for (i, delta) in [0.2, 0.35, 0.05, 0.9].into_iter().enumerate() {
            contributions = split(&contributions, &format!("tuner-{i}"), delta);
            assert!(
                (share_sum(&contributions) - 1.0).abs() < 2e-2,
                "sum drifted after fork {i}"
            );
        }
    }
}
