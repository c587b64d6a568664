//! Weight and vote-allocation math for auto-contribute.

use std::collections::BTreeMap;

use patron_jobs::Randomizer;
use patron_types::PublisherActivity;

/// Map dwell seconds to an attention score. The curve starts at zero,
/// rises steeply for the first minutes of attention and flattens for long
/// sessions. Its constants are anchored on the minimum-duration threshold.
fn seconds_to_score(seconds: f64, min_duration_secs: f64) -> f64 {
    let c = seconds * 100.0;
    let min_duration_big = min_duration_secs * 100.0;
    let a = 15_000.0 - min_duration_big;
    let b = 2.0 * min_duration_big - 15_000.0;
    if a == 0.0 {
        // A 150-second threshold degenerates the quotient.
        return c / b;
    }
    (-b + (b * b + 4.0 * a * c).sqrt()) / (2.0 * a)
}

/// Compute normalized attention weights for qualified publishers.
///
/// Publishers below either threshold are excluded; the rest are weighted
/// by a concave function of their cumulative dwell time and normalized so
/// the weights sum to 1.
pub fn calculate_weights(
    publishers: &[PublisherActivity],
    min_visits: i64,
    min_duration_secs: f64,
) -> BTreeMap<String, f64> {
    let mut durations: BTreeMap<String, f64> = BTreeMap::new();
    for activity in publishers {
        if activity.visits >= min_visits && activity.duration_secs >= min_duration_secs {
            *durations.entry(activity.publisher_id.clone()).or_default() +=
                activity.duration_secs;
        }
    }

    let mut total_score = 0.0;
    let mut scores: BTreeMap<String, f64> = BTreeMap::new();
    for (publisher_id, duration) in durations {
        let score = seconds_to_score(duration, min_duration_secs);
        total_score += score;
        scores.insert(publisher_id, score);
    }

    if total_score <= 0.0 {
        return BTreeMap::new();
    }

    for score in scores.values_mut() {
        *score /= total_score;
    }

    scores
}

/// Allocate `total_votes` votes across publishers proportionally to their
/// weights, by repeated sampling. The total allocated always equals
/// `total_votes` exactly.
pub fn allocate_votes(
    randomizer: &dyn Randomizer,
    weights: &BTreeMap<String, f64>,
    total_votes: usize,
) -> BTreeMap<String, usize> {
    let mut votes: BTreeMap<String, usize> = weights
        .keys()
        .map(|publisher_id| (publisher_id.clone(), 0))
        .collect();

    if weights.is_empty() {
        return votes;
    }

    let mut votes_remaining = total_votes;
    while votes_remaining > 0 {
        let draw = randomizer.uniform01();
        let mut upper_bound = 0.0;
        for (publisher_id, weight) in weights {
            upper_bound += weight;
            // Inclusive comparison: a draw landing exactly on a boundary
            // goes to the earlier publisher in iteration order.
            if upper_bound >= draw {
                if let Some(count) = votes.get_mut(publisher_id) {
                    *count += 1;
                    votes_remaining -= 1;
                }
                break;
            }
        }
    }

    votes
}
