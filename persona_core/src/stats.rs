//! Small statistics helpers shared by the aggregators and simulators.
//!
//! Rankings here are deterministic: counting preserves first-seen order and
//! ties keep that order.

/// Arithmetic mean, or `None` for an empty input.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Mean over the present values only; absent values do not bias it.
pub fn mean_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    mean(values.into_iter().flatten())
}

/// Counts items, keeping first-seen order.
pub fn frequencies<'a, I>(items: I) -> Vec<(&'a str, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(&'a str, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
}

/// The `k` most frequent items; ties keep first-seen order.
pub fn top_k<'a, I>(items: I, k: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = frequencies(items);
    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(k)
        .map(|(item, _)| item.to_string())
        .collect()
}

/// Up to `k` distinct items in first-seen order.
pub fn distinct_first_seen<I>(items: I, k: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if out.len() == k {
            break;
        }
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Percentile with linear interpolation between closest ranks.
///
/// `q` is in [0, 100]. Returns `None` for an empty sample.
pub fn percentile(samples: &[f64], q: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_empty_is_none() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert_relative_eq!(mean(vec![4.0, 2.0, -3.0]).unwrap(), 1.0);
    }

    #[test]
    fn test_mean_present_skips_absent() {
        let m = mean_present(vec![Some(4.0), None, Some(2.0)]).unwrap();
        assert_relative_eq!(m, 3.0);
        assert_eq!(mean_present(vec![None, None]), None);
    }

    #[test]
    fn test_top_k_ties_keep_first_seen() {
        let items = ["b", "a", "c", "a", "b", "d"];
        assert_eq!(top_k(items, 3), vec!["b", "a", "c"]);
        assert_eq!(top_k(["x"], 3), vec!["x"]);
    }

    #[test]
    fn test_distinct_first_seen() {
        let items = ["q", "p", "q", "r", "s"].map(String::from);
        assert_eq!(distinct_first_seen(items, 3), vec!["q", "p", "r"]);
    }

    #[test]
    fn test_percentile_interpolates() {
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(percentile(&samples, 50.0).unwrap(), 3.0);
        assert_relative_eq!(percentile(&samples, 2.5).unwrap(), 1.1, epsilon = 1e-9);
        assert_relative_eq!(percentile(&samples, 97.5).unwrap(), 4.9, epsilon = 1e-9);
        assert_eq!(percentile(&[], 50.0), None);
    }
}
