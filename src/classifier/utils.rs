use ndarray::Array1;

/// Numerically stable softmax over log-space scores.
pub(crate) fn softmax(scores: &Array1<f64>) -> Array1<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Array1::zeros(scores.len());
    }
    let exp = scores.mapv(|s| (s - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Index of the highest score. Ties go to the lowest index.
pub(crate) fn argmax_first(scores: &Array1<f64>) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some(b) if score <= scores[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Highest score among all indices except `skip`.
pub(crate) fn runner_up(scores: &Array1<f64>, skip: usize) -> Option<f64> {
    scores
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != skip)
        .map(|(_, &s)| s)
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))))
}

/// Two-way softmax weight of the winner against the runner-up.
pub(crate) fn margin_confidence(best: f64, second: Option<f64>) -> f32 {
    match second {
        Some(second) => (1.0 / (1.0 + (second - best).exp())) as f32,
        None => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&array![-1.0, -2.0, -3.0]);
        assert!((p.sum() - 1.0).abs() < 1e-9);
        assert!(p[0] > p[1] && p[1] > p[2]);
    }

    #[test]
    fn test_argmax_prefers_first_on_tie() {
        assert_eq!(argmax_first(&array![-1.0, -0.5, -0.5]), Some(1));
        assert_eq!(argmax_first(&Array1::<f64>::zeros(0)), None);
    }

    #[test]
    fn test_margin_confidence() {
        assert_eq!(margin_confidence(-1.0, None), 1.0);
        assert!((margin_confidence(-1.0, Some(-1.0)) - 0.5).abs() < 1e-6);
        assert!(margin_confidence(-1.0, Some(-4.0)) > 0.9);
    }

    #[test]
    fn test_runner_up() {
        let scores = array![-3.0, -1.0, -2.0];
        assert_eq!(runner_up(&scores, 1), Some(-2.0));
        assert_eq!(runner_up(&array![-1.0], 0), None);
    }
}
