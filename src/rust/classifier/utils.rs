use ndarray::{Array1, ArrayView1};

/// Scales `vec` in place to unit euclidean length. Zero rows stay zero.
pub(crate) fn normalize_l2(vec: &mut Array1<f64>) {
    let norm = vec.iter().map(|&x| x * x).sum::<f64>().sqrt();
    if norm > 1e-12 {
        *vec /= norm;
    }
}

/// Scales `vec` in place so its absolute values sum to one. Zero rows stay zero.
pub(crate) fn normalize_l1(vec: &mut Array1<f64>) {
    let norm: f64 = vec.iter().map(|x| x.abs()).sum();
    if norm > 1e-12 {
        *vec /= norm;
    }
}

/// Turns unnormalised log scores into probabilities, shifting by the max first.
pub(crate) fn softmax(scores: ArrayView1<f64>) -> Array1<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp = scores.mapv(|s| (s - max).exp());
    let sum = exp.sum();
    exp / sum
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Index of the largest value; the earliest index wins a tie.
pub(crate) fn argmax(values: ArrayView1<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in values.iter().enumerate() {
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}
