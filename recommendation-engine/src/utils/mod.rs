// Vector math helpers shared by the similarity index and recall strategies

use ndarray::ArrayView1;

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product = a.dot(&b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Indices of `scores` sorted by descending value.
/// Stable, so equal scores keep their original relative order.
/// NaN scores are treated as less than any valid score.
pub fn rank_descending(scores: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}
