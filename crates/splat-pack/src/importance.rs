use rayon::prelude::*;

use crate::accessor::{VertexRow, VertexRows};
use crate::schema::{Field, ScaleRotationFields, SplatLayout};

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Importance of a splat: its volume weighted by its opacity.
///
/// Splats without a scale all score 0. A missing opacity counts as fully opaque.
pub fn importance(
    row: &VertexRow<'_>,
    scale_rotation: Option<&ScaleRotationFields>,
    opacity: Option<Field>,
) -> f32 {
    let Some(fields) = scale_rotation else {
        return 0.0;
    };

    let size: f64 = fields
        .log_scale
        .iter()
        .map(|&field| row.read(field).exp())
        .product();
    let opacity = opacity.map_or(1.0, |field| sigmoid(row.read(field)));
    let score = (size * opacity) as f32;

    // NaN would break the ordering, treat it like an unscaled splat.
    if score.is_nan() { 0.0 } else { score }
}

pub fn importance_scores(rows: &VertexRows<'_>, layout: &SplatLayout) -> Vec<f32> {
    let _span = tracing::trace_span!("Calculate importance").entered();

    (0..rows.len())
        .into_par_iter()
        .map(|index| {
            importance(
                &rows.row(index),
                layout.scale_rotation.as_ref(),
                layout.opacity,
            )
        })
        .collect()
}

/// Indices of `scores`, most important first. Equal scores keep their source order.
pub fn rank_by_importance(scores: &[f32]) -> Vec<usize> {
    let _span = tracing::trace_span!("Sort by importance").entered();

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.par_sort_unstable_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    order
}
