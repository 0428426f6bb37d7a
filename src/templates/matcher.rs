//! Best-template lookup for a chunk.

use super::similarity::{SimilarityOptions, ratio_with};
use super::types::{MatchResult, Template};

/// Score `chunk` against every template with default similarity options.
///
/// See [`best_match_with`].
pub fn best_match(chunk: &str, templates: &[Template], threshold: f64) -> MatchResult {
    best_match_with(chunk, templates, threshold, SimilarityOptions::default())
}

/// Score `chunk` against every template and report the best one.
///
/// The first template reaching the highest score wins; later templates with an equal score do
/// not replace it. `is_match` is set when that score is at least `threshold`. An empty template
/// set yields `(false, 0.0, "")`.
pub fn best_match_with(
    chunk: &str,
    templates: &[Template],
    threshold: f64,
    options: SimilarityOptions,
) -> MatchResult {
    let mut best = MatchResult::default();

    for template in templates {
        let score = ratio_with(chunk, &template.content, options);
        tracing::trace!(template = %template.template_name, score, "Scored template");
        if score > best.score {
            best.score = score;
            best.template_name = template.template_name.clone();
        }
    }

    best.is_match = !templates.is_empty() && best.score >= threshold;
    best
}
