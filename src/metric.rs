//! Distance metrics and the threshold semantics attached to each.

use std::cmp::Ordering;
use std::fmt;

use clap::ValueEnum;

/// Whether smaller or larger scores mean "more relevant".
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScoreDirection {
    /// Distances: keep results with `score <= threshold`.
    LowerIsBetter,
    /// Similarities: keep results with `score >= threshold`.
    HigherIsBetter,
}

/// Metric used to rank stored chunks against a query vector.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum SearchMode {
    /// L2 distance (pgvector `<->`).
    #[default]
    Euclidean,
    /// Cosine similarity, `1 - (a <=> b)`.
    Cosine,
    /// Inner product, `-(a <#> b)`.
    InnerProduct,
}

impl SearchMode {
    /// Direction in which scores improve for this metric.
    pub fn direction(self) -> ScoreDirection {
        match self {
            Self::Euclidean => ScoreDirection::LowerIsBetter,
            Self::Cosine | Self::InnerProduct => ScoreDirection::HigherIsBetter,
        }
    }

    /// Threshold predicate; a result is kept only when this returns true.
    pub fn passes(self, score: f64, threshold: f64) -> bool {
        match self.direction() {
            ScoreDirection::LowerIsBetter => score <= threshold,
            ScoreDirection::HigherIsBetter => score >= threshold,
        }
    }

    /// Orders two scores best-first.
    pub fn compare_scores(self, a: f64, b: f64) -> Ordering {
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self.direction() {
            ScoreDirection::LowerIsBetter => ord,
            ScoreDirection::HigherIsBetter => ord.reverse(),
        }
    }

    /// pgvector operator whose ascending order is best-first.
    pub fn operator(self) -> &'static str {
        match self {
            Self::Euclidean => "<->",
            Self::Cosine => "<=>",
            Self::InnerProduct => "<#>",
        }
    }

    /// SQL expression yielding this metric's score for `column` against `param`.
    pub fn score_sql(self, column: &str, param: &str) -> String {
        match self {
            Self::Euclidean => format!("{column} <-> {param}"),
            Self::Cosine => format!("1 - ({column} <=> {param})"),
            Self::InnerProduct => format!("({column} <#> {param}) * -1"),
        }
    }

    /// Computes the score in-process. Both slices must have the same length.
    pub fn score(self, a: &[f32], b: &[f32]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            Self::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| {
                    let d = f64::from(*x) - f64::from(*y);
                    d * d
                })
                .sum::<f64>()
                .sqrt(),
            Self::Cosine => {
                let (ma, mb) = (magnitude(a), magnitude(b));
                if ma == 0.0 || mb == 0.0 {
                    return 0.0;
                }
                dot(a, b) / (ma * mb)
            }
            Self::InnerProduct => dot(a, b),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Euclidean => "euclidean distance",
            Self::Cosine => "cosine similarity",
            Self::InnerProduct => "inner product",
        };
        f.write_str(name)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

fn magnitude(v: &[f32]) -> f64 {
    dot(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn threshold_direction_follows_metric() {
        assert!(SearchMode::Euclidean.passes(0.3, 0.5));
        assert!(SearchMode::Euclidean.passes(0.5, 0.5));
        assert!(!SearchMode::Euclidean.passes(0.6, 0.5));

        assert!(SearchMode::Cosine.passes(0.8, 0.5));
        assert!(!SearchMode::Cosine.passes(0.3, 0.5));
        assert!(SearchMode::InnerProduct.passes(2.0, 1.5));
        assert!(!SearchMode::InnerProduct.passes(-1.0, 0.0));
    }

    #[test]
    fn best_first_ordering() {
        let mut distances = vec![0.6, 0.3, 0.9];
        distances.sort_by(|a, b| SearchMode::Euclidean.compare_scores(*a, *b));
        assert_eq!(distances, vec![0.3, 0.6, 0.9]);

        let mut similarities = vec![0.6, 0.3, 0.9];
        similarities.sort_by(|a, b| SearchMode::Cosine.compare_scores(*a, *b));
        assert_eq!(similarities, vec![0.9, 0.6, 0.3]);
    }

    #[test]
    fn in_process_scores() {
        let a = [3.0, 0.0];
        let b = [0.0, 4.0];
        assert!(close(SearchMode::Euclidean.score(&a, &b), 5.0));
        assert!(close(SearchMode::Cosine.score(&a, &b), 0.0));
        assert!(close(SearchMode::Cosine.score(&a, &[6.0, 0.0]), 1.0));
        assert!(close(SearchMode::InnerProduct.score(&[1.0, 2.0], &[3.0, 4.0]), 11.0));
        assert!(close(SearchMode::Cosine.score(&[0.0, 0.0], &a), 0.0));
    }

    #[test]
    fn sql_fragments() {
        assert_eq!(SearchMode::Euclidean.operator(), "<->");
        assert_eq!(
            SearchMode::Cosine.score_sql("embedding", "$1"),
            "1 - (embedding <=> $1)"
        );
        assert_eq!(
            SearchMode::InnerProduct.score_sql("embedding", "$1"),
            "(embedding <#> $1) * -1"
        );
    }

    #[test]
    fn parses_from_cli_names() {
        assert_eq!(
            SearchMode::from_str("inner-product", true).unwrap(),
            SearchMode::InnerProduct
        );
        assert_eq!(SearchMode::default(), SearchMode::Euclidean);
    }
}
