//! Pairs AS-IS and TO-BE models into comparison rows.

use crate::normalizer::same_model;
use crate::results::{CtaClassification, MatchKind, MatchRow, ModelCandidate};

/// Default number of matched rows per comparison
pub const DEFAULT_MATCH_LIMIT: usize = 2;

/// Builds comparison rows from the two pages' candidates.
///
/// Each AS-IS candidate takes the first unused TO-BE candidate that is the
/// same model. When nothing pairs up, the first model of each page is shown
/// side by side as a `FirstInCategory` row.
pub fn match_rows(
    as_is: &[ModelCandidate],
    to_be: &[ModelCandidate],
    as_is_cls: &CtaClassification,
    to_be_cls: &CtaClassification,
    limit: usize,
) -> Vec<MatchRow> {
    let mut used = vec![false; to_be.len()];
    let mut rows = Vec::new();

    for a in as_is {
        if rows.len() >= limit {
            break;
        }
        let hit = to_be
            .iter()
            .enumerate()
            .find(|(i, b)| !used[*i] && same_model(&a.base, &b.base));
        if let Some((i, b)) = hit {
            used[i] = true;
            ::log::debug!("Matched {} with {}", a.base, b.base);
            rows.push(row(a, b, as_is_cls, to_be_cls, MatchKind::Matched));
        }
    }

    if rows.is_empty() && limit > 0 {
        if let (Some(a), Some(b)) = (as_is.first(), to_be.first()) {
            ::log::info!(
                "No common models, comparing first in category: {} / {}",
                a.base,
                b.base
            );
            rows.push(row(a, b, as_is_cls, to_be_cls, MatchKind::FirstInCategory));
        }
    }

    rows
}

fn row(
    a: &ModelCandidate,
    b: &ModelCandidate,
    as_is_cls: &CtaClassification,
    to_be_cls: &CtaClassification,
    match_kind: MatchKind,
) -> MatchRow {
    MatchRow {
        model_as_is: a.base.clone(),
        model_to_be: b.base.clone(),
        learn_more_as_is: as_is_cls.learn_more(),
        learn_more_to_be: to_be_cls.learn_more(),
        buy_now_as_is: as_is_cls.buy_now_shape,
        buy_now_to_be: to_be_cls.buy_now_shape,
        compare_pos_as_is: as_is_cls.compare_position,
        compare_pos_to_be: to_be_cls.compare_position,
        match_kind,
    }
}
