//! polarity — post-hoc group-mean orientation correction.
//!
//! Purpose
//! -------
//! Re-orient an already-estimated configuration when anchor-based sign
//! fixing was unavailable or disagrees with known group semantics: compare
//! the mean coordinate of two named reference groups on a dimension and
//! flip the whole dimension when the expected-negative group sits above
//! the expected-positive group.
//!
//! Key behaviors
//! -------------
//! - The flip condition is a *strict* inequality on the group means, so
//!   applying the pass to already-oriented data is a no-op (idempotent).
//! - Group membership comes from an external metadata tag per legislator;
//!   the estimator's math never sees these tags.
//! - Small reference groups (< [`MIN_GROUP_SIZE`] members) trigger a
//!   warning: a mean over two legislators is a weak orientation signal.
//!
//! Invariants & assumptions
//! ------------------------
//! - This is a heuristic approximation: group means can mis-correct when
//!   the groups are small or ideologically overlapping. It is deliberately
//!   a separate pass, invoked by the caller, never folded into the
//!   estimator where it could mask estimation defects as polarity issues.
use std::collections::HashMap;

use crate::scaling::core::params::{BillPoints, IdealPoint};
use crate::scaling::core::votes::LegislatorId;
use crate::scaling::errors::{ScalingError, ScalingResult};

/// Reference groups below this size trigger a reliability warning.
pub const MIN_GROUP_SIZE: usize = 3;

/// Expected group orientation on one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub dimension: usize,
    /// Group whose mean coordinate should come out negative.
    pub negative_group: String,
    /// Group whose mean coordinate should come out positive.
    pub positive_group: String,
}

/// What the pass did on one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupOrientation {
    pub dimension: usize,
    pub negative_mean: f64,
    pub positive_mean: f64,
    pub negative_count: usize,
    pub positive_count: usize,
    pub flipped: bool,
}

/// Orient dimensions by reference-group means.
///
/// For each spec, computes the mean coordinate of both groups on the
/// spec's dimension over `points`; when `mean(negative) > mean(positive)`
/// (strictly), negates that dimension for every ideal point and bill.
/// Dimensions whose groups have no members present are left unchanged
/// with a warning.
///
/// # Errors
/// - [`ScalingError::DimensionOutOfRange`] when a spec names a dimension
///   the fitted configuration does not have.
pub fn orient_by_groups(
    points: &mut [IdealPoint], bills: &mut [BillPoints],
    groups: &HashMap<LegislatorId, String>, specs: &[GroupSpec],
) -> ScalingResult<Vec<GroupOrientation>> {
    let dims = points.first().map(|p| p.dims()).unwrap_or(0);
    let mut report = Vec::with_capacity(specs.len());

    for spec in specs {
        if spec.dimension >= dims {
            return Err(ScalingError::DimensionOutOfRange { dimension: spec.dimension, dims });
        }

        let (negative_mean, negative_count) =
            group_mean(points, groups, &spec.negative_group, spec.dimension);
        let (positive_mean, positive_count) =
            group_mean(points, groups, &spec.positive_group, spec.dimension);

        if negative_count < MIN_GROUP_SIZE {
            log::warn!(
                "reference group '{}' has {} members on dimension {}; \
                 orientation may be unreliable",
                spec.negative_group,
                negative_count,
                spec.dimension
            );
        }
        if positive_count < MIN_GROUP_SIZE {
            log::warn!(
                "reference group '{}' has {} members on dimension {}; \
                 orientation may be unreliable",
                spec.positive_group,
                positive_count,
                spec.dimension
            );
        }

        let decidable = negative_count > 0 && positive_count > 0;
        let flipped = decidable && negative_mean > positive_mean;
        if flipped {
            for point in points.iter_mut() {
                point.flip_dimension(spec.dimension);
            }
            for bill in bills.iter_mut() {
                bill.flip_dimension(spec.dimension);
            }
        }
        if !decidable {
            log::warn!(
                "no members found for one of the reference groups on dimension {}; \
                 leaving orientation unchanged",
                spec.dimension
            );
        }

        report.push(GroupOrientation {
            dimension: spec.dimension,
            negative_mean,
            positive_mean,
            negative_count,
            positive_count,
            flipped,
        });
    }
    Ok(report)
}

/// Mean coordinate and member count of one tagged group on one dimension.
fn group_mean(
    points: &[IdealPoint], groups: &HashMap<LegislatorId, String>, group: &str, dimension: usize,
) -> (f64, usize) {
    let mut total = 0.0;
    let mut count = 0usize;
    for point in points {
        if groups.get(&point.legislator).map(String::as_str) == Some(group) {
            total += point.coords[dimension];
            count += 1;
        }
    }
    if count == 0 {
        (0.0, 0)
    } else {
        (total / count as f64, count)
    }
}
