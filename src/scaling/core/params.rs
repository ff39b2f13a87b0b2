//! Estimation artifacts: fitted bill reference points and legislator ideal
//! points.
//!
//! Both containers are plain data: they are recomputed in full on every run
//! and handed to the (external) exporter unchanged. The polarity passes
//! mutate coordinates in place; nothing else does after estimation ends.
use ndarray::Array1;

use crate::scaling::core::votes::{LegislatorId, VoteId};

/// Fitted spatial parameters of one roll call: the D-dimensional yea and
/// nay reference points.
#[derive(Debug, Clone, PartialEq)]
pub struct BillPoints {
    pub vote: VoteId,
    pub period: usize,
    pub yea: Array1<f64>,
    pub nay: Array1<f64>,
}

impl BillPoints {
    pub fn dims(&self) -> usize {
        self.yea.len()
    }

    /// Negate one dimension of both reference points.
    pub(crate) fn flip_dimension(&mut self, dim: usize) {
        self.yea[dim] = -self.yea[dim];
        self.nay[dim] = -self.nay[dim];
    }
}

/// One legislator's estimated position in one period.
#[derive(Debug, Clone, PartialEq)]
pub struct IdealPoint {
    pub legislator: LegislatorId,
    pub period: usize,
    pub coords: Array1<f64>,
}

impl IdealPoint {
    pub fn dims(&self) -> usize {
        self.coords.len()
    }

    /// Negate one dimension of the position.
    pub(crate) fn flip_dimension(&mut self, dim: usize) {
        self.coords[dim] = -self.coords[dim];
    }
}
