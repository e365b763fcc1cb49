//! Distribution families and the records they produce.
//!
//! The [`Shape`] decides the record kind: a plain size gives a
//! [`Record::SequenceFloat`], an integer or string index gives the matching
//! mapping record with one entry per label.

use std::collections::{BTreeMap, BTreeSet};

use ensemble_types::{EnsembleRecord, Record};
use rand::Rng;

use crate::error::StatsError;
use crate::normal::{inverse_normal_cdf, standard_normal};

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// How many values a draw has and how they are labeled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// `n` unlabeled values, in order.
    Size(usize),
    /// One value per integer label.
    IntIndex(Vec<i64>),
    /// One value per string label.
    StrIndex(Vec<String>),
}

impl Shape {
    /// Number of values in one draw.
    pub fn len(&self) -> usize {
        match self {
            Self::Size(n) => *n,
            Self::IntIndex(index) => index.len(),
            Self::StrIndex(index) => index.len(),
        }
    }

    /// Whether a draw would have no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self) -> Result<(), StatsError> {
        if self.is_empty() {
            return Err(StatsError::EmptyShape);
        }
        match self {
            Self::Size(_) => Ok(()),
            Self::IntIndex(index) => reject_duplicates(index),
            Self::StrIndex(index) => reject_duplicates(index),
        }
    }

    /// Label `values` according to this shape.
    fn to_record(&self, values: Vec<f64>) -> Record {
        match self {
            Self::Size(_) => Record::SequenceFloat(values),
            Self::IntIndex(index) => Record::MappingIntFloat(
                index.iter().copied().zip(values).collect::<BTreeMap<_, _>>(),
            ),
            Self::StrIndex(index) => Record::MappingStrFloat(
                index.iter().cloned().zip(values).collect::<BTreeMap<_, _>>(),
            ),
        }
    }
}

fn reject_duplicates<T: Ord + ToString>(index: &[T]) -> Result<(), StatsError> {
    let mut seen = BTreeSet::new();
    for label in index {
        if !seen.insert(label) {
            return Err(StatsError::DuplicateIndex(label.to_string()));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Family
// ---------------------------------------------------------------------------

/// Supported distribution families.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Family {
    /// Normal distribution.
    Gaussian {
        /// Mean.
        mean: f64,
        /// Standard deviation, strictly positive.
        std: f64,
    },
    /// Continuous uniform distribution on `[lower, upper)`.
    Uniform {
        /// Lower bound.
        lower: f64,
        /// Upper bound, strictly above `lower`.
        upper: f64,
    },
}

impl Family {
    fn validate(self) -> Result<(), StatsError> {
        match self {
            Self::Gaussian { mean, std } => {
                finite("mean", mean)?;
                finite("std", std)?;
                if std <= 0.0 {
                    return Err(StatsError::InvalidParameter {
                        parameter: "std",
                        value: std,
                        reason: "must be positive",
                    });
                }
                Ok(())
            }
            Self::Uniform { lower, upper } => {
                finite("lower", lower)?;
                finite("upper", upper)?;
                if lower >= upper {
                    return Err(StatsError::InvalidParameter {
                        parameter: "upper",
                        value: upper,
                        reason: "must be greater than lower",
                    });
                }
                Ok(())
            }
        }
    }

    fn draw<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        match self {
            Self::Gaussian { mean, std } => std.mul_add(standard_normal(rng), mean),
            Self::Uniform { lower, upper } => rng.random_range(lower..upper),
        }
    }

    fn quantile(self, x: f64) -> f64 {
        match self {
            Self::Gaussian { mean, std } => std.mul_add(inverse_normal_cdf(x), mean),
            Self::Uniform { lower, upper } => (upper - lower).mul_add(x, lower),
        }
    }
}

const fn finite(parameter: &'static str, value: f64) -> Result<(), StatsError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(StatsError::InvalidParameter {
            parameter,
            value,
            reason: "must be finite",
        })
    }
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// A validated family paired with the shape of the records it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    family: Family,
    shape: Shape,
}

impl Distribution {
    /// Build a distribution, checking parameters and shape.
    pub fn new(family: Family, shape: Shape) -> Result<Self, StatsError> {
        family.validate()?;
        shape.validate()?;
        Ok(Self { family, shape })
    }

    /// Normal distribution with the given mean and standard deviation.
    pub fn gaussian(mean: f64, std: f64, shape: Shape) -> Result<Self, StatsError> {
        Self::new(Family::Gaussian { mean, std }, shape)
    }

    /// Uniform distribution on `[lower, upper)`.
    pub fn uniform(lower: f64, upper: f64, shape: Shape) -> Result<Self, StatsError> {
        Self::new(Family::Uniform { lower, upper }, shape)
    }

    /// The family and its parameters.
    pub const fn family(&self) -> Family {
        self.family
    }

    /// The shape of produced records.
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Draw one record.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Record {
        let values = (0..self.shape.len())
            .map(|_| self.family.draw(rng))
            .collect();
        self.shape.to_record(values)
    }

    /// Record whose every entry is the quantile at `x`.
    pub fn ppf(&self, x: f64) -> Result<Record, StatsError> {
        let inside_unit_interval = x > 0.0 && x < 1.0;
        if !inside_unit_interval {
            return Err(StatsError::QuantileOutOfRange(x));
        }
        let value = self.family.quantile(x);
        Ok(self.shape.to_record(vec![value; self.shape.len()]))
    }

    /// Draw `ensemble_size` independent records.
    pub fn sample_ensemble<R: Rng + ?Sized>(
        &self,
        ensemble_size: usize,
        rng: &mut R,
    ) -> Result<EnsembleRecord, StatsError> {
        if ensemble_size == 0 {
            return Err(StatsError::ZeroEnsembleSize);
        }
        let ensemble: EnsembleRecord = (0..ensemble_size).map(|_| self.sample(rng)).collect();
        tracing::debug!(
            family = ?self.family,
            ensemble_size,
            values_per_record = self.shape.len(),
            "Sampled ensemble"
        );
        Ok(ensemble)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use ensemble_types::RecordKind;

    use super::*;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn size_shape_gives_sequence() {
        let dist = Distribution::gaussian(0.0, 1.0, Shape::Size(4)).unwrap();
        let record = dist.sample(&mut rng());
        assert_eq!(record.kind(), RecordKind::SequenceFloat);
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn index_shapes_label_values() {
        let dist = Distribution::uniform(0.0, 1.0, Shape::IntIndex(vec![3, 1, 7])).unwrap();
        let record = dist.sample(&mut rng());
        assert_eq!(record.kind(), RecordKind::MappingIntFloat);
        assert_eq!(record.index_labels(), vec!["1", "3", "7"]);

        let dist = Distribution::uniform(
            0.0,
            1.0,
            Shape::StrIndex(vec!["a".to_owned(), "b".to_owned()]),
        )
        .unwrap();
        let record = dist.sample(&mut rng());
        assert_eq!(record.kind(), RecordKind::MappingStrFloat);
        assert_eq!(record.index_labels(), vec!["a", "b"]);
    }

    #[test]
    fn uniform_draws_stay_in_bounds() {
        let dist = Distribution::uniform(-2.0, 3.0, Shape::Size(500)).unwrap();
        let values = dist.sample(&mut rng()).values();
        assert!(values.iter().all(|v| (-2.0..3.0).contains(v)));
    }

    #[test]
    fn gaussian_draws_center_on_mean() {
        let dist = Distribution::gaussian(10.0, 0.5, Shape::Size(5_000)).unwrap();
        let values = dist.sample(&mut rng()).values();
        let mean = values.iter().sum::<f64>() / 5_000.0;
        assert!((mean - 10.0).abs() < 0.05, "mean {mean}");
    }

    #[test]
    fn ppf_fills_every_entry() {
        let dist = Distribution::uniform(2.0, 4.0, Shape::Size(3)).unwrap();
        assert_eq!(dist.ppf(0.25).unwrap(), Record::SequenceFloat(vec![2.5; 3]));

        let dist = Distribution::gaussian(1.0, 2.0, Shape::Size(2)).unwrap();
        let values = dist.ppf(0.5).unwrap().values();
        assert!(values.iter().all(|v| (v - 1.0).abs() < 1e-9));
    }

    #[test]
    fn ppf_rejects_values_outside_unit_interval() {
        let dist = Distribution::gaussian(0.0, 1.0, Shape::Size(1)).unwrap();
        for x in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(dist.ppf(x), Err(StatsError::QuantileOutOfRange(_))));
        }
    }

    #[test]
    fn invalid_parameters_rejected() {
        assert!(matches!(
            Distribution::gaussian(0.0, 0.0, Shape::Size(1)),
            Err(StatsError::InvalidParameter { parameter: "std", .. })
        ));
        assert!(matches!(
            Distribution::gaussian(f64::NAN, 1.0, Shape::Size(1)),
            Err(StatsError::InvalidParameter { parameter: "mean", .. })
        ));
        assert!(matches!(
            Distribution::uniform(1.0, 1.0, Shape::Size(1)),
            Err(StatsError::InvalidParameter { parameter: "upper", .. })
        ));
    }

    #[test]
    fn bad_shapes_rejected() {
        assert_eq!(
            Distribution::gaussian(0.0, 1.0, Shape::Size(0)),
            Err(StatsError::EmptyShape)
        );
        assert_eq!(
            Distribution::gaussian(0.0, 1.0, Shape::StrIndex(Vec::new())),
            Err(StatsError::EmptyShape)
        );
        assert_eq!(
            Distribution::gaussian(0.0, 1.0, Shape::IntIndex(vec![1, 2, 1])),
            Err(StatsError::DuplicateIndex("1".to_owned()))
        );
    }

    #[test]
    fn ensemble_has_consistent_kind() {
        let dist = Distribution::gaussian(0.0, 1.0, Shape::IntIndex(vec![0, 1])).unwrap();
        let ensemble = dist.sample_ensemble(5, &mut rng()).unwrap();
        assert_eq!(ensemble.ensemble_size(), 5);
        assert_eq!(ensemble.record_kind(), Ok(RecordKind::MappingIntFloat));
        assert_eq!(
            dist.sample_ensemble(0, &mut rng()),
            Err(StatsError::ZeroEnsembleSize)
        );
    }

    #[test]
    fn same_seed_same_ensemble() {
        let dist = Distribution::uniform(0.0, 1.0, Shape::Size(3)).unwrap();
        let a = dist.sample_ensemble(4, &mut rng()).unwrap();
        let b = dist.sample_ensemble(4, &mut rng()).unwrap();
        assert_eq!(a, b);
    }
}
