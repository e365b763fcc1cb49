//! Records and ensemble records.
//!
//! A [`Record`] is one realization's numeric payload. It comes in exactly
//! three shapes, distinguished by how the values are indexed:
//!
//! | Kind | Payload | Index labels |
//! |------|---------|--------------|
//! | [`RecordKind::SequenceFloat`] | `Vec<f64>` | `0..n` |
//! | [`RecordKind::MappingIntFloat`] | `BTreeMap<i64, f64>` | integer keys |
//! | [`RecordKind::MappingStrFloat`] | `BTreeMap<String, f64>` | string keys |
//!
//! An [`EnsembleRecord`] holds one record per realization. All of its
//! records must share a kind before it can be stored.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised when a record or ensemble record violates the data model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// The ensemble record contains no realizations.
    #[error("ensemble record is empty")]
    Empty,

    /// Two realizations carry records of different kinds.
    #[error("inconsistent record kind at realization {realization}: expected {expected}, found {found}")]
    InconsistentKind {
        /// Realization index of the first offending record.
        realization: usize,
        /// Kind established by realization 0.
        expected: RecordKind,
        /// Kind found at `realization`.
        found: RecordKind,
    },

    /// An ensemble size of zero was supplied.
    #[error("ensemble size must be positive")]
    ZeroEnsembleSize,
}

// ---------------------------------------------------------------------------
// RecordKind
// ---------------------------------------------------------------------------

/// The index kind of a [`Record`].
///
/// Serialized with the names the storage service keeps in record userdata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Ordered sequence of floats, indexed by position.
    #[serde(rename = "LIST_FLOAT")]
    SequenceFloat,
    /// Floats keyed by integer.
    #[serde(rename = "MAPPING_INT_FLOAT")]
    MappingIntFloat,
    /// Floats keyed by string.
    #[serde(rename = "MAPPING_STR_FLOAT")]
    MappingStrFloat,
}

impl RecordKind {
    /// Wire name of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SequenceFloat => "LIST_FLOAT",
            Self::MappingIntFloat => "MAPPING_INT_FLOAT",
            Self::MappingStrFloat => "MAPPING_STR_FLOAT",
        }
    }
}

impl core::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One realization's numeric payload.
///
/// Serializes as a JSON array or object. Deserialization tries the shapes
/// in order: array, object whose keys all parse as integers, object with
/// string keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    /// Ordered sequence of floats.
    SequenceFloat(Vec<f64>),
    /// Floats keyed by integer.
    MappingIntFloat(BTreeMap<i64, f64>),
    /// Floats keyed by string.
    MappingStrFloat(BTreeMap<String, f64>),
}

impl Record {
    /// The kind tag of this record.
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::SequenceFloat(_) => RecordKind::SequenceFloat,
            Self::MappingIntFloat(_) => RecordKind::MappingIntFloat,
            Self::MappingStrFloat(_) => RecordKind::MappingStrFloat,
        }
    }

    /// Number of values in the record.
    pub fn len(&self) -> usize {
        match self {
            Self::SequenceFloat(values) => values.len(),
            Self::MappingIntFloat(map) => map.len(),
            Self::MappingStrFloat(map) => map.len(),
        }
    }

    /// Whether the record holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index labels as text, in value order.
    ///
    /// Sequences are labelled by position.
    pub fn index_labels(&self) -> Vec<String> {
        match self {
            Self::SequenceFloat(values) => (0..values.len()).map(|i| i.to_string()).collect(),
            Self::MappingIntFloat(map) => map.keys().map(ToString::to_string).collect(),
            Self::MappingStrFloat(map) => map.keys().cloned().collect(),
        }
    }

    /// Values in index order.
    pub fn values(&self) -> Vec<f64> {
        match self {
            Self::SequenceFloat(values) => values.clone(),
            Self::MappingIntFloat(map) => map.values().copied().collect(),
            Self::MappingStrFloat(map) => map.values().copied().collect(),
        }
    }
}

/// Intermediate shape used to deserialize a [`Record`].
///
/// Integer map keys cannot be recovered through an untagged enum, so
/// objects are read with string keys and reclassified afterwards.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecord {
    Sequence(Vec<f64>),
    Mapping(BTreeMap<String, f64>),
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        match raw {
            RawRecord::Sequence(values) => Self::SequenceFloat(values),
            RawRecord::Mapping(map) => {
                let int_keyed: Option<BTreeMap<i64, f64>> = map
                    .iter()
                    .map(|(key, value)| key.parse::<i64>().ok().map(|k| (k, *value)))
                    .collect();
                match int_keyed {
                    Some(int_map) if !map.is_empty() => Self::MappingIntFloat(int_map),
                    _ => Self::MappingStrFloat(map),
                }
            }
        }
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawRecord::deserialize(deserializer).map(Self::from)
    }
}

impl From<Vec<f64>> for Record {
    fn from(values: Vec<f64>) -> Self {
        Self::SequenceFloat(values)
    }
}

impl From<BTreeMap<i64, f64>> for Record {
    fn from(map: BTreeMap<i64, f64>) -> Self {
        Self::MappingIntFloat(map)
    }
}

impl From<BTreeMap<String, f64>> for Record {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self::MappingStrFloat(map)
    }
}

// ---------------------------------------------------------------------------
// EnsembleRecord
// ---------------------------------------------------------------------------

/// One [`Record`] per realization, indexed by realization id.
///
/// Construction accepts any records; kind uniformity is checked by
/// [`EnsembleRecord::record_kind`] before a write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnsembleRecord {
    records: Vec<Record>,
}

impl EnsembleRecord {
    /// Wrap per-realization records. Index `i` is realization `i`.
    pub const fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// The per-realization records.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of realizations.
    pub fn ensemble_size(&self) -> usize {
        self.records.len()
    }

    /// The record for one realization, if present.
    pub fn get(&self, realization: usize) -> Option<&Record> {
        self.records.get(realization)
    }

    /// Consume into the per-realization records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// The kind shared by every realization.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Empty`] for an empty ensemble and
    /// [`RecordError::InconsistentKind`] naming the first realization whose
    /// kind differs from realization 0.
    pub fn record_kind(&self) -> Result<RecordKind, RecordError> {
        let mut records = self.records.iter();
        let expected = records.next().ok_or(RecordError::Empty)?.kind();
        for (offset, record) in records.enumerate() {
            let found = record.kind();
            if found != expected {
                return Err(RecordError::InconsistentKind {
                    realization: offset.saturating_add(1),
                    expected,
                    found,
                });
            }
        }
        Ok(expected)
    }
}

impl From<Vec<Record>> for EnsembleRecord {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<Record> for EnsembleRecord {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn str_record(pairs: &[(&str, f64)]) -> Record {
        Record::MappingStrFloat(pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect())
    }

    #[test]
    fn sequence_labels_are_positions() {
        let record = Record::SequenceFloat(vec![1.5, 2.5, 3.5]);
        assert_eq!(record.index_labels(), vec!["0", "1", "2"]);
        assert_eq!(record.values(), vec![1.5, 2.5, 3.5]);
        assert_eq!(record.kind(), RecordKind::SequenceFloat);
    }

    #[test]
    fn mapping_labels_follow_key_order() {
        let record: Record = BTreeMap::from([(10_i64, 1.0), (-2, 2.0)]).into();
        assert_eq!(record.index_labels(), vec!["-2", "10"]);
        assert_eq!(record.values(), vec![2.0, 1.0]);
    }

    #[test]
    fn json_array_is_sequence() {
        let record: Record = serde_json::from_str("[1.0, 2.0]").unwrap();
        assert_eq!(record, Record::SequenceFloat(vec![1.0, 2.0]));
    }

    #[test]
    fn json_object_with_integer_keys_is_int_mapping() {
        let record: Record = serde_json::from_str(r#"{"1": 0.5, "3": 1.5}"#).unwrap();
        assert_eq!(record.kind(), RecordKind::MappingIntFloat);
        assert_eq!(record, BTreeMap::from([(1_i64, 0.5), (3, 1.5)]).into());
    }

    #[test]
    fn json_object_with_text_keys_is_str_mapping() {
        let record: Record = serde_json::from_str(r#"{"a": 1.0, "7": 2.0}"#).unwrap();
        assert_eq!(record, str_record(&[("a", 1.0), ("7", 2.0)]));
    }

    #[test]
    fn record_serializes_back_to_plain_json() {
        let record: Record = BTreeMap::from([(2_i64, 4.0)]).into();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"2":4.0}"#);
    }

    #[test]
    fn uniform_ensemble_reports_its_kind() {
        let ensemble = EnsembleRecord::new(vec![
            str_record(&[("a", 1.0)]),
            str_record(&[("a", 2.0)]),
        ]);
        assert_eq!(ensemble.record_kind(), Ok(RecordKind::MappingStrFloat));
        assert_eq!(ensemble.ensemble_size(), 2);
    }

    #[test]
    fn mixed_ensemble_names_first_offender() {
        let ensemble = EnsembleRecord::new(vec![
            Record::SequenceFloat(vec![1.0]),
            Record::SequenceFloat(vec![2.0]),
            str_record(&[("a", 1.0)]),
        ]);
        assert_eq!(
            ensemble.record_kind(),
            Err(RecordError::InconsistentKind {
                realization: 2,
                expected: RecordKind::SequenceFloat,
                found: RecordKind::MappingStrFloat,
            })
        );
    }

    #[test]
    fn empty_ensemble_has_no_kind() {
        assert_eq!(EnsembleRecord::default().record_kind(), Err(RecordError::Empty));
    }

    #[test]
    fn ensemble_deserializes_from_array_of_records() {
        let ensemble: EnsembleRecord =
            serde_json::from_str(r#"[{"a": 1.0}, {"a": 2.0}]"#).unwrap();
        assert_eq!(ensemble.ensemble_size(), 2);
        assert_eq!(ensemble.get(1), Some(&str_record(&[("a", 2.0)])));
    }
}
