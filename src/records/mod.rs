//! Typed per-sample records and explicit keyed joins.
//!
//! Clinical annotations, deconvolved cell fractions and enrichment scores are carried as
//! plain structs keyed by [`SampleId`]. Combining them goes through [`join`], which always
//! joins on the sample key and takes the join kind as an argument.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::EnrichmentError;

/// Sample or patient identifier, e.g. a TCGA barcode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleId(String);

impl SampleId {
    pub fn new(id: impl Into<String>) -> Self {
        SampleId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The participant part of a TCGA barcode (`TCGA-XX-XXXX`), so that sample/aliquot level
    /// ids can be joined against patient level clinical tables. Ids with fewer than three
    /// dash separated fields are returned unchanged.
    pub fn tcga_patient(&self) -> SampleId {
        let fields: Vec<&str> = self.0.splitn(4, '-').collect();
        if fields.len() < 3 {
            return self.clone();
        }
        SampleId(fields[..3].join("-"))
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SampleId {
    fn from(id: &str) -> Self {
        SampleId::new(id)
    }
}

impl From<String> for SampleId {
    fn from(id: String) -> Self {
        SampleId(id)
    }
}

/// Anything that can be joined on a sample id.
pub trait Keyed {
    fn key(&self) -> &SampleId;
}

impl Keyed for SampleId {
    fn key(&self) -> &SampleId {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreatmentResponse {
    Responder,
    NonResponder,
    Unknown,
}

impl TreatmentResponse {
    /// Group id used by the two-group comparisons; `None` for samples without a response call.
    pub fn group_id(&self) -> Option<usize> {
        match self {
            TreatmentResponse::NonResponder => Some(0),
            TreatmentResponse::Responder => Some(1),
            TreatmentResponse::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClinicalRecord {
    pub sample_id: SampleId,
    pub response: TreatmentResponse,
    /// Clinical subtype label, e.g. "TNBC"
    pub subtype: Option<String>,
}

impl Keyed for ClinicalRecord {
    fn key(&self) -> &SampleId {
        &self.sample_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord<T> {
    pub sample_id: SampleId,
    pub gene_set: String,
    pub score: T,
}

impl<T> Keyed for ScoreRecord<T> {
    fn key(&self) -> &SampleId {
        &self.sample_id
    }
}

/// Deconvolution estimate of one cell type in one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct CellFraction {
    pub sample_id: SampleId,
    pub cell_type: String,
    pub fraction: f64,
}

impl Keyed for CellFraction {
    fn key(&self) -> &SampleId {
        &self.sample_id
    }
}

/// Fractions of a single cell type, one record per sample.
pub fn fractions_for(records: &[CellFraction], cell_type: &str) -> Vec<CellFraction> {
    records
        .iter()
        .filter(|r| r.cell_type == cell_type)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Keep only left records with a matching right record
    Inner,
    /// Keep every left record; unmatched ones get `right: None`
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Joined<L, R> {
    pub left: L,
    pub right: Option<R>,
}

/// Join two record collections on their sample id.
///
/// Output follows the order of `left`. A key that occurs more than once on the right side is
/// an error, so each left record matches at most one right record.
pub fn join<L, R>(left: &[L], right: &[R], kind: JoinKind) -> anyhow::Result<Vec<Joined<L, R>>>
where
    L: Keyed + Clone,
    R: Keyed + Clone,
{
    let mut index: HashMap<&SampleId, &R> = HashMap::with_capacity(right.len());
    for record in right {
        if index.insert(record.key(), record).is_some() {
            return Err(EnrichmentError::DuplicateKey {
                key: record.key().to_string(),
            }
            .into());
        }
    }

    let joined: Vec<Joined<L, R>> = left
        .iter()
        .filter_map(|l| {
            let right = index.get(l.key()).map(|&r| r.clone());
            match (kind, right) {
                (JoinKind::Inner, None) => None,
                (_, right) => Some(Joined {
                    left: l.clone(),
                    right,
                }),
            }
        })
        .collect();

    debug!(
        ?kind,
        left = left.len(),
        right = right.len(),
        joined = joined.len(),
        "Joined records on sample id"
    );

    Ok(joined)
}

/// Score matrix columns that carry a response call, and their group ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDesign {
    pub columns: Vec<usize>,
    pub group_ids: Vec<usize>,
}

/// Match score matrix columns to clinical records and keep those with a known response.
pub fn response_design(
    sample_ids: &[String],
    clinical: &[ClinicalRecord],
) -> anyhow::Result<ResponseDesign> {
    let keys: Vec<SampleId> = sample_ids.iter().map(|s| SampleId::new(s.as_str())).collect();
    let joined = join(&keys, clinical, JoinKind::Left)?;

    let mut columns = Vec::new();
    let mut group_ids = Vec::new();
    for (column, row) in joined.iter().enumerate() {
        let group = row.right.as_ref().and_then(|c| c.response.group_id());
        if let Some(group) = group {
            columns.push(column);
            group_ids.push(group);
        }
    }

    Ok(ResponseDesign { columns, group_ids })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clinical(id: &str, response: TreatmentResponse) -> ClinicalRecord {
        ClinicalRecord {
            sample_id: SampleId::new(id),
            response,
            subtype: Some("TNBC".to_string()),
        }
    }

    fn score(id: &str, value: f64) -> ScoreRecord<f64> {
        ScoreRecord {
            sample_id: SampleId::new(id),
            gene_set: "IG".to_string(),
            score: value,
        }
    }

    #[test]
    fn inner_join_drops_unmatched_records() {
        let scores = vec![score("p1", 0.1), score("p2", 0.2), score("p3", 0.3)];
        let clin = vec![
            clinical("p3", TreatmentResponse::Responder),
            clinical("p1", TreatmentResponse::NonResponder),
        ];

        let joined = join(&scores, &clin, JoinKind::Inner).unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].left.sample_id.as_str(), "p1");
        assert_eq!(
            joined[0].right.as_ref().unwrap().response,
            TreatmentResponse::NonResponder
        );
        assert_eq!(joined[1].left.sample_id.as_str(), "p3");
    }

    #[test]
    fn left_join_keeps_unmatched_records() {
        let scores = vec![score("p1", 0.1), score("p2", 0.2)];
        let clin = vec![clinical("p1", TreatmentResponse::Responder)];

        let joined = join(&scores, &clin, JoinKind::Left).unwrap();
        assert_eq!(joined.len(), 2);
        assert!(joined[0].right.is_some());
        assert!(joined[1].right.is_none());
    }

    #[test]
    fn duplicate_right_keys_are_rejected() {
        let scores = vec![score("p1", 0.1)];
        let clin = vec![
            clinical("p1", TreatmentResponse::Responder),
            clinical("p1", TreatmentResponse::NonResponder),
        ];

        let err = join(&scores, &clin, JoinKind::Inner).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EnrichmentError>(),
            Some(&EnrichmentError::DuplicateKey {
                key: "p1".to_string()
            })
        );
    }

    #[test]
    fn tcga_patient_truncates_sample_barcodes() {
        let id = SampleId::new("TCGA-A2-A0T2-01A-11R-A084-07");
        assert_eq!(id.tcga_patient(), SampleId::new("TCGA-A2-A0T2"));
        assert_eq!(SampleId::new("local-7").tcga_patient(), SampleId::new("local-7"));
    }

    #[test]
    fn response_design_skips_unknown_and_missing() {
        let samples: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let clin = vec![
            clinical("a", TreatmentResponse::Responder),
            clinical("b", TreatmentResponse::Unknown),
            clinical("d", TreatmentResponse::NonResponder),
        ];

        let design = response_design(&samples, &clin).unwrap();
        assert_eq!(design.columns, vec![0, 3]);
        assert_eq!(design.group_ids, vec![1, 0]);
    }

    #[test]
    fn fractions_filter_by_cell_type() {
        let records = vec![
            CellFraction {
                sample_id: SampleId::new("a"),
                cell_type: "B cell".to_string(),
                fraction: 0.2,
            },
            CellFraction {
                sample_id: SampleId::new("a"),
                cell_type: "T cell".to_string(),
                fraction: 0.5,
            },
        ];
        let b_cells = fractions_for(&records, "B cell");
        assert_eq!(b_cells.len(), 1);
        assert_eq!(b_cells[0].fraction, 0.2);
    }
}
