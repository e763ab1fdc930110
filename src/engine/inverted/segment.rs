//! In-memory index state: term dictionaries, postings, stored fields and the
//! back index used to remove a document's postings on update.

use std::collections::BTreeMap;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::document::{
    AnalyzedField, Document, Field, FieldValue, IndexingOptions, TermFrequency, TermLocation,
};
use crate::engine::DocNum;
use crate::error::Result;
use crate::mapping::DEFAULT_FIELD;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum StoredValue {
    Text(String),
    Numeric(f64),
    DateTime(i64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredField {
    pub(crate) name: String,
    pub(crate) array_positions: Vec<u64>,
    pub(crate) value: StoredValue,
    pub(crate) options: IndexingOptions,
}

impl StoredField {
    fn from_field(field: &Field) -> Option<Self> {
        let value = match field.value() {
            FieldValue::Text(s) => StoredValue::Text(s.clone()),
            FieldValue::Numeric(n) => StoredValue::Numeric(*n),
            FieldValue::DateTime(dt) => StoredValue::DateTime(dt.timestamp_nanos_opt()?),
        };
        Some(StoredField {
            name: field.name().to_string(),
            array_positions: field.array_positions().to_vec(),
            value,
            options: field.options(),
        })
    }

    pub(crate) fn to_field(&self) -> Result<Field> {
        let positions = self.array_positions.clone();
        let field = match &self.value {
            StoredValue::Text(s) => Field::text(&self.name, positions, s.as_str()),
            StoredValue::Numeric(n) => Field::numeric(&self.name, positions, *n),
            StoredValue::DateTime(nanos) => {
                Field::datetime(&self.name, positions, DateTime::from_timestamp_nanos(*nanos))?
            }
        };
        Ok(field.with_options(self.options))
    }

    pub(crate) fn field_value(&self) -> FieldValue {
        match &self.value {
            StoredValue::Text(s) => FieldValue::Text(s.clone()),
            StoredValue::Numeric(n) => FieldValue::Numeric(*n),
            StoredValue::DateTime(nanos) => {
                FieldValue::DateTime(DateTime::from_timestamp_nanos(*nanos))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredPosting {
    pub(crate) frequency: u64,
    pub(crate) norm: f32,
    pub(crate) locations: Vec<TermLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredDocument {
    pub(crate) id: String,
    pub(crate) stored: Vec<StoredField>,
    /// Terms this document contributed, keyed by field.
    pub(crate) back_index: BTreeMap<String, Vec<String>>,
}

/// A document after analysis, ready to be applied to a segment.
#[derive(Debug)]
pub(crate) struct AnalyzedDocument {
    id: String,
    fields: BTreeMap<String, AnalyzedField>,
    stored: Vec<StoredField>,
}

fn merge_into(target: &mut AnalyzedField, source: &AnalyzedField) {
    target.length += source.length;
    for (term, tf) in &source.terms {
        let entry: &mut TermFrequency = target.terms.entry(term.clone()).or_default();
        entry.frequency += tf.frequency;
        entry.locations.extend(tf.locations.iter().cloned());
    }
}

impl AnalyzedDocument {
    /// Analyze every field. Text fields included in `_all` are also merged
    /// into the composite field.
    pub(crate) fn analyze(doc: &Document) -> Result<Self> {
        let mut fields: BTreeMap<String, AnalyzedField> = BTreeMap::new();
        let mut stored = Vec::new();

        for field in doc.fields() {
            let options = field.options();
            let into_all = options.include_in_all && field.as_text().is_some();
            if options.index || into_all {
                let analyzed = field.analyze()?;
                if options.index {
                    merge_into(fields.entry(field.name().to_string()).or_default(), &analyzed);
                }
                if into_all {
                    merge_into(fields.entry(DEFAULT_FIELD.to_string()).or_default(), &analyzed);
                }
            }
            if options.store {
                if let Some(sf) = StoredField::from_field(field) {
                    stored.push(sf);
                }
            }
        }

        Ok(AnalyzedDocument {
            id: doc.id().to_string(),
            fields,
            stored,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Segment {
    next_doc: DocNum,
    pub(crate) ids: BTreeMap<String, DocNum>,
    pub(crate) docs: BTreeMap<DocNum, StoredDocument>,
    /// Field names in the order they were first indexed.
    pub(crate) fields: Vec<String>,
    /// field -> term -> doc -> posting
    pub(crate) terms: BTreeMap<String, BTreeMap<String, BTreeMap<DocNum, StoredPosting>>>,
    pub(crate) internal: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Segment {
    /// Remove a document and its postings. Returns whether it existed.
    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let Some(num) = self.ids.remove(id) else {
            return false;
        };
        if let Some(doc) = self.docs.remove(&num) {
            for (field, terms) in &doc.back_index {
                let Some(dict) = self.terms.get_mut(field) else {
                    continue;
                };
                for term in terms {
                    if let Some(postings) = dict.get_mut(term) {
                        postings.remove(&num);
                        if postings.is_empty() {
                            dict.remove(term);
                        }
                    }
                }
                if dict.is_empty() {
                    self.terms.remove(field);
                }
            }
        }
        true
    }

    /// Insert an analyzed document, replacing any previous version.
    pub(crate) fn insert(&mut self, doc: AnalyzedDocument) {
        self.remove(&doc.id);

        let num = self.next_doc;
        self.next_doc += 1;

        let mut back_index = BTreeMap::new();
        for (name, analyzed) in doc.fields {
            if !self.fields.contains(&name) {
                self.fields.push(name.clone());
            }
            let norm = if analyzed.length > 0 {
                1.0 / (analyzed.length as f32).sqrt()
            } else {
                1.0
            };
            let dict = self.terms.entry(name.clone()).or_default();
            let mut field_terms = Vec::with_capacity(analyzed.terms.len());
            for (term, tf) in analyzed.terms {
                dict.entry(term.clone()).or_default().insert(
                    num,
                    StoredPosting {
                        frequency: tf.frequency,
                        norm,
                        locations: tf.locations,
                    },
                );
                field_terms.push(term);
            }
            back_index.insert(name, field_terms);
        }

        self.ids.insert(doc.id.clone(), num);
        self.docs.insert(
            num,
            StoredDocument {
                id: doc.id,
                stored: doc.stored,
                back_index,
            },
        );
    }

    pub(crate) fn doc_count(&self) -> u64 {
        self.ids.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PipelineAnalyzer;
    use std::sync::Arc;

    fn doc(id: &str, body: &str) -> Document {
        Document::new(id).with_field(
            Field::text("body", vec![], body).with_analyzer(Arc::new(PipelineAnalyzer::simple())),
        )
    }

    #[test]
    fn test_insert_and_replace() {
        let mut segment = Segment::default();
        segment.insert(AnalyzedDocument::analyze(&doc("a", "red fish")).unwrap());
        segment.insert(AnalyzedDocument::analyze(&doc("b", "blue fish")).unwrap());
        assert_eq!(segment.doc_count(), 2);
        assert_eq!(segment.terms["body"]["fish"].len(), 2);
        assert_eq!(segment.terms["_all"]["fish"].len(), 2);

        segment.insert(AnalyzedDocument::analyze(&doc("a", "green")).unwrap());
        assert_eq!(segment.doc_count(), 2);
        assert!(!segment.terms["body"].contains_key("red"));
        assert_eq!(segment.terms["body"]["fish"].len(), 1);
    }

    #[test]
    fn test_remove_cleans_dictionary() {
        let mut segment = Segment::default();
        segment.insert(AnalyzedDocument::analyze(&doc("a", "solo")).unwrap());
        assert!(segment.remove("a"));
        assert!(!segment.remove("a"));
        assert!(segment.terms.is_empty());
        assert_eq!(segment.fields, vec!["_all".to_string(), "body".to_string()]);
    }
}
