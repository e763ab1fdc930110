//! Point-in-time reader over a shared segment snapshot.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use crate::document::Document;
use crate::engine::inverted::segment::{Segment, StoredDocument};
use crate::engine::{DictEntry, DocNum, DumpRow, IndexReader, Posting};
use crate::error::{GlaiveError, Result};

#[derive(Debug)]
pub struct InvertedIndexReader {
    segment: Arc<Segment>,
    closed: bool,
}

impl InvertedIndexReader {
    pub(crate) fn new(segment: Arc<Segment>) -> Self {
        InvertedIndexReader {
            segment,
            closed: false,
        }
    }

    fn stored_rows(doc: &StoredDocument) -> impl Iterator<Item = DumpRow> + '_ {
        doc.stored.iter().map(|sf| DumpRow::Stored {
            doc_id: doc.id.clone(),
            field: sf.name.clone(),
            array_positions: sf.array_positions.clone(),
            value: sf.field_value(),
        })
    }

    fn term_rows(&self, num: DocNum, doc: &StoredDocument) -> Vec<DumpRow> {
        let mut rows = Vec::new();
        for (field, terms) in &doc.back_index {
            for term in terms {
                let frequency = self
                    .segment
                    .terms
                    .get(field)
                    .and_then(|dict| dict.get(term))
                    .and_then(|postings| postings.get(&num))
                    .map(|p| p.frequency)
                    .unwrap_or(0);
                rows.push(DumpRow::Term {
                    field: field.clone(),
                    term: term.clone(),
                    doc_id: doc.id.clone(),
                    frequency,
                });
            }
        }
        rows
    }
}

impl IndexReader for InvertedIndexReader {
    fn doc_count(&self) -> u64 {
        self.segment.doc_count()
    }

    fn document(&self, id: &str) -> Result<Option<Document>> {
        let Some(stored) = self
            .segment
            .ids
            .get(id)
            .and_then(|num| self.segment.docs.get(num))
        else {
            return Ok(None);
        };

        let mut doc = Document::new(id);
        for sf in &stored.stored {
            doc.add_field(sf.to_field()?);
        }
        Ok(Some(doc))
    }

    fn fields(&self) -> Result<Vec<String>> {
        Ok(self.segment.fields.clone())
    }

    fn field_dict_range(
        &self,
        field: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<DictEntry>> {
        let Some(dict) = self.segment.terms.get(field) else {
            return Ok(Vec::new());
        };
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Ok(Vec::new());
            }
        }
        let lower = start.map_or(Bound::Unbounded, Bound::Included);
        let upper = end.map_or(Bound::Unbounded, Bound::Included);
        Ok(dict
            .range::<str, _>((lower, upper))
            .map(|(term, postings)| DictEntry {
                term: term.clone(),
                count: postings.len() as u64,
            })
            .collect())
    }

    fn field_dict_prefix(&self, field: &str, prefix: &str) -> Result<Vec<DictEntry>> {
        let Some(dict) = self.segment.terms.get(field) else {
            return Ok(Vec::new());
        };
        Ok(dict
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(term, _)| term.starts_with(prefix))
            .map(|(term, postings)| DictEntry {
                term: term.clone(),
                count: postings.len() as u64,
            })
            .collect())
    }

    fn term_postings(&self, field: &str, term: &str) -> Result<Vec<Posting>> {
        let Some(postings) = self
            .segment
            .terms
            .get(field)
            .and_then(|dict| dict.get(term))
        else {
            return Ok(Vec::new());
        };
        Ok(postings
            .iter()
            .map(|(doc, p)| Posting {
                doc: *doc,
                frequency: p.frequency,
                norm: p.norm,
                locations: p.locations.clone(),
            })
            .collect())
    }

    fn doc_numbers(&self) -> Vec<DocNum> {
        self.segment.docs.keys().copied().collect()
    }

    fn doc_number(&self, id: &str) -> Option<DocNum> {
        self.segment.ids.get(id).copied()
    }

    fn external_id(&self, doc: DocNum) -> Result<String> {
        self.segment
            .docs
            .get(&doc)
            .map(|d| d.id.clone())
            .ok_or_else(|| GlaiveError::storage(format!("no document numbered {doc}")))
    }

    fn document_field_terms(&self, doc: DocNum) -> Result<BTreeMap<String, Vec<String>>> {
        self.segment
            .docs
            .get(&doc)
            .map(|d| d.back_index.clone())
            .ok_or_else(|| GlaiveError::storage(format!("no document numbered {doc}")))
    }

    fn get_internal(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.segment.internal.get(key).cloned())
    }

    fn dump_all(&self) -> Result<Vec<DumpRow>> {
        let mut rows = self.dump_fields()?;
        for (num, doc) in &self.segment.docs {
            rows.extend(self.term_rows(*num, doc));
            rows.extend(Self::stored_rows(doc));
            rows.push(DumpRow::BackIndex {
                doc_id: doc.id.clone(),
                terms: doc.back_index.clone(),
            });
        }
        rows.extend(
            self.segment
                .internal
                .iter()
                .map(|(key, value)| DumpRow::Internal {
                    key: key.clone(),
                    value: value.clone(),
                }),
        );
        Ok(rows)
    }

    fn dump_doc(&self, id: &str) -> Result<Vec<DumpRow>> {
        let Some((num, doc)) = self
            .segment
            .ids
            .get(id)
            .and_then(|num| self.segment.docs.get(num).map(|doc| (*num, doc)))
        else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<DumpRow> = Self::stored_rows(doc).collect();
        rows.extend(self.term_rows(num, doc));
        rows.push(DumpRow::BackIndex {
            doc_id: doc.id.clone(),
            terms: doc.back_index.clone(),
        });
        Ok(rows)
    }

    fn dump_fields(&self) -> Result<Vec<DumpRow>> {
        Ok(self
            .segment
            .fields
            .iter()
            .enumerate()
            .map(|(index, name)| DumpRow::Field {
                index,
                name: name.clone(),
            })
            .collect())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(GlaiveError::storage("reader already closed"));
        }
        self.closed = true;
        Ok(())
    }
}
