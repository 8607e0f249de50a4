// Density table: the flat, fixed-schema materialization of candidate chunks.
//
// Column order is fixed: doc_id, chunk_id, substring_start, substring_end,
// l2_norm, then one `<topic>_topic_density` column per topic in topic-set
// order.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::topics::topic::TopicSet;

use super::density::CandidateChunk;

/// Leading columns shared by every density table.
pub const BASE_COLUMNS: [&str; 5] = [
    "doc_id",
    "chunk_id",
    "substring_start",
    "substring_end",
    "l2_norm",
];

#[derive(Debug, Clone, Default)]
pub struct DensityTable {
    topic_names: Vec<String>,
    rows: Vec<CandidateChunk>,
}

impl DensityTable {
    pub fn new(topics: &TopicSet) -> Self {
        Self {
            topic_names: topics.names().map(str::to_string).collect(),
            rows: Vec::new(),
        }
    }

    pub fn extend(&mut self, chunks: impl IntoIterator<Item = CandidateChunk>) {
        self.rows.extend(chunks);
    }

    pub fn topic_names(&self) -> &[String] {
        &self.topic_names
    }

    pub fn rows(&self) -> &[CandidateChunk] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in output order.
    pub fn columns(&self) -> Vec<String> {
        BASE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(
                self.topic_names
                    .iter()
                    .map(|name| format!("{name}_topic_density")),
            )
            .collect()
    }

    /// Write the table as CSV (header row first).
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.columns())?;

        for row in &self.rows {
            let mut record = vec![
                row.doc_id.clone(),
                row.chunk_id.to_string(),
                row.substring_start.to_string(),
                row.substring_end.to_string(),
                row.l2_norm.to_string(),
            ];
            record.extend(row.densities.iter().map(|d| d.to_string()));
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        self.write_csv(file)
            .with_context(|| format!("Failed to write density table to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn table() -> DensityTable {
        let topics =
            TopicSet::from_terms([("topic1", vec!["a"]), ("topic2", vec!["b"])]).unwrap();
        let mut table = DensityTable::new(&topics);
        table.extend([CandidateChunk {
            doc_id: "doc".to_string(),
            chunk_id: Uuid::nil(),
            substring_start: 0,
            substring_end: 7,
            l2_norm: 0.5,
            densities: vec![0.5, 0.0],
        }]);
        table
    }

    #[test]
    fn test_columns_in_fixed_order() {
        assert_eq!(
            table().columns(),
            vec![
                "doc_id",
                "chunk_id",
                "substring_start",
                "substring_end",
                "l2_norm",
                "topic1_topic_density",
                "topic2_topic_density",
            ]
        );
    }

    #[test]
    fn test_csv_output() {
        let mut buf = Vec::new();
        table().write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "doc_id,chunk_id,substring_start,substring_end,l2_norm,topic1_topic_density,topic2_topic_density"
        );
        assert_eq!(
            lines.next().unwrap(),
            "doc,00000000-0000-0000-0000-000000000000,0,7,0.5,0.5,0"
        );
        assert!(lines.next().is_none());
    }
}
