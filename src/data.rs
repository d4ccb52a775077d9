//! CSV ingestion for the book dataset.
//!
//! Rows are coerced field by field. A row is only dropped when it carries no
//! usable genre; every other field degrades to `None` so the row can still
//! feed the aggregations that do not need it.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const GENRE_COLUMN: &str = "genre";
pub const AGE_COLUMN: &str = "age_category";
pub const RATING_COLUMN: &str = "rating_average";
pub const ADAPTED_COLUMN: &str = "adapted_to_movie";

const GENRE_DELIMITER: char = ',';

#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot open dataset {}: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed dataset header: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset is missing required column `{0}`")]
    MissingColumn(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeCategory {
    Children,
    YoungAdult,
    Adult,
}

impl AgeCategory {
    /// Display order, bottom to top on the heatmap.
    pub const ALL: [AgeCategory; 3] = [Self::Children, Self::YoungAdult, Self::Adult];

    pub fn label(self) -> &'static str {
        match self {
            Self::Children => "Children",
            Self::YoungAdult => "Young Adult",
            Self::Adult => "Adult",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "Children" => Some(Self::Children),
            "Young Adult" => Some(Self::YoungAdult),
            "Adult" => Some(Self::Adult),
            _ => None,
        }
    }
}

/// One parsed dataset row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub genres: Vec<String>,
    pub age_category: Option<AgeCategory>,
    pub rating_average: Option<f64>,
    pub adapted_to_movie: Option<bool>,
}

impl Record {
    pub fn new(genre: &str, age: &str, rating: &str, adapted: &str) -> Option<Self> {
        let genres = split_genres(genre);
        if genres.is_empty() {
            return None;
        }
        Some(Self {
            genres,
            age_category: AgeCategory::parse(age),
            rating_average: parse_rating(rating),
            adapted_to_movie: parse_adapted(adapted),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
    /// Rows dropped during ingestion.
    pub skipped: usize,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn split_genres(raw: &str) -> Vec<String> {
    raw.split(GENRE_DELIMITER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_rating(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_adapted(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed == "TRUE")
    }
}

pub fn load_dataset(path: &Path) -> Result<Dataset, DataError> {
    let file = File::open(path).map_err(|source| DataError::Unavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = parse_dataset(file)?;
    info!(
        path = %path.display(),
        records = dataset.records.len(),
        skipped = dataset.skipped,
        "loaded dataset"
    );
    Ok(dataset)
}

pub fn parse_dataset<R: Read>(reader: R) -> Result<Dataset, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Ok(Dataset::default());
    }
    let column = |name: &str| headers.iter().position(|header| header.trim() == name);
    let genre_idx = column(GENRE_COLUMN).ok_or(DataError::MissingColumn(GENRE_COLUMN))?;
    let age_idx = column(AGE_COLUMN);
    let rating_idx = column(RATING_COLUMN);
    let adapted_idx = column(ADAPTED_COLUMN);

    let mut dataset = Dataset::default();
    for (line, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                debug!(line = line + 2, error = %err, "skipping unreadable row");
                dataset.skipped += 1;
                continue;
            }
        };
        let field = |idx: Option<usize>| idx.and_then(|idx| row.get(idx)).unwrap_or("");
        match Record::new(
            field(Some(genre_idx)),
            field(age_idx),
            field(rating_idx),
            field(adapted_idx),
        ) {
            Some(record) => dataset.records.push(record),
            None => {
                debug!(line = line + 2, "skipping row without genre");
                dataset.skipped += 1;
            }
        }
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_fields() {
        let csv = "title,genre,age_category,rating_average,adapted_to_movie\n\
                   Dune,\"Sci-Fi, Fantasy ,\",Adult,4.25,TRUE\n\
                   Matilda,Fiction,Children,not-a-number,FALSE\n";
        let dataset = parse_dataset(csv.as_bytes()).unwrap();
        assert_eq!(dataset.records.len(), 2);
        assert_eq!(dataset.skipped, 0);

        let dune = &dataset.records[0];
        assert_eq!(dune.genres, vec!["Sci-Fi", "Fantasy"]);
        assert_eq!(dune.age_category, Some(AgeCategory::Adult));
        assert_eq!(dune.rating_average, Some(4.25));
        assert_eq!(dune.adapted_to_movie, Some(true));

        let matilda = &dataset.records[1];
        assert_eq!(matilda.rating_average, None);
        assert_eq!(matilda.adapted_to_movie, Some(false));
    }

    #[test]
    fn drops_rows_without_genre() {
        let csv = "genre,age_category\n ,Adult\n,,\nThriller,Teen\n";
        let dataset = parse_dataset(csv.as_bytes()).unwrap();
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.skipped, 2);
        assert_eq!(dataset.records[0].age_category, None);
    }

    #[test]
    fn missing_optional_columns_become_absent() {
        let dataset = parse_dataset("genre\nFantasy\n".as_bytes()).unwrap();
        let record = &dataset.records[0];
        assert_eq!(record.age_category, None);
        assert_eq!(record.rating_average, None);
        assert_eq!(record.adapted_to_movie, None);
    }

    #[test]
    fn missing_genre_column_is_an_error() {
        let err = parse_dataset("title,age_category\nX,Adult\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(GENRE_COLUMN)));
    }

    #[test]
    fn empty_input_is_an_empty_dataset() {
        let dataset = parse_dataset("genre,age_category\n".as_bytes()).unwrap();
        assert!(dataset.is_empty());
        let dataset = parse_dataset("".as_bytes()).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.skipped, 0);
    }

    #[test]
    fn unavailable_source_reports_path() {
        let err = load_dataset(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DataError::Unavailable { .. }));
        assert!(err.to_string().contains("here.csv"));
    }

    #[test]
    fn rejects_non_finite_ratings() {
        let record = Record::new("Fantasy", "Adult", "NaN", "").unwrap();
        assert_eq!(record.rating_average, None);
        assert_eq!(record.adapted_to_movie, None);
    }
}
