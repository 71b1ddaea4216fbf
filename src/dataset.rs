use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::LoadError;
use crate::models::{Cell, Measure, Record};

const YEAR: &str = "Year";
const SCHOOL: &str = "School";
const POSITION: &str = "Pos";

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// A header row plus raw cells, independent of the file format it came from.
#[derive(Debug, Clone)]
pub struct Table {
    origin: String,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn from_csv_reader<R: Read>(reader: R, origin: &str) -> Result<Self, LoadError> {
        let csv_error = |source| LoadError::Csv {
            origin: origin.to_string(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(csv_error)?;
            rows.push(record.iter().map(text_cell).collect());
        }

        Ok(Self {
            origin: origin.to_string(),
            headers,
            rows,
        })
    }

    /// Reads the first worksheet of a workbook.
    pub fn from_workbook(path: &Path) -> Result<Self, LoadError> {
        let workbook_error = |source| LoadError::Workbook {
            path: path.to_path_buf(),
            source,
        };
        let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| LoadError::NoSheets {
                path: path.to_path_buf(),
            })?;
        let range = workbook.worksheet_range(&sheet).map_err(workbook_error)?;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|header| {
                header
                    .iter()
                    .map(|cell| match data_cell(cell) {
                        Cell::Text(text) => text.trim().to_string(),
                        Cell::Number(value) => number_text(value),
                        Cell::Missing => String::new(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            origin: path.display().to_string(),
            headers,
            rows: rows.map(|row| row.iter().map(data_cell).collect()).collect(),
        })
    }

    fn column(&self, name: &'static str) -> Result<usize, LoadError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| LoadError::MissingColumn {
                column: name,
                origin: self.origin.clone(),
            })
    }
}

fn text_cell(raw: &str) -> Cell {
    if raw.trim().is_empty() {
        Cell::Missing
    } else {
        Cell::Text(raw.to_string())
    }
}

fn data_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Missing,
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::DateTime(value) => Cell::Number(value.as_f64()),
        Data::Bool(value) => Cell::Text(value.to_string()),
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
            text_cell(value)
        }
    }
}

fn number_text(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn label(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Text(text) => Some(text.clone()),
        Cell::Number(value) => Some(number_text(*value)),
        Cell::Missing => None,
    }
}

fn year(cell: &Cell) -> Option<i32> {
    let value = match cell {
        Cell::Number(value) => *value,
        Cell::Text(text) => {
            let text = text.trim();
            match text.parse::<i32>() {
                Ok(year) => return Some(year),
                Err(_) => text.parse::<f64>().ok()?,
            }
        }
        Cell::Missing => return None,
    };
    let in_range = value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX);
    (value.fract() == 0.0 && in_range).then_some(value as i32)
}

/// The in-memory draft table. Numeric coercion has already run on every
/// measure column by the time a `Dataset` is handed out.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Loads the configured source, failing when none was given.
    pub fn load_configured(source: Option<&Path>) -> Result<Self, LoadError> {
        Self::load(source.ok_or(LoadError::NoSource)?)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let table = if extension == "csv" {
            let file = File::open(path).map_err(|source| LoadError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Table::from_csv_reader(file, &path.display().to_string())?
        } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            Table::from_workbook(path)?
        } else {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        };

        let dataset = Self::from_table(table)?;
        tracing::info!(
            path = %path.display(),
            records = dataset.records.len(),
            "loaded draft dataset"
        );
        Ok(dataset)
    }

    pub fn from_table(table: Table) -> Result<Self, LoadError> {
        let year_idx = table.column(YEAR)?;
        let school_idx = table.column(SCHOOL)?;
        let position_idx = table.column(POSITION)?;
        let salary_idx = table.column(Measure::Salary.column())?;
        let cav_idx = table.column(Measure::Cav.column())?;
        let pick_idx = table.column(Measure::Pick.column())?;

        let mut records = Vec::with_capacity(table.rows.len());
        for (index, row) in table.rows.iter().enumerate() {
            if row.iter().all(|cell| *cell == Cell::Missing) {
                continue;
            }
            let cell = |idx: usize| row.get(idx).cloned().unwrap_or(Cell::Missing);

            let year_cell = cell(year_idx);
            let year = year(&year_cell).ok_or_else(|| LoadError::InvalidYear {
                row: index + 1,
                value: label(&year_cell).unwrap_or_default(),
                origin: table.origin.clone(),
            })?;

            records.push(Record {
                year,
                school: label(&cell(school_idx)),
                position: label(&cell(position_idx)),
                salary: cell(salary_idx),
                cav: cell(cav_idx),
                pick: cell(pick_idx),
            });
        }

        let mut dataset = Self { records };
        dataset.coerce_numeric(&Measure::ALL);
        Ok(dataset)
    }

    /// Builds a dataset from records as-is. Text cells stay uncoerced until
    /// [`Dataset::coerce_numeric`] runs.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Replaces non-numeric text in the given columns with missing values.
    /// Running it again is a no-op.
    pub fn coerce_numeric(&mut self, measures: &[Measure]) {
        for &measure in measures {
            let mut dropped = 0usize;
            for record in &mut self.records {
                let cell = record.cell_mut(measure);
                let was_text = matches!(cell, Cell::Text(_));
                cell.coerce();
                if was_text && *cell == Cell::Missing {
                    dropped += 1;
                }
            }
            if dropped > 0 {
                tracing::warn!(
                    column = measure.column(),
                    count = dropped,
                    "non-numeric values treated as missing"
                );
            }
        }
    }

    /// Distinct years in the order they first appear.
    pub fn years(&self) -> Vec<i32> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|record| record.year)
            .filter(|year| seen.insert(*year))
            .collect()
    }

    pub fn positions(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter_map(|record| record.position.as_deref())
            .filter(|position| seen.insert(*position))
            .map(str::to_string)
            .collect()
    }
}
