use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;
pub mod chart;
pub mod error;
pub mod plot;
pub mod statistics;

pub use error::{Error, Result};

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Name of the column holding the sample time in the statistics logs.
pub const TIME_COLUMN: &str = "time";

/// The main struct for the csv data: named numeric columns of equal length.
/// Missing or non-numeric cells are kept as NAN, so that a row is never dropped
/// while loading; plotting decides what to skip.
#[derive(Debug, Clone, Default)]
pub struct Table {
    names: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl Table {
    /// Init a Table from a csv file with a header row.
    pub fn from_csv(fin: &Path) -> Result<Table> {
        let file = File::open(fin).map_err(|source| Error::Io {
            path: fin.to_path_buf(),
            source,
        })?;
        Table::from_reader(file)
    }

    /// Init a Table from any csv source with a header row.
    /// Records with a different number of fields than the header are an error.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(rdr);
        let names: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let mut values: Vec<Vec<f64>> = vec![Vec::with_capacity(10000); names.len()];
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            for ((column, name), field) in values.iter_mut().zip(names.iter()).zip(record.iter()) {
                column.push(parse_cell(field).unwrap_or_else(|| {
                    debug!("row {}, column {}: no numeric value in {:?}", row, name, field);
                    f64::NAN
                }));
            }
        }
        Ok(Table { names, values })
    }

    pub fn columns(&self) -> &[String] {
        &self.names
    }

    /// number of rows
    pub fn len(&self) -> usize {
        self.values.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.position(name).map(|i| &self.values[i][..])
    }

    /// Like `column`, but reports the available columns when `name` is absent.
    pub fn require(&self, name: &str) -> Result<&[f64]> {
        self.column(name).ok_or_else(|| Error::MissingColumn {
            column: name.to_string(),
            available: self.names.clone(),
        })
    }

    /// divides all the values of a column by `divisor`, in-place
    pub fn divide_column(&mut self, name: &str, divisor: f64) -> Result<()> {
        let i = match self.position(name) {
            Some(i) => i,
            None => {
                return Err(Error::MissingColumn {
                    column: name.to_string(),
                    available: self.names.clone(),
                })
            }
        };
        for v in self.values[i].iter_mut() {
            *v /= divisor;
        }
        Ok(())
    }

    /// keeps the columns whose name satisfies `keep`, in their original order
    /// takes a reference and returns a new Table
    pub fn select<F: Fn(&str) -> bool>(&self, keep: F) -> Table {
        let mut table = Table::default();
        for (name, values) in self.names.iter().zip(self.values.iter()) {
            if keep(name) {
                table.names.push(name.clone());
                table.values.push(values.clone());
            }
        }
        table
    }

    /// renames every column with `rename`, in-place
    pub fn rename_columns<F: Fn(&str) -> String>(&mut self, rename: F) {
        for name in self.names.iter_mut() {
            *name = rename(name);
        }
    }

    /// Stacks the rows of all `tables`, in order, copying every value once.
    /// The result has the union of the columns, in order of first appearance;
    /// cells of a column missing from a table are NAN.
    pub fn concat(tables: &[Table]) -> Table {
        let mut names: Vec<String> = Vec::new();
        for t in tables {
            for name in t.names.iter() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        let rows: usize = tables.iter().map(Table::len).sum();
        let values = names
            .iter()
            .map(|name| {
                let mut column = Vec::with_capacity(rows);
                for t in tables {
                    match t.column(name) {
                        Some(v) => column.extend_from_slice(v),
                        None => column.resize(column.len() + t.len(), f64::NAN),
                    }
                }
                column
            })
            .collect();
        Table { names, values }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

fn parse_cell(field: &str) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    field.parse().ok()
}

/// Minimum and maximum of a slice, or None when it is empty.
/// Values that are not comparable with themselves (NAN) are skipped.
pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    #[allow(clippy::eq_op)]
    let mut self_iter = s.iter().filter(|v| *v == *v);
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}
