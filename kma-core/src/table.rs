//! A small column-ordered string table.
//!
//! Cells are optional: a row that never received a value for a column holds
//! `None` there, which renders as an empty field in every output format.

use std::{fmt, io};

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; short rows are padded with absent cells.
    pub(crate) fn push_row(&mut self, mut cells: Vec<Option<String>>) {
        debug_assert!(cells.len() <= self.columns.len());
        cells.resize(self.columns.len(), None);
        self.rows.push(cells);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|cells| Row { table: self, cells })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row { table: self, cells })
    }

    /// All values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_deref()).collect())
    }

    /// Write the table as CSV with a header line.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> csv::Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        // csv only ever writes the UTF-8 it was given
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    cells: &'a [Option<String>],
}

impl<'a> Row<'a> {
    /// Cell value by column name; `None` for an unknown column or absent cell.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.table.column_index(column)?;
        self.cells[idx].as_deref()
    }

    pub fn cells(&self) -> impl Iterator<Item = Option<&'a str>> {
        self.cells.iter().map(|c| c.as_deref())
    }
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, cell) in self.table.columns.iter().zip(self.cells) {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

/// Serializes as a list of row objects, keys in column order.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in self.rows() {
            seq.serialize_element(&row)?;
        }
        seq.end()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                let len = cell.as_deref().map_or(0, |c| c.chars().count());
                *w = (*w).max(len);
            }
        }

        write_line(f, &widths, self.columns.iter().map(String::as_str))?;
        for row in &self.rows {
            write_line(f, &widths, row.iter().map(|c| c.as_deref().unwrap_or("")))?;
        }
        Ok(())
    }
}

fn write_line<'a>(
    f: &mut fmt::Formatter<'_>,
    widths: &[usize],
    cells: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    let mut line = String::new();
    for (i, (cell, &width)) in cells.zip(widths).enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(&format!("{cell:<width$}"));
    }
    writeln!(f, "{}", line.trim_end())
}
