//! Header-indexed CSV cursor. Archive files mark missing cells as empty or
//! "NA", carry numeric columns as "12" or "12.0" interchangeably, and the odd
//! row with a short field count — the typed accessors absorb all of that so
//! pipeline code never branches on cell shape.

use std::collections::HashMap;
use std::io::Read;

use csv::{ReaderBuilder, StringRecord};

pub struct RowCursor<R: Read> {
    reader: csv::Reader<R>,
    index: HashMap<String, usize>,
    record: StringRecord,
}

impl<R: Read> RowCursor<R> {
    /// Build the header→index map once; rows stream one at a time after that.
    pub fn new(source: R) -> csv::Result<Self> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);
        let index = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Ok(Self {
            reader,
            index,
            record: StringRecord::new(),
        })
    }

    /// Move to the next row. Returns false at end of stream.
    pub fn advance(&mut self) -> csv::Result<bool> {
        self.reader.read_record(&mut self.record)
    }

    pub fn has_column(&self, col: &str) -> bool {
        self.index.contains_key(col)
    }

    /// Trimmed cell text, "" when the column or cell is missing.
    pub fn text(&self, col: &str) -> &str {
        self.index
            .get(col)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
            .unwrap_or("")
    }

    /// Integer cell; missing, "NA" and garbage all coerce to 0. Archive files
    /// render whole numbers as "12.0" in places, so a float parse backs up
    /// the integer parse.
    pub fn int(&self, col: &str) -> i64 {
        self.opt_int(col).unwrap_or(0)
    }

    pub fn float(&self, col: &str) -> f64 {
        self.opt_float(col).unwrap_or(0.0)
    }

    /// None for missing/"NA" cells — for columns that are nullable in the
    /// domain rather than zero-defaulted.
    pub fn opt_int(&self, col: &str) -> Option<i64> {
        let raw = self.text(col);
        if raw.is_empty() || raw == "NA" {
            return None;
        }
        raw.parse::<i64>()
            .ok()
            .or_else(|| raw.parse::<f64>().ok().map(|f| f as i64))
    }

    pub fn opt_float(&self, col: &str) -> Option<f64> {
        let raw = self.text(col);
        if raw.is_empty() || raw == "NA" {
            return None;
        }
        raw.parse::<f64>().ok()
    }

    /// "A-B" pair cell; anything else is (0, 0).
    pub fn split_pair(&self, col: &str) -> (i64, i64) {
        crate::utils::split_pair(self.text(col))
    }

    pub fn bool_flag(&self, col: &str) -> bool {
        matches!(self.text(col), "1" | "1.0" | "true" | "TRUE")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn cursor(data: &str) -> RowCursor<Cursor<Vec<u8>>> {
        RowCursor::new(Cursor::new(data.as_bytes().to_vec())).unwrap()
    }

    #[test]
    fn typed_accessors_coerce_sentinels() {
        let mut rows = cursor("player,yards,avg,eff\nJ. Smith,NA,7.5,5-12\n,120.0,,\n");

        assert!(rows.advance().unwrap());
        assert_eq!(rows.text("player"), "J. Smith");
        assert_eq!(rows.int("yards"), 0); // NA
        assert!((rows.float("avg") - 7.5).abs() < f64::EPSILON);
        assert_eq!(rows.split_pair("eff"), (5, 12));
        assert_eq!(rows.opt_int("yards"), None);

        assert!(rows.advance().unwrap());
        assert_eq!(rows.text("player"), "");
        assert_eq!(rows.int("yards"), 120); // "120.0" truncates
        assert_eq!(rows.float("avg"), 0.0);
        assert_eq!(rows.split_pair("eff"), (0, 0));

        assert!(!rows.advance().unwrap());
    }

    #[test]
    fn short_rows_are_tolerated() {
        let mut rows = cursor("a,b,c\n1,2\n");
        assert!(rows.advance().unwrap());
        assert_eq!(rows.int("a"), 1);
        assert_eq!(rows.int("b"), 2);
        assert_eq!(rows.text("c"), "");
        assert_eq!(rows.int("c"), 0);
    }

    #[test]
    fn unknown_column_is_empty() {
        let mut rows = cursor("a\n1\n");
        assert!(rows.advance().unwrap());
        assert!(!rows.has_column("z"));
        assert_eq!(rows.text("z"), "");
        assert_eq!(rows.int("z"), 0);
    }
}
