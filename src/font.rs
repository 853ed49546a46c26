//! Bitmap glyph tables.
//!
//! A table is a flat array of fixed-size records. Record 0 is the header
//! `{columns, rows, stride, ..}`; record `n` holds the bitmap of character
//! code `0x1F + n`. Each bitmap row is one byte, most significant bit on the
//! left, and the rows are sent to the panel starting from the end of the
//! record. This is the layout of the stock 6x8, 8x8 and 8x16 tables, so
//! existing font assets can be used as they are.

use crate::error::Error;

/// Character code that maps to the header record.
const FIRST_RECORD_CODE: u8 = 0x1F;

/// The three font slots of the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FontSize {
    /// 6x8 in the stock assets
    Small,
    /// 8x8 in the stock assets
    Medium,
    /// 8x16 in the stock assets
    Big,
}

impl FontSize {
    /// Column pitch used when printing strings.
    pub fn advance(self) -> u8 {
        match self {
            FontSize::Small => 6,
            FontSize::Medium | FontSize::Big => 8,
        }
    }

    fn slot(self) -> usize {
        match self {
            FontSize::Small => 0,
            FontSize::Medium => 1,
            FontSize::Big => 2,
        }
    }
}

/// A validated, read-only glyph table.
#[derive(Clone, Copy, Debug)]
pub struct GlyphTable {
    data: &'static [u8],
    columns: u8,
    rows: u8,
    stride: u8,
}

impl GlyphTable {
    /// Check the header of `data` and wrap it.
    ///
    /// Rows are a single byte wide, so at most 8 columns are supported, and
    /// a record must be large enough to hold every row.
    pub fn new(data: &'static [u8]) -> Result<Self, Error> {
        let (columns, rows, stride) = match data {
            [c, r, s, ..] => (*c, *r, *s),
            _ => return Err(Error::InvalidGlyphTable),
        };

        if columns == 0 || columns > 8 || rows == 0 || rows > stride {
            return Err(Error::InvalidGlyphTable);
        }
        if data.len() < 2 * usize::from(stride) {
            return Err(Error::InvalidGlyphTable);
        }

        Ok(GlyphTable {
            data,
            columns,
            rows,
            stride,
        })
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn stride(&self) -> u8 {
        self.stride
    }

    /// Look up the bitmap for `code`.
    pub fn glyph(&self, code: u8) -> Result<Glyph, Error> {
        if code <= FIRST_RECORD_CODE {
            return Err(Error::UnsupportedCharacter(code));
        }
        let stride = usize::from(self.stride);
        let start = stride * usize::from(code - FIRST_RECORD_CODE);

        let record = self
            .data
            .get(start..start + stride)
            .ok_or(Error::UnsupportedCharacter(code))?;

        Ok(Glyph {
            columns: self.columns,
            rows: self.rows,
            record,
        })
    }
}

/// One character bitmap borrowed from a [`GlyphTable`].
#[derive(Clone, Copy, Debug)]
pub struct Glyph {
    columns: u8,
    rows: u8,
    record: &'static [u8],
}

impl Glyph {
    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    /// Bitmap rows in transmission order: last byte of the record first.
    pub fn rows_in_send_order(&self) -> impl Iterator<Item = u8> + 'static {
        let record: &'static [u8] = self.record;
        record.iter().rev().take(usize::from(self.rows)).copied()
    }
}

/// The glyph tables installed in a display, one per [`FontSize`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Fonts {
    tables: [Option<GlyphTable>; 3],
}

impl Fonts {
    pub const fn new() -> Self {
        Fonts { tables: [None; 3] }
    }

    pub fn with(mut self, size: FontSize, table: GlyphTable) -> Self {
        self.tables[size.slot()] = Some(table);
        self
    }

    pub fn get(&self, size: FontSize) -> Result<&GlyphTable, Error> {
        self.tables[size.slot()]
            .as_ref()
            .ok_or(Error::MissingFont(size))
    }
}
