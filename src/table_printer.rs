use std::fmt::{Display, Write};
use unicode_width::UnicodeWidthStr;

/// Box-drawn text tables for terminal reports.
#[derive(Default, Debug)]
pub struct TablePrinter {
    title: Option<String>,
    header: Option<String>,
    footer: Option<String>,
    column_names: Vec<String>,
    columns: Vec<Vec<String>>,
}

impl TablePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title<T>(self, title: T) -> Self
    where
        Option<String>: From<T>,
    {
        Self {
            title: Option::from(title),
            ..self
        }
    }

    pub fn with_header<T>(self, header: T) -> Self
    where
        Option<String>: From<T>,
    {
        Self {
            header: Option::from(header),
            ..self
        }
    }

    pub fn with_footer<T>(self, footer: T) -> Self
    where
        Option<String>: From<T>,
    {
        Self {
            footer: Option::from(footer),
            ..self
        }
    }

    /// Add empty columns, to be filled with [`add_row`](TablePrinter::add_row).
    pub fn with_empty_columns<T: Display>(mut self, col_names: &[T]) -> Self {
        for name in col_names {
            self.column_names.push(name.to_string());
            self.columns.push(vec![]);
        }
        self
    }

    pub fn add_row(&mut self, row_vals: Vec<String>) {
        debug_assert!(row_vals.len() == self.columns.len());
        for (col, val) in self.columns.iter_mut().zip(row_vals.into_iter()) {
            col.push(val);
        }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn print(&self) -> Result<(), std::fmt::Error> {
        print!("{}", self.render(0)?);
        Ok(())
    }

    /// Draw the table, at least `min_width` characters wide. A table without columns renders as
    /// an empty string.
    pub fn render(&self, min_width: usize) -> Result<String, std::fmt::Error> {
        if self.columns.is_empty() {
            return Ok(String::new());
        }

        let (table_width, col_widths) = self.calculate_widths(min_width);

        let mut out = String::with_capacity(2000);
        let (left, right) = self.write_title(table_width, &mut out)?;
        let (left, right) = self.write_header(left, right, table_width, &mut out)?;
        self.write_column_names(left, right, &col_widths, &mut out)?;
        self.write_rows(&col_widths, &mut out)?;
        self.write_footer(table_width, &col_widths, &mut out)?;

        Ok(out)
    }

    /// The full table width and the width of each column.
    fn calculate_widths(&self, min_width: usize) -> (usize, Vec<usize>) {
        let title_width = self
            .title
            .as_ref()
            .map(|title| UnicodeWidthStr::width(title.as_str()) + 2)
            .unwrap_or(0);

        let mut table_width = min_width.max(title_width);

        let mut col_widths: Vec<usize> = self
            .column_names
            .iter()
            .zip(&self.columns)
            .map(|(name, vals)| {
                vals.iter()
                    .map(|v| UnicodeWidthStr::width(v.as_str()))
                    .chain(std::iter::once(UnicodeWidthStr::width(name.as_str())))
                    .max()
                    .unwrap_or(0)
                    + 2
            })
            .collect();

        let all_cols_width =
            |widths: &[usize]| widths.iter().sum::<usize>() + widths.len().saturating_sub(1);

        // Widen the narrowest columns until the title fits.
        while all_cols_width(&col_widths) < table_width {
            let min = col_widths.iter().cloned().min().unwrap_or(0);
            for width in col_widths.iter_mut().filter(|w| **w == min) {
                *width += 1;
            }
        }

        table_width = table_width.max(all_cols_width(&col_widths));

        (table_width, col_widths)
    }

    fn write_title(
        &self,
        table_width: usize,
        out: &mut String,
    ) -> Result<(char, char), std::fmt::Error> {
        writeln!(out)?;

        match self.title {
            Some(ref title) => {
                writeln!(out, "\u{250c}{}\u{2510}", "\u{2500}".repeat(table_width))?;
                writeln!(out, "\u{2502}{0:^1$}\u{2502}", title, table_width)?;
                Ok(('\u{251c}', '\u{2524}'))
            }
            None => Ok(('\u{250c}', '\u{2510}')),
        }
    }

    fn write_header(
        &self,
        left: char,
        right: char,
        table_width: usize,
        out: &mut String,
    ) -> Result<(char, char), std::fmt::Error> {
        match self.header {
            Some(ref header) => {
                writeln!(out, "{}{}{}", left, "\u{2500}".repeat(table_width), right)?;
                for line in wrapper(header, table_width) {
                    writeln!(out, "\u{2502}{0:<1$}\u{2502}", line, table_width)?;
                }
                Ok(('\u{251c}', '\u{2524}'))
            }
            None => Ok((left, right)),
        }
    }

    fn write_column_names(
        &self,
        left: char,
        right: char,
        col_widths: &[usize],
        out: &mut String,
    ) -> Result<(), std::fmt::Error> {
        border(out, left, '\u{252c}', right, col_widths)?;

        for (name, width) in self.column_names.iter().zip(col_widths) {
            write!(out, "\u{2502} {0:^1$} ", name, width - 2)?;
        }
        writeln!(out, "\u{2502}")
    }

    fn write_rows(&self, col_widths: &[usize], out: &mut String) -> Result<(), std::fmt::Error> {
        border(out, '\u{251c}', '\u{253c}', '\u{2524}', col_widths)?;

        for i in 0..self.num_rows() {
            for (column, col_width) in self.columns.iter().zip(col_widths) {
                let val = column.get(i).map(String::as_str).unwrap_or("");
                write!(out, "\u{2502} {0:>1$} ", val, col_width - 2)?;
            }
            writeln!(out, "\u{2502}")?;
        }

        Ok(())
    }

    fn write_footer(
        &self,
        table_width: usize,
        col_widths: &[usize],
        out: &mut String,
    ) -> Result<(), std::fmt::Error> {
        match self.footer {
            Some(ref footer) => {
                border(out, '\u{251c}', '\u{2534}', '\u{2524}', col_widths)?;
                for line in wrapper(footer, table_width) {
                    writeln!(out, "\u{2502}{0:<1$}\u{2502}", line, table_width)?;
                }
                writeln!(out, "\u{2514}{}\u{2518}", "\u{2500}".repeat(table_width))
            }
            None => border(out, '\u{2514}', '\u{2534}', '\u{2518}', col_widths),
        }
    }
}

/// A horizontal border with a junction between every column.
fn border(
    out: &mut String,
    left: char,
    junction: char,
    right: char,
    col_widths: &[usize],
) -> Result<(), std::fmt::Error> {
    let segments: Vec<String> = col_widths.iter().map(|&w| "\u{2500}".repeat(w)).collect();
    writeln!(out, "{}{}{}", left, segments.join(&junction.to_string()), right)
}

/// Split the header/footers into lines
fn wrapper(text: &str, table_width: usize) -> Vec<&str> {
    let mut to_ret: Vec<&str> = vec![];

    let mut remaining = text;
    while remaining.len() > table_width {
        let mut cut = table_width;
        while !remaining.is_char_boundary(cut) {
            cut -= 1;
        }
        let guess = &remaining[..cut];

        let right_edge = guess
            .find('\n')
            .or_else(|| guess.rfind(char::is_whitespace))
            .filter(|&edge| edge > 0)
            .unwrap_or(cut);
        to_ret.push(&remaining[..right_edge]);
        remaining = remaining[right_edge..].trim();
    }
    to_ret.push(remaining);

    to_ret
}
