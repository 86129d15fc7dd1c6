//! Decoding of the ASCII grid text format.
//!
//! A tile is distributed as an ESRI-style ASCII grid: a six line header of
//! `keyword value` pairs followed by one line of whitespace-separated
//! integers per raster row, north row first.
//!
//! ```text
//! ncols         4
//! nrows         2
//! xllcorner     0.0
//! yllcorner     0.0
//! cellsize      1.0
//! NODATA_value  -9999
//! 1 2 3 4
//! 5 6 7 8
//! ```
//!
//! Header keywords are matched case-insensitively and in any order within
//! the first six lines. Keywords other than the five required ones are
//! ignored.

use std::io::BufRead;

use nom::branch::alt;
use nom::bytes::complete::{is_not, tag_no_case};
use nom::character::complete::{i32 as i32_parser, space0, space1, u32 as u32_parser};
use nom::combinator::{all_consuming, eof, map_parser, peek, value};
use nom::multi::separated_list0;
use nom::number::complete::double;
use nom::sequence::{delimited, preceded, terminated};
use nom::{IResult, Parser};

use crate::error::{GridError, Result};
use crate::grid::{GridHeader, GridTile};

/// Number of lines making up the header block.
pub const HEADER_LINES: usize = 6;

/// Upper bound on the sample buffer reserved up front (one 6001 x 6001
/// tile). Larger grids grow the buffer as rows are read.
const PREALLOC_SAMPLES: usize = 6001 * 6001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderKey {
    NCols,
    NRows,
    XllCorner,
    YllCorner,
    CellSize,
}

impl HeaderKey {
    fn name(self) -> &'static str {
        match self {
            HeaderKey::NCols => "ncols",
            HeaderKey::NRows => "nrows",
            HeaderKey::XllCorner => "xllcorner",
            HeaderKey::YllCorner => "yllcorner",
            HeaderKey::CellSize => "cellsize",
        }
    }
}

/// Parse a complete grid file held in memory.
pub fn parse_grid(text: &str) -> Result<GridTile> {
    parse_lines(text.lines())
}

/// Parse a grid from a buffered reader.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<GridTile> {
    let lines = reader.lines().collect::<std::io::Result<Vec<_>>>()?;
    parse_lines(lines)
}

/// Parse a grid from a sequence of lines.
///
/// Blank lines after the last row are ignored; a blank line between rows
/// is reported as an empty row.
///
/// # Errors
///
/// - [`GridError::MissingHeader`] if a required keyword is absent from the header block
/// - [`GridError::InvalidHeader`] if a header value is not numeric or out of range
/// - [`GridError::RowLength`] / [`GridError::InvalidSample`] for a bad data row
/// - [`GridError::RowCount`] if the body does not hold `nrows` rows
pub fn parse_lines<I>(lines: I) -> Result<GridTile>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut lines = lines.into_iter();
    let header = parse_header(&mut lines)?;

    let mut elevation = Vec::with_capacity(header.len().min(PREALLOC_SAMPLES));
    let mut row = 0;
    let mut after_blank = false;

    for line in lines {
        let line = line.as_ref();
        if line.trim().is_empty() {
            after_blank = true;
            continue;
        }
        if after_blank && row < header.rows {
            return Err(GridError::RowLength {
                row,
                expected: header.cols,
                found: 0,
            });
        }
        // Keep counting surplus rows so the error reports the real size
        if row < header.rows {
            parse_row(line, row, header.cols, &mut elevation)?;
        }
        row += 1;
    }

    if row != header.rows {
        return Err(GridError::RowCount {
            expected: header.rows,
            found: row,
        });
    }

    GridTile::new(header, elevation)
}

/// `<keyword>` at the start of a header line, followed by whitespace or the end of line.
fn header_key(input: &str) -> IResult<&str, HeaderKey> {
    preceded(
        space0,
        terminated(
            alt((
                value(HeaderKey::NCols, tag_no_case("ncols")),
                value(HeaderKey::NRows, tag_no_case("nrows")),
                value(HeaderKey::XllCorner, tag_no_case("xllcorner")),
                value(HeaderKey::YllCorner, tag_no_case("yllcorner")),
                value(HeaderKey::CellSize, tag_no_case("cellsize")),
            )),
            peek(alt((space1, eof))),
        ),
    )(input)
}

/// A single value filling the rest of a header line.
fn header_value<'a, O, P>(parser: P) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    P: Parser<&'a str, O, nom::error::Error<&'a str>>,
{
    all_consuming(delimited(space0, parser, space0))
}

fn sample(input: &str) -> IResult<&str, i32> {
    map_parser(is_not(" \t\r"), all_consuming(i32_parser))(input)
}

fn data_row(input: &str) -> IResult<&str, Vec<i32>> {
    preceded(space0, separated_list0(space1, sample))(input)
}

fn parse_header<I>(lines: &mut I) -> Result<GridHeader>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    let mut cols: Option<usize> = None;
    let mut rows: Option<usize> = None;
    let mut x_ll: Option<f64> = None;
    let mut y_ll: Option<f64> = None;
    let mut cell_size: Option<f64> = None;

    for line in lines.by_ref().take(HEADER_LINES) {
        // Unknown keywords such as NODATA_value are ignored
        let Ok((rest, key)) = header_key(line.as_ref()) else {
            continue;
        };

        match key {
            HeaderKey::NCols => cols = Some(parse_count(key, rest)?),
            HeaderKey::NRows => rows = Some(parse_count(key, rest)?),
            HeaderKey::XllCorner => x_ll = Some(parse_float(key, rest)?),
            HeaderKey::YllCorner => y_ll = Some(parse_float(key, rest)?),
            HeaderKey::CellSize => cell_size = Some(parse_float(key, rest)?),
        }
    }

    let header = GridHeader {
        cols: cols.ok_or(GridError::MissingHeader { key: "ncols" })?,
        rows: rows.ok_or(GridError::MissingHeader { key: "nrows" })?,
        x_ll: x_ll.ok_or(GridError::MissingHeader { key: "xllcorner" })?,
        y_ll: y_ll.ok_or(GridError::MissingHeader { key: "yllcorner" })?,
        cell_size: cell_size.ok_or(GridError::MissingHeader { key: "cellsize" })?,
    };

    if header.cols == 0 {
        return Err(invalid("ncols", header.cols));
    }
    if header.rows == 0 {
        return Err(invalid("nrows", header.rows));
    }
    if header.rows.checked_mul(header.cols).is_none() {
        return Err(invalid(
            "nrows",
            format!("{} (x {} columns overflows)", header.rows, header.cols),
        ));
    }
    if !header.x_ll.is_finite() {
        return Err(invalid("xllcorner", header.x_ll));
    }
    if !header.y_ll.is_finite() {
        return Err(invalid("yllcorner", header.y_ll));
    }
    if !(header.cell_size.is_finite() && header.cell_size > 0.0) {
        return Err(invalid("cellsize", header.cell_size));
    }

    Ok(header)
}

fn parse_count(key: HeaderKey, rest: &str) -> Result<usize> {
    header_value(u32_parser)(rest)
        .ok()
        .and_then(|(_, v)| usize::try_from(v).ok())
        .ok_or_else(|| invalid(key.name(), rest.trim()))
}

fn parse_float(key: HeaderKey, rest: &str) -> Result<f64> {
    header_value(double)(rest)
        .map(|(_, v)| v)
        .map_err(|_| invalid(key.name(), rest.trim()))
}

fn invalid(key: &'static str, value: impl ToString) -> GridError {
    GridError::InvalidHeader {
        key,
        value: value.to_string(),
    }
}

fn parse_row(line: &str, row: usize, cols: usize, out: &mut Vec<i32>) -> Result<()> {
    let (rest, samples) = data_row(line).map_err(|_| GridError::InvalidSample {
        row,
        token: line.trim().to_string(),
    })?;

    // The list stops at the first token that is not an integer
    let rest = rest.trim_start();
    if !rest.is_empty() {
        let token = is_not::<_, _, nom::error::Error<&str>>(" \t\r")(rest)
            .map(|(_, token)| token)
            .unwrap_or(rest);
        return Err(GridError::InvalidSample {
            row,
            token: token.to_string(),
        });
    }

    if samples.len() != cols {
        return Err(GridError::RowLength {
            row,
            expected: cols,
            found: samples.len(),
        });
    }

    out.extend_from_slice(&samples);
    Ok(())
}
