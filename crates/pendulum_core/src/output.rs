//! Line-oriented text format shared with the rendering tools.
//!
//! A file starts with `#key=value` comment lines describing the run, followed
//! by one line of separated numbers per sample. Other comment lines (such as
//! the trailing elapsed time) carry no data.

use crate::adaptive::{AdaptiveDomain, DataPoint};
use crate::pendulum::DoublePendulum;
use crate::uniform::{UniformDomain, UniformGrid};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::io::{Read, Write};
use std::time::Duration;

/// Lines starting with this character are comments, not data.
pub const COMMENT: char = '#';

/// Default field separator.
pub const SEPARATOR: u8 = b'\t';

/// Run parameters, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    entries: Vec<(String, String)>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Display) -> &mut Self {
        self.entries.push((key.into(), value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

fn pendulum_header(pendulum: &impl DoublePendulum) -> Header {
    let params = pendulum.params();
    let mut header = Header::new();
    header
        .push("M1", params.m1)
        .push("M2", params.m2)
        .push("L1", params.l1)
        .push("L2", params.l2)
        .push("type", pendulum.variant());
    header
}

pub fn uniform_header(
    pendulum: &impl DoublePendulum,
    domain: &UniformDomain,
    max_steps: u32,
) -> Header {
    let params = pendulum.params();
    let (width, height) = domain.dimensions();
    let mut header = pendulum_header(pendulum);
    header
        .push("ai1Min", domain.a1_min)
        .push("ai1Max", domain.a1_max)
        .push("ai2Min", domain.a2_min)
        .push("ai2Max", domain.a2_max)
        .push("gridSize", domain.cell_size)
        .push("dt", params.dt)
        .push("g", params.g)
        .push("nStepMax", max_steps)
        .push("imgSizeX", width)
        .push("imgSizeY", height)
        .push("renderType", "uniform");
    header
}

pub fn adaptive_header(
    pendulum: &impl DoublePendulum,
    domain: &AdaptiveDomain,
    max_steps: u32,
    cycles: usize,
) -> Header {
    let params = pendulum.params();
    let mut header = pendulum_header(pendulum);
    header
        .push("ai1Central", domain.center_x)
        .push("ai2Central", domain.center_y)
        .push("aiSize", domain.size)
        .push("dt", params.dt)
        .push("g", params.g)
        .push("nStepMax", max_steps)
        .push("nCycles", cycles)
        .push("renderType", "adaptive");
    header
}

pub fn write_header<W: Write>(out: &mut W, header: &Header) -> Result<()> {
    for (key, value) in header.entries() {
        writeln!(out, "{COMMENT}{key}={value}")?;
    }
    Ok(())
}

fn row_writer<W: Write>(out: W, separator: u8) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(separator)
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out)
}

/// One `col SEP row SEP value` line per cell, row-major.
pub fn write_uniform_grid<W: Write, T: Serialize>(
    out: &mut W,
    grid: &UniformGrid<T>,
    separator: u8,
) -> Result<()> {
    let mut rows = row_writer(out, separator);
    for (col, row, value) in grid.cells() {
        rows.serialize((col, row, value))?;
    }
    rows.flush()?;
    Ok(())
}

/// One `x SEP y SEP size SEP value` line per data point.
pub fn write_data_points<'a, W, I>(out: &mut W, points: I, separator: u8) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a DataPoint>,
{
    let mut rows = row_writer(out, separator);
    for point in points {
        rows.serialize((point.x, point.y, point.size, point.value))?;
    }
    rows.flush()?;
    Ok(())
}

pub fn write_values<W: Write>(out: &mut W, values: &[f64], separator: u8) -> Result<()> {
    let mut rows = row_writer(out, separator);
    rows.serialize(values)?;
    rows.flush()?;
    Ok(())
}

pub fn write_elapsed<W: Write>(out: &mut W, elapsed: Duration) -> Result<()> {
    write!(out, "{COMMENT} Elapsed time: {} s", elapsed.as_secs())?;
    Ok(())
}

/// Parsed contents of a text output file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextOutput {
    pub header: Header,
    pub rows: Vec<Vec<f64>>,
}

pub fn read_text_output<R: Read>(mut reader: R, separator: u8) -> Result<TextOutput> {
    if separator == COMMENT as u8 || separator == b'\n' {
        bail!("Separator must not be a comment or line break character.");
    }
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .context("Failed to read text output.")?;

    let mut output = TextOutput::default();
    for line in text.lines() {
        if let Some(comment) = line.trim().strip_prefix(COMMENT) {
            if let Some((key, value)) = comment.split_once('=') {
                output.header.push(key.trim(), value.trim());
            }
        }
    }

    let mut rows = csv::ReaderBuilder::new()
        .delimiter(separator)
        .has_headers(false)
        .comment(Some(COMMENT as u8))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());
    for row in rows.deserialize::<Vec<f64>>() {
        output.rows.push(row.context("Invalid data row.")?);
    }
    Ok(output)
}
