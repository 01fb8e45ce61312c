//! Storage-format table codec.
//!
//! Wiki pages keep their body as an XHTML fragment. Reading uses
//! `quick-xml` events and collects only cell text; generation uses the
//! writer API. One embedded table per page is assumed — the first one wins.

use std::io::Cursor;

use phanlog_core::report::Table;
use quick_xml::{
  Reader, Writer,
  events::{BytesEnd, BytesStart, BytesText, Event},
};

use crate::{Error, Result};

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Parse the first embedded table of a page body.
///
/// Header cells may be `<th>` or `<td>`; the first row is taken as the
/// header row. Markup nested inside a cell contributes only its text.
pub fn parse_first_table(body: &str) -> Result<Table> {
  // No reader-level text trimming: a cell's text can arrive in several
  // events split by nested markup, and trimming each piece would glue
  // words together. Cells are trimmed once, when they close.
  let mut reader = Reader::from_str(body);

  let mut table = Table::default();
  let mut in_table = false;
  let mut seen_header = false;
  let mut row: Option<Vec<String>> = None;
  let mut cell: Option<String> = None;

  loop {
    match reader.read_event() {
      Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
        b"table" if !in_table => in_table = true,
        b"tr" if in_table => row = Some(Vec::new()),
        b"td" | b"th" if row.is_some() => cell = Some(String::new()),
        _ => {}
      },
      Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
        // Self-closing cells are empty cells.
        b"td" | b"th" => {
          if let Some(cells) = row.as_mut() {
            cells.push(String::new());
          }
        }
        _ => {}
      },
      Ok(Event::End(ref e)) => match e.local_name().as_ref() {
        b"table" if in_table => break,
        b"tr" if in_table => {
          if let Some(cells) = row.take() {
            if seen_header {
              table.rows.push(cells);
            } else {
              table.headers = cells;
              seen_header = true;
            }
          }
        }
        b"td" | b"th" => {
          if let Some(text) = cell.take()
            && let Some(cells) = row.as_mut()
          {
            cells.push(text.trim().to_owned());
          }
        }
        _ => {}
      },
      Ok(Event::Text(ref t)) => {
        if let Some(cell) = cell.as_mut() {
          cell.push_str(&text_of(t));
        }
      }
      Ok(Event::Eof) => {
        if !in_table {
          return Err(Error::MissingTable);
        }
        break;
      }
      Err(e) => return Err(Error::Xml(e.to_string())),
      _ => {}
    }
  }

  Ok(table)
}

fn text_of(t: &BytesText) -> String {
  // Pages written by humans can carry HTML entities that are not valid XML
  // (&nbsp; and friends); fall back to the raw bytes for those.
  t.unescape()
    .map(|cow| cow.into_owned())
    .unwrap_or_else(|_| String::from_utf8_lossy(t.as_ref()).into_owned())
}

// ─── Generation ──────────────────────────────────────────────────────────────

/// Render a table as a storage-format fragment.
pub fn render_table(table: &Table) -> String {
  let mut writer = Writer::new(Cursor::new(Vec::new()));

  writer.write_event(Event::Start(BytesStart::new("table"))).unwrap();
  writer.write_event(Event::Start(BytesStart::new("tbody"))).unwrap();

  writer.write_event(Event::Start(BytesStart::new("tr"))).unwrap();
  for header in &table.headers {
    write_cell(&mut writer, "th", header);
  }
  writer.write_event(Event::End(BytesEnd::new("tr"))).unwrap();

  for row in &table.rows {
    writer.write_event(Event::Start(BytesStart::new("tr"))).unwrap();
    for value in row {
      write_cell(&mut writer, "td", value);
    }
    writer.write_event(Event::End(BytesEnd::new("tr"))).unwrap();
  }

  writer.write_event(Event::End(BytesEnd::new("tbody"))).unwrap();
  writer.write_event(Event::End(BytesEnd::new("table"))).unwrap();

  String::from_utf8(writer.into_inner().into_inner()).unwrap()
}

fn write_cell(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) {
  writer.write_event(Event::Start(BytesStart::new(tag))).unwrap();
  if !text.is_empty() {
    writer.write_event(Event::Text(BytesText::new(text))).unwrap();
  }
  writer.write_event(Event::End(BytesEnd::new(tag))).unwrap();
}

// ─── Splicing ────────────────────────────────────────────────────────────────

/// Replace the first embedded table of `body` with `replacement`, leaving
/// the rest of the page untouched.
pub fn splice_table(body: &str, replacement: &str) -> Result<String> {
  const CLOSE: &str = "</table>";

  let start = body.find("<table").ok_or(Error::MissingTable)?;
  let close = body[start..].find(CLOSE).ok_or(Error::MissingTable)?;
  let end = start + close + CLOSE.len();

  let mut out = String::with_capacity(body.len() + replacement.len());
  out.push_str(&body[..start]);
  out.push_str(replacement);
  out.push_str(&body[end..]);
  Ok(out)
}
