//! Unit tests for site extraction, tri-state flags, and reconciliation.

use chrono::NaiveDate;

use crate::{
  Error,
  report::{REPORT_COLUMNS, Table, NotesTable, reconcile},
  scan::{Scan, Site},
  status::{Flag, StatusRow},
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn row(id: &str, site: Site, date: Option<NaiveDate>) -> StatusRow {
  StatusRow {
    site,
    date,
    dicom: day(2024, 1, 1),
    bids: None,
    bids_validation: Flag::Blank,
    anatomical: Flag::Blank,
    diffusion_low: Flag::Blank,
    diffusion_high: Flag::Blank,
    functional: Flag::Blank,
    id: id.to_owned(),
  }
}

fn notes(pairs: &[(&str, &str)]) -> NotesTable {
  pairs
    .iter()
    .map(|(id, n)| (id.to_string(), n.to_string()))
    .collect()
}

// ─── Site extraction ─────────────────────────────────────────────────────────

#[test]
fn extract_recognises_every_code() {
  for site in Site::ALL {
    let id = format!("{}0001QC", site.code());
    assert_eq!(Site::extract(&id).unwrap(), site);
  }
}

#[test]
fn extract_is_case_insensitive() {
  assert_eq!(Site::extract("ns0001QC").unwrap(), Site::Ns);
  assert_eq!(Site::extract("Ns0001QC").unwrap(), Site::Ns);
  assert_eq!(Site::extract("nS0001QC").unwrap(), Site::Ns);
}

#[test]
fn extract_finds_embedded_code() {
  // Code does not have to be a prefix.
  assert_eq!(Site::extract("phantom-uc-20240101").unwrap(), Site::Uc);
}

#[test]
fn extract_takes_leftmost_match() {
  // "um" appears before "ws"; the leftmost code wins.
  assert_eq!(Site::extract("um-then-ws").unwrap(), Site::Um);
}

#[test]
fn extract_rejects_unknown_identifier() {
  let err = Site::extract("12345QC").unwrap_err();
  assert!(matches!(err, Error::UnrecognizedSite(_)));
}

#[test]
fn extract_rejects_short_identifier() {
  assert!(Site::extract("x").is_err());
  assert!(Site::extract("").is_err());
}

#[test]
fn site_code_roundtrip() {
  for site in Site::ALL {
    assert_eq!(Site::from_code(site.code()), Some(site));
  }
  assert_eq!(Site::from_code("XX"), None);
}

#[test]
fn scan_new_derives_site() {
  let scan = Scan::new("WS0002QC", day(2024, 2, 1), None).unwrap();
  assert_eq!(scan.site, Site::Ws);
  assert_eq!(scan.id, "WS0002QC");

  assert!(Scan::new("0002QC", day(2024, 2, 1), None).is_err());
}

// ─── Flags ───────────────────────────────────────────────────────────────────

#[test]
fn flag_from_valid() {
  assert_eq!(Flag::from_valid(Some(true)), Flag::Yes);
  assert_eq!(Flag::from_valid(Some(false)), Flag::No);
  assert_eq!(Flag::from_valid(None), Flag::Blank);
}

#[test]
fn flag_gated_blanks_unless_validated() {
  // Derivative presence is only meaningful once validation passed.
  assert_eq!(Flag::gated(Flag::Yes, true), Flag::Yes);
  assert_eq!(Flag::gated(Flag::Yes, false), Flag::No);
  assert_eq!(Flag::gated(Flag::No, true), Flag::Blank);
  assert_eq!(Flag::gated(Flag::No, false), Flag::Blank);
  assert_eq!(Flag::gated(Flag::Blank, true), Flag::Blank);
  assert_eq!(Flag::gated(Flag::Blank, false), Flag::Blank);
}

#[test]
fn flag_symbol_roundtrip() {
  for flag in [Flag::Blank, Flag::Yes, Flag::No] {
    assert_eq!(Flag::from_symbol(flag.as_str()), Some(flag));
  }
  assert_eq!(Flag::from_symbol("maybe"), None);
}

// ─── Notes projection ────────────────────────────────────────────────────────

#[test]
fn project_notes_by_id() {
  let table = Table {
    headers: vec!["site".into(), "id".into(), "notes".into()],
    rows: vec![
      vec!["NS".into(), "NS0001QC".into(), "re-scan requested".into()],
      vec!["WS".into(), "WS0002QC".into(), "".into()],
    ],
  };
  let notes = table.project_notes().unwrap();
  assert_eq!(notes.get("NS0001QC"), Some("re-scan requested"));
  assert_eq!(notes.get("WS0002QC"), Some(""));
  assert_eq!(notes.get("UC0003QC"), None);
}

#[test]
fn project_notes_requires_id_column() {
  let table = Table {
    headers: vec!["site".into(), "notes".into()],
    rows: vec![],
  };
  let err = table.project_notes().unwrap_err();
  assert!(matches!(err, Error::MissingColumn("id")));
}

#[test]
fn project_notes_requires_notes_column() {
  let table = Table {
    headers: vec!["site".into(), "id".into()],
    rows: vec![],
  };
  let err = table.project_notes().unwrap_err();
  assert!(matches!(err, Error::MissingColumn("notes")));
}

#[test]
fn project_notes_tolerates_ragged_rows() {
  let table = Table {
    headers: vec!["id".into(), "notes".into()],
    rows: vec![vec!["NS0001QC".into()]],
  };
  let notes = table.project_notes().unwrap();
  assert_eq!(notes.get("NS0001QC"), Some(""));
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

#[test]
fn reconcile_carries_notes_over_new_completeness() {
  // The old table annotated UC0003QC; the recomputed view has fresh flags.
  let mut new_row = row("UC0003QC", Site::Uc, Some(day(2024, 3, 1)));
  new_row.bids_validation = Flag::Yes;
  new_row.anatomical = Flag::Yes;
  new_row.functional = Flag::No;

  let report = reconcile(
    vec![new_row],
    &notes(&[("UC0003QC", "re-scan requested")]),
  );

  assert_eq!(report.rows.len(), 1);
  assert_eq!(report.rows[0].notes, "re-scan requested");
  assert_eq!(report.rows[0].status.anatomical, Flag::Yes);
  assert_eq!(report.rows[0].status.functional, Flag::No);
}

#[test]
fn reconcile_drops_rows_absent_from_new() {
  let report = reconcile(
    vec![row("NS0001QC", Site::Ns, None)],
    &notes(&[("GONE99", "x"), ("NS0001QC", "keep me")]),
  );

  assert_eq!(report.rows.len(), 1);
  assert_eq!(report.rows[0].status.id, "NS0001QC");
  assert_eq!(report.rows[0].notes, "keep me");
}

#[test]
fn reconcile_keeps_unannotated_rows_blank() {
  let report = reconcile(vec![row("NS0001QC", Site::Ns, None)], &notes(&[]));
  assert_eq!(report.rows[0].notes, "");
}

#[test]
fn reconcile_is_idempotent() {
  let new = vec![
    row("NS0001QC", Site::Ns, Some(day(2024, 1, 2))),
    row("WS0002QC", Site::Ws, Some(day(2024, 1, 3))),
  ];
  let old = notes(&[("NS0001QC", "check ghosting")]);

  let first = reconcile(new.clone(), &old);
  let republished = first.to_table().project_notes().unwrap();
  let second = reconcile(new, &republished);

  assert_eq!(first.to_table(), second.to_table());
}

#[test]
fn reconcile_sorts_by_site_then_date() {
  let report = reconcile(
    vec![
      row("WS0009QC", Site::Ws, Some(day(2024, 1, 1))),
      row("NS0002QC", Site::Ns, Some(day(2024, 2, 1))),
      row("NS0001QC", Site::Ns, Some(day(2024, 1, 1))),
    ],
    &notes(&[]),
  );

  let ids: Vec<_> = report.rows.iter().map(|r| r.status.id.as_str()).collect();
  assert_eq!(ids, ["NS0001QC", "NS0002QC", "WS0009QC"]);
}

#[test]
fn reconcile_sorts_undated_rows_last_within_site() {
  let report = reconcile(
    vec![
      row("NS0003QC", Site::Ns, None),
      row("NS0001QC", Site::Ns, Some(day(2024, 1, 1))),
    ],
    &notes(&[]),
  );

  let ids: Vec<_> = report.rows.iter().map(|r| r.status.id.as_str()).collect();
  assert_eq!(ids, ["NS0001QC", "NS0003QC"]);
}

#[test]
fn reconcile_sort_is_stable_on_ties() {
  // Same site and date: input order is preserved.
  let report = reconcile(
    vec![
      row("NS0001QC", Site::Ns, Some(day(2024, 1, 1))),
      row("NS0002QC", Site::Ns, Some(day(2024, 1, 1))),
      row("NS0003QC", Site::Ns, Some(day(2024, 1, 1))),
    ],
    &notes(&[]),
  );

  let ids: Vec<_> = report.rows.iter().map(|r| r.status.id.as_str()).collect();
  assert_eq!(ids, ["NS0001QC", "NS0002QC", "NS0003QC"]);
}

// ─── Rendering ───────────────────────────────────────────────────────────────

#[test]
fn report_table_has_published_column_order() {
  let report = reconcile(vec![row("NS0001QC", Site::Ns, None)], &notes(&[]));
  let table = report.to_table();
  assert_eq!(table.headers, REPORT_COLUMNS);
}

#[test]
fn report_table_formats_dates_and_blanks() {
  let mut r = row("SH0004QC", Site::Sh, Some(day(2024, 3, 5)));
  r.bids = Some(day(2024, 3, 7));
  r.bids_validation = Flag::Yes;
  r.anatomical = Flag::No;

  let report = reconcile(vec![r], &notes(&[]));
  let table = report.to_table();

  let cells = &table.rows[0];
  assert_eq!(cells[0], "SH");
  assert_eq!(cells[1], "24-03-05");
  assert_eq!(cells[2], "24-01-01");
  assert_eq!(cells[3], "24-03-07");
  assert_eq!(cells[4], "Y");
  assert_eq!(cells[5], "N");
  // Ungated columns stay blank, never "null".
  assert_eq!(cells[6], "");
  assert_eq!(cells[9], "SH0004QC");
  assert_eq!(cells[10], "");
}
