//! SQL schema for the phanlog SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS scans (
    id              TEXT PRIMARY KEY,
    site            TEXT NOT NULL,   -- 'NS' | 'WS' | 'SH' | 'UI' | 'UC' | 'UM'
    day             TEXT NOT NULL,   -- ISO 8601 date; filesystem creation time
    acquisition_day TEXT             -- ISO 8601 date, NULL when not extractable
);

-- At most one conversion per scan; a conversion whose scan is not (yet)
-- known keeps a NULL scan_id.
CREATE TABLE IF NOT EXISTS conversions (
    conversion_id INTEGER PRIMARY KEY,
    scan_id       TEXT REFERENCES scans(id),
    day           TEXT NOT NULL,
    valid         INTEGER,           -- NULL = validation never ran
    UNIQUE (scan_id)
);

CREATE TABLE IF NOT EXISTS derivatives (
    id       TEXT PRIMARY KEY,
    modality TEXT NOT NULL,          -- 'anat' | 'func' | 'dwi'
    meta     TEXT NOT NULL,          -- sidecar JSON, stored verbatim
    scan_id  TEXT REFERENCES scans(id)
);

-- Slice metrics belong to exactly one functional derivative and go with it.
CREATE TABLE IF NOT EXISTS slices (
    slice_id      INTEGER PRIMARY KEY,
    derivative_id TEXT NOT NULL REFERENCES derivatives(id) ON DELETE CASCADE,
    slice         INTEGER,
    signal        REAL,
    signal_p2p    REAL,
    snr           REAL,
    ghost         REAL
);

CREATE INDEX IF NOT EXISTS derivatives_scan_idx  ON derivatives(scan_id);
CREATE INDEX IF NOT EXISTS slices_derivative_idx ON slices(derivative_id);

-- Diffusion tag views: a dwi derivative is tagged by the weighting keyword
-- embedded in its identifier. Rows matching neither keyword appear in
-- neither view (absence, not negation).
CREATE VIEW IF NOT EXISTS diffusion_low AS
SELECT
    id,
    scan_id,
    CASE WHEN id LIKE '%b1000%' THEN 'Y' ELSE 'N' END AS tagged
FROM derivatives
WHERE modality = 'dwi' AND id LIKE '%b1000%';

CREATE VIEW IF NOT EXISTS diffusion_high AS
SELECT
    id,
    scan_id,
    CASE WHEN id LIKE '%b2000%' THEN 'Y' ELSE 'N' END AS tagged
FROM derivatives
WHERE modality = 'dwi' AND id LIKE '%b2000%';

-- Consolidated status: one row per scan. Outer joins keep scans with no
-- conversion or derivatives visible as gaps instead of dropping them, and
-- the DISTINCT projections stop multiple derivatives of one modality from
-- fanning a scan into several rows.
CREATE VIEW IF NOT EXISTS status_log AS
SELECT
    s.site            AS site,
    s.acquisition_day AS date,
    s.day             AS dicom,
    c.day             AS bids,
    CASE WHEN c.valid = 1 THEN 'Y'
         WHEN c.valid = 0 THEN 'N'
         ELSE '' END  AS bids_validation,
    CASE WHEN c.valid IS NULL OR c.valid = 0 THEN ''
         WHEN anat.scan_id IS NOT NULL THEN 'Y'
         ELSE 'N' END AS anatomical,
    CASE WHEN c.valid IS NULL OR c.valid = 0 THEN ''
         WHEN dlow.scan_id IS NOT NULL THEN 'Y'
         ELSE 'N' END AS \"diffusion-low\",
    CASE WHEN c.valid IS NULL OR c.valid = 0 THEN ''
         WHEN dhigh.scan_id IS NOT NULL THEN 'Y'
         ELSE 'N' END AS \"diffusion-high\",
    CASE WHEN c.valid IS NULL OR c.valid = 0 THEN ''
         WHEN func.scan_id IS NOT NULL THEN 'Y'
         ELSE 'N' END AS functional,
    s.id              AS id
FROM scans s
LEFT JOIN conversions c ON c.scan_id = s.id
LEFT JOIN (SELECT DISTINCT scan_id FROM derivatives WHERE modality = 'anat') anat
       ON anat.scan_id = s.id
LEFT JOIN (SELECT DISTINCT scan_id FROM derivatives WHERE modality = 'func') func
       ON func.scan_id = s.id
LEFT JOIN (SELECT DISTINCT scan_id FROM diffusion_low) dlow
       ON dlow.scan_id = s.id
LEFT JOIN (SELECT DISTINCT scan_id FROM diffusion_high) dhigh
       ON dhigh.scan_id = s.id
ORDER BY s.site, s.day;

PRAGMA user_version = 1;
";
