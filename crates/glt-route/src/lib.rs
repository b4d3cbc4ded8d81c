//! glt-route
//!
//! Static route overlay for the Green Line tracker: the fixed polyline
//! drawn under the moving markers plus the station list, both loaded
//! once at startup from bundled CSV files. Not per-cycle; never part of
//! the reconciliation core.
//!
//! ## CSV contracts
//!
//! Polyline — one point per line, `lat,lon`:
//!
//! ```csv
//! 42.35057,-71.13066
//! 42.35120,-71.12951
//! ```
//!
//! Stations — one station per line, `name,lat,lon`:
//!
//! ```csv
//! Boston College,42.34003,-71.16674
//! ```
//!
//! Blank lines and lines starting with `#` are skipped in both formats.
//! Unlike the per-record tolerance of the live feed, a malformed row
//! here is a structural error: the bundled files are fixed assets, so
//! the overlay either loads whole or fails at startup.

use std::fmt;
use std::path::Path;

use glt_reconcile::{MarkerKind, Position};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced by overlay CSV parsing.
#[derive(Debug)]
pub enum RouteCsvError {
    /// An I/O error opening or reading the file.
    Io(String),
    /// A row does not have the expected number of fields.
    RowShape { row: usize, raw: String },
    /// A field could not be parsed into the expected type.
    ParseField {
        row: usize,
        field: &'static str,
        raw: String,
    },
}

impl fmt::Display for RouteCsvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteCsvError::Io(msg) => write!(f, "route csv io error: {msg}"),
            RouteCsvError::RowShape { row, raw } => {
                write!(f, "route csv row {row}: unexpected shape '{raw}'")
            }
            RouteCsvError::ParseField { row, field, raw } => {
                write!(
                    f,
                    "route csv row {row}: cannot parse field '{field}' from value '{raw}'"
                )
            }
        }
    }
}

impl std::error::Error for RouteCsvError {}

// ---------------------------------------------------------------------------
// Overlay model
// ---------------------------------------------------------------------------

/// A fixed station placed once at startup. Stations are never reconciled.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Station {
    pub name: String,
    pub position: Position,
}

impl Station {
    pub fn kind(&self) -> MarkerKind {
        MarkerKind::Station
    }
}

/// Everything the surface draws exactly once.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RouteOverlay {
    pub polyline: Vec<Position>,
    pub stations: Vec<Station>,
}

impl RouteOverlay {
    pub fn is_empty(&self) -> bool {
        self.polyline.is_empty() && self.stations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load a `lat,lon` polyline CSV from `path`.
pub fn load_polyline_csv(path: &Path) -> Result<Vec<Position>, RouteCsvError> {
    let src = read_file(path)?;
    parse_polyline_str(&src)
}

/// Parse a polyline from CSV text (useful for tests and bundled assets).
pub fn parse_polyline_str(src: &str) -> Result<Vec<Position>, RouteCsvError> {
    let mut points = Vec::new();
    for (row, line) in data_rows(src) {
        let mut fields = line.split(',');
        let (Some(lat_raw), Some(lon_raw), None) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(RouteCsvError::RowShape {
                row,
                raw: line.to_string(),
            });
        };
        points.push(Position::new(
            parse_coord(row, "lat", lat_raw)?,
            parse_coord(row, "lon", lon_raw)?,
        ));
    }
    Ok(points)
}

/// Load a `name,lat,lon` station CSV from `path`.
pub fn load_stations_csv(path: &Path) -> Result<Vec<Station>, RouteCsvError> {
    let src = read_file(path)?;
    parse_stations_str(&src)
}

/// Parse stations from CSV text.
pub fn parse_stations_str(src: &str) -> Result<Vec<Station>, RouteCsvError> {
    let mut stations = Vec::new();
    for (row, line) in data_rows(src) {
        let mut fields = line.split(',');
        let (Some(name), Some(lat_raw), Some(lon_raw), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(RouteCsvError::RowShape {
                row,
                raw: line.to_string(),
            });
        };
        stations.push(Station {
            name: name.trim().to_string(),
            position: Position::new(
                parse_coord(row, "lat", lat_raw)?,
                parse_coord(row, "lon", lon_raw)?,
            ),
        });
    }
    Ok(stations)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, RouteCsvError> {
    std::fs::read_to_string(path)
        .map_err(|e| RouteCsvError::Io(format!("read '{}': {e}", path.display())))
}

/// Yield `(1-based row, trimmed line)` for every non-blank, non-comment line.
fn data_rows(src: &str) -> impl Iterator<Item = (usize, &str)> {
    src.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
}

fn parse_coord(row: usize, field: &'static str, raw: &str) -> Result<f64, RouteCsvError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| RouteCsvError::ParseField {
            row,
            field,
            raw: raw.trim().to_string(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_polyline_with_comments_and_blanks() {
        let src = "# Green Line B, westbound\n42.35057,-71.13066\n\n 42.35120 , -71.12951 \n";
        let points = parse_polyline_str(src).unwrap();
        assert_eq!(points.len(), 2);
        assert!((points[0].lat - 42.35057).abs() < 1e-9);
        assert!((points[1].lon - -71.12951).abs() < 1e-9);
    }

    #[test]
    fn polyline_row_with_wrong_field_count_is_structural_error() {
        let err = parse_polyline_str("42.35057\n").unwrap_err();
        assert!(matches!(err, RouteCsvError::RowShape { row: 1, .. }), "{err}");
    }

    #[test]
    fn polyline_bad_coordinate_reports_row_and_field() {
        let err = parse_polyline_str("42.35057,-71.13066\nnorth,-71.0\n").unwrap_err();
        match err {
            RouteCsvError::ParseField { row, field, raw } => {
                assert_eq!(row, 2);
                assert_eq!(field, "lat");
                assert_eq!(raw, "north");
            }
            other => panic!("expected ParseField, got {other}"),
        }
    }

    #[test]
    fn parses_stations() {
        let src = "Boston College,42.34003,-71.16674\nSouth Street,42.34249,-71.14599\n";
        let stations = parse_stations_str(src).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name, "Boston College");
        assert_eq!(stations[0].kind(), MarkerKind::Station);
    }

    #[test]
    fn empty_input_is_an_empty_overlay_not_an_error() {
        assert!(parse_polyline_str("").unwrap().is_empty());
        assert!(parse_stations_str("# only comments\n").unwrap().is_empty());
    }

    #[test]
    fn loads_polyline_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "42.35057,-71.13066").unwrap();
        writeln!(f, "42.35120,-71.12951").unwrap();
        let points = load_polyline_csv(f.path()).unwrap();
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_polyline_csv(Path::new("/nonexistent/route.csv")).unwrap_err();
        assert!(matches!(err, RouteCsvError::Io(_)), "{err}");
    }
}
