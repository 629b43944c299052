//! Integration tests for the clean stage
//!
//! Raw snapshots are written to temp files the way the extract stage writes
//! them, then cleaned with the house sales plan.

use house_sales_etl::etl::Transformer;
use house_sales_etl::stages::run_clean;
use house_sales_etl::storage::{Checkpoint, CsvReader, Snapshot};
use house_sales_etl::table::{ColumnType, Value};
use house_sales_etl::transform::{CleaningPlan, NUMERIC_COLUMNS};
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER: &str =
    ",Suburb,Address,Rooms,Type,Price,Date,Postcode,Bedroom2,Bathroom,Car,Landsize,YearBuilt,CouncilArea,Regionname,Propertycount";

fn write_raw(dir: &TempDir, rows: &[&str]) -> PathBuf {
    let path = dir.path().join("P2M3_data_clean.csv");
    let mut content = String::from(HEADER);
    content.push('\n');
    for (i, row) in rows.iter().enumerate() {
        content.push_str(&format!("{},{}\n", i, row));
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn melbourne_rows() -> Vec<&'static str> {
    vec![
        "Abbotsford,85 Turner St,2,h,1480000.0,3/12/2016,3067.0,2.0,1.0,1.0,202.0,1900.0,Yarra,Northern Metropolitan,4019.0",
        "Abbotsford,25 Bloomburg St,2,h,1035000.0,4/02/2016,3067.0,2.0,1.0,0.0,156.0,1900.0,Yarra,Northern Metropolitan,4019.0",
        "Abbotsford,25 Bloomburg St,2,h,1035000.0,4/02/2016,3067.0,2.0,1.0,0.0,156.0,1900.0,Yarra,Northern Metropolitan,4019.0",
        "Abbotsford,5 Charles St,3,h,1465000.0,4/03/2017,3067.0,3.0,2.0,,134.0,1900.0,Yarra,Northern Metropolitan,4019.0",
        "Airport West,154 Halsey Rd,3,t,840000.0,05/01/2020,3042.0,3.0,2.0,1.0,303.0,2009.0,Moonee Valley,Western Metropolitan,3464.0",
        "Albert Park,105 Kerferd Rd,2,h,1275000.0,07/05/2016,3206.0,2.0,1.0,0.0,120.0,1900.0,Port Phillip,Southern Metropolitan,",
        "Alphington,6 Smith St,4,h,2000000.0,08/10/2016,3078.0,4.0,2.0,4.0,835.0,1950.0,Darebin,Northern Metropolitan,2211.0",
    ]
}

fn clean(path: &PathBuf) -> Snapshot {
    let extracted = Snapshot::open(path, Checkpoint::Extracted).unwrap();
    run_clean(&extracted, &CleaningPlan::house_sales()).unwrap()
}

#[test]
fn test_cleaned_snapshot_properties() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_raw(&temp_dir, &melbourne_rows());

    let snapshot = clean(&path);
    let table = CsvReader::new(&path).read().unwrap();

    // 7 rows, one duplicate, two with a missing value
    assert_eq!(table.len(), 4);
    assert_eq!(snapshot.rows(), 4);

    let name_pattern = Regex::new(r"^[a-z_]+$").unwrap();
    for name in table.schema().names() {
        assert!(name_pattern.is_match(name), "unexpected column name {}", name);
    }
    assert_eq!(table.schema().names().next(), Some("house_id"));
    assert!(table.schema().index_of("unnamed").is_none());
    assert!(table.schema().index_of("bedroom").is_some());

    let distinct: HashSet<_> = table.rows().iter().collect();
    assert_eq!(distinct.len(), table.len());
    assert!(table.rows().iter().flatten().all(|v| !v.is_missing()));

    let ids: Vec<_> = table.column_values("house_id").unwrap().cloned().collect();
    assert_eq!(ids, (0..4).map(Value::Integer).collect::<Vec<_>>());

    for name in NUMERIC_COLUMNS {
        assert_eq!(
            table.schema().column(name).unwrap().ty,
            ColumnType::Integer,
            "{} should be an integer column",
            name
        );
    }
    assert_eq!(table.schema().column("date").unwrap().ty, ColumnType::Date);
}

#[test]
fn test_day_first_dates_and_integer_casts() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_raw(&temp_dir, &melbourne_rows());

    clean(&path);
    let table = CsvReader::new(&path).read().unwrap();
    let date = table.schema().index_of("date").unwrap();
    let bedroom = table.schema().index_of("bedroom").unwrap();
    let suburb = table.schema().index_of("suburb").unwrap();

    let airport_west = table
        .rows()
        .iter()
        .find(|row| row[suburb] == Value::Text("Airport West".into()))
        .unwrap();
    assert_eq!(airport_west[date].to_cell(), "2020-01-05");
    assert_eq!(airport_west[bedroom], Value::Integer(3));
}

#[test]
fn test_duplicate_pair_and_null_row() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_raw(&temp_dir, &melbourne_rows()[1..4]);

    let snapshot = clean(&path);
    let table = snapshot.read().unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0][0], Value::Integer(0));
    let address = table.schema().index_of("address").unwrap();
    assert_eq!(table.rows()[0][address], Value::Text("25 Bloomburg St".into()));
}

#[test]
fn test_everything_dropped_leaves_header() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_raw(&temp_dir, &melbourne_rows()[3..4]);

    let snapshot = clean(&path);
    assert_eq!(snapshot.rows(), 0);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.starts_with("house_id,suburb,address,rooms,type,price,date,"));
}

#[test]
fn test_unparsable_date_fails_without_touching_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let rows = [
        "Abbotsford,85 Turner St,2,h,1480000.0,someday,3067.0,2.0,1.0,1.0,202.0,1900.0,Yarra,Northern Metropolitan,4019.0",
    ];
    let path = write_raw(&temp_dir, &rows);
    let before = std::fs::read_to_string(&path).unwrap();

    let extracted = Snapshot::open(&path, Checkpoint::Extracted).unwrap();
    let err = run_clean(&extracted, &CleaningPlan::house_sales()).unwrap_err();

    assert!(format!("{:#}", err).contains("cannot parse 'date'"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_plan_is_a_transformer() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_raw(&temp_dir, &melbourne_rows());

    let raw = CsvReader::new(&path).read().unwrap();
    let once = CleaningPlan::house_sales().transform(raw).unwrap();
    assert_eq!(once.len(), 4);
    assert_eq!(once.schema().len(), 16);
}
