use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime};
use csv::{ByteRecord, StringRecord};
use tracing::{debug, info, warn};

use crate::error::{ExploreError, ExploreResult};
use crate::models::{City, Column, ColumnSet, Dataset, TripRecord};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

pub fn resolve_path(data_dir: &Path, city: City) -> PathBuf {
    data_dir.join(city.file_name())
}

pub fn load(city: City, data_dir: &Path) -> ExploreResult<Dataset> {
    let path = resolve_path(data_dir, city);
    info!(%city, path = %path.display(), "loading trip data");
    let file = File::open(&path).map_err(|err| ExploreError::Read {
        path: path.clone(),
        source: err.into(),
    })?;
    load_from_reader(city, file).map_err(|err| match err {
        ExploreError::Read { source, .. } => ExploreError::Read { path, source },
        other => other,
    })
}

pub fn load_from_reader<R: Read>(city: City, input: R) -> ExploreResult<Dataset> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    read_dataset(city, reader)
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

struct ColumnIndex {
    start_time: usize,
    trip_duration: Option<usize>,
    start_station: Option<usize>,
    end_station: Option<usize>,
    user_type: Option<usize>,
    gender: Option<usize>,
    birth_year: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &[String]) -> ExploreResult<(Self, ColumnSet)> {
        let find = |column: Column| {
            headers
                .iter()
                .position(|header| Column::from_header(header) == Some(column))
        };
        let start_time = find(Column::StartTime)
            .ok_or(ExploreError::MissingColumn(Column::StartTime.header()))?;
        let columns = headers
            .iter()
            .filter_map(|header| Column::from_header(header))
            .collect();

        Ok((
            ColumnIndex {
                start_time,
                trip_duration: find(Column::TripDuration),
                start_station: find(Column::StartStation),
                end_station: find(Column::EndStation),
                user_type: find(Column::UserType),
                gender: find(Column::Gender),
                birth_year: find(Column::BirthYear),
            },
            columns,
        ))
    }
}

fn cell(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    let value = record.get(idx?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn number(record: &StringRecord, idx: Option<usize>) -> Option<f64> {
    cell(record, idx)?
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn read_dataset<R: Read>(city: City, mut reader: csv::Reader<R>) -> ExploreResult<Dataset> {
    let read_err = |source: csv::Error| ExploreError::Read {
        path: PathBuf::new(),
        source,
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(read_err)?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();
    let (index, columns) = ColumnIndex::from_headers(&headers)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (row, result) in reader.byte_records().enumerate() {
        let bytes: ByteRecord = result.map_err(read_err)?;
        let line = bytes.position().map(|pos| pos.line()).unwrap_or_default();
        let parsed = StringRecord::from_byte_record(bytes)
            .map_err(|err| format!("invalid utf-8: {}", err.utf8_error()))
            .and_then(|raw| {
                let value = raw.get(index.start_time).unwrap_or_default();
                match parse_timestamp(value) {
                    Some(start_time) => Ok((raw, start_time)),
                    None => Err(format!("unparsable start time {value:?}")),
                }
            });
        let (raw, start_time) = match parsed {
            Ok(parsed) => parsed,
            Err(reason) => {
                let err = ExploreError::MalformedRecord { line, reason };
                debug!(%err, "skipping record");
                skipped += 1;
                continue;
            }
        };

        records.push(TripRecord {
            row,
            start_time,
            trip_duration: number(&raw, index.trip_duration),
            start_station: cell(&raw, index.start_station),
            end_station: cell(&raw, index.end_station),
            user_type: cell(&raw, index.user_type),
            gender: cell(&raw, index.gender),
            birth_year: number(&raw, index.birth_year).map(|year| year as i32),
            month: start_time.month(),
            day_of_week: start_time.weekday(),
            raw,
        });
    }

    if skipped > 0 {
        warn!(%city, skipped, "skipped malformed records");
    }
    info!(%city, rows = records.len(), "trip data loaded");

    Ok(Dataset {
        city,
        headers,
        columns,
        records,
        skipped,
    })
}

#[cfg(test)]
pub(crate) fn dataset_from_csv(input: &str) -> Dataset {
    load_from_reader(City::Chicago, input.as_bytes()).unwrap()
}
