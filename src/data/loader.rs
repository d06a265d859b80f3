use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use bytes::Bytes;
use once_cell::sync::OnceCell;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::LoadError;
use super::model::{ColumnOrder, CoordinateDataset, CoordinateRow};
use super::source::{DataSource, DefaultFetcher, SourceFetcher};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load coordinates from a file picked by the user. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, then two numeric columns
/// * `.parquet` – first two numeric columns
pub fn load_file(path: &Path, order: ColumnOrder) -> Result<CoordinateDataset, LoadError> {
    let source = DataSource::Local(path.to_path_buf());
    let bytes = DefaultFetcher.fetch(&source)?;
    parse_source(&source, bytes, order)
}

/// Resolves the configured source (local file, else remote fallback) and
/// parses it.
#[derive(Debug, Clone)]
pub struct CoordinateLoader<F = DefaultFetcher> {
    pub local_path: PathBuf,
    pub fallback_base_url: String,
    pub column_order: ColumnOrder,
    fetcher: F,
}

impl CoordinateLoader<DefaultFetcher> {
    pub fn new(
        local_path: impl Into<PathBuf>,
        fallback_base_url: impl Into<String>,
        column_order: ColumnOrder,
    ) -> Self {
        Self::with_fetcher(local_path, fallback_base_url, column_order, DefaultFetcher)
    }
}

impl<F: SourceFetcher> CoordinateLoader<F> {
    pub fn with_fetcher(
        local_path: impl Into<PathBuf>,
        fallback_base_url: impl Into<String>,
        column_order: ColumnOrder,
        fetcher: F,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            fallback_base_url: fallback_base_url.into(),
            column_order,
            fetcher,
        }
    }

    /// Read the source exactly once and parse it. Zero rows is an error.
    pub fn load(&self) -> Result<CoordinateDataset, LoadError> {
        let source = DataSource::resolve(&self.local_path, &self.fallback_base_url);
        let bytes = self.fetcher.fetch(&source)?;
        let dataset = parse_source(&source, bytes, self.column_order)?;
        log::info!("Loaded {} coordinates from {}", dataset.len(), dataset.origin);
        Ok(dataset)
    }
}

// ---------------------------------------------------------------------------
// Process-wide cache
// ---------------------------------------------------------------------------

/// Write-once dataset cell: populated by the first successful load and
/// reused until the process exits. Failed loads are not stored.
#[derive(Debug)]
pub struct DatasetCache {
    cell: OnceCell<Arc<CoordinateDataset>>,
}

impl DatasetCache {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn get_or_load<F: SourceFetcher>(
        &self,
        loader: &CoordinateLoader<F>,
    ) -> Result<Arc<CoordinateDataset>, LoadError> {
        self.cell
            .get_or_try_init(|| loader.load().map(Arc::new))
            .cloned()
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}

/// The application's dataset, loaded once per process.
pub static DATASET: DatasetCache = DatasetCache::new();

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn parse_source(
    source: &DataSource,
    bytes: Vec<u8>,
    order: ColumnOrder,
) -> Result<CoordinateDataset, LoadError> {
    let rows = match source.extension().as_deref() {
        Some("parquet") | Some("pq") => parse_parquet(Bytes::from(bytes), order)?,
        _ => parse_csv(&bytes, order)?,
    };
    if rows.is_empty() {
        return Err(LoadError::malformed(format!("{source} contains no data rows")));
    }
    warn_if_swapped(&rows);
    Ok(CoordinateDataset::new(rows, source.to_string()))
}

/// CSV layout: one header row (skipped), then at least two columns of which
/// only the first two are read, positionally.
pub fn parse_csv(bytes: &[u8], order: ColumnOrder) -> Result<Vec<CoordinateRow>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| LoadError::malformed(format!("reading CSV header: {e}")))?
        .clone();
    let order = effective_order(headers.get(0), headers.get(1), order);

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        // +2: one-based, after the header.
        let line = row_no + 2;
        let record = result.map_err(|e| LoadError::malformed(format!("CSV line {line}: {e}")))?;
        let first = parse_cell(record.get(0), line, 0)?;
        let second = parse_cell(record.get(1), line, 1)?;
        rows.push(order.bind(first, second));
    }
    Ok(rows)
}

fn parse_cell(cell: Option<&str>, line: usize, col: usize) -> Result<f64, LoadError> {
    let text = cell.ok_or_else(|| {
        LoadError::malformed(format!("CSV line {line}: missing column {}", col + 1))
    })?;
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(LoadError::malformed(format!(
            "CSV line {line}, column {}: '{text}' is not a finite number",
            col + 1
        ))),
    }
}

/// Parquet layout: the first two numeric columns, positionally.
pub fn parse_parquet(bytes: Bytes, order: ColumnOrder) -> Result<Vec<CoordinateRow>, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)
        .map_err(|e| LoadError::malformed(format!("reading parquet metadata: {e}")))?;

    let numeric: Vec<(usize, String)> = builder
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| is_numeric(f.data_type()))
        .map(|(i, f)| (i, f.name().clone()))
        .take(2)
        .collect();
    let [(first_idx, first_name), (second_idx, second_name)] = numeric.as_slice() else {
        return Err(LoadError::malformed("parquet file needs two numeric columns"));
    };
    let (first_idx, second_idx) = (*first_idx, *second_idx);
    let order = effective_order(Some(first_name.as_str()), Some(second_name.as_str()), order);

    let reader = builder
        .build()
        .map_err(|e| LoadError::malformed(format!("building parquet reader: {e}")))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch =
            batch_result.map_err(|e| LoadError::malformed(format!("reading parquet batch: {e}")))?;
        let first = as_f64(batch.column(first_idx))?;
        let second = as_f64(batch.column(second_idx))?;
        for i in 0..batch.num_rows() {
            if first.is_null(i) || second.is_null(i) {
                return Err(LoadError::malformed(format!("parquet row {}: null coordinate", rows.len())));
            }
            let (a, b) = (first.value(i), second.value(i));
            if !a.is_finite() || !b.is_finite() {
                return Err(LoadError::malformed(format!(
                    "parquet row {}: non-finite coordinate ({a}, {b})",
                    rows.len()
                )));
            }
            rows.push(order.bind(a, b));
        }
    }
    Ok(rows)
}

fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32
    )
}

fn as_f64(col: &Arc<dyn Array>) -> Result<Float64Array, LoadError> {
    let converted = cast(col, &DataType::Float64)
        .map_err(|e| LoadError::malformed(format!("converting column to f64: {e}")))?;
    converted
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| LoadError::malformed("expected a Float64 column after cast"))
}

// ---------------------------------------------------------------------------
// Column-order checks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Lon,
    Lat,
}

fn axis_of(header: &str) -> Option<Axis> {
    match header.trim().to_ascii_lowercase().as_str() {
        "lon" | "lng" | "long" | "longitude" | "x" => Some(Axis::Lon),
        "lat" | "latitude" | "y" => Some(Axis::Lat),
        _ => None,
    }
}

/// A header naming both columns wins over the configured order.
fn effective_order(first: Option<&str>, second: Option<&str>, configured: ColumnOrder) -> ColumnOrder {
    let named = match (first.and_then(axis_of), second.and_then(axis_of)) {
        (Some(Axis::Lon), Some(Axis::Lat)) => Some(ColumnOrder::LonLat),
        (Some(Axis::Lat), Some(Axis::Lon)) => Some(ColumnOrder::LatLon),
        _ => None,
    };
    match named {
        Some(order) if order != configured => {
            log::warn!("Header names columns as {order}, overriding configured order {configured}");
            order
        }
        Some(order) => order,
        None => configured,
    }
}

fn warn_if_swapped(rows: &[CoordinateRow]) {
    let lat_out_of_range = rows.iter().any(|r| r.lat.abs() > 90.0);
    let lon_fits_lat = rows.iter().all(|r| r.lon.abs() <= 90.0);
    if lat_out_of_range && lon_fits_lat {
        log::warn!("Latitudes exceed ±90° while longitudes fit; the columns look swapped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Serves a fixed body for remote sources, counting every request.
    struct FakeFetcher {
        body: Option<&'static str>,
        requests: RefCell<Vec<DataSource>>,
    }

    impl FakeFetcher {
        fn serving(body: &'static str) -> Self {
            Self { body: Some(body), requests: RefCell::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { body: None, requests: RefCell::new(Vec::new()) }
        }
    }

    impl SourceFetcher for &FakeFetcher {
        fn fetch(&self, source: &DataSource) -> Result<Vec<u8>, LoadError> {
            self.requests.borrow_mut().push(source.clone());
            match self.body {
                Some(body) => Ok(body.as_bytes().to_vec()),
                None => Err(LoadError::unavailable(source.to_string(), "HTTP 404 Not Found")),
            }
        }
    }

    const MISSING: &str = "/no/such/dir/data.csv";

    #[test]
    fn reads_first_two_columns_and_skips_header() {
        let rows = parse_csv(b"a,b,c\n-95.0,29.0,x\n-97.0,31.0,y\n", ColumnOrder::LonLat).unwrap();
        assert_eq!(rows, vec![CoordinateRow::new(-95.0, 29.0), CoordinateRow::new(-97.0, 31.0)]);
    }

    #[test]
    fn configured_lat_lon_order_is_applied() {
        let rows = parse_csv(b"c1,c2\n29.5, -95.5\n", ColumnOrder::LatLon).unwrap();
        assert_eq!(rows, vec![CoordinateRow::new(-95.5, 29.5)]);
    }

    #[test]
    fn named_header_overrides_configuration() {
        let rows = parse_csv(b"Latitude,Longitude\n29.5,-95.5\n", ColumnOrder::LonLat).unwrap();
        assert_eq!(rows, vec![CoordinateRow::new(-95.5, 29.5)]);
    }

    #[test]
    fn non_numeric_cell_is_malformed() {
        let err = parse_csv(b"lon,lat\n-95.0,north\n", ColumnOrder::LonLat).unwrap_err();
        assert!(matches!(err, LoadError::EmptyOrMalformed(_)));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn non_finite_cells_are_malformed() {
        for body in [
            &b"lon,lat\nNaN,29.0\n-95.0,29.0\n"[..],
            &b"lon,lat\n-95.0,29.0\n-97.0,inf\n"[..],
            &b"lon,lat\n-95.0,-Infinity\n"[..],
        ] {
            let err = parse_csv(body, ColumnOrder::LonLat).unwrap_err();
            assert!(matches!(err, LoadError::EmptyOrMalformed(_)), "{err}");
        }
        let err = parse_csv(b"lon,lat\n-95.0,29.0\n-97.0,inf\n", ColumnOrder::LonLat).unwrap_err();
        assert!(err.to_string().contains("line 3, column 2"));
    }

    #[test]
    fn non_finite_parquet_value_is_malformed() {
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("lon", DataType::Float64, false),
            Field::new("lat", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![-95.0, f64::NAN])),
                Arc::new(Float64Array::from(vec![29.0, 31.0])),
            ],
        )
        .unwrap();
        let mut buffer = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buffer, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = parse_parquet(Bytes::from(buffer), ColumnOrder::LonLat).unwrap_err();
        assert!(matches!(err, LoadError::EmptyOrMalformed(_)));
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn single_column_row_is_malformed() {
        let err = parse_csv(b"lon,lat\n-95.0\n", ColumnOrder::LonLat).unwrap_err();
        assert!(matches!(err, LoadError::EmptyOrMalformed(_)));
    }

    #[test]
    fn header_only_file_is_empty() {
        let fetcher = FakeFetcher::serving("lon,lat\n");
        let loader = CoordinateLoader::with_fetcher(MISSING, "https://host/raw", ColumnOrder::LonLat, &fetcher);
        assert!(matches!(loader.load(), Err(LoadError::EmptyOrMalformed(_))));
    }

    #[test]
    fn missing_local_file_fetches_fallback_once() {
        let fetcher = FakeFetcher::serving("lon,lat\n-95.0,29.0\n-97.0,31.0\n");
        let loader = CoordinateLoader::with_fetcher(MISSING, "https://host/raw", ColumnOrder::LonLat, &fetcher);
        let dataset = loader.load().unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(
            *fetcher.requests.borrow(),
            vec![DataSource::Remote("https://host/raw/data.csv".to_string())]
        );
    }

    #[test]
    fn unreachable_fallback_is_source_unavailable() {
        let fetcher = FakeFetcher::failing();
        let loader = CoordinateLoader::with_fetcher(MISSING, "https://host/raw", ColumnOrder::LonLat, &fetcher);
        let err = loader.load().unwrap_err();
        assert!(matches!(err, LoadError::SourceUnavailable { .. }));
        assert_eq!(fetcher.requests.borrow().len(), 1);
    }

    #[test]
    fn cache_returns_same_dataset_without_rereading() {
        let fetcher = FakeFetcher::serving("lon,lat\n-95.0,29.0\n-97.0,31.0\n");
        let loader = CoordinateLoader::with_fetcher(MISSING, "https://host/raw", ColumnOrder::LonLat, &fetcher);
        let cache = DatasetCache::new();

        let first = cache.get_or_load(&loader).unwrap();
        let second = cache.get_or_load(&loader).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.requests.borrow().len(), 1);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let failing = FakeFetcher::failing();
        let cache = DatasetCache::new();
        let bad = CoordinateLoader::with_fetcher(MISSING, "https://host/raw", ColumnOrder::LonLat, &failing);
        assert!(cache.get_or_load(&bad).is_err());

        let serving = FakeFetcher::serving("lon,lat\n-95.0,29.0\n-97.0,31.0\n");
        let good = CoordinateLoader::with_fetcher(MISSING, "https://host/raw", ColumnOrder::LonLat, &serving);
        assert_eq!(cache.get_or_load(&good).unwrap().len(), 2);
    }

    #[test]
    fn load_file_reads_local_csv() {
        let path = std::env::temp_dir().join(format!("enrollment-loader-{}.csv", std::process::id()));
        std::fs::write(&path, "lon,lat\n-95.3701,29.7601\n-96.9209,32.7079\n").unwrap();
        let dataset = load_file(&path, ColumnOrder::LonLat).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[1], CoordinateRow::new(-96.9209, 32.7079));
    }

    #[test]
    fn load_file_reports_missing_file_as_unavailable() {
        let err = load_file(Path::new(MISSING), ColumnOrder::LonLat).unwrap_err();
        assert!(matches!(err, LoadError::SourceUnavailable { .. }));
    }
}
