//! Turns raw CSV records into the scaled numeric matrix the classifier
//! consumes. Fitting learns the column order, label vocabulary and scaling
//! ranges from training data; transforming replays those decisions on new
//! records so inference input always lines up with what the network saw.

mod artifacts;
mod scale;
mod table;

pub use artifacts::{ArtifactBundle, LabelCodec};
pub use scale::MinMaxScaler;
pub use table::RecordTable;

use crate::error::{Error, Result};
use crate::schema::{self, FeatureVector};
use ndarray::Array2;

/// Output of fitting the preprocessing stage on a labelled training table.
#[derive(Debug)]
pub struct FitOutput {
    /// Scaled feature matrix, rows in file order.
    pub matrix: Array2<f32>,
    /// Encoded class index per row, aligned with `matrix`.
    pub class_indices: Vec<u32>,
    /// The artifacts needed to repeat this transform at inference time.
    pub bundle: ArtifactBundle,
}

/// Transform a record table with previously fitted artifacts.
///
/// The label column, if present, is ignored. Extra columns the bundle does
/// not know are dropped; columns the bundle expects but the table lacks are
/// zero-filled. Non-numeric cells in an expected column are a hard error.
pub fn transform(table: &RecordTable, bundle: &ArtifactBundle) -> Result<Array2<f32>> {
    let label_col = table.column_index(bundle.labels.label_column());
    let nrows = table.row_count();

    let mut parsed: Vec<(String, Vec<f32>)> = Vec::new();
    for (idx, header) in table.headers().iter().enumerate() {
        if Some(idx) == label_col {
            continue;
        }
        match parse_column(header, &table.column(idx)) {
            Ok(values) => parsed.push((header.clone(), values)),
            Err(err) => {
                if expected_column(bundle, header) {
                    return Err(err);
                }
                tracing::debug!(column = %header, "dropping unparseable extra column");
            }
        }
    }

    let mut matrix = Array2::<f32>::zeros((nrows, bundle.columns.len()));
    for (j, name) in bundle.columns.iter().enumerate() {
        if let Some((_, values)) = parsed
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
        {
            for (i, &v) in values.iter().enumerate() {
                matrix[(i, j)] = v;
            }
        }
    }

    bundle.scaler.apply(&mut matrix);
    Ok(matrix)
}

/// Fit scaler, label codec and column order on a labelled training table.
///
/// The label column must exist; every other column must parse, since a
/// training file with junk columns would bake garbage into the artifacts.
/// Column order is taken from the file.
pub fn fit(table: &RecordTable, label_column: &str) -> Result<FitOutput> {
    let label_idx = table.column_index(label_column).ok_or_else(|| {
        Error::DataFormat(format!("label column {label_column} not found"))
    })?;

    let label_cells = table.column(label_idx);
    let labels = LabelCodec::fit(label_column, &label_cells);

    let mut class_indices = Vec::with_capacity(label_cells.len());
    for cell in &label_cells {
        // fit() just saw every label, so encode cannot miss
        match labels.encode(cell.trim()) {
            Some(i) => class_indices.push(i),
            None => {
                return Err(Error::DataFormat(format!(
                    "label {cell:?} missing from fitted vocabulary"
                )))
            }
        }
    }

    let mut columns = Vec::new();
    let mut parsed_columns: Vec<Vec<f32>> = Vec::new();
    for (idx, header) in table.headers().iter().enumerate() {
        if idx == label_idx {
            continue;
        }
        parsed_columns.push(parse_column(header, &table.column(idx))?);
        columns.push(header.clone());
    }

    let nrows = table.row_count();
    let mut matrix = Array2::<f32>::zeros((nrows, columns.len()));
    for (j, values) in parsed_columns.iter().enumerate() {
        for (i, &v) in values.iter().enumerate() {
            matrix[(i, j)] = v;
        }
    }

    let scaler = MinMaxScaler::fit(&matrix);
    scaler.apply(&mut matrix);

    let bundle = ArtifactBundle {
        scaler,
        labels,
        columns,
    };

    Ok(FitOutput {
        matrix,
        class_indices,
        bundle,
    })
}

/// Transform a single schema-ordered feature vector into a one-row matrix
/// in the bundle's column order. Fields the bundle never saw are skipped;
/// bundle columns outside the schema stay zero.
pub fn transform_vector(vector: &FeatureVector, bundle: &ArtifactBundle) -> Result<Array2<f32>> {
    let mut matrix = Array2::<f32>::zeros((1, bundle.columns.len()));
    for (j, name) in bundle.columns.iter().enumerate() {
        if let Some(v) = vector.get(&name.to_ascii_lowercase()) {
            matrix[(0, j)] = v;
        }
    }
    bundle.scaler.apply(&mut matrix);
    Ok(matrix)
}

fn expected_column(bundle: &ArtifactBundle, header: &str) -> bool {
    bundle
        .columns
        .iter()
        .any(|c| c.eq_ignore_ascii_case(header))
}

/// Parse one column to f32. Categorical fields fall back to their code
/// tables when the cell is not already numeric; empty cells read as 0.
fn parse_column(header: &str, cells: &[&str]) -> Result<Vec<f32>> {
    let field = header.to_ascii_lowercase();
    let mut out = Vec::with_capacity(cells.len());
    for (i, cell) in cells.iter().enumerate() {
        let trimmed = cell.trim();
        let value = if let Some(code) = schema::categorical_code(&field, trimmed) {
            code
        } else if trimmed.is_empty() {
            0.0
        } else {
            trimmed.parse::<f32>().map_err(|_| {
                Error::DataFormat(format!(
                    "column {header} row {} is not numeric: {trimmed:?}",
                    i + 1
                ))
            })?
        };
        out.push(value);
    }
    Ok(out)
}
