use std::path::{Path, PathBuf};

use aircode::dataset::FeatureRecord;
use aircode::ml::logreg::TrainOptions;

/// Flight-code prefixes per aircraft type. 737 prefixes all trip the
/// built-in special marker.
const FLEET: &[(&str, &[&str])] = &[
    ("737", &["B738", "QF73H", "VA73H"]),
    ("320", &["A320", "JQ320", "TT320"]),
    ("788", &["B788", "NZ788", "QF788"]),
];

/// `per_prefix` rows per prefix, with numeric suffixes starting at `offset`
/// so training and evaluation sets can be disjoint.
pub fn fleet_records(per_prefix: usize, offset: usize) -> Vec<FeatureRecord> {
    let mut rows = Vec::new();
    for idx in 0..per_prefix {
        for (label, prefixes) in FLEET {
            for prefix in *prefixes {
                rows.push(FeatureRecord::new(
                    format!("{prefix}-{:03}", offset + idx),
                    *label,
                ));
            }
        }
    }
    rows
}

/// Options that converge on the fleet fixtures.
pub fn quick_train_options() -> TrainOptions {
    TrainOptions {
        epochs: 40,
        batch_size: 8,
        ..TrainOptions::default()
    }
}

/// Write a `FlightCode,IATACode` CSV.
pub fn write_csv(dir: &Path, name: &str, rows: &[FeatureRecord]) -> PathBuf {
    let path = dir.join(name);
    let mut text = String::from("FlightCode,IATACode\n");
    for row in rows {
        text.push_str(&format!("{},{}\n", row.flight_code, row.true_label));
    }
    std::fs::write(&path, text).expect("write csv fixture");
    path
}
