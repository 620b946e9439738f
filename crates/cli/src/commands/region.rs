//! region command - List accepted S3 regions

use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use skycp_core::S3_REGIONS;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

const GCS_NOTE: &str = "gs:// addresses carry no region; the bucket's location applies";

#[derive(Debug, Serialize)]
struct RegionOutput {
    s3: &'static [&'static str],
    gcs: &'static str,
}

/// Execute the region command
pub fn execute(output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    if formatter.is_json() {
        formatter.json(&RegionOutput {
            s3: S3_REGIONS,
            gcs: GCS_NOTE,
        });
        return ExitCode::Success;
    }

    formatter.println(&region_table().to_string());
    formatter.println(GCS_NOTE);
    ExitCode::Success
}

fn region_table() -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Provider", "Region", "Address prefix"]);
    for region in S3_REGIONS {
        table.add_row(vec![
            "s3".to_string(),
            region.to_string(),
            format!("s3:{region}:"),
        ]);
    }
    table
}
