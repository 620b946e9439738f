//! cp command - Copy files to and from a bucket
//!
//! Resolves the two paths into one operation, expands it into file mappings,
//! and hands those to the transfer driver with the matching provider store.

use clap::Args;
use serde::Serialize;
use skycp_core::{
    BlobStore, Config, Direction, FileMapping, MappedFile, Provider, RemoteAddress, SkippedItem,
    TransferConfig, TransferObserver, TransferOperation, TransferSummary, TransferredItem,
    map_files, resolve,
};
use skycp_gcs::GcsStore;
use skycp_s3::S3Store;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, human_size};

const USAGE: &str = "\
You need to provide a source and a destination path.

EXAMPLES:
   skycp ./file s3:us-east-1:bucket:path/filename
   skycp ./folder/ \"s3:us-east-1:bucket:path with spaces/folder/\"
   skycp s3:eu-west-1:bucket:reports/q3.csv ./q3.csv
   skycp -p ./site/ gs://bucket/www/
   skycp gs://bucket/path/report.csv ./out/

Run `skycp region` to list the accepted S3 regions.
";

/// Copy a file or folder between the local filesystem and a bucket
#[derive(Args, Debug, Default)]
pub struct CpArgs {
    /// Source path (local path, s3:<region>:<bucket>:<key> or gs://<bucket>/<key>)
    pub source: Option<String>,

    /// Destination path (local path, s3:<region>:<bucket>:<key> or gs://<bucket>/<key>)
    pub target: Option<String>,

    /// Make uploaded files publicly readable (overrides --permission)
    #[arg(short, long)]
    pub public: bool,

    /// Storage class for uploaded files
    #[arg(long, value_name = "CLASS")]
    pub storage: Option<String>,

    /// Canned permission for uploaded files
    #[arg(long, value_name = "ACL")]
    pub permission: Option<String>,

    /// Only show what would be copied (dry run)
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct PlanOutput<'a> {
    dry_run: bool,
    direction: Direction,
    permission: &'a str,
    storage_class: &'a str,
    mappings: Vec<FileMapping>,
    skipped: Vec<SkippedItem>,
}

#[derive(Debug, Serialize)]
struct CpOutput<'a> {
    status: &'static str,
    #[serde(flatten)]
    summary: &'a TransferSummary,
    total_human: String,
}

/// Execute the cp command
pub async fn execute(
    args: CpArgs,
    file_config: &Config,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (Some(source), Some(target)) = (args.source.as_deref(), args.target.as_deref()) else {
        eprint!("{USAGE}");
        return ExitCode::UsageError;
    };

    let config = TransferConfig {
        public: args.public,
        permission: args.permission.clone(),
        storage_class: args.storage.clone(),
        ..Default::default()
    }
    .with_file_defaults(file_config);

    let operation = match resolve(source, target, &config) {
        Ok(op) => op,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    tracing::debug!(
        direction = %operation.direction,
        remote = %operation.remote,
        permission = operation.permission(),
        storage_class = operation.storage_class(),
        "Resolved copy operation"
    );

    let mappings = match map_files(&operation) {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    if args.dry_run {
        return print_plan(&operation, mappings, &formatter);
    }

    let store = connect(&operation.remote).await;
    let mut reporter = CpReporter {
        formatter: &formatter,
        remote: &operation.remote,
    };

    match skycp_core::execute(store.as_ref(), &operation, mappings, &mut reporter).await {
        Ok(summary) => print_summary(&summary, &formatter),
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from(&e)
        }
    }
}

async fn connect(remote: &RemoteAddress) -> Box<dyn BlobStore> {
    match remote.provider {
        Provider::S3 => {
            let region = remote.region.clone().unwrap_or_default();
            Box::new(S3Store::new(region).await)
        }
        Provider::Gcs => Box::new(GcsStore::new()),
    }
}

/// Display form of `remote` pointing at `key`
fn remote_target(remote: &RemoteAddress, key: &str) -> String {
    RemoteAddress {
        key: key.to_string(),
        ..remote.clone()
    }
    .to_string()
}

fn print_plan(
    operation: &TransferOperation,
    mappings: impl IntoIterator<Item = MappedFile>,
    formatter: &Formatter,
) -> ExitCode {
    let (mut planned, mut skipped) = (Vec::new(), Vec::new());
    for mapping in mappings {
        match mapping {
            Ok(mapping) => planned.push(mapping),
            Err(item) => skipped.push(item),
        }
    }

    if formatter.is_json() {
        formatter.json(&PlanOutput {
            dry_run: true,
            direction: operation.direction,
            permission: operation.permission(),
            storage_class: operation.storage_class(),
            mappings: planned,
            skipped,
        });
        return ExitCode::Success;
    }

    for mapping in &planned {
        let remote = remote_target(&operation.remote, &mapping.key);
        formatter.planned(operation.direction, &mapping.local, &remote);
    }
    for item in &skipped {
        formatter.file_skipped(item);
    }
    formatter.println(&format!(
        "permission: {}, storage class: {}",
        operation.permission(),
        operation.storage_class()
    ));
    ExitCode::Success
}

fn print_summary(summary: &TransferSummary, formatter: &Formatter) -> ExitCode {
    if formatter.is_json() {
        formatter.json(&CpOutput {
            status: if summary.skipped.is_empty() {
                "success"
            } else {
                "partial"
            },
            summary,
            total_human: human_size(summary.total_bytes),
        });
    } else {
        formatter.summary(summary);
    }
    // Skipped files do not fail the run
    ExitCode::Success
}

/// Forwards driver progress to the formatter
struct CpReporter<'a> {
    formatter: &'a Formatter,
    remote: &'a RemoteAddress,
}

impl TransferObserver for CpReporter<'_> {
    fn started(&mut self, direction: Direction, mapping: &FileMapping) {
        let remote = remote_target(self.remote, &mapping.key);
        self.formatter.file_started(direction, &mapping.local, &remote);
    }

    fn completed(&mut self, direction: Direction, item: &TransferredItem) {
        self.formatter.file_completed(direction, item);
    }

    fn skipped(&mut self, item: &SkippedItem) {
        self.formatter.file_skipped(item);
    }
}
