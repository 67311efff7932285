use std::path::PathBuf;

use crate::cli::{load_session, LoadArgs};
use crate::error::Result;
use crate::export::report_file_name;
use crate::settings::{get_export_dir, shellexpand_path};
use crate::workbook::write_report;

fn output_path(output: Option<&str>) -> PathBuf {
    match output {
        Some(p) => PathBuf::from(shellexpand_path(p)),
        None => get_export_dir().join(report_file_name(chrono::Local::now().date_naive())),
    }
}

pub fn run(args: &LoadArgs, output: Option<&str>) -> Result<()> {
    let session = load_session(args)?;
    let report = session.report(&args.only)?;
    let path = output_path(output);
    write_report(&report, &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
