use comfy_table::{Cell, Table};

use crate::cli::{load_session, LoadArgs};
use crate::error::Result;
use crate::ledger::available_filters;

pub fn run(args: &LoadArgs) -> Result<()> {
    let session = load_session(args)?;
    if session.ledger().is_empty() {
        println!("No transactions loaded.");
        return Ok(());
    }
    let options = available_filters(session.ledger().transactions());

    let mut table = Table::new();
    table.set_header(vec!["Filter", "Key", "Rows"]);
    for opt in &options {
        table.add_row(vec![
            Cell::new(&opt.label),
            Cell::new(&opt.key),
            Cell::new(opt.count),
        ]);
    }
    println!("{table}");
    Ok(())
}
