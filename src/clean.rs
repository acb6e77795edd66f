//! Gate the merged table on complete records.

use crate::models::{Field, Record};
use crate::table::MergedTable;
use log::debug;

/// Keep rows where every field in `required` has a value. Order is preserved and the
/// input table is left as is.
pub fn clean(table: &MergedTable, required: &[Field]) -> MergedTable {
    let out = table.filter(|r| is_complete(r, required));
    if out.len() != table.len() {
        debug!(
            "dropped {} of {} rows missing one of {:?}",
            table.len() - out.len(),
            table.len(),
            required
        );
    }
    out
}

/// [`clean`] over [`Field::ANALYTICAL`]; every analysis consumer expects this.
pub fn clean_analytical(table: &MergedTable) -> MergedTable {
    clean(table, &Field::ANALYTICAL)
}

pub fn is_complete(record: &Record, required: &[Field]) -> bool {
    required.iter().all(|f| record.has(*f))
}
