//! Per-location aggregation of the time-series records.
//!
//! Every region row is kept under its `(country, region)` pair, each country
//! gets a day-wise total over its regions, and a worldwide total is summed over
//! every row. The table is rebuilt from scratch on every download.

pub mod aggregate;
pub mod types;
pub mod utility;

pub use aggregate::aggregate_records;
pub use types::{Entry, LocationKey, LocationTable, Series};

/// Name under which the worldwide total is offered for selection.
pub const WORLDWIDE: &str = "Worldwide";

use anyhow::Result;

use crate::fetch::{HttpClient, fetch_source};
use crate::parser::parse_records;

/// Downloads (or reads) `source` and aggregates it into a fresh table.
#[tracing::instrument(skip(client))]
pub async fn load_table<C: HttpClient>(client: &C, source: &str) -> Result<LocationTable> {
    let bytes = fetch_source(client, source).await?;
    let records = parse_records(&bytes)?;
    Ok(aggregate_records(&records)?)
}
