use crate::domain::order::LineItem;
use crate::error::{OrderError, Result};
use std::io::Read;

/// Reads order line items from a CSV source with a `name,unit_price,quantity` header.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<LineItem>`.
/// It handles whitespace trimming automatically, and every decoded line is validated.
pub struct LineItemReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> LineItemReader<R> {
    /// Creates a new `LineItemReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads, deserializes and validates line items.
    pub fn line_items(self) -> impl Iterator<Item = Result<LineItem>> {
        self.reader.into_deserialize().map(|result| {
            let item: LineItem = result.map_err(OrderError::from)?;
            item.validate()?;
            Ok(item)
        })
    }

    /// Reads every line item, failing on the first bad line.
    pub fn read_all(self) -> Result<Vec<LineItem>> {
        self.line_items().collect()
    }
}
