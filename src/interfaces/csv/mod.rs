pub mod line_item_reader;
pub mod order_writer;
