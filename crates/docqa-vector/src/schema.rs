use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const TABLE_NAME: &str = "chunks";

/// One row per chunk. `ordinal` is the ingestion position, used to order
/// equidistant hits deterministically.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("text", DataType::Utf8, false),
		Field::new("source_path", DataType::Utf8, false),
		Field::new("page_number", DataType::Int32, true),
		Field::new("chunk_index", DataType::Int32, false),
		Field::new("ocr", DataType::Boolean, true),
		Field::new("ordinal", DataType::Int32, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
