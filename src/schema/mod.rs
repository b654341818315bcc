pub mod derive;

pub use derive::{infer_arrow_dtype_from_str, is_null_token, widen, SchemaScan};
