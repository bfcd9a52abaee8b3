pub mod catalog_error;
pub mod catalog_record;
