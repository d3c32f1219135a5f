pub mod form_reader;
pub mod result_writer;
