//! Adapters between the outside world (CSV files, standard streams) and the
//! library's types.

pub mod csv;
