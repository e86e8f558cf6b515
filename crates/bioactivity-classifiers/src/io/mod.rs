//! Delimited-table input and output.
pub mod tables;

pub use tables::{
    read_prediction_table, read_training_table, write_evaluation_table, write_prediction_table,
};
