//! Utility functions and types

pub mod data_loader;

pub use data_loader::{column_names, column_to_array1, columns_to_array2, ColumnInfo, DataLoader, DatasetInfo};
