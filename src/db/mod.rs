pub mod dbtables;
