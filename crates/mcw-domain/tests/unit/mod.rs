//! Domain unit test suite.

mod ops_schema_tests;
mod work_item_serde_tests;
