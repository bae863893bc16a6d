//! Application unit test suite.

mod memory_tests;
mod port_mock_tests;
mod search_tests;
mod sync_tests;
mod test_support;
mod work_item_graph_tests;
