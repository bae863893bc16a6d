//! Infrastructure unit test suite.

mod config_tests;
