//! CLI unit test suite.

mod cli_tests;
