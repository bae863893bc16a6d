//! Server unit test suite.

mod dispatch_tests;
mod rpc_tests;
