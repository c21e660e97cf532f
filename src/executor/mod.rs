//! Case execution
//!
//! [`TestContext`] and the assertion helpers cases are written with, and
//! the sequential [`SuiteRunner`].

mod context;
mod runner;

pub use context::{
    expect, expect_format, expect_one_of, expect_status, fixture, CallbackEvent,
    RunSettings, TestContext, TestFailure,
};
pub use runner::SuiteRunner;
