//! Test doubles for both sides of the boundary.

mod fake_host;
mod fake_rrd;

pub use fake_host::{seq, Failure, FakeHost, FakeObject, FakeRecord};
pub use fake_rrd::{FakeRrd, RecordedCall, ScriptedSeries};
