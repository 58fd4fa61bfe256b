pub mod conformance;
pub mod contract;
pub mod markers;
pub mod perf;
