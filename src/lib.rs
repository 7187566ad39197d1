//! Binary-side glue for the CycleCloud bootstrap: argument parsing,
//! configuration, tracing and dependency wiring.

pub mod bootstrap;
