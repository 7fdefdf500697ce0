//! Built-in simulations used by the CLI, the benches and the tests.

pub mod double_well;

pub use double_well::DoubleWell;
