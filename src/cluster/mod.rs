mod comm;
mod distributor;
mod worker;

pub use comm::*;
pub use distributor::*;
pub use worker::*;

#[cfg(test)]
mod comm_tests;
