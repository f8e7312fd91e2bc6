//! Library surface of the nodecycle binary: the cluster simulation
//! used by `rehearse` and by the integration tests.

pub mod sim;
