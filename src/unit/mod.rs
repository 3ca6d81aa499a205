pub mod fsm;
pub mod fsm_tests;
pub mod queue;

pub use fsm::UnitFsm;
pub use queue::RequestQueue;
