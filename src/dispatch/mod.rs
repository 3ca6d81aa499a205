pub mod dispatcher;
pub mod selector;

pub use dispatcher::Dispatcher;
pub use selector::NearestUnitSelector;
pub use selector::UnitSelector;
