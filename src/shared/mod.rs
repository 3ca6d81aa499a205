pub mod macros;
pub mod structs;

pub use structs::CallError;
pub use structs::Direction;
pub use structs::HallCallOutcome;
pub use structs::HallDirection;
pub use structs::Request;
pub use structs::RequestOrigin;
pub use structs::StateEvent;
pub use structs::UnitId;
pub use structs::UnitSnapshot;
pub use structs::UnitState;
