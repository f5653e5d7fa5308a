//! Vehicle interface adapters: mock OBD/CAN bus and violation storage.

pub mod mock_bus;
pub mod storage;

pub use mock_bus::MockVehicleBus;
pub use storage::SqliteViolationStore;
