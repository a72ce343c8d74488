pub mod config;
pub mod events;
pub mod floor;
pub mod input;
pub mod jump;
mod math;
pub mod modes;
pub mod policy;
pub mod scene;
pub mod simulator;
pub mod stance;
pub mod state;
pub mod velocity;

pub use config::{ConfigError, SimulationConfig};
pub use events::{MovementEvent, SpeedCategory};
pub use input::MoveInput;
pub use policy::{MovementPolicy, SourcePolicy};
pub use scene::{CollisionQuery, ProbeShape, RapierScene, SurfaceKind, SurfaceMaterial, SweepHit};
pub use simulator::Simulator;
pub use state::{FloorResult, MovementMode, MovementState};
