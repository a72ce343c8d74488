use serde::{Deserialize, Serialize};

use crate::scene::SurfaceKind;
use crate::state::MovementMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedCategory {
    Walk,
    Sprint,
}

/// Outbound hooks for audio and higher layers. The simulator pushes these
/// into its queue at well-defined points; it never waits on a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementEvent {
    Footstep {
        surface: SurfaceKind,
        category: SpeedCategory,
        /// Alternates every step; true is the left foot.
        left: bool,
        crouched: bool,
    },
    Jumped {
        surface: SurfaceKind,
    },
    Landed {
        surface: SurfaceKind,
        /// Downward speed at impact, positive.
        impact_speed: f32,
    },
    ModeChanged {
        from: MovementMode,
        to: MovementMode,
    },
}
