use anyhow::Result;
use clap::Parser;
use glam::Vec3;
use strafe::{
    MoveInput, MovementEvent, MovementState, RapierScene, SimulationConfig, Simulator,
    SurfaceKind, SurfaceMaterial,
};

#[derive(Parser)]
#[command(name = "strafe-demo")]
#[command(about = "Scripted run of the strafe movement simulator")]
struct Args {
    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(short, long, default_value_t = 10.0, help = "Simulated seconds")]
    seconds: f32,

    #[arg(long, help = "Hold sprint for the whole run")]
    sprint: bool,

    #[arg(long, help = "Hold jump for the whole run (auto-bhop)")]
    bhop: bool,

    #[arg(long, default_value_t = 30, help = "Print position every N ticks")]
    showpos_interval: u32,
}

/// Flat ground, a steppable ledge and a launch ramp.
fn build_course() -> RapierScene {
    let mut scene = RapierScene::new();
    let concrete = SurfaceMaterial {
        friction: 0.8,
        kind: SurfaceKind::Concrete,
    };
    let metal = SurfaceMaterial {
        friction: 0.4,
        kind: SurfaceKind::Metal,
    };

    scene.add_ground(0.0, 10_000.0, concrete);
    scene.add_box(
        Vec3::new(600.0, 0.0, 15.0),
        Vec3::new(100.0, 300.0, 15.0),
        concrete,
    );
    scene.add_ramp(
        Vec3::new(1400.0, 0.0, 60.0),
        Vec3::new(250.0, 300.0, 20.0),
        -0.35,
        metal,
    );
    scene.commit();
    scene
}

fn script(args: &Args, tick: u32, tick_rate: u32) -> MoveInput {
    let mut input = MoveInput::new();
    input.wish_dir = Vec3::X;
    input.view_forward = Vec3::X;
    input.set(MoveInput::FLAG_SPRINT, args.sprint);
    input.set(MoveInput::FLAG_JUMP, args.bhop);
    // Duck through the second half of every fourth second.
    let phase = tick % (tick_rate * 4);
    input.set(MoveInput::FLAG_CROUCH, !args.bhop && phase > tick_rate * 3);
    input
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = SimulationConfig::default();
    config.validate()?;

    let scene = build_course();
    let mut sim = Simulator::new(config.clone());
    let mut state = MovementState::new(
        &config,
        Vec3::new(0.0, 0.0, config.capsule_half_height + 10.0),
    );

    let dt = 1.0 / args.tick_rate as f32;
    let ticks = (args.seconds * args.tick_rate as f32) as u32;
    log::info!("running {ticks} ticks at {} Hz", args.tick_rate);

    for tick in 0..ticks {
        let input = script(&args, tick, args.tick_rate);
        sim.tick(&mut state, &input, &scene, dt);

        for event in sim.drain_events() {
            match event {
                MovementEvent::Footstep {
                    surface,
                    category,
                    left,
                    ..
                } => {
                    let foot = if left { "L" } else { "R" };
                    log::debug!("footstep {foot} {category:?} on {surface:?}");
                }
                MovementEvent::Jumped { surface } => log::info!("jumped off {surface:?}"),
                MovementEvent::Landed {
                    surface,
                    impact_speed,
                } => log::info!("landed on {surface:?} at {impact_speed:.1} u/s"),
                MovementEvent::ModeChanged { from, to } => {
                    log::debug!("mode {from:?} -> {to:?}");
                }
            }
        }

        if tick % args.showpos_interval == 0 {
            println!(
                "pos: {:8.2} {:8.2} {:8.2}  vel: {:7.2}  mode: {:?}{}",
                state.position.x,
                state.position.y,
                state.position.z,
                state.horizontal_speed(),
                state.mode,
                if state.crouched { " (crouched)" } else { "" },
            );
        }
    }

    println!(
        "final: x={:.2} z={:.2} speed={:.2}",
        state.position.x,
        state.position.z,
        state.horizontal_speed()
    );
    Ok(())
}
