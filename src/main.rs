use anyhow::{Context, Result};
use clap::Parser;

use preempt_sim::simulation::{RouteId, SimWorld};

/// Tick length while an emergency episode is active
const ACTIVE_TICK_SECS: f32 = 1.0;

/// Tick length while the network idles
const IDLE_TICK_SECS: f32 = 2.0;

#[derive(Parser)]
#[command(name = "preempt_sim")]
#[command(about = "Emergency signal-preemption simulation with a console dashboard")]
struct Cli {
    /// Emergency route to dispatch (exact catalog name; defaults to the first route)
    #[arg(long)]
    route: Option<String>,

    /// Seed the RNG for reproducible post-episode vehicle reseeding
    #[arg(long)]
    seed: Option<u64>,

    /// Idle ticks to run before dispatching the ambulance
    #[arg(long, default_value = "2")]
    warmup_ticks: u32,

    /// Maximum ticks to run after dispatch
    #[arg(long, default_value = "60")]
    max_ticks: u32,

    /// List available routes and exit
    #[arg(long)]
    list_routes: bool,

    /// Sleep between ticks so the dashboard plays out in real time
    #[arg(long)]
    watch: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut world = match cli.seed {
        Some(seed) => SimWorld::create_delhi_world_with_seed(seed),
        None => SimWorld::create_delhi_world(),
    };

    if cli.list_routes {
        println!("Available emergency routes:");
        for route in world.routes_in_order() {
            println!(
                "  {} ({} -> {}, {}, priority: {})",
                route.name, route.hospital, route.destination, route.eta, route.priority
            );
        }
        return Ok(());
    }

    let route_id = match &cli.route {
        Some(name) => world
            .find_route_by_name(name)
            .with_context(|| format!("Unknown route '{}'; try --list-routes", name))?,
        None => world
            .route_ids()
            .first()
            .copied()
            .context("Route catalog is empty")?,
    };

    run_headless(&mut world, route_id, cli.warmup_ticks, cli.max_ticks, cli.watch)
}

/// Run the dashboard loop in the console
fn run_headless(
    world: &mut SimWorld,
    route_id: RouteId,
    warmup_ticks: u32,
    max_ticks: u32,
    watch: bool,
) -> Result<()> {
    println!("Running emergency-preemption simulation...");
    println!();

    // Let the network idle briefly before the emergency call comes in
    for _ in 0..warmup_ticks {
        world.tick(IDLE_TICK_SECS);
    }

    println!("State before dispatch:");
    world.print_summary();
    world.draw_map();

    world.start_episode(route_id)?;

    let mut tick = 0;
    while tick < max_ticks {
        // The external cadence is faster while an emergency is running
        let delta_secs = if world.episode.is_active() {
            ACTIVE_TICK_SECS
        } else {
            IDLE_TICK_SECS
        };

        let snapshot = world.tick(delta_secs);
        tick += 1;

        println!(
            "--- Tick {} ({:.1}s simulated time) ---",
            tick, world.time
        );
        world.print_summary();
        world.draw_map();

        if !snapshot.active {
            break;
        }

        if watch {
            std::thread::sleep(std::time::Duration::from_secs_f32(delta_secs));
        }
    }

    println!("=== Final State ===");
    world.print_summary();
    world.draw_map();

    Ok(())
}
