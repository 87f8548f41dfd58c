use std::env;
use std::process;
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use depot_dispatch::io::events::EventType;
use depot_dispatch::io::{reporting, schedule};
use depot_dispatch::net::server::DeliveryServer;
use depot_dispatch::simulation::config::SimulationConfig;
use depot_dispatch::simulation::engine::World;

struct Args {
    config_path: String,
    serve_addr: Option<String>,
    ticks: usize,
    seed: u64,
}

fn parse_args() -> Result<Args, String> {
    let mut args = env::args().skip(1);
    let mut config_path = None;
    let mut serve_addr = None;
    let mut ticks = 60;
    let mut seed = 0;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--serve" => {
                serve_addr = Some(args.next().ok_or("--serve needs an address")?);
            }
            "--ticks" => {
                let value = args.next().ok_or("--ticks needs a number")?;
                ticks = value.parse().map_err(|_| format!("bad tick count: {value}"))?;
            }
            "--seed" => {
                let value = args.next().ok_or("--seed needs a number")?;
                seed = value.parse().map_err(|_| format!("bad seed: {value}"))?;
            }
            "--help" | "-h" => {
                return Err(String::new());
            }
            other if config_path.is_none() => config_path = Some(other.to_string()),
            other => return Err(format!("unexpected argument: {other}")),
        }
    }

    Ok(Args {
        config_path: config_path.ok_or("missing configuration file path")?,
        serve_addr,
        ticks,
        seed,
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("error: {message}");
            }
            eprintln!(
                "usage: depot-dispatch <config.json> [--serve ADDR] [--ticks N] [--seed S]"
            );
            process::exit(if message.is_empty() { 0 } else { 2 });
        }
    };

    // 1. LOAD CONFIGURATION
    let config = match SimulationConfig::load(&args.config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            process::exit(1);
        }
    };

    // 2. BUILD THE WORLD
    let mut world = match World::new(config, args.seed) {
        Ok(world) => world,
        Err(err) => {
            eprintln!("failed to initialize: {err}");
            process::exit(1);
        }
    };

    // 3. SCHEDULE PREVIEW
    let slots = schedule::generate_schedule(&world.stores, &world.routes);
    if let Err(err) = schedule::write_schedule("delivery_schedule.csv", &slots) {
        eprintln!("warning: could not write schedule preview: {err}");
    }

    // 4. SERVE OR RUN
    match args.serve_addr {
        Some(addr) => {
            let world = Arc::new(Mutex::new(world));
            let server = match DeliveryServer::bind(addr.as_str(), world) {
                Ok(server) => server,
                Err(err) => {
                    eprintln!("failed to bind {addr}: {err}");
                    process::exit(1);
                }
            };
            if let Err(err) = server.run() {
                eprintln!("server error: {err}");
                process::exit(1);
            }
        }
        None => {
            println!("Running {} ticks...", args.ticks);
            world.run(args.ticks);

            // 5. EXPORT RESULTS
            let output_file = "delivery_events.csv";
            match reporting::write_event_log(output_file, &world.events) {
                Ok(()) => println!("Event log written to ./{output_file}"),
                Err(err) => eprintln!("Error writing CSV: {err}"),
            }

            // 6. PRINT SUMMARY
            println!("\n=== Delivery Summary ===");
            for (label, event_type) in [
                ("Orders received", EventType::OrderReceived),
                ("Orders deferred", EventType::OrderDeferred),
                ("Dispatches", EventType::Dispatched),
                ("Deliveries accepted", EventType::DeliveryAccepted),
                ("Deliveries rejected", EventType::DeliveryRejected),
                ("Vehicle returns", EventType::VehicleReturned),
                ("Warehouse restocks", EventType::Restock),
            ] {
                println!("{label}: {}", world.events.count_of(event_type));
            }
            println!("\nSimulation complete at {}.", world.clock.now().hhmm());
        }
    }
}
