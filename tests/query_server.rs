// Query-protocol round trips over a real socket: one tick per
// well-formed request, none for garbage.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};
use std::thread;

use depot_dispatch::net::client::DeliveryClient;
use depot_dispatch::net::protocol::Response;
use depot_dispatch::net::server::DeliveryServer;
use depot_dispatch::simulation::config::SimulationConfig;
use depot_dispatch::simulation::engine::World;

fn quiet_world() -> World {
    let raw = r#"{
        "warehouse": { "inventory": { "water": 100 } },
        "stores": [
            { "id": 1, "name": "Central",
              "delivery_windows": [[9, 22]],
              "product_requirements": { "water": 50 } }
        ],
        "vehicles": [ { "id": 1, "capacity": 30 } ],
        "distances": {
            "warehouse": { "Central": 5 },
            "Central": { "warehouse": 5 }
        },
        "params": { "consumption_chance": 0.0, "restock_threshold": 0 }
    }"#;
    let config = SimulationConfig::from_json(raw).unwrap();
    World::new(config, 1).unwrap()
}

fn start_server(world: Arc<Mutex<World>>) -> std::net::SocketAddr {
    let server = DeliveryServer::bind("127.0.0.1:0", world).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || {
        let _ = server.run();
    });
    addr
}

#[test]
fn store_status_round_trip() {
    let world = Arc::new(Mutex::new(quiet_world()));
    let addr = start_server(Arc::clone(&world));

    let mut client = DeliveryClient::connect(addr).unwrap();
    let response = client.get_store_status(1).unwrap();
    let Response::Success { data } = response else {
        panic!("expected success, got {response:?}");
    };
    assert_eq!(data["store_id"], 1);
    assert_eq!(data["name"], "Central");
    assert_eq!(data["requirements"]["water"], 50);
    assert_eq!(data["delivery_windows"][0][0], 9);
}

#[test]
fn vehicle_status_round_trip() {
    let world = Arc::new(Mutex::new(quiet_world()));
    let addr = start_server(Arc::clone(&world));

    let mut client = DeliveryClient::connect(addr).unwrap();
    let response = client.get_vehicle_status(1).unwrap();
    let Response::Success { data } = response else {
        panic!("expected success, got {response:?}");
    };
    assert_eq!(data["vehicle_id"], 1);
    assert_eq!(data["capacity"], 30);
    // The request itself ticked the world once, which dispatched the
    // first order toward the store.
    assert_eq!(data["status"], "en_route");
    assert_eq!(data["current_load"]["water"], 30);
}

#[test]
fn unknown_ids_answer_with_errors() {
    let world = Arc::new(Mutex::new(quiet_world()));
    let addr = start_server(Arc::clone(&world));

    let mut client = DeliveryClient::connect(addr).unwrap();
    let response = client.get_store_status(99).unwrap();
    let Response::Error { message } = response else {
        panic!("expected error");
    };
    assert!(message.contains("99"));
}

#[test]
fn each_request_advances_exactly_one_tick() {
    let world = Arc::new(Mutex::new(quiet_world()));
    let addr = start_server(Arc::clone(&world));

    let mut client = DeliveryClient::connect(addr).unwrap();
    client.get_store_status(1).unwrap();
    client.get_vehicle_status(1).unwrap();
    assert_eq!(world.lock().unwrap().clock.elapsed(), 30);

    // Malformed input answers with an error and does not tick.
    let stream = TcpStream::connect(addr).unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = stream;
    writer.write_all(b"this is not json\n").unwrap();
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    let response: Response = serde_json::from_str(&line).unwrap();
    assert!(!response.is_success());
    assert_eq!(world.lock().unwrap().clock.elapsed(), 30);
}

#[test]
fn concurrent_clients_never_interleave_ticks() {
    let world = Arc::new(Mutex::new(quiet_world()));
    let addr = start_server(Arc::clone(&world));

    let mut handles = Vec::new();
    for _ in 0..4 {
        handles.push(thread::spawn(move || {
            let mut client = DeliveryClient::connect(addr).unwrap();
            for _ in 0..5 {
                assert!(client.get_store_status(1).unwrap().is_success());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // 4 clients x 5 requests = 20 ticks, each 15 minutes.
    assert_eq!(world.lock().unwrap().clock.elapsed(), 20 * 15);
}
