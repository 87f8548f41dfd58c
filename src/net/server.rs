// src/net/server.rs
//
// Thread-per-connection TCP front end over the single-threaded
// simulation core. All tick-advancing calls are serialized through one
// mutex around "advance one tick and read state"; concurrent clients
// can never interleave two ticks or observe mid-tick state.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::thread;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::net::protocol::{Request, Response};
use crate::simulation::engine::World;

pub struct DeliveryServer {
    listener: TcpListener,
    world: Arc<Mutex<World>>,
}

impl DeliveryServer {
    pub fn bind(addr: impl ToSocketAddrs, world: Arc<Mutex<World>>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        info!(addr = %listener.local_addr()?, "query server listening");
        Ok(Self { listener, world })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the listener fails; each client gets
    /// its own thread.
    pub fn run(self) -> std::io::Result<()> {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let world = Arc::clone(&self.world);
                    thread::spawn(move || {
                        if let Err(err) = handle_client(stream, world) {
                            warn!(error = %err, "client connection ended with error");
                        }
                    });
                }
                Err(err) => warn!(error = %err, "failed to accept connection"),
            }
        }
        Ok(())
    }
}

fn handle_client(stream: TcpStream, world: Arc<Mutex<World>>) -> std::io::Result<()> {
    let peer = stream.peer_addr()?;
    debug!(%peer, "client connected");

    let reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                let mut world = match world.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                respond(&mut world, &request)
            }
            // Malformed input answers with an error and does not tick.
            Err(err) => Response::Error {
                message: format!("invalid request: {err}"),
            },
        };

        let mut payload = serde_json::to_vec(&response)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
        payload.push(b'\n');
        writer.write_all(&payload)?;
    }

    debug!(%peer, "client disconnected");
    Ok(())
}

/// The query contract: advance exactly one tick, then answer from the
/// fresh snapshot.
pub fn respond(world: &mut World, request: &Request) -> Response {
    world.step();

    match request {
        Request::GetStoreStatus { store_id } => match world.store_snapshot(*store_id) {
            Some(snapshot) => success(&snapshot),
            None => Response::Error {
                message: format!("store {store_id} not found"),
            },
        },
        Request::GetVehicleStatus { vehicle_id } => match world.vehicle_snapshot(*vehicle_id) {
            Some(snapshot) => success(&snapshot),
            None => Response::Error {
                message: format!("vehicle {vehicle_id} not found"),
            },
        },
    }
}

fn success<T: Serialize>(data: &T) -> Response {
    match serde_json::to_value(data) {
        Ok(data) => Response::Success { data },
        Err(err) => Response::Error {
            message: err.to_string(),
        },
    }
}
