// src/net/client.rs

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::ProtocolError;
use crate::model::{StoreId, VehicleId};
use crate::net::protocol::{Request, Response};

/// Blocking client for the query protocol. One request, one response,
/// newline-delimited JSON.
pub struct DeliveryClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl DeliveryClient {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, ProtocolError> {
        let stream = TcpStream::connect(addr)?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            reader,
            writer: stream,
        })
    }

    pub fn send(&mut self, request: &Request) -> Result<Response, ProtocolError> {
        let mut payload = serde_json::to_vec(request)?;
        payload.push(b'\n');
        self.writer.write_all(&payload)?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(ProtocolError::ConnectionClosed);
        }
        Ok(serde_json::from_str(&line)?)
    }

    pub fn get_store_status(&mut self, store_id: StoreId) -> Result<Response, ProtocolError> {
        self.send(&Request::GetStoreStatus { store_id })
    }

    pub fn get_vehicle_status(
        &mut self,
        vehicle_id: VehicleId,
    ) -> Result<Response, ProtocolError> {
        self.send(&Request::GetVehicleStatus { vehicle_id })
    }
}
