//! Bulk transport emulation
//!
//! Frames MTP containers over TCP and drives the responder. The real
//! transport is a USB bulk endpoint pair; this driver keeps the same
//! container discipline (command, data, response containers with the
//! 12-byte generic header) so the responder core cannot tell the
//! difference. Exactly one initiator is served at a time: the protocol has
//! no concurrent sessions.

use log::{debug, error, info, warn};
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::config::ResponderConfig;
use crate::protocol::{
    CommandBlock, ContainerHeader, ContainerType, ResponseCode, CONTAINER_HEADER_LEN,
};
use crate::responder::{Effect, MtpResponder};

/// Event container code the initiator uses to cancel the transfer in
/// progress, standing in for the USB cancel control request.
const EVENT_CANCEL_TRANSACTION: u16 = 0x4001;

pub struct Server {
    listener: TcpListener,
    config: ResponderConfig,
}

impl Server {
    pub async fn new(config: ResponderConfig) -> Self {
        let socket = config.control_socket();
        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Responder bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                panic!("Responder startup failed on socket {}: {}", socket, e);
            }
        };

        if let Err(e) = std::fs::create_dir_all(&config.storage_root) {
            warn!("Failed to create storage root directory: {}", e);
        } else {
            info!("Storage root directory: {}", config.storage_root);
        }

        Self { listener, config }
    }

    pub async fn start(&self) {
        info!("Starting MTP responder on {}", self.config.control_socket());

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("Initiator connected: {}", addr);
                    if let Err(e) = serve_initiator(stream, self.config.clone()).await {
                        warn!("Session with {} ended: {}", addr, e);
                    }
                    info!("Initiator {} disconnected", addr);
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Runs one initiator's command loop until it disconnects. A fresh
/// responder is built per connection, so every connection starts with a
/// closed session, the way a replugged USB device would.
async fn serve_initiator(mut stream: TcpStream, config: ResponderConfig) -> io::Result<()> {
    let payload_capacity = config.io_buffer_size - CONTAINER_HEADER_LEN;
    let mut responder = MtpResponder::new(config);

    loop {
        let header = match read_header(&mut stream).await? {
            Some(header) => header,
            None => return Ok(()),
        };

        match ContainerType::from_u16(header.container_type) {
            Some(ContainerType::Command) => {}
            Some(ContainerType::Event) => {
                if header.code == EVENT_CANCEL_TRANSACTION {
                    debug!("Cancel event received, aborting active transfer");
                    responder.cancel();
                } else {
                    warn!("Ignoring event container {:#06x}", header.code);
                }
                continue;
            }
            _ => {
                warn!(
                    "Unexpected container type {}, dropping connection",
                    header.container_type
                );
                return Ok(());
            }
        }

        let param_len = (header.total_len as usize).saturating_sub(CONTAINER_HEADER_LEN);
        let mut raw_params = vec![0u8; param_len];
        stream.read_exact(&mut raw_params).await?;
        let params: Vec<u32> = raw_params
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let command = CommandBlock {
            code: header.code,
            transaction_id: header.transaction_id,
            params,
        };
        let mut effect = responder.command(command);
        let mut total_xferred: u64 = 0;

        // Apply effects until the operation reaches its final response.
        loop {
            match effect {
                Effect::SendDataAndRespond { payload } => {
                    write_data_container(&mut stream, &header, &payload, None).await?;
                    write_response(&mut stream, ResponseCode::Ok, header.transaction_id, &[])
                        .await?;
                    break;
                }
                Effect::SendData {
                    payload,
                    declared_total,
                } => {
                    write_data_container(&mut stream, &header, &payload, Some(declared_total))
                        .await?;
                    total_xferred = (CONTAINER_HEADER_LEN + payload.len()) as u64;
                    effect = responder.data(&[], total_xferred);
                }
                Effect::SendChunk { payload } => {
                    stream.write_all(&payload).await?;
                    total_xferred += payload.len() as u64;
                    effect = responder.data(&[], total_xferred);
                }
                Effect::ReceiveData => {
                    effect =
                        receive_data_phase(&mut stream, &mut responder, payload_capacity).await?;
                }
                Effect::Respond { code, params } => {
                    write_response(&mut stream, code, header.transaction_id, &params).await?;
                    break;
                }
            }
        }
    }
}

/// Reads one inbound data container and feeds its payload to the responder
/// in buffer-sized slices. Returns the first effect that is not a further
/// reception request, or the last effect once the container is drained.
async fn receive_data_phase(
    stream: &mut TcpStream,
    responder: &mut MtpResponder,
    payload_capacity: usize,
) -> io::Result<Effect> {
    let header = match read_header(stream).await? {
        Some(header) => header,
        None => {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Initiator disconnected during data phase",
            ));
        }
    };
    if ContainerType::from_u16(header.container_type) != Some(ContainerType::Data) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "Expected a data container",
        ));
    }

    let mut remaining = (header.total_len as usize).saturating_sub(CONTAINER_HEADER_LEN);
    let mut total_xferred = CONTAINER_HEADER_LEN as u64;

    if remaining == 0 {
        return Ok(responder.data(&[], total_xferred));
    }

    loop {
        let chunk_len = remaining.min(payload_capacity);
        let mut chunk = vec![0u8; chunk_len];
        stream.read_exact(&mut chunk).await?;
        remaining -= chunk_len;
        total_xferred += chunk_len as u64;

        let effect = responder.data(&chunk, total_xferred);
        if remaining == 0 {
            return Ok(effect);
        }
        if !matches!(effect, Effect::ReceiveData) {
            return Ok(effect);
        }
    }
}

/// Reads a container header; `None` when the initiator closed the
/// connection cleanly between containers.
async fn read_header(stream: &mut TcpStream) -> io::Result<Option<ContainerHeader>> {
    let mut raw = [0u8; CONTAINER_HEADER_LEN];
    match stream.read_exact(&mut raw).await {
        Ok(_) => Ok(Some(ContainerHeader::parse(&raw))),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e),
    }
}

/// Writes a data container. When `declared_total` is set, the header length
/// declares the full logical payload even though only a prefix follows now;
/// the rest goes out as raw continuation chunks.
async fn write_data_container(
    stream: &mut TcpStream,
    command_header: &ContainerHeader,
    payload: &[u8],
    declared_total: Option<u64>,
) -> io::Result<()> {
    let logical_len = declared_total.unwrap_or(payload.len() as u64);
    let header = ContainerHeader {
        total_len: (CONTAINER_HEADER_LEN as u64 + logical_len) as u32,
        container_type: ContainerType::Data.as_u16(),
        code: command_header.code,
        transaction_id: command_header.transaction_id,
    };
    stream.write_all(&header.encode()).await?;
    stream.write_all(payload).await?;
    Ok(())
}

async fn write_response(
    stream: &mut TcpStream,
    code: ResponseCode,
    transaction_id: u32,
    params: &[u32],
) -> io::Result<()> {
    let header = ContainerHeader {
        total_len: (CONTAINER_HEADER_LEN + params.len() * 4) as u32,
        container_type: ContainerType::Response.as_u16(),
        code: code.as_u16(),
        transaction_id,
    };
    stream.write_all(&header.encode()).await?;
    for param in params {
        stream.write_all(&param.to_le_bytes()).await?;
    }
    stream.flush().await?;
    Ok(())
}
