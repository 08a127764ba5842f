//! Chunked transfer engine
//!
//! Bridges the fixed-size protocol buffer to arbitrarily large files. Each
//! streaming operation is a two-phase state machine re-entered once per
//! transport event: the command phase opens the stream and declares the
//! total length, every data phase moves one bounded chunk. At most one
//! transfer is outstanding at a time. The protocol serializes commands, so
//! overlapping logical transfers cannot arise from a well-behaved host; the
//! engine does not defend against them beyond logging.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use log::{debug, info, warn};

use crate::error::TransferError;
use crate::protocol::CONTAINER_HEADER_LEN;

struct Outbound {
    handle: u32,
    file: File,
    total: u64,
}

struct Staged {
    handle: u32,
    file: File,
    expected: u64,
}

struct Inbound {
    handle: u32,
    file: File,
    expected: u64,
}

enum ActiveTransfer {
    /// Streaming an object out to the host.
    Outbound(Outbound),
    /// Created by SendObjectInfo, waiting for the SendObject operation.
    Staged(Staged),
    /// Absorbing SendObject payload.
    Inbound(Inbound),
}

impl ActiveTransfer {
    fn handle(&self) -> u32 {
        match self {
            ActiveTransfer::Outbound(t) => t.handle,
            ActiveTransfer::Staged(t) => t.handle,
            ActiveTransfer::Inbound(t) => t.handle,
        }
    }
}

/// What an outbound data-phase step produced.
pub enum OutboundStep {
    Chunk(Vec<u8>),
    Done,
}

/// What an inbound data-phase step wants next.
pub enum InboundStep {
    NeedMore,
    Done,
}

#[derive(Default)]
pub struct TransferEngine {
    active: Option<ActiveTransfer>,
}

impl TransferEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    /// Command phase of an outbound transfer: captures the total size via a
    /// seek to the end and fills the first chunk. The caller reports `total`
    /// to the transport up front even though only this prefix is attached,
    /// so the transport knows how many follow-up phases to expect.
    pub fn begin_outbound(
        &mut self,
        handle: u32,
        mut file: File,
        payload_capacity: usize,
    ) -> Result<(u64, Vec<u8>), TransferError> {
        if let Some(stale) = &self.active {
            warn!(
                "Starting transfer for handle {} while handle {} is still active",
                handle,
                stale.handle()
            );
        }
        let total = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;

        let first_len = total.min(payload_capacity as u64) as usize;
        let mut chunk = vec![0u8; first_len];
        file.read_exact(&mut chunk)?;

        info!("Outbound transfer started: handle {}, {} bytes", handle, total);
        self.active = Some(ActiveTransfer::Outbound(Outbound { handle, file, total }));
        Ok((total, chunk))
    }

    /// Data phase of an outbound transfer. `total_xferred` counts header
    /// plus payload bytes the transport has moved so far; the next file
    /// offset is that figure minus the header size.
    pub fn advance_outbound(
        &mut self,
        total_xferred: u64,
        payload_capacity: usize,
    ) -> Result<OutboundStep, TransferError> {
        let transfer = match self.active.as_mut() {
            Some(ActiveTransfer::Outbound(t)) => t,
            // the final chunk already closed the stream
            None => return Ok(OutboundStep::Done),
            Some(_) => return Err(TransferError::NoOutboundTransfer),
        };

        let offset = total_xferred.saturating_sub(CONTAINER_HEADER_LEN as u64);
        let remaining = transfer.total.saturating_sub(offset);
        if remaining == 0 {
            let handle = transfer.handle;
            self.active = None;
            debug!("Outbound transfer complete: handle {}", handle);
            return Ok(OutboundStep::Done);
        }

        let len = remaining.min(payload_capacity as u64) as usize;
        transfer.file.seek(SeekFrom::Start(offset))?;
        let mut chunk = vec![0u8; len];
        transfer.file.read_exact(&mut chunk)?;

        if offset + len as u64 >= transfer.total {
            let handle = transfer.handle;
            self.active = None;
            debug!("Outbound transfer complete: handle {}", handle);
        }
        Ok(OutboundStep::Chunk(chunk))
    }

    /// Parks a freshly created object until the SendObject operation
    /// arrives. `expected` is the size the descriptor declared.
    pub fn stage_inbound(&mut self, handle: u32, file: File, expected: u64) {
        if let Some(stale) = &self.active {
            warn!(
                "Staging handle {} replaces still-active handle {}",
                handle,
                stale.handle()
            );
        }
        debug!("Staged inbound transfer: handle {}, {} bytes expected", handle, expected);
        self.active = Some(ActiveTransfer::Staged(Staged { handle, file, expected }));
    }

    /// SendObject command phase: arms the staged transfer for reception and
    /// returns the expected payload length.
    pub fn start_inbound(&mut self) -> Result<u64, TransferError> {
        match self.active.take() {
            Some(ActiveTransfer::Staged(staged)) => {
                let expected = staged.expected;
                self.active = Some(ActiveTransfer::Inbound(Inbound {
                    handle: staged.handle,
                    file: staged.file,
                    expected,
                }));
                Ok(expected)
            }
            other => {
                self.active = other;
                Err(TransferError::NothingStaged)
            }
        }
    }

    /// Appends one received chunk. Reception continues until the payload
    /// moved so far (header excluded) reaches the expected size.
    pub fn absorb(&mut self, payload: &[u8], total_xferred: u64) -> Result<InboundStep, TransferError> {
        let transfer = match self.active.as_mut() {
            Some(ActiveTransfer::Inbound(t)) => t,
            _ => return Err(TransferError::NothingStaged),
        };

        transfer.file.write_all(payload)?;
        let received = total_xferred.saturating_sub(CONTAINER_HEADER_LEN as u64);
        if received < transfer.expected {
            debug!(
                "Inbound transfer: handle {}, {} of {} bytes received",
                transfer.handle, received, transfer.expected
            );
            return Ok(InboundStep::NeedMore);
        }

        transfer.file.flush()?;
        let handle = transfer.handle;
        self.active = None;
        debug!("Inbound transfer complete: handle {}", handle);
        Ok(InboundStep::Done)
    }

    /// Closes whatever stream is open, immediately. Partially written bytes
    /// stay on disk and the table entry is not retracted.
    pub fn abort(&mut self) {
        if let Some(transfer) = self.active.take() {
            info!("Aborting active transfer for handle {}", transfer.handle());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn payload_cap() -> usize {
        16
    }

    fn header() -> u64 {
        CONTAINER_HEADER_LEN as u64
    }

    #[test]
    fn test_outbound_chunks_until_done() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        let content: Vec<u8> = (0..40u8).collect();
        fs::write(&path, &content).unwrap();

        let mut engine = TransferEngine::new();
        let (total, first) = engine
            .begin_outbound(5, File::open(&path).unwrap(), payload_cap())
            .unwrap();
        assert_eq!(total, 40);
        assert_eq!(first, &content[..16]);

        let mut collected = first;
        let mut xferred = header() + 16;
        loop {
            match engine.advance_outbound(xferred, payload_cap()).unwrap() {
                OutboundStep::Chunk(chunk) => {
                    xferred += chunk.len() as u64;
                    collected.extend_from_slice(&chunk);
                }
                OutboundStep::Done => break,
            }
        }
        assert_eq!(collected, content);
        assert!(engine.is_idle());
    }

    #[test]
    fn test_outbound_zero_length_completes_without_chunks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");
        fs::write(&path, b"").unwrap();

        let mut engine = TransferEngine::new();
        let (total, first) = engine
            .begin_outbound(7, File::open(&path).unwrap(), payload_cap())
            .unwrap();
        assert_eq!(total, 0);
        assert!(first.is_empty());
        assert!(matches!(
            engine.advance_outbound(header(), payload_cap()).unwrap(),
            OutboundStep::Done
        ));
        assert!(engine.is_idle());
    }

    #[test]
    fn test_inbound_accumulates_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("up.bin");
        let content: Vec<u8> = (0..40u8).rev().collect();

        let mut engine = TransferEngine::new();
        engine.stage_inbound(3, File::create(&path).unwrap(), content.len() as u64);
        assert_eq!(engine.start_inbound().unwrap(), 40);

        let mut xferred = header();
        for chunk in content.chunks(payload_cap()) {
            xferred += chunk.len() as u64;
            let step = engine.absorb(chunk, xferred).unwrap();
            if xferred - header() < content.len() as u64 {
                assert!(matches!(step, InboundStep::NeedMore));
            } else {
                assert!(matches!(step, InboundStep::Done));
            }
        }
        assert!(engine.is_idle());
        assert_eq!(fs::read(&path).unwrap(), content);
    }

    #[test]
    fn test_start_inbound_without_staging_fails() {
        let mut engine = TransferEngine::new();
        assert!(matches!(
            engine.start_inbound(),
            Err(TransferError::NothingStaged)
        ));
    }

    #[test]
    fn test_abort_drops_stream_and_keeps_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.bin");

        let mut engine = TransferEngine::new();
        engine.stage_inbound(4, File::create(&path).unwrap(), 100);
        engine.start_inbound().unwrap();
        engine.absorb(b"partial-bytes", header() + 13).unwrap();
        engine.abort();

        assert!(engine.is_idle());
        assert_eq!(fs::read(&path).unwrap(), b"partial-bytes");
    }
}
