//! Responder core
//!
//! Owns all session-scoped state: the handle table, the session controller,
//! the transfer engine and the command in flight. The transport driver
//! feeds command and data events in; each event yields exactly one effect.
//! The responder runs on a single logical thread and is only ever re-entered
//! between phases, never concurrently.

use log::{debug, warn};

use crate::config::ResponderConfig;
use crate::protocol::{CommandBlock, DeviceIdentity, ResponseCode, CONTAINER_HEADER_LEN};
use crate::responder::effect::{Effect, Phase};
use crate::responder::handlers;
use crate::session::SessionController;
use crate::handles::HandleTable;
use crate::storage::{StorageDescriptor, Volume};
use crate::transfer::TransferEngine;

pub struct MtpResponder {
    pub(crate) config: ResponderConfig,
    pub(crate) identity: DeviceIdentity,
    pub(crate) descriptor: StorageDescriptor,
    pub(crate) volume: Volume,
    pub(crate) session: SessionController,
    pub(crate) table: HandleTable,
    pub(crate) engine: TransferEngine,
    in_flight: Option<CommandBlock>,
}

impl MtpResponder {
    pub fn new(config: ResponderConfig) -> Self {
        let identity = DeviceIdentity {
            manufacturer: config.manufacturer.clone(),
            model: config.model.clone(),
            device_version: config.device_version.clone(),
            serial: config.serial_number(),
            friendly_name: config.friendly_name.clone(),
        };
        let descriptor = StorageDescriptor::new(
            config.storage_description.clone(),
            config.volume_identifier.clone(),
        );
        let volume = Volume::new(config.storage_root_path(), config.storage_capacity_bytes);
        let table = HandleTable::new(config.handle_capacity);

        Self {
            identity,
            descriptor,
            volume,
            session: SessionController::new(),
            table,
            engine: TransferEngine::new(),
            in_flight: None,
            config,
        }
    }

    /// Payload bytes that fit in one container next to the header.
    pub(crate) fn payload_capacity(&self) -> usize {
        self.config.io_buffer_size - CONTAINER_HEADER_LEN
    }

    /// Number of live handle table entries. Exposed for inspection.
    pub fn object_count(&self) -> usize {
        self.table.count()
    }

    /// Command phase entry point.
    pub fn command(&mut self, command: CommandBlock) -> Effect {
        debug!(
            "Command {:#06x}, tx {}, params {:?}",
            command.code, command.transaction_id, command.params
        );
        self.in_flight = Some(command.clone());
        self.run(&command, Phase::Command, &[], 0)
    }

    /// Data phase entry point. `total_xferred` is the cumulative byte count
    /// the transport has moved for the current data phase, header included.
    pub fn data(&mut self, payload: &[u8], total_xferred: u64) -> Effect {
        let command = match self.in_flight.clone() {
            Some(command) => command,
            None => {
                warn!("Data phase event with no command in flight");
                return Effect::respond(ResponseCode::GeneralError);
            }
        };
        self.run(&command, Phase::Data, payload, total_xferred)
    }

    /// Cancel/reset control request: drops whatever stream is open, without
    /// flushing and without retracting a partially created table entry.
    pub fn cancel(&mut self) {
        self.engine.abort();
        self.in_flight = None;
    }

    fn run(
        &mut self,
        command: &CommandBlock,
        phase: Phase,
        payload: &[u8],
        total_xferred: u64,
    ) -> Effect {
        let effect = handlers::dispatch(self, command, phase, payload, total_xferred)
            .unwrap_or_else(|e| {
                warn!("Operation {:#06x} failed: {}", command.code, e);
                Effect::respond(e.response_code())
            });
        if effect.is_final() {
            self.in_flight = None;
        }
        effect
    }
}
