//! Module `effect`
//!
//! A handler never touches the transport directly. Every command or
//! data-phase event produces exactly one `Effect` describing what the
//! driver must do next; the driver owns the endpoint mechanics and
//! re-enters the responder for the following phase.

use crate::protocol::ResponseCode;

/// Which stage of the current operation an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Command,
    Data,
}

/// The responder's instruction to the transport driver.
#[derive(Debug)]
pub enum Effect {
    /// Send a complete dataset payload, then an OK response. Used by the
    /// single-phase query operations.
    SendDataAndRespond { payload: Vec<u8> },
    /// First block of a streamed data phase. `declared_total` covers the
    /// full logical payload even though only the prefix that fit is
    /// attached; the transport derives the number of follow-up phases
    /// from it.
    SendData { payload: Vec<u8>, declared_total: u64 },
    /// Continuation chunk of the outbound data phase in progress.
    SendChunk { payload: Vec<u8> },
    /// Deliver (more) inbound payload to the responder.
    ReceiveData,
    /// Final response for the current operation.
    Respond {
        code: ResponseCode,
        params: Vec<u32>,
    },
}

impl Effect {
    pub fn respond(code: ResponseCode) -> Self {
        Effect::Respond {
            code,
            params: Vec::new(),
        }
    }

    pub fn respond_with(code: ResponseCode, params: Vec<u32>) -> Self {
        Effect::Respond { code, params }
    }

    /// True when this effect ends the operation.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Effect::Respond { .. } | Effect::SendDataAndRespond { .. }
        )
    }
}
