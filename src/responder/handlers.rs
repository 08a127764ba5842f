//! Operation handlers
//!
//! One function per supported operation, selected by an exhaustive match on
//! the operation code. Handlers return the effect the driver must apply;
//! errors are mapped onto response codes by the dispatcher.

use log::{debug, error, info};

use crate::error::{HandleError, ResponderError};
use crate::handles::PARENT_ROOT;
use crate::objects;
use crate::protocol::datasets::{
    self, ASSOCIATION_GENERIC_FOLDER, ASSOCIATION_UNDEFINED, DEV_PROP_DEVICE_FRIENDLY_NAME,
};
use crate::protocol::{
    CommandBlock, ObjectInfo, OperationCode, PayloadWriter, ResponseCode, ALL_WILDCARD,
};
use crate::responder::core::MtpResponder;
use crate::responder::effect::{Effect, Phase};
use crate::storage::SUPPORTED_STORAGE_ID;
use crate::transfer::{InboundStep, OutboundStep};

/// Routes one transport event to its operation handler.
pub(crate) fn dispatch(
    r: &mut MtpResponder,
    command: &CommandBlock,
    phase: Phase,
    payload: &[u8],
    total_xferred: u64,
) -> Result<Effect, ResponderError> {
    let op = OperationCode::from_u16(command.code)
        .ok_or(ResponderError::UnsupportedOperation(command.code))?;

    match op {
        OperationCode::GetDeviceInfo => get_device_info(r),
        OperationCode::OpenSession => open_session(r),
        OperationCode::CloseSession => close_session(r),
        OperationCode::GetStorageIds => get_storage_ids(),
        OperationCode::GetStorageInfo => get_storage_info(r, command),
        OperationCode::GetDevicePropDesc => get_device_property(r, command, true),
        OperationCode::GetDevicePropValue => get_device_property(r, command, false),
        OperationCode::GetObjectHandles => get_object_handles(r, command),
        OperationCode::GetObjectInfo => get_object_info(r, command),
        OperationCode::GetObject => get_object(r, command, phase, total_xferred),
        OperationCode::DeleteObject => delete_object(r, command),
        OperationCode::SendObjectInfo => send_object_info(r, command, phase, payload),
        OperationCode::SendObject => send_object(r, phase, payload, total_xferred),
    }
}

fn get_device_info(r: &mut MtpResponder) -> Result<Effect, ResponderError> {
    let mut w = PayloadWriter::new();
    datasets::encode_device_info(&mut w, &r.identity);
    Ok(Effect::SendDataAndRespond {
        payload: w.into_bytes(),
    })
}

fn open_session(r: &mut MtpResponder) -> Result<Effect, ResponderError> {
    r.session.open(&mut r.table, &r.volume)?;
    Ok(Effect::respond(ResponseCode::Ok))
}

fn close_session(r: &mut MtpResponder) -> Result<Effect, ResponderError> {
    r.session.close(&mut r.table)?;
    Ok(Effect::respond(ResponseCode::Ok))
}

fn get_storage_ids() -> Result<Effect, ResponderError> {
    let mut w = PayloadWriter::new();
    w.put_u32_array(&[SUPPORTED_STORAGE_ID]);
    Ok(Effect::SendDataAndRespond {
        payload: w.into_bytes(),
    })
}

fn get_storage_info(r: &mut MtpResponder, command: &CommandBlock) -> Result<Effect, ResponderError> {
    r.session.require_open()?;
    let storage_id = command.param(0).ok_or(ResponderError::InvalidParameter)?;
    if storage_id != SUPPORTED_STORAGE_ID {
        return Err(ResponderError::InvalidStorageId(storage_id));
    }

    let free_objects = (r.table.capacity() - r.table.count()) as u32;
    let info = r.descriptor.info(&r.volume, free_objects)?;
    let mut w = PayloadWriter::new();
    info.encode(&mut w);
    Ok(Effect::SendDataAndRespond {
        payload: w.into_bytes(),
    })
}

/// Serves both GetDevicePropDesc and GetDevicePropValue. The friendly name
/// is the single supported property.
fn get_device_property(
    r: &mut MtpResponder,
    command: &CommandBlock,
    describe: bool,
) -> Result<Effect, ResponderError> {
    let prop_code = command.param(0).ok_or(ResponderError::InvalidParameter)?;
    if prop_code != DEV_PROP_DEVICE_FRIENDLY_NAME as u32 {
        return Err(ResponderError::ParameterNotSupported(prop_code));
    }

    let mut w = PayloadWriter::new();
    if describe {
        datasets::encode_device_prop_desc(&mut w, &r.identity.friendly_name);
    } else {
        w.put_string(&r.identity.friendly_name);
    }
    Ok(Effect::SendDataAndRespond {
        payload: w.into_bytes(),
    })
}

fn get_object_handles(
    r: &mut MtpResponder,
    command: &CommandBlock,
) -> Result<Effect, ResponderError> {
    r.session.require_open()?;
    let storage_id = command.param(0).ok_or(ResponderError::InvalidParameter)?;
    if storage_id != ALL_WILDCARD && storage_id != SUPPORTED_STORAGE_ID {
        return Err(ResponderError::InvalidStorageId(storage_id));
    }
    // param 1 is an optional format filter, ignored here
    let parent = match command.param(2) {
        Some(ALL_WILDCARD) | None => PARENT_ROOT,
        Some(parent) => parent,
    };

    let handles = r.table.children_of(parent);
    debug!("Reporting {} objects below parent {}", handles.len(), parent);
    let mut w = PayloadWriter::new();
    w.put_u32_array(&handles);
    Ok(Effect::SendDataAndRespond {
        payload: w.into_bytes(),
    })
}

fn get_object_info(r: &mut MtpResponder, command: &CommandBlock) -> Result<Effect, ResponderError> {
    r.session.require_open()?;
    let handle = command.param(0).ok_or(ResponderError::InvalidParameter)?;
    let path = r.table.resolve_path(r.volume.root(), handle)?;
    let meta = r.volume.stat(&path).map_err(|e| {
        error!("Failed to stat handle {}: {}", handle, e);
        ResponderError::Handle(HandleError::NotFound(handle))
    })?;
    let entry = r
        .table
        .find(handle)
        .ok_or(ResponderError::Handle(HandleError::NotFound(handle)))?;

    let association = if entry.is_directory {
        ASSOCIATION_GENERIC_FOLDER
    } else {
        ASSOCIATION_UNDEFINED
    };
    let info = ObjectInfo::describe(
        SUPPORTED_STORAGE_ID,
        meta.len() as u32,
        entry.parent_handle,
        association,
        entry.name.clone(),
    );
    debug!("Reporting handle {}: {}, size={}", handle, entry.name, meta.len());

    let mut w = PayloadWriter::new();
    info.encode(&mut w);
    Ok(Effect::SendDataAndRespond {
        payload: w.into_bytes(),
    })
}

fn get_object(
    r: &mut MtpResponder,
    command: &CommandBlock,
    phase: Phase,
    total_xferred: u64,
) -> Result<Effect, ResponderError> {
    r.session.require_open()?;
    match phase {
        Phase::Command => {
            let handle = command.param(0).ok_or(ResponderError::InvalidParameter)?;
            let path = r.table.resolve_path(r.volume.root(), handle)?;
            let file = r.volume.open_read(&path).map_err(|e| {
                error!("Cannot open handle {} for reading: {}", handle, e);
                ResponderError::Handle(HandleError::NotFound(handle))
            })?;
            let capacity = r.payload_capacity();
            let (total, first) = r.engine.begin_outbound(handle, file, capacity)?;
            Ok(Effect::SendData {
                payload: first,
                declared_total: total,
            })
        }
        Phase::Data => {
            let capacity = r.payload_capacity();
            match r.engine.advance_outbound(total_xferred, capacity)? {
                OutboundStep::Chunk(payload) => Ok(Effect::SendChunk { payload }),
                OutboundStep::Done => Ok(Effect::respond(ResponseCode::Ok)),
            }
        }
    }
}

fn send_object_info(
    r: &mut MtpResponder,
    command: &CommandBlock,
    phase: Phase,
    payload: &[u8],
) -> Result<Effect, ResponderError> {
    // 1. Session and storage checks apply to both phases
    r.session.require_open()?;
    let storage_id = command.param(0).ok_or(ResponderError::InvalidParameter)?;
    if storage_id != ALL_WILDCARD && storage_id != SUPPORTED_STORAGE_ID {
        return Err(ResponderError::InvalidStorageId(storage_id));
    }
    if phase == Phase::Command {
        return Ok(Effect::ReceiveData);
    }

    // 2. Parse the descriptor the host sent
    let info = ObjectInfo::parse(payload, r.config.max_filename_length)?;
    if info.storage_id != 0 && info.storage_id != SUPPORTED_STORAGE_ID {
        return Err(ResponderError::InvalidStorageId(info.storage_id));
    }

    // 3. Resolve and validate the parent
    let parent = if info.parent_object == ALL_WILDCARD {
        PARENT_ROOT
    } else {
        info.parent_object
    };
    if parent != PARENT_ROOT {
        match r.table.find(parent) {
            Some(entry) if entry.is_directory => {}
            _ => {
                error!("Invalid parent {} for incoming object {}", parent, info.filename);
                return Err(ResponderError::Handle(HandleError::InvalidParent(parent)));
            }
        }
    }

    match info.association_type {
        // 4. Plain file: capacity checks, then create and stage for reception
        ASSOCIATION_UNDEFINED => {
            let size = info.compressed_size as u64;
            let created = objects::create_file(&mut r.table, &r.volume, parent, &info.filename, size)?;
            r.engine.stage_inbound(created.handle, created.file, size);
            Ok(Effect::respond_with(
                ResponseCode::Ok,
                vec![SUPPORTED_STORAGE_ID, parent, created.handle],
            ))
        }
        // 5. Folder: one level only, created immediately, discovered at the
        //    next session rebuild, so no handle is reported yet
        ASSOCIATION_GENERIC_FOLDER => {
            objects::create_directory(&r.volume, parent, &info.filename)?;
            Ok(Effect::respond_with(
                ResponseCode::Ok,
                vec![SUPPORTED_STORAGE_ID, PARENT_ROOT, 0],
            ))
        }
        other => {
            error!("Unsupported association type {:#06x}", other);
            Err(ResponderError::InvalidParameter)
        }
    }
}

fn send_object(
    r: &mut MtpResponder,
    phase: Phase,
    payload: &[u8],
    total_xferred: u64,
) -> Result<Effect, ResponderError> {
    match phase {
        Phase::Command => {
            let expected = r.engine.start_inbound()?;
            info!("Receiving object payload, {} bytes expected", expected);
            Ok(Effect::ReceiveData)
        }
        Phase::Data => match r.engine.absorb(payload, total_xferred)? {
            InboundStep::NeedMore => Ok(Effect::ReceiveData),
            InboundStep::Done => Ok(Effect::respond(ResponseCode::Ok)),
        },
    }
}

fn delete_object(r: &mut MtpResponder, command: &CommandBlock) -> Result<Effect, ResponderError> {
    r.session.require_open()?;
    let handle = command.param(0).ok_or(ResponderError::InvalidParameter)?;
    // param 1 is an optional format filter, ignored here
    objects::delete(&mut r.table, &r.volume, handle)?;
    Ok(Effect::respond(ResponseCode::Ok))
}
