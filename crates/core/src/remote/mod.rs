//! Remote control over OSC.
//!
//! Messages arrive on a listener thread ([`RemoteReceiver`]) and are queued
//! for the main thread, which decodes them into [`RemoteCommand`]s and runs
//! them through the same session operations as interactive edits. Anything
//! that fails to decode is logged and dropped.

mod receiver;

use std::path::PathBuf;

use rosc::{OscMessage, OscType};

pub use receiver::RemoteReceiver;

use crate::{MapError, Result, Uid, NULL_UID};

/// A decoded remote request.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCommand {
    AddQuad,
    AddTriangle,
    AddEllipse,
    /// Saves to the given path, or to the current project file.
    SaveProject(Option<PathBuf>),
    OpenProject(PathBuf),
    SetUri { paint: Uid, uri: String },
    SetRate { paint: Uid, rate: f64 },
    SetVolume { paint: Uid, volume: f64 },
    SetPlayState { paint: Uid, playing: bool },
    Play,
    Pause,
    Rewind,
    Undo,
    Redo,
}

impl RemoteCommand {
    pub fn parse(message: &OscMessage) -> Result<Self> {
        let addr = message.addr.as_str();
        let args = message.args.as_slice();
        let bad = || MapError::BadArguments {
            addr: addr.to_string(),
            typetags: typetags(args),
        };

        let command = match addr {
            "/add/quad" => no_args(args, RemoteCommand::AddQuad),
            "/add/triangle" => no_args(args, RemoteCommand::AddTriangle),
            "/add/ellipse" => no_args(args, RemoteCommand::AddEllipse),
            "/project/save" => match args {
                [] => Some(RemoteCommand::SaveProject(None)),
                [OscType::String(path)] if !path.is_empty() => {
                    Some(RemoteCommand::SaveProject(Some(PathBuf::from(path))))
                }
                _ => None,
            },
            "/project/open" => match args {
                [OscType::String(path)] if !path.is_empty() => {
                    Some(RemoteCommand::OpenProject(PathBuf::from(path)))
                }
                _ => None,
            },
            "/paint/media/uri" => match args {
                [id, OscType::String(uri)] => paint_id(id).map(|paint| RemoteCommand::SetUri {
                    paint,
                    uri: uri.clone(),
                }),
                _ => None,
            },
            "/paint/media/rate" => match args {
                [id, value] => paint_id(id)
                    .zip(number(value))
                    .map(|(paint, rate)| RemoteCommand::SetRate { paint, rate }),
                _ => None,
            },
            "/paint/media/volume" => match args {
                [id, value] => paint_id(id)
                    .zip(number(value))
                    .map(|(paint, volume)| RemoteCommand::SetVolume { paint, volume }),
                _ => None,
            },
            "/paint/media/play" => match args {
                [id] => paint_id(id).map(|paint| RemoteCommand::SetPlayState {
                    paint,
                    playing: true,
                }),
                _ => None,
            },
            "/paint/media/pause" => match args {
                [id] => paint_id(id).map(|paint| RemoteCommand::SetPlayState {
                    paint,
                    playing: false,
                }),
                _ => None,
            },
            "/paint/media/play_state" => match args {
                [id, state] => paint_id(id)
                    .zip(flag(state))
                    .map(|(paint, playing)| RemoteCommand::SetPlayState { paint, playing }),
                _ => None,
            },
            "/transport/play" => no_args(args, RemoteCommand::Play),
            "/transport/pause" => no_args(args, RemoteCommand::Pause),
            "/transport/rewind" => no_args(args, RemoteCommand::Rewind),
            "/undo" => no_args(args, RemoteCommand::Undo),
            "/redo" => no_args(args, RemoteCommand::Redo),
            _ => return Err(MapError::UnknownAddress(addr.to_string())),
        };

        command.ok_or_else(bad)
    }
}

fn no_args(args: &[OscType], command: RemoteCommand) -> Option<RemoteCommand> {
    args.is_empty().then_some(command)
}

fn paint_id(arg: &OscType) -> Option<Uid> {
    match arg {
        OscType::Int(id) => Uid::try_from(*id).ok().filter(|id| *id != NULL_UID),
        OscType::Long(id) => Uid::try_from(*id).ok().filter(|id| *id != NULL_UID),
        _ => None,
    }
}

fn number(arg: &OscType) -> Option<f64> {
    let value = match arg {
        OscType::Float(v) => f64::from(*v),
        OscType::Double(v) => *v,
        OscType::Int(v) => f64::from(*v),
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn flag(arg: &OscType) -> Option<bool> {
    match arg {
        OscType::Bool(v) => Some(*v),
        OscType::Int(v) => Some(*v != 0),
        _ => None,
    }
}

/// OSC type tag string of an argument list, e.g. `is`.
pub fn typetags(args: &[OscType]) -> String {
    args.iter()
        .map(|arg| match arg {
            OscType::Int(_) => 'i',
            OscType::Float(_) => 'f',
            OscType::String(_) => 's',
            OscType::Blob(_) => 'b',
            OscType::Time(_) => 't',
            OscType::Long(_) => 'h',
            OscType::Double(_) => 'd',
            OscType::Char(_) => 'c',
            OscType::Color(_) => 'r',
            OscType::Midi(_) => 'm',
            OscType::Bool(true) => 'T',
            OscType::Bool(false) => 'F',
            OscType::Array(_) => '[',
            OscType::Nil => 'N',
            OscType::Inf => 'I',
        })
        .collect()
}
