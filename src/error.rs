use std::path::PathBuf;

use thiserror::Error;



# [ derive (Debug, Error) ]
/// Failures that prevent the settings file from being read at all (partial parse issues are only logged)
pub enum SettingsError {

    #[error ("no writeable location found for the settings file")]
    NoWritableLocation,

    #[error ("settings file {path:?} could not be accessed: {source}")]
    Io {
        path   : PathBuf,
        #[source]
        source : std::io::Error,
    },
}


# [ derive (Debug, Clone, PartialEq, Eq, Error) ]
pub enum HotkeyError {

    #[error ("hotkey {binding} (id {id}) was refused by the OS: {reason}")]
    Rejected {
        id      : i32,
        binding : String,
        reason  : String,
    },
}
