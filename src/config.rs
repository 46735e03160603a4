#![ allow (non_snake_case, non_upper_case_globals) ]

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};

use tracing::{debug, error, info, warn};
use tracing::metadata::LevelFilter;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{Layer, Registry, reload};
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::prelude::*;

use crate::error::SettingsError;
use crate::keys::{self, Modifier, ModifierMask, VirtualKey};




/// Content written out whenever the settings file is missing (or blank)
pub const DEFAULT_SETTINGS_CONTENT : &str = "\
; Switchback Settings\r\n\
; Modifiers: ALT, CTRL, SHIFT, WIN (any combination, e.g. CTRL,ALT)\r\n\
Modifiers=ALT\r\n\
; Key: Any key name (e.g., Q, W, F1, Space, OemSemicolon, etc.), or one of these literals: ; , . / ' [ ] \\ - = `\r\n\
Key=Q\r\n\
; AlternativeKey: Optional second key using the same modifiers (ignored if it is the same as Key)\r\n\
AlternativeKey=K\r\n\
; PollIntervalMs: How often (in ms) the foreground window is sampled, default 100\r\n\
;PollIntervalMs=100\r\n\
; LogLevel: TRACE, DEBUG, INFO, WARN, ERROR or OFF, default INFO\r\n\
;LogLevel=INFO\r\n";


const KEY_MODIFIERS       : &str = "Modifiers";
const KEY_KEY             : &str = "Key";
const KEY_ALTERNATIVE_KEY : &str = "AlternativeKey";
const KEY_POLL_INTERVAL   : &str = "PollIntervalMs";
const KEY_LOG_LEVEL       : &str = "LogLevel";




# [ derive (Debug, Clone, PartialEq) ]
pub struct Settings {
    pub modifiers       : ModifierMask,
    pub key             : VirtualKey,
    pub alternative_key : Option<VirtualKey>,
    pub poll_interval   : Duration,
    pub log_level       : LevelFilter,
}

impl Default for Settings {
    fn default () -> Self {
        Settings {
            modifiers       : ModifierMask::from (Modifier::ALT),
            key             : 0x51,    // Q
            alternative_key : None,
            poll_interval   : Settings::DEFAULT_POLL_INTERVAL,
            log_level       : LevelFilter::INFO,
        }
    }
}


/// Splits ini text into name/value pairs .. blank and `;` lines are skipped, the first `=` separates, later names override earlier ones
pub fn read_ini (text:&str) -> HashMap <String, String> {
    text.lines()
        .map (|l| l.trim())
        .filter (|l| !l.is_empty() && !l.starts_with(';'))
        .filter_map (|l| l.split_once('=') .filter (|(name,_)| !name.trim().is_empty()))
        .map (|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Key values can carry an inline comment after a ` ;` marker, which we drop
fn strip_inline_comment (value:&str) -> &str {
    value.split_once(" ;") .map (|(v,_)| v) .unwrap_or(value) .trim()
}

fn parse_log_level (value:&str) -> Option<LevelFilter> {
    match value {
        "TRACE" => Some (LevelFilter::TRACE),
        "DEBUG" => Some (LevelFilter::DEBUG),
        "INFO"  => Some (LevelFilter::INFO),
        "WARN"  => Some (LevelFilter::WARN),
        "ERROR" => Some (LevelFilter::ERROR),
        "OFF"   => Some (LevelFilter::OFF),
        _       => None,
    }
}


impl Settings {

    pub const DEFAULT_POLL_INTERVAL : Duration = Duration::from_millis(100);
    const POLL_INTERVAL_RANGE_MS : std::ops::RangeInclusive<u64> = 10 ..= 10_000;


    /// Builds settings from ini text over the defaults
    pub fn parse (text:&str) -> Settings {
        Settings::parse_over (&Settings::default(), text)
    }

    /// Builds settings from ini text over a base (normally the settings currently in effect).<br>
    /// `Modifiers` and `Key` keep the base value unless their line is present (and for `Key`, parses).
    /// The optional keys fall back to their defaults when absent, and keep the base value when unparseable.
    pub fn parse_over (base:&Settings, text:&str) -> Settings {
        let entries = read_ini (text);
        let mut s = base.clone();

        if let Some(mods) = entries.get(KEY_MODIFIERS) {
            s.modifiers = keys::parse_modifiers (mods);
            info! ("Modifiers {:?} parsed as {}", mods, s.modifiers);
            if s.modifiers.is_empty() {
                warn! ("No modifiers recognized in {:?} .. hotkey will be registered on the bare key", mods);
            }
        }

        if let Some(val) = entries.get(KEY_KEY) {
            let val = strip_inline_comment (val);
            match keys::parse_key (val) {
                Some(vk) => { s.key = vk; info! ("Key {:?} parsed as {}", val, keys::key_display(vk)); }
                None     => warn! ("Could not parse Key {:?} .. keeping {}", val, keys::key_display(s.key)),
            }
        }

        if let Some(val) = entries.get(KEY_ALTERNATIVE_KEY) {
            let val = strip_inline_comment (val);
            match keys::parse_key (val) {
                Some(vk) => { s.alternative_key = Some(vk); info! ("AlternativeKey {:?} parsed as {}", val, keys::key_display(vk)); }
                None     => warn! ("Could not parse AlternativeKey {:?} .. keeping {}", val,
                                   s.alternative_key .map (keys::key_display) .unwrap_or ("disabled".into())),
            }
        } else {
            s.alternative_key = None;
        }
        if s.alternative_key == Some(s.key) {
            info! ("AlternativeKey is the same as Key ({}) .. alternative hotkey disabled", keys::key_display(s.key));
            s.alternative_key = None;
        }

        if let Some(val) = entries.get(KEY_POLL_INTERVAL) {
            match val.parse::<u64>() .ok() .filter (|ms| Self::POLL_INTERVAL_RANGE_MS.contains(ms)) {
                Some(ms) => s.poll_interval = Duration::from_millis(ms),
                None     => warn! ("Ignoring PollIntervalMs {:?} .. expected a number of ms in {:?}", val, Self::POLL_INTERVAL_RANGE_MS),
            }
        } else {
            s.poll_interval = Self::DEFAULT_POLL_INTERVAL;
        }

        if let Some(val) = entries.get(KEY_LOG_LEVEL) {
            match parse_log_level (val) {
                Some(level) => s.log_level = level,
                None        => warn! ("Ignoring unrecognized LogLevel {:?}", val),
            }
        } else {
            s.log_level = Settings::default().log_level;
        }

        entries .keys()
            .filter (|k| ![KEY_MODIFIERS, KEY_KEY, KEY_ALTERNATIVE_KEY, KEY_POLL_INTERVAL, KEY_LOG_LEVEL].contains(&k.as_str()))
            .for_each (|k| debug! ("Ignoring unknown setting {:?}", k));

        s
    }
}




# [ derive (Debug) ]
pub struct _Config {
    pub path       : Option<PathBuf>,
    pub loglevel   : RwLock <Option <Handle <LevelFilter, Registry>>>,
    pub load_error : RwLock <Option <SettingsError>>,
    log_requested  : AtomicBool,
    late_log_guard : Mutex <Option <WorkerGuard>>,
}

# [ derive (Debug, Clone) ]
pub struct Config ( Arc <_Config> );

impl Deref for Config {
    type Target = _Config;
    fn deref (&self) -> &_Config { &self.0 }
}




/// Returns the directory of the currently running executable
fn get_app_dir () -> Option<PathBuf> {
    std::env::current_exe().ok() .and_then (|p| p.parent() .map (|p| p.to_path_buf()))
}

/// Checks whether a path is writeable by the current user by attempting to open/create a file in write mode
fn is_writeable (path: &Path) -> bool {
    fs::OpenOptions::new().write(true).create(true).truncate(false).open(path).is_ok()
    // note that ^^ this is similar to 'touch' and will create an empty file if it doesnt exist (which we then treat as absent)
}




impl Config {

    pub const CONF_FILE_NAME : &'static str = "settings.ini";
    pub const APP_DIR_NAME   : &'static str = "Switchback";

    pub const SWITCHBACK_VERSION : &'static str = env!("CARGO_PKG_VERSION");


    pub fn instance () -> Config {
        static INSTANCE: OnceCell <Config> = OnceCell::new();
        INSTANCE .get_or_init ( || Config::new (Self::locate_config_file()) ) .clone()
    }

    /// Config over an explicit settings-file path (None means there is nowhere to read or write settings)
    pub fn new (path: Option<PathBuf>) -> Config {
        Config ( Arc::new ( _Config {
            path,
            loglevel   : RwLock::new (None),
            load_error : RwLock::new (None),
            log_requested  : AtomicBool::new (false),
            late_log_guard : Mutex::new (None),
        } ) )
    }


    fn locate_config_file () -> Option<PathBuf> {
        let app_dir_loc = get_app_dir() .map (|p| p.join(Self::CONF_FILE_NAME));
        if app_dir_loc.as_ref() .is_some_and (|p| is_writeable(p)) {
            return app_dir_loc
        }
        let data_dir = dirs::data_local_dir() .map (|p| p.join(Self::APP_DIR_NAME));
        if let Some(dir) = data_dir.as_ref() .filter (|d| !d.exists()) {
            let _ = fs::create_dir_all (dir);
        }
        data_dir .map (|p| p.join(Self::CONF_FILE_NAME)) .filter (|p| is_writeable(p))
    }

    pub fn get_config_file (&self) -> Option<&Path> {
        self.path.as_deref()
    }
    pub fn get_log_loc (&self) -> Option<PathBuf> {
        self.path.as_ref() .and_then (|p| p.parent()) .map (|p| p.to_path_buf())
    }



    /// Loads settings, never failing outward : on total failure we log, keep the error for the shell to report, and use defaults
    pub fn load_settings (&self) -> Settings {
        self.load_settings_over (&Settings::default())
    }

    /// Loads settings with fields that are missing or unparseable in the file keeping their value from `base`.<br>
    /// A total failure still falls back to the plain defaults.
    pub fn load_settings_over (&self, base:&Settings) -> Settings {
        match self.try_load_settings (base) {
            Ok(s) => {
                info! ("Settings loaded .. modifiers: {}, key: {}, alternative: {}", s.modifiers, keys::key_display(s.key),
                       s.alternative_key .map (keys::key_display) .unwrap_or ("disabled".into()));
                *self.load_error.write() = None;
                s
            }
            Err(e) => {
                error! ("Error loading settings: {} .. using defaults", e);
                *self.load_error.write() = Some(e);
                Settings::default()
            }
        }
    }

    fn try_load_settings (&self, base:&Settings) -> Result <Settings, SettingsError> {
        let path = self.path.as_ref() .ok_or (SettingsError::NoWritableLocation)?;
        let text = match fs::read_to_string (path) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                info! ("Settings file {:?} is empty .. writing defaults", path);
                self.write_default_settings (path)?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info! ("Settings file {:?} not found .. creating it with defaults", path);
                self.write_default_settings (path)?
            }
            Err(source) => return Err ( SettingsError::Io { path: path.clone(), source } ),
        };
        Ok ( Settings::parse_over (base, &text) )
    }

    fn write_default_settings (&self, path:&Path) -> Result <String, SettingsError> {
        fs::write (path, DEFAULT_SETTINGS_CONTENT)
            .map_err (|source| SettingsError::Io { path: path.to_path_buf(), source })?;
        Ok (DEFAULT_SETTINGS_CONTENT.to_string())
    }

    /// Takes any total-load failure recorded by the last load, so it gets reported only once
    pub fn take_load_error (&self) -> Option<SettingsError> {
        self.load_error.write().take()
    }

    /// Reads just the log level, without logging .. (used before the log subscriber exists)
    pub fn peek_log_level (&self) -> LevelFilter {
        self.path.as_ref()
            .and_then (|p| fs::read_to_string(p).ok())
            .and_then (|text| read_ini(&text).get(KEY_LOG_LEVEL) .and_then (|v| parse_log_level(v)))
            .unwrap_or (LevelFilter::INFO)
    }


    pub fn trigger_config_file_edit (&self) {
        match self.path.as_ref() {
            Some(conf_path) => {
                if let Err(e) = std::process::Command::new("notepad.exe").arg(conf_path).spawn() {
                    warn! ("Failed to open settings file {:?} in editor: {}", conf_path, e);
                }
            }
            None => warn! ("No settings file location available to open"),
        }
    }



    pub fn reload_log_level (&self, log_level:LevelFilter) {
        // if logging was requested but started disabled, this is where it gets set up
        // (the guard from main covers the initial setup, a late one is kept here till exit)
        if self.log_requested.load (Ordering::Relaxed) && self.loglevel.read().is_none() {
            if let Some(guard) = self.setup_log_subscriber (log_level) {
                *self.late_log_guard.lock() = Some(guard);
            }
        }
        info! ("Setting log-level to {:?}", log_level.into_level());
        if let Some(h) = self.loglevel.read().as_ref() {
            let _ = h.modify (|f| *f = log_level);
        }
    }

    /// Sets up the rolling-file log subscriber .. the returned guard must be held (in main) so pending logs get flushed on exit
    pub fn setup_log_subscriber (&self, log_level:LevelFilter) -> Option<WorkerGuard> {

        self.log_requested.store (true, Ordering::Relaxed);
        if log_level == LevelFilter::OFF || self.loglevel.read().is_some() {
            return None
        }
        let log_loc = self.get_log_loc()?;

        let log_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("switchback_log")
            .filename_suffix("log")
            .max_log_files(7)
            .build(log_loc);

        let log_appender = match log_appender {
            Ok(a) => a,
            Err(e) => {
                report_diagnostic (&format! ("SWITCHBACK : failed to set up log file appender : {}", e));
                return None
            }
        };

        let (nb_log_appender, guard) = non_blocking (log_appender);

        let (level_filter, filter_handle) = reload::Layer::new (log_level);

        let timer_fmt = ::time::format_description::parse (
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
        ).ok()?;

        let subscriber = tracing_subscriber::fmt::Layer::new()
            .with_writer(nb_log_appender)
            .with_timer(LocalTime::new(timer_fmt))
            .with_ansi(false)
            .with_filter(level_filter);

        if tracing_subscriber::registry().with(subscriber).try_init().is_err() {
            report_diagnostic ("SWITCHBACK : a global log subscriber was already set");
            return None
        }
        // only a handle onto the installed layer is worth keeping for level reloads
        *self.loglevel.write() = Some(filter_handle);

        Some(guard)
    }

}


/// Last-resort diagnostics for when the log file itself is unavailable
pub fn report_diagnostic (msg:&str) {
    eprintln! ("{}", msg);
    #[cfg(windows)]
    crate::win_apis::write_win_dbg_string (msg);
}
