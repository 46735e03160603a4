// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr (
    all ( not(debug_assertions), target_os = "windows" ),
    windows_subsystem = "windows"
)]

use switchback::config::{report_diagnostic, Config};


fn main() {

    let conf = Config::instance();

    // we want the non-blocking log-appender guard to be here in main, to ensure any pending logs get flushed upon crash etc
    let guard = conf.setup_log_subscriber (conf.peek_log_level());

    tracing::info! ("Launching Switchback v{} ...", Config::SWITCHBACK_VERSION);

    #[cfg(windows)]
    {
        if let Err(e) = switchback::tray::run_switchback_tray (conf) {
            tracing::error! ("Switchback failed to start its message window: {}", e);
            report_diagnostic (&format! ("SWITCHBACK : failed to start : {}", e));
            drop (guard);
            std::process::exit (1);
        }
    }

    #[cfg(not(windows))]
    {
        tracing::error! ("Switchback needs the Windows desktop to run");
        report_diagnostic ("SWITCHBACK : unsupported platform, only Windows is supported");
        drop ((conf, guard));
        std::process::exit (1);
    }
}
