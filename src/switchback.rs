#![ allow (non_snake_case) ]

use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::{Config, Settings};
use crate::hotkeys::{self, HotkeyBinding, HotkeyDispatcher, HotkeyRegistrar};
use crate::tracker::{TrackerState, WindowSystem, WindowTracker};




/// User-facing notifications .. the dialogs are blocking (and may pump messages while up), the notification is not
pub trait Notifier {
    fn show_warning      (&self, title:&str, text:&str);
    fn show_error        (&self, title:&str, text:&str);
    fn show_notification (&self, title:&str, text:&str);
}

/// Everything the app needs from the OS
pub trait Platform : WindowSystem + HotkeyRegistrar + Notifier + Clone + Send + Sync + 'static { }

impl <T> Platform for T where T : WindowSystem + HotkeyRegistrar + Notifier + Clone + Send + Sync + 'static { }




pub struct _Switchback <P: Platform> {
    pub conf   : Config,
    platform   : P,
    tracker    : Mutex <WindowTracker <P>>,
    hotkeys    : Mutex <HotkeyDispatcher <P>>,
    applied    : Mutex <Settings>,
    msgs_count : AtomicU32,
}

/// App state : ties settings, hotkey dispatch and window tracking together.<br>
/// The `proc_*` entry points are all driven from the single thread running the message loop, and
/// none of them hold a lock while a (message-pumping) dialog is up.
# [ derive (Clone) ]
pub struct Switchback <P: Platform> ( Arc <_Switchback <P>> );

impl <P: Platform> Deref for Switchback <P> {
    type Target = _Switchback <P>;
    fn deref (&self) -> &Self::Target { &self.0 }
}




impl <P: Platform> Switchback <P> {

    pub const HEARTBEAT_PERIOD : Duration = Duration::from_secs(5);


    pub fn new (conf:Config, platform:P) -> Switchback<P> {
        let sb = Switchback ( Arc::new ( _Switchback {
            conf,
            tracker    : Mutex::new ( WindowTracker::new (platform.clone(), Settings::DEFAULT_POLL_INTERVAL) ),
            hotkeys    : Mutex::new ( HotkeyDispatcher::new (platform.clone()) ),
            applied    : Mutex::new ( Settings::default() ),
            platform,
            msgs_count : AtomicU32::default(),
        } ) );
        // the dispatcher's handler only holds a weak ref back to us, so dropping the app doesnt leak it
        let weak = Arc::downgrade (&sb.0);
        sb.hotkeys.lock().set_handler ( Arc::new ( move || {
            if let Some(inner) = weak.upgrade() { Switchback(inner).proc_hot_key__switch_to_previous() }
        } ) );
        sb
    }


    /// Initial settings load and hotkey registration
    pub fn start (&self) {
        info! ("Starting Switchback v{} ..", Config::SWITCHBACK_VERSION);
        self.load_and_apply_settings();
    }

    /// Loads settings over the ones in effect (reporting a total load failure), then applies them .. returns whether the load itself succeeded
    fn load_and_apply_settings (&self) -> bool {
        let base = self.applied.lock().clone();
        let settings = self.conf.load_settings_over (&base);
        let load_err = self.conf.take_load_error();
        self.conf.reload_log_level (settings.log_level);
        self.apply_settings (&settings);
        if let Some(e) = load_err.as_ref() {
            self.platform.show_error ("Error", &format! ("Error loading settings: {}", e));
        }
        load_err.is_none()
    }

    fn apply_settings (&self, settings:&Settings) {
        *self.applied.lock() = settings.clone();
        self.tracker.lock().set_poll_interval (settings.poll_interval);

        let bindings = hotkeys::bindings_for (settings);
        let results  = self.hotkeys.lock().register (&bindings);

        bindings.iter() .zip (results.iter()) .filter (|(_, r)| r.is_err()) .for_each (|(b, _)| {
            self.platform.show_warning ( "Warning",
                &format! ("Failed to register hotkey {}. The application may not work correctly.", b) );
        } );
    }



    /*****  timer, hotkey and menu event handlers  ******/

    pub fn proc_timer__poll_tick (&self) {
        self.tracker.lock().poll_tick();
    }

    pub fn proc_timer__heartbeat (&self) -> u32 {
        let n = self.msgs_count.swap (0, Ordering::Relaxed);
        debug! ("{} messages received in last {} seconds", n, Self::HEARTBEAT_PERIOD.as_secs());
        n
    }

    pub fn note_msg_received (&self) {
        self.msgs_count.fetch_add (1, Ordering::Relaxed);
    }

    pub fn proc_hot_key__fired (&self, id:i32) {
        // we take the handler out first so the dispatcher isnt locked while it runs
        let action = self.hotkeys.lock().handler_for (id);
        if let Some(action) = action { action() }
    }

    pub fn proc_hot_key__switch_to_previous (&self) {
        self.tracker.lock().switch_to_previous();
    }

    pub fn proc_menu_req__reload (&self) {
        info! ("Reloading settings ..");
        self.hotkeys.lock().unregister_all();
        if self.load_and_apply_settings() {
            self.platform.show_notification ("Settings Reloaded", "Hotkey settings have been updated.");
        }
    }

    pub fn proc_menu_req__edit_settings (&self) {
        self.conf.trigger_config_file_edit();
    }

    pub fn shutdown (&self) {
        info! ("Shutting down .. unregistering hotkeys");
        self.hotkeys.lock().unregister_all();
    }



    pub fn settings           (&self) -> Settings             { self.applied.lock().clone() }
    pub fn poll_interval      (&self) -> Duration             { self.tracker.lock().poll_interval() }
    pub fn tracker_state      (&self) -> TrackerState         { self.tracker.lock().state() }
    pub fn registered_hotkeys (&self) -> Vec <HotkeyBinding>  { self.hotkeys.lock().registered().to_vec() }

}




#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};
    use crate::hotkeys::{ALTERNATIVE_HOTKEY_ID, PRIMARY_HOTKEY_ID};
    use crate::keys::{Modifier, VK_OEM_1};
    use crate::test_utils::FakePlatform;

    fn app (settings_text:Option<&str>) -> (TempDir, PathBuf, FakePlatform, Switchback<FakePlatform>) {
        let dir = tempdir().unwrap();
        let path = dir.path().join(Config::CONF_FILE_NAME);
        if let Some(text) = settings_text {
            fs::write(&path, text).unwrap();
        }
        let os = FakePlatform::new();
        let sb = Switchback::new(Config::new(Some(path.clone())), os.clone());
        (dir, path, os, sb)
    }

    #[test]
    fn fresh_start_creates_defaults_and_registers_both_hotkeys() {
        let (_dir, path, os, sb) = app(None);
        sb.start();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Modifiers=ALT") && text.contains("Key=Q") && text.contains("AlternativeKey=K"));

        let bindings = os.registered_bindings();
        assert_eq!(os.registered_ids(), vec![PRIMARY_HOTKEY_ID, ALTERNATIVE_HOTKEY_ID]);
        assert!(bindings.iter().all(|b| b.fs_modifiers() == 0x0001 | 0x4000));
        assert_eq!((bindings[0].key, bindings[1].key), (0x51, 0x4B));
        assert!(os.warnings().is_empty() && os.errors().is_empty());
    }

    #[test]
    fn ctrl_alt_semicolon_registers_single_binding() {
        let (_dir, _path, os, sb) = app(Some("Modifiers=CTRL,ALT\r\nKey=;\r\n"));
        sb.start();

        let bindings = os.registered_bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].id, PRIMARY_HOTKEY_ID);
        assert_eq!(bindings[0].fs_modifiers(), 0x0001 | 0x0002 | 0x4000);
        assert_eq!(bindings[0].key, VK_OEM_1);
    }

    #[test]
    fn hotkey_toggles_between_last_two_windows() {
        let (_dir, _path, os, sb) = app(None);
        sb.start();
        os.add_window(100); os.add_window(200);

        os.set_foreground(100); sb.proc_timer__poll_tick();
        os.set_foreground(200); sb.proc_timer__poll_tick();

        sb.proc_hot_key__fired(PRIMARY_HOTKEY_ID);
        assert_eq!(os.foreground(), 100);
        assert_eq!(sb.tracker_state().current(), Some(100));

        // a poll in between sees the window we just activated, which is already current
        sb.proc_timer__poll_tick();
        sb.proc_hot_key__fired(ALTERNATIVE_HOTKEY_ID);
        assert_eq!(os.foreground(), 200);
        assert_eq!(os.activations(), vec![100, 200]);
    }

    #[test]
    fn unknown_hotkey_ids_are_ignored() {
        let (_dir, _path, os, sb) = app(None);
        sb.start();
        os.add_window(1); os.add_window(2);
        os.set_foreground(1); sb.proc_timer__poll_tick();
        os.set_foreground(2); sb.proc_timer__poll_tick();

        sb.proc_hot_key__fired(42);
        assert!(os.activations().is_empty());
        assert_eq!(sb.tracker_state().current(), Some(2));
    }

    #[test]
    fn refused_registration_warns_and_keeps_running() {
        let (_dir, _path, os, sb) = app(None);
        os.refuse_hotkey(PRIMARY_HOTKEY_ID);
        sb.start();

        assert_eq!(os.registered_ids(), vec![ALTERNATIVE_HOTKEY_ID]);
        let warnings = os.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ALT+Q"));
    }

    #[test]
    fn reload_reregisters_and_confirms() {
        let (_dir, path, os, sb) = app(Some("Modifiers=ALT\nKey=Q\nAlternativeKey=K\n"));
        sb.start();
        assert_eq!(os.registered_ids().len(), 2);

        fs::write(&path, "Modifiers=WIN\nKey=F2\nAlternativeKey=F2\nPollIntervalMs=250\n").unwrap();
        sb.proc_menu_req__reload();

        let bindings = os.registered_bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].fs_modifiers(), 0x0008 | 0x4000);
        assert_eq!(bindings[0].key, 0x71);
        assert_eq!(sb.poll_interval(), Duration::from_millis(250));
        assert_eq!(os.notifications(), vec!["Settings Reloaded: Hotkey settings have been updated.".to_string()]);
    }

    #[test]
    fn reload_with_bad_key_keeps_binding_in_effect() {
        let (_dir, path, os, sb) = app(Some("Modifiers=CTRL\nKey=F2\n"));
        sb.start();
        let before = os.registered_bindings();
        assert_eq!((before[0].fs_modifiers(), before[0].key), (0x0002 | 0x4000, 0x71));

        fs::write(&path, "Key=F2x\n").unwrap();
        sb.proc_menu_req__reload();

        let after = os.registered_bindings();
        assert_eq!(after.len(), 1);
        assert_eq!((after[0].fs_modifiers(), after[0].key), (0x0002 | 0x4000, 0x71));
        assert_eq!(os.notifications().len(), 1);
    }

    #[test]
    fn reload_without_modifiers_line_keeps_modifiers_in_effect() {
        let (_dir, path, os, sb) = app(Some("Modifiers=CTRL,SHIFT\nKey=F3\nAlternativeKey=F4\n"));
        sb.start();
        assert_eq!(os.registered_ids(), vec![PRIMARY_HOTKEY_ID, ALTERNATIVE_HOTKEY_ID]);

        fs::write(&path, "Key=F5\nAlternativeKey=NoSuchKey\n").unwrap();
        sb.proc_menu_req__reload();

        let bindings = os.registered_bindings();
        assert_eq!(bindings.len(), 2);
        assert!(bindings.iter().all(|b| b.fs_modifiers() == 0x0002 | 0x0004 | 0x4000));
        assert_eq!((bindings[0].key, bindings[1].key), (0x74, 0x73));
        assert_eq!(sb.settings().modifiers, Modifier::CTRL | Modifier::SHIFT);
    }

    #[test]
    fn reload_after_total_failure_resets_to_alt_q() {
        let (_dir, path, os, sb) = app(Some("Modifiers=WIN\nKey=F6\n"));
        sb.start();

        // a directory where the settings file was cannot be read at all
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        sb.proc_menu_req__reload();

        assert_eq!(os.errors().len(), 1);
        let bindings = os.registered_bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!((bindings[0].fs_modifiers(), bindings[0].key), (0x0001 | 0x4000, 0x51));
    }

    #[test]
    fn total_load_failure_reports_error_and_uses_defaults() {
        let os = FakePlatform::new();
        let sb = Switchback::new(Config::new(None), os.clone());
        sb.start();

        assert_eq!(os.errors().len(), 1);
        let bindings = os.registered_bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!((bindings[0].fs_modifiers(), bindings[0].key), (0x0001 | 0x4000, 0x51));

        // a reload that fails again is not confirmed
        sb.proc_menu_req__reload();
        assert_eq!(os.errors().len(), 2);
        assert!(os.notifications().is_empty());
    }

    #[test]
    fn shutdown_unregisters_everything() {
        let (_dir, _path, os, sb) = app(None);
        sb.start();
        sb.shutdown();
        assert!(os.registered_ids().is_empty());
        assert!(sb.registered_hotkeys().is_empty());
    }

    #[test]
    fn heartbeat_reports_and_resets_message_count() {
        let (_dir, _path, _os, sb) = app(None);
        (0..3).for_each(|_| sb.note_msg_received());
        assert_eq!(sb.proc_timer__heartbeat(), 3);
        assert_eq!(sb.proc_timer__heartbeat(), 0);
    }
}
