//! In-memory stand-in for the OS, recording what the app asks of it

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::HotkeyError;
use crate::hotkeys::{HotkeyBinding, HotkeyRegistrar};
use crate::switchback::Notifier;
use crate::tracker::{Hwnd, WindowSystem};



#[derive(Debug, Default)]
struct FakeOs {
    fgnd              : Hwnd,
    windows           : HashSet<Hwnd>,
    refuse_activation : bool,
    refused_hotkeys   : HashSet<i32>,
    registered        : Vec<HotkeyBinding>,
    activations       : Vec<Hwnd>,
    warnings          : Vec<String>,
    errors            : Vec<String>,
    notifications     : Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct FakePlatform (Arc<Mutex<FakeOs>>);

impl FakePlatform {
    pub fn new () -> Self { Self::default() }

    pub fn set_foreground (&self, hwnd:Hwnd) { self.0.lock().fgnd = hwnd }
    pub fn foreground (&self) -> Hwnd { self.0.lock().fgnd }

    pub fn add_window   (&self, hwnd:Hwnd) { self.0.lock().windows.insert(hwnd); }
    pub fn close_window (&self, hwnd:Hwnd) { self.0.lock().windows.remove(&hwnd); }

    pub fn refuse_activation (&self, refuse:bool) { self.0.lock().refuse_activation = refuse }
    pub fn refuse_hotkey (&self, id:i32) { self.0.lock().refused_hotkeys.insert(id); }

    pub fn registered_ids (&self) -> Vec<i32> { self.0.lock().registered.iter().map(|b| b.id).collect() }
    pub fn registered_bindings (&self) -> Vec<HotkeyBinding> { self.0.lock().registered.clone() }

    pub fn activations   (&self) -> Vec<Hwnd>   { self.0.lock().activations.clone() }
    pub fn warnings      (&self) -> Vec<String> { self.0.lock().warnings.clone() }
    pub fn errors        (&self) -> Vec<String> { self.0.lock().errors.clone() }
    pub fn notifications (&self) -> Vec<String> { self.0.lock().notifications.clone() }
}

impl WindowSystem for FakePlatform {
    fn foreground_window (&self) -> Hwnd { self.0.lock().fgnd }

    fn is_window (&self, hwnd:Hwnd) -> bool { self.0.lock().windows.contains(&hwnd) }

    fn activate_window (&self, hwnd:Hwnd) -> bool {
        let mut os = self.0.lock();
        os.activations.push(hwnd);
        if os.refuse_activation { return false }
        os.fgnd = hwnd;
        true
    }
}

impl HotkeyRegistrar for FakePlatform {
    fn register_hotkey (&self, binding:&HotkeyBinding) -> Result<(), HotkeyError> {
        let mut os = self.0.lock();
        if os.refused_hotkeys.contains(&binding.id) || os.registered.iter().any(|b| b.id == binding.id) {
            return Err ( HotkeyError::Rejected {
                id: binding.id, binding: binding.to_string(), reason: "hotkey already registered".into()
            } )
        }
        os.registered.push(*binding);
        Ok(())
    }

    fn unregister_hotkey (&self, binding:&HotkeyBinding) {
        self.0.lock().registered.retain(|b| b.id != binding.id);
    }
}

impl Notifier for FakePlatform {
    fn show_warning (&self, title:&str, text:&str) { self.0.lock().warnings.push(format!("{}: {}", title, text)) }
    fn show_error (&self, title:&str, text:&str) { self.0.lock().errors.push(format!("{}: {}", title, text)) }
    fn show_notification (&self, title:&str, text:&str) { self.0.lock().notifications.push(format!("{}: {}", title, text)) }
}
