#![ allow (non_upper_case_globals, non_snake_case) ]

use std::ffi::c_void;

use windows::core::PCWSTR;
use windows::Win32::Foundation::HWND;
use windows::Win32::System::Diagnostics::Debug::OutputDebugStringW;
use windows::Win32::UI::Input::KeyboardAndMouse::{RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS};
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowPlacement, IsWindow, MessageBoxW, SetForegroundWindow, ShowWindowAsync,
    MB_ICONERROR, MB_ICONWARNING, MB_OK, MESSAGEBOX_STYLE, SW_RESTORE, SW_SHOWMINIMIZED, WINDOWPLACEMENT,
};

use crate::error::HotkeyError;
use crate::hotkeys::{HotkeyBinding, HotkeyRegistrar};
use crate::switchback::Notifier;
use crate::tracker::{Hwnd, WindowSystem};
use crate::tray;



pub fn to_hwnd (hwnd:Hwnd) -> HWND { HWND (hwnd as *mut c_void) }

/// utf-16 copy of the string, nul-terminated for win32 calls
pub fn to_wide (s:&str) -> Vec<u16> {
    s.encode_utf16() .chain (std::iter::once(0)) .collect()
}



pub fn get_fgnd_window () -> Hwnd { unsafe {
    GetForegroundWindow().0 as Hwnd
} }

pub fn check_window_exists (hwnd:Hwnd) -> bool { unsafe {
    IsWindow (to_hwnd(hwnd)) .as_bool()
} }

pub fn window_activate (hwnd:Hwnd) -> bool { unsafe {
    let mut win_state = WINDOWPLACEMENT::default();
    let _ = GetWindowPlacement (to_hwnd(hwnd), &mut win_state);
    if win_state.showCmd == SW_SHOWMINIMIZED.0 as u32 {
        let _ = ShowWindowAsync (to_hwnd(hwnd), SW_RESTORE);
    }
    SetForegroundWindow (to_hwnd(hwnd)) .as_bool()
    // ^^ win32 only lets this through when the foreground-lock rules allow it .. a refusal just returns false
} }



pub fn register_hotkey (msg_hwnd:Hwnd, binding:&HotkeyBinding) -> windows::core::Result<()> { unsafe {
    RegisterHotKey (to_hwnd(msg_hwnd), binding.id, HOT_KEY_MODIFIERS (binding.fs_modifiers()), binding.key as u32)
} }

pub fn unregister_hotkey (msg_hwnd:Hwnd, id:i32) -> windows::core::Result<()> { unsafe {
    UnregisterHotKey (to_hwnd(msg_hwnd), id)
} }



/// Blocking message box (note that it runs its own modal message loop while up)
pub fn message_box (title:&str, text:&str, style:MESSAGEBOX_STYLE) { unsafe {
    let (title, text) = (to_wide(title), to_wide(text));
    let _ = MessageBoxW (HWND::default(), PCWSTR(text.as_ptr()), PCWSTR(title.as_ptr()), style);
} }

pub fn write_win_dbg_string (msg:&str) { unsafe {
    let msg_wide = to_wide (msg);
    OutputDebugStringW (PCWSTR(msg_wide.as_ptr()));
} }




# [ derive (Debug, Copy, Clone) ]
/// The real OS, with hotkeys bound to our hidden message window, and notifications going out via the tray window
pub struct Win32Platform {
    msg_hwnd  : Hwnd,
    tray_hwnd : Hwnd,
}

impl Win32Platform {
    pub fn new (msg_hwnd:Hwnd, tray_hwnd:Hwnd) -> Self { Win32Platform { msg_hwnd, tray_hwnd } }
}

impl WindowSystem for Win32Platform {
    fn foreground_window (&self) -> Hwnd { get_fgnd_window() }
    fn is_window (&self, hwnd:Hwnd) -> bool { check_window_exists (hwnd) }
    fn activate_window (&self, hwnd:Hwnd) -> bool { window_activate (hwnd) }
}

impl HotkeyRegistrar for Win32Platform {
    fn register_hotkey (&self, binding:&HotkeyBinding) -> Result <(), HotkeyError> {
        register_hotkey (self.msg_hwnd, binding) .map_err (|e| HotkeyError::Rejected {
            id: binding.id, binding: binding.to_string(), reason: e.to_string()
        } )
    }
    fn unregister_hotkey (&self, binding:&HotkeyBinding) {
        if let Err(e) = unregister_hotkey (self.msg_hwnd, binding.id) {
            tracing::debug! ("unregistering hotkey id {} failed: {}", binding.id, e);
        }
    }
}

impl Notifier for Win32Platform {
    fn show_warning (&self, title:&str, text:&str) { message_box (title, text, MB_OK | MB_ICONWARNING) }
    fn show_error   (&self, title:&str, text:&str) { message_box (title, text, MB_OK | MB_ICONERROR) }
    fn show_notification (&self, title:&str, text:&str) {
        tray::show_balloon (to_hwnd(self.tray_hwnd), title, text);
    }
}
