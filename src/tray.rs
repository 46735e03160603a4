#![ allow (non_snake_case) ]

use std::time::Duration;

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{ERROR_CLASS_ALREADY_EXISTS, HINSTANCE, HWND, LPARAM, LRESULT, POINT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::WM_HOTKEY;
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_INFO, NIF_MESSAGE, NIF_TIP, NIIF_INFO, NIM_ADD, NIM_DELETE, NIM_MODIFY, NOTIFYICONDATAW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, HMENU, CreateWindowExW, DefWindowProcW, DestroyMenu, DestroyWindow, DispatchMessageW,
    GetCursorPos, GetMessageW, KillTimer, LoadIconW, PostMessageW, PostQuitMessage, RegisterClassW, SetForegroundWindow,
    SetTimer, TrackPopupMenu, TranslateMessage, HWND_MESSAGE, IDI_APPLICATION, MF_SEPARATOR, MF_STRING, MSG, TPM_BOTTOMALIGN,
    TPM_RETURNCMD, TPM_RIGHTBUTTON, WINDOW_EX_STYLE, WINDOW_STYLE, WM_APP, WM_CONTEXTMENU, WM_NULL, WM_RBUTTONUP, WM_TIMER,
    WNDCLASSW, WS_EX_TOOLWINDOW, WS_POPUP,
};

use crate::config::Config;
use crate::switchback::Switchback;
use crate::tracker::Hwnd;
use crate::win_apis::{to_hwnd, Win32Platform};



const WM_TRAY_CALLBACK   : u32   = WM_APP + 1;
const TRAY_ICON_ID       : u32   = 1;

const POLL_TIMER_ID      : usize = 1;
const HEARTBEAT_TIMER_ID : usize = 2;

const MENU_EDIT_CONF     : usize = 1;
const MENU_RELOAD        : usize = 2;
const MENU_QUIT          : usize = 3;
// note: ^^ menu ids come back to us as the TrackPopupMenu return value, zero means dismissed


struct TrayApp {
    sb        : Switchback <Win32Platform>,
    msg_hwnd  : Hwnd,
    tray_hwnd : Hwnd,
}

// the app is reached from the window-proc callback, so it lives in a static once both windows exist
static APP : OnceCell <TrayApp> = OnceCell::new();




/// Creates the hidden message and tray windows, adds the tray icon, registers hotkeys, arms the timers, and runs the message loop till exit
pub fn run_switchback_tray (conf:Config) -> windows::core::Result<()> { unsafe {

    let (msg_hwnd, tray_hwnd) = create_app_windows()?;
    info! ("created message window {:?} and tray window {:?}", msg_hwnd.0, tray_hwnd.0);

    let sb = Switchback::new (conf, Win32Platform::new (msg_hwnd.0 as Hwnd, tray_hwnd.0 as Hwnd));
    let _ = APP.set ( TrayApp { sb: sb.clone(), msg_hwnd: msg_hwnd.0 as Hwnd, tray_hwnd: tray_hwnd.0 as Hwnd } );

    add_tray_icon (tray_hwnd);
    sb.start();

    arm_poll_timer (msg_hwnd, sb.poll_interval());
    let _ = SetTimer (msg_hwnd, HEARTBEAT_TIMER_ID, Switchback::<Win32Platform>::HEARTBEAT_PERIOD.as_millis() as u32, None);

    let mut msg = MSG::default();
    while GetMessageW (&mut msg, None, 0, 0) .as_bool() {
        let _ = TranslateMessage (&msg);
        DispatchMessageW (&msg);
    }
    info! ("message loop ended .. exiting");
    Ok(())
} }


/// Creates the message-only window (hotkeys and timers) and the hidden top-level window that owns the tray icon and menu
fn create_app_windows () -> windows::core::Result <(HWND, HWND)> { unsafe {

    let hinst : HINSTANCE = GetModuleHandleW (None)?.into();
    let class_name = w!("SwitchbackMessageWindow");

    let wc = WNDCLASSW {
        lpfnWndProc   : Some (wnd_proc),
        hInstance     : hinst,
        lpszClassName : class_name,
        ..Default::default()
    };
    if RegisterClassW (&wc) == 0 {
        let e = windows::core::Error::from_win32();
        if e.code() != ERROR_CLASS_ALREADY_EXISTS.to_hresult() { return Err(e) }
    }

    // a message-only window : never shown, zero-sized, only there to receive hotkey and timer messages
    let msg_hwnd = CreateWindowExW (
        WINDOW_EX_STYLE::default(), class_name, w!("Switchback"), WINDOW_STYLE::default(),
        0, 0, 0, 0, HWND_MESSAGE, HMENU::default(), hinst, None,
    )?;
    // the tray icon and its menu need a real top-level owner (message-only windows cant take the foreground)
    let tray_hwnd = CreateWindowExW (
        WS_EX_TOOLWINDOW, class_name, w!("Switchback Tray"), WS_POPUP,
        0, 0, 0, 0, HWND::default(), HMENU::default(), hinst, None,
    )?;
    Ok ((msg_hwnd, tray_hwnd))
} }


fn arm_poll_timer (hwnd:HWND, interval:Duration) { unsafe {
    // re-arming an existing timer id just replaces its period
    let _ = SetTimer (hwnd, POLL_TIMER_ID, interval.as_millis() as u32, None);
} }



unsafe extern "system" fn wnd_proc (hwnd:HWND, msg:u32, w_param:WPARAM, l_param:LPARAM) -> LRESULT {

    let Some(app) = APP.get() else {
        return DefWindowProcW (hwnd, msg, w_param, l_param)
    };
    let sb = &app.sb;
    sb.note_msg_received();

    match msg {
        WM_TIMER if w_param.0 == POLL_TIMER_ID      => { sb.proc_timer__poll_tick(); }
        WM_TIMER if w_param.0 == HEARTBEAT_TIMER_ID => { sb.proc_timer__heartbeat(); }
        WM_HOTKEY => { sb.proc_hot_key__fired (w_param.0 as i32); }
        WM_TRAY_CALLBACK => {
            // for the classic tray callback, the mouse msg comes in the low word of lparam
            let ev = (l_param.0 as u32) & 0xFFFF;
            if ev == WM_RBUTTONUP || ev == WM_CONTEXTMENU { show_tray_menu (app) }
        }
        _ => return DefWindowProcW (hwnd, msg, w_param, l_param)
    }
    LRESULT(0)
}




fn fill_wide (dest: &mut [u16], s:&str) {
    // copies as much as fits while leaving room for the terminating nul
    let wide = s.encode_utf16() .take (dest.len().saturating_sub(1)) .collect::<Vec<u16>>();
    dest[..wide.len()].copy_from_slice (&wide);
    dest[wide.len()] = 0;
}

fn tray_icon_data (hwnd:HWND) -> NOTIFYICONDATAW {
    NOTIFYICONDATAW {
        cbSize : std::mem::size_of::<NOTIFYICONDATAW>() as u32,
        hWnd   : hwnd,
        uID    : TRAY_ICON_ID,
        ..Default::default()
    }
}

fn add_tray_icon (hwnd:HWND) { unsafe {
    let mut nid = tray_icon_data (hwnd);
    nid.uFlags = NIF_MESSAGE | NIF_ICON | NIF_TIP;
    nid.uCallbackMessage = WM_TRAY_CALLBACK;
    nid.hIcon = LoadIconW (HINSTANCE::default(), IDI_APPLICATION) .unwrap_or_default();
    fill_wide (&mut nid.szTip, "Switchback");
    if !Shell_NotifyIconW (NIM_ADD, &nid) .as_bool() {
        warn! ("failed to add tray icon");
    }
} }

fn remove_tray_icon (hwnd:HWND) { unsafe {
    let _ = Shell_NotifyIconW (NIM_DELETE, &tray_icon_data(hwnd));
} }

/// Pops a balloon notification off our tray icon
pub fn show_balloon (hwnd:HWND, title:&str, text:&str) { unsafe {
    let mut nid = tray_icon_data (hwnd);
    nid.uFlags = NIF_INFO;
    nid.dwInfoFlags = NIIF_INFO;
    nid.Anonymous.uTimeout = 2000;
    fill_wide (&mut nid.szInfoTitle, title);
    fill_wide (&mut nid.szInfo, text);
    let _ = Shell_NotifyIconW (NIM_MODIFY, &nid);
} }




fn show_tray_menu (app:&TrayApp) { unsafe {
    let tray_hwnd = to_hwnd (app.tray_hwnd);
    let Ok(menu) = CreatePopupMenu() else {
        warn! ("failed to create tray menu");
        return
    };
    let _ = AppendMenuW (menu, MF_STRING,    MENU_EDIT_CONF, w!("Edit Settings"));
    let _ = AppendMenuW (menu, MF_STRING,    MENU_RELOAD,    w!("Reload Settings"));
    let _ = AppendMenuW (menu, MF_SEPARATOR, 0,              PCWSTR::null());
    let _ = AppendMenuW (menu, MF_STRING,    MENU_QUIT,      w!("Exit"));

    // the (top-level) menu owner has to be fgnd for the menu to dismiss properly when clicking elsewhere
    let _ = SetForegroundWindow (tray_hwnd);
    let mut pt = POINT::default();
    let _ = GetCursorPos (&mut pt);
    let cmd = TrackPopupMenu (menu, TPM_RETURNCMD | TPM_RIGHTBUTTON | TPM_BOTTOMALIGN, pt.x, pt.y, 0, tray_hwnd, None);
    let _ = DestroyMenu (menu);
    // nudge the owner so a second right-click opens the menu again instead of just closing it
    let _ = PostMessageW (tray_hwnd, WM_NULL, WPARAM(0), LPARAM(0));

    exec_menu_action (cmd.0 as usize, app);
} }

fn exec_menu_action (id:usize, app:&TrayApp) {
    let sb = &app.sb;
    match id {
        MENU_EDIT_CONF => { sb.proc_menu_req__edit_settings() }
        MENU_RELOAD    => { sb.proc_menu_req__reload(); arm_poll_timer (to_hwnd(app.msg_hwnd), sb.poll_interval()); }
        MENU_QUIT      => { exit_switchback (app) }
        _ => { }
    }
}

fn exit_switchback (app:&TrayApp) { unsafe {
    let (msg_hwnd, tray_hwnd) = (to_hwnd(app.msg_hwnd), to_hwnd(app.tray_hwnd));
    app.sb.shutdown();
    let _ = KillTimer (msg_hwnd, POLL_TIMER_ID);
    let _ = KillTimer (msg_hwnd, HEARTBEAT_TIMER_ID);
    remove_tray_icon (tray_hwnd);
    let _ = DestroyWindow (tray_hwnd);
    let _ = DestroyWindow (msg_hwnd);
    PostQuitMessage (0);
} }
