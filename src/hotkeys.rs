use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::HotkeyError;
use crate::keys::{self, ModifierMask, VirtualKey};



pub const PRIMARY_HOTKEY_ID     : i32 = 9000;
pub const ALTERNATIVE_HOTKEY_ID : i32 = 9001;

/// win32 MOD_NOREPEAT .. holding the combination down fires only once
pub const MOD_NOREPEAT : u32 = 0x4000;


/// Action type invoked when a bound hotkey fires
pub type Action = Arc < dyn Fn() + Send + Sync + 'static >;




# [ derive (Debug, Copy, Clone, Eq, PartialEq, Hash) ]
pub struct HotkeyBinding {
    pub id        : i32,
    pub modifiers : ModifierMask,
    pub key       : VirtualKey,
    pub no_repeat : bool,
}

impl HotkeyBinding {

    /// bindings we make always ask for no auto-repeat
    pub fn new (id:i32, modifiers:ModifierMask, key:VirtualKey) -> Self {
        HotkeyBinding { id, modifiers, key, no_repeat: true }
    }

    /// The modifier flags word as passed to the OS registration call
    pub fn fs_modifiers (&self) -> u32 {
        self.modifiers.bits() | if self.no_repeat { MOD_NOREPEAT } else { 0 }
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() { write! (f, "{}", keys::key_display(self.key)) }
        else { write! (f, "{}+{}", self.modifiers, keys::key_display(self.key)) }
    }
}


/// The bindings implied by settings : the primary, plus the alternative if one is enabled
pub fn bindings_for (settings:&Settings) -> Vec<HotkeyBinding> {
    let mut bindings = vec! [ HotkeyBinding::new (PRIMARY_HOTKEY_ID, settings.modifiers, settings.key) ];
    if let Some(alt_key) = settings.alternative_key .filter (|k| *k != settings.key) {
        bindings.push ( HotkeyBinding::new (ALTERNATIVE_HOTKEY_ID, settings.modifiers, alt_key) );
    }
    bindings
}




/// The OS global-hotkey facility
pub trait HotkeyRegistrar {
    fn register_hotkey   (&self, binding:&HotkeyBinding) -> Result <(), HotkeyError>;
    fn unregister_hotkey (&self, binding:&HotkeyBinding);
}


/// Owns the set of registered hotkeys and routes fired-notifications to the one registered handler
pub struct HotkeyDispatcher <R: HotkeyRegistrar> {
    registrar  : R,
    registered : Vec <HotkeyBinding>,
    on_fired   : Option <Action>,
}

impl <R: HotkeyRegistrar> HotkeyDispatcher <R> {

    pub fn new (registrar:R) -> Self {
        HotkeyDispatcher { registrar, registered: Vec::new(), on_fired: None }
    }

    pub fn set_handler (&mut self, action:Action) {
        self.on_fired = Some(action);
    }

    pub fn registered (&self) -> &[HotkeyBinding] { &self.registered }


    /// Registers the given bindings (replacing any current ones), returning the outcome per binding in order.<br>
    /// A refused binding is simply left out .. the rest stay active.
    pub fn register (&mut self, bindings:&[HotkeyBinding]) -> Vec <Result <(), HotkeyError>> {
        self.unregister_all();
        bindings .iter() .map (|b| {
            debug! ("registering hotkey {} (id {}, fs-modifiers {:#06x}, vk {:#04x})", b, b.id, b.fs_modifiers(), b.key);
            let res = self.registrar.register_hotkey (b);
            match res.as_ref() {
                Ok(_)  => { info! ("registered hotkey {} (id {})", b, b.id); self.registered.push(*b); }
                Err(e) => { warn! ("{}", e); }
            }
            res
        } ) .collect()
    }

    pub fn unregister_all (&mut self) {
        for b in self.registered.drain(..) {
            debug! ("unregistering hotkey {} (id {})", b, b.id);
            self.registrar.unregister_hotkey (&b);
        }
    }


    /// The handler to run for a fired hotkey id, if the id is one of ours
    pub fn handler_for (&self, id:i32) -> Option<Action> {
        if !self.registered.iter().any (|b| b.id == id) {
            debug! ("ignoring hotkey notification for unknown id {}", id);
            return None
        }
        self.on_fired.clone()
    }

    /// Runs the handler for a fired hotkey id .. returns whether it was ours and handled
    pub fn dispatch (&self, id:i32) -> bool {
        match self.handler_for (id) {
            Some(action) => { action(); true }
            None => false,
        }
    }
}
