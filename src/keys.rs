#![ allow (non_upper_case_globals) ]

//! Token tables for the settings file : modifier names, punctuation literals, and symbolic key names

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use strum_macros::AsRefStr;



/// Platform virtual-key code (win32 VK_* values)
pub type VirtualKey = u16;


pub const VK_OEM_1      : VirtualKey = 0xBA;    // ;
pub const VK_OEM_PLUS   : VirtualKey = 0xBB;    // =
pub const VK_OEM_COMMA  : VirtualKey = 0xBC;    // ,
pub const VK_OEM_MINUS  : VirtualKey = 0xBD;    // -
pub const VK_OEM_PERIOD : VirtualKey = 0xBE;    // .
pub const VK_OEM_2      : VirtualKey = 0xBF;    // /
pub const VK_OEM_3      : VirtualKey = 0xC0;    // `
pub const VK_OEM_4      : VirtualKey = 0xDB;    // [
pub const VK_OEM_5      : VirtualKey = 0xDC;    // \
pub const VK_OEM_6      : VirtualKey = 0xDD;    // ]
pub const VK_OEM_7      : VirtualKey = 0xDE;    // '


/// Single-character literals accepted as key values, and the OEM key each one maps to.<br>
/// (`=` and backtick go to the 'plus' and 'tilde' keys, which carry those chars unshifted)
pub const PUNCTUATION_KEYS : [(char, VirtualKey); 11] = [
    ( ';',  VK_OEM_1      ),
    ( ',',  VK_OEM_COMMA  ),
    ( '.',  VK_OEM_PERIOD ),
    ( '/',  VK_OEM_2      ),
    ( '\'', VK_OEM_7      ),
    ( '[',  VK_OEM_4      ),
    ( ']',  VK_OEM_6      ),
    ( '\\', VK_OEM_5      ),
    ( '-',  VK_OEM_MINUS  ),
    ( '=',  VK_OEM_PLUS   ),
    ( '`',  VK_OEM_3      ),
];


/// Symbolic key names (besides the patterned A-Z, D0-D9, F1-F24, NumPad0-9 families handled in code).<br>
/// Where a code has several names, the first listed is the one used for display.
const KEY_NAMES : &[(&str, VirtualKey)] = &[
    ("LButton", 0x01), ("RButton", 0x02), ("Cancel", 0x03), ("MButton", 0x04), ("XButton1", 0x05), ("XButton2", 0x06),
    ("Back", 0x08), ("Tab", 0x09), ("LineFeed", 0x0A), ("Clear", 0x0C),
    ("Enter", 0x0D), ("Return", 0x0D),
    ("ShiftKey", 0x10), ("ControlKey", 0x11), ("Menu", 0x12), ("Pause", 0x13),
    ("CapsLock", 0x14), ("Capital", 0x14),
    ("KanaMode", 0x15), ("HangulMode", 0x15), ("HanguelMode", 0x15),
    ("JunjaMode", 0x17), ("FinalMode", 0x18), ("HanjaMode", 0x19), ("KanjiMode", 0x19),
    ("Escape", 0x1B), ("IMEConvert", 0x1C), ("IMENonconvert", 0x1D), ("IMEAccept", 0x1E), ("IMEAceept", 0x1E), ("IMEModeChange", 0x1F),
    ("Space", 0x20),
    ("PageUp", 0x21), ("Prior", 0x21), ("PageDown", 0x22), ("Next", 0x22),
    ("End", 0x23), ("Home", 0x24), ("Left", 0x25), ("Up", 0x26), ("Right", 0x27), ("Down", 0x28),
    ("Select", 0x29), ("Print", 0x2A), ("Execute", 0x2B),
    ("PrintScreen", 0x2C), ("Snapshot", 0x2C),
    ("Insert", 0x2D), ("Delete", 0x2E), ("Help", 0x2F),
    ("LWin", 0x5B), ("RWin", 0x5C), ("Apps", 0x5D), ("Sleep", 0x5F),
    ("Multiply", 0x6A), ("Add", 0x6B), ("Separator", 0x6C), ("Subtract", 0x6D), ("Decimal", 0x6E), ("Divide", 0x6F),
    ("NumLock", 0x90), ("Scroll", 0x91),
    ("LShiftKey", 0xA0), ("RShiftKey", 0xA1), ("LControlKey", 0xA2), ("RControlKey", 0xA3), ("LMenu", 0xA4), ("RMenu", 0xA5),
    ("BrowserBack", 0xA6), ("BrowserForward", 0xA7), ("BrowserRefresh", 0xA8), ("BrowserStop", 0xA9),
    ("BrowserSearch", 0xAA), ("BrowserFavorites", 0xAB), ("BrowserHome", 0xAC),
    ("VolumeMute", 0xAD), ("VolumeDown", 0xAE), ("VolumeUp", 0xAF),
    ("MediaNextTrack", 0xB0), ("MediaPreviousTrack", 0xB1), ("MediaStop", 0xB2), ("MediaPlayPause", 0xB3),
    ("LaunchMail", 0xB4), ("SelectMedia", 0xB5), ("LaunchApplication1", 0xB6), ("LaunchApplication2", 0xB7),
    ("OemSemicolon", VK_OEM_1), ("Oem1", VK_OEM_1),
    ("Oemplus", VK_OEM_PLUS), ("Oemcomma", VK_OEM_COMMA), ("OemMinus", VK_OEM_MINUS), ("OemPeriod", VK_OEM_PERIOD),
    ("OemQuestion", VK_OEM_2), ("Oem2", VK_OEM_2),
    ("Oemtilde", VK_OEM_3), ("Oem3", VK_OEM_3),
    ("OemOpenBrackets", VK_OEM_4), ("Oem4", VK_OEM_4),
    ("OemPipe", VK_OEM_5), ("Oem5", VK_OEM_5),
    ("OemCloseBrackets", VK_OEM_6), ("Oem6", VK_OEM_6),
    ("OemQuotes", VK_OEM_7), ("Oem7", VK_OEM_7),
    ("Oem8", 0xDF), ("OemBackslash", 0xE2), ("Oem102", 0xE2),
    ("ProcessKey", 0xE5), ("Packet", 0xE7),
    ("Attn", 0xF6), ("Crsel", 0xF7), ("Exsel", 0xF8), ("EraseEof", 0xF9), ("Play", 0xFA), ("Zoom", 0xFB),
    ("NoName", 0xFC), ("Pa1", 0xFD), ("OemClear", 0xFE),
];




# [ derive (Debug, Copy, Clone, Eq, PartialEq, Hash, AsRefStr) ]
/// Modifier tokens recognized in the `Modifiers` setting .. the variant names are the literal tokens we scan for
pub enum Modifier { ALT, CTRL, SHIFT, WIN }

impl Modifier {
    pub const ALL : [Modifier; 4] = [ Modifier::ALT, Modifier::CTRL, Modifier::SHIFT, Modifier::WIN ];

    pub fn str (&self) -> &str { self.as_ref() }

    /// the win32 MOD_* bit for this modifier
    pub fn bits (&self) -> u32 {
        match self {
            Modifier::ALT   => 0x0001,
            Modifier::CTRL  => 0x0002,
            Modifier::SHIFT => 0x0004,
            Modifier::WIN   => 0x0008,
        }
    }
}



# [ derive (Debug, Default, Copy, Clone, Eq, PartialEq, Hash) ]
/// Set of modifiers, stored as the OR of their win32 MOD_* bits
pub struct ModifierMask (u32);

impl ModifierMask {
    pub const NONE : ModifierMask = ModifierMask (0);

    pub fn bits     (&self) -> u32  { self.0 }
    pub fn is_empty (&self) -> bool { self.0 == 0 }
    pub fn contains (&self, m:Modifier) -> bool { self.0 & m.bits() != 0 }
}

impl From<Modifier> for ModifierMask {
    fn from (m:Modifier) -> Self { ModifierMask (m.bits()) }
}
impl BitOr<Modifier> for ModifierMask {
    type Output = ModifierMask;
    fn bitor (self, m:Modifier) -> ModifierMask { ModifierMask (self.0 | m.bits()) }
}
impl BitOr for Modifier {
    type Output = ModifierMask;
    fn bitor (self, m:Modifier) -> ModifierMask { ModifierMask (self.bits() | m.bits()) }
}
impl BitOrAssign<Modifier> for ModifierMask {
    fn bitor_assign (&mut self, m:Modifier) { self.0 |= m.bits() }
}
impl FromIterator<Modifier> for ModifierMask {
    fn from_iter <I: IntoIterator<Item=Modifier>> (iter:I) -> Self {
        iter.into_iter() .fold (ModifierMask::NONE, |mask, m| mask | m)
    }
}

impl fmt::Display for ModifierMask {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() { return write! (f, "NONE") }
        let names = Modifier::ALL .iter() .filter (|m| self.contains(**m)) .map (|m| m.str()) .collect::<Vec<_>>();
        write! (f, "{}", names.join("+"))
    }
}




/// Scans a `Modifiers` value for the literal modifier tokens.<br>
/// This is plain substring containment : delimiters, order and repetition dont matter, unrecognized text is ignored,
/// and a token embedded in a longer word still counts (e.g. "ALTERNATE" yields ALT).
pub fn parse_modifiers (value:&str) -> ModifierMask {
    Modifier::ALL .into_iter() .filter (|m| value.contains (m.str())) .collect()
}


/// Resolves a key value : a single punctuation literal maps through the punctuation table, anything else is looked up by name
pub fn parse_key (value:&str) -> Option<VirtualKey> {
    let mut chars = value.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(&(_, vk)) = PUNCTUATION_KEYS .iter() .find (|(p,_)| *p == c) {
            return Some(vk)
    }  }
    parse_key_name (value)
}


/// Case-sensitive lookup of a symbolic key name .. a plain decimal in 1..=254 is also accepted as a raw key code
pub fn parse_key_name (name:&str) -> Option<VirtualKey> {
    if let Some(&(_, vk)) = KEY_NAMES .iter() .find (|(n,_)| *n == name) {
        return Some(vk)
    }
    if let Some(vk) = parse_patterned_key_name (name) {
        return Some(vk)
    }
    name .parse::<u16>() .ok() .filter (|vk| (1..=254).contains(vk))
}

fn single_digit (s:&str) -> Option<u16> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_digit(10) .map (|d| d as u16),
        _ => None,
    }
}

fn parse_patterned_key_name (name:&str) -> Option<VirtualKey> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return if c.is_ascii_uppercase() { Some (c as u16) } else { None }
    }
    if let Some(d) = name.strip_prefix("NumPad") .and_then (single_digit) {
        return Some (0x60 + d)
    }
    if let Some(d) = name.strip_prefix('D') .and_then (single_digit) {
        return Some (0x30 + d)
    }
    if let Some(n) = name.strip_prefix('F') {
        if !n.starts_with('0') && n.chars().all(|c| c.is_ascii_digit()) {
            return n.parse::<u16>().ok() .filter (|n| (1..=24).contains(n)) .map (|n| 0x6F + n)
    }  }
    None
}


/// Display name for a key code (the primary symbolic name where there is one)
pub fn key_display (vk:VirtualKey) -> String {
    match vk {
        0x30 ..= 0x39 => format! ("D{}", vk - 0x30),
        0x41 ..= 0x5A => ((vk as u8) as char).to_string(),
        0x60 ..= 0x69 => format! ("NumPad{}", vk - 0x60),
        0x70 ..= 0x87 => format! ("F{}", vk - 0x6F),
        _ => KEY_NAMES .iter() .find (|(_,v)| *v == vk) .map (|(n,_)| n.to_string())
                .unwrap_or_else (|| format! ("0x{:02X}", vk)),
    }
}
