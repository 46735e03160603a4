use std::time::Duration;

use tracing::{debug, trace};



/// Raw OS window handle (as an integer, so it can be freely stored and compared) .. zero is the null handle
pub type Hwnd = isize;


/// What the tracker needs from the windowing system
pub trait WindowSystem {
    /// The window currently receiving input, or zero if there is none
    fn foreground_window (&self) -> Hwnd;
    /// Whether the handle still refers to an existing window
    fn is_window (&self, hwnd:Hwnd) -> bool;
    /// Asks the OS to bring the window to the foreground .. the OS is free to refuse
    fn activate_window (&self, hwnd:Hwnd) -> bool;
}




# [ derive (Debug, Default, Copy, Clone, Eq, PartialEq) ]
/// The current and previously foregrounded windows .. mutated only via `observe` and `swap`
pub struct TrackerState {
    current  : Option<Hwnd>,
    previous : Option<Hwnd>,
}

impl TrackerState {

    pub fn current  (&self) -> Option<Hwnd> { self.current }
    pub fn previous (&self) -> Option<Hwnd> { self.previous }

    /// Records a sampled foreground window : a non-null handle different from current shifts current into previous.<br>
    /// Returns whether anything changed.
    pub fn observe (&mut self, fgnd:Hwnd) -> bool {
        if fgnd == 0 || self.current == Some(fgnd) { return false }
        self.previous = self.current;
        self.current  = Some(fgnd);
        true
    }

    /// Exchanges current and previous (no-op when there's no previous)
    pub fn swap (&mut self) -> bool {
        if self.previous.is_none() { return false }
        std::mem::swap (&mut self.current, &mut self.previous);
        true
    }
}




/// Samples the foreground window on a fixed period, and performs the switch-to-previous action.<br>
/// All calls are expected from the one thread that owns the timer and hotkey message handling.
pub struct WindowTracker <W: WindowSystem> {
    win           : W,
    state         : TrackerState,
    poll_interval : Duration,
}

impl <W: WindowSystem> WindowTracker <W> {

    pub fn new (win:W, poll_interval:Duration) -> Self {
        WindowTracker { win, state: TrackerState::default(), poll_interval }
    }

    pub fn state (&self) -> TrackerState { self.state }

    pub fn poll_interval (&self) -> Duration { self.poll_interval }

    /// Updates the sampling period .. takes effect when the owning timer is re-armed
    pub fn set_poll_interval (&mut self, dur:Duration) { self.poll_interval = dur }


    /// One timer tick : sample the foreground window and fold it into the state.<br>
    /// Focus changes that come and go between two ticks are not seen at all (a known limit of sampling).
    pub fn poll_tick (&mut self) -> bool {
        let fgnd = self.win.foreground_window();
        let changed = self.state.observe (fgnd);
        if changed {
            trace! ("fgnd changed .. current: {:?}, previous: {:?}", self.state.current, self.state.previous);
        }
        changed
    }


    /// Brings the previous window forward and swaps the slots, so invoking this again toggles back.<br>
    /// Activation can silently fail (OS foreground-lock rules) .. the next poll tick then corrects `current`.
    pub fn switch_to_previous (&mut self) -> Option<Hwnd> {
        let target = self.state.previous?;
        if !self.win.is_window (target) {
            debug! ("previous window {:?} no longer exists .. ignoring switch request", target);
            return None
        }
        if !self.win.activate_window (target) {
            debug! ("OS did not confirm activation of {:?}", target);
        }
        self.state.swap();
        debug! ("switched to {:?} (now previous: {:?})", target, self.state.previous);
        Some(target)
    }
}
