/// How long a single touch must be held before the tooltip is shown.
pub const LONG_PRESS_MS: u32 = 500;

/// Identifies one armed long-press timer. The host arms a real timer when it
/// sees [`Effect::ArmTimer`] and reports expiry back with the same token; a
/// token that no longer matches the pending one is ignored, which is what
/// makes cancel-and-replace on a new touch actually stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

/// Pointer/touch input, with picking already resolved by the caller.
/// `hit` is the slot under the position when that slot shows a listed
/// parcel; bare lattice cells and misses are both `None` — there is nothing
/// to display or navigate to for them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    PointerMove { x: f64, y: f64, hit: Option<usize> },
    PointerLeave,
    Click { hit: Option<usize> },
    /// A touch-start with exactly one active touch. Multi-touch gestures
    /// (pinch zoom) are the host's business and never reach the controller.
    TouchStart { x: f64, y: f64, hit: Option<usize> },
    TouchMove { x: f64, y: f64, hit: Option<usize> },
    TouchEnd,
    TouchCancel,
    LongPressFired(TimerToken),
}

/// Side effects for the host to execute, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    ShowTooltip { slot: usize, x: f64, y: f64 },
    HideTooltip,
    /// Open the external record for the parcel at this slot.
    Navigate { slot: usize },
    ArmTimer { token: TimerToken, duration_ms: u32 },
    CancelTimer { token: TimerToken },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Hovering(usize),
    LongPressPending {
        x: f64,
        y: f64,
        hit: Option<usize>,
        token: TimerToken,
    },
}

/// Hover/click/long-press state machine, independent of the host UI toolkit.
/// Owns the single pending long-press timer; a new touch-start replaces it,
/// cancelling the old timer first.
#[derive(Debug)]
pub struct InteractionController {
    state: State,
    next_token: u64,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            next_token: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    pub fn hovered_slot(&self) -> Option<usize> {
        match self.state {
            State::Hovering(slot) => Some(slot),
            _ => None,
        }
    }

    fn issue_token(&mut self) -> TimerToken {
        self.next_token += 1;
        TimerToken(self.next_token)
    }

    /// Cancel a pending long-press timer, if any, pushing the cancel effect.
    fn cancel_pending(&mut self, effects: &mut Vec<Effect>) {
        if let State::LongPressPending { token, .. } = self.state {
            effects.push(Effect::CancelTimer { token });
            self.state = State::Idle;
        }
    }

    fn hover_to(&mut self, hit: Option<usize>, x: f64, y: f64, effects: &mut Vec<Effect>) {
        match hit {
            Some(slot) => {
                self.state = State::Hovering(slot);
                effects.push(Effect::ShowTooltip { slot, x, y });
            }
            None => {
                if !matches!(self.state, State::Idle) {
                    effects.push(Effect::HideTooltip);
                }
                self.state = State::Idle;
            }
        }
    }

    /// Feed one input event; returns the effects the host must run.
    pub fn handle(&mut self, input: PointerInput) -> Vec<Effect> {
        let mut effects = Vec::new();
        match input {
            PointerInput::PointerMove { x, y, hit } => {
                self.cancel_pending(&mut effects);
                self.hover_to(hit, x, y, &mut effects);
            }
            PointerInput::PointerLeave => {
                self.cancel_pending(&mut effects);
                if !matches!(self.state, State::Idle) {
                    effects.push(Effect::HideTooltip);
                }
                self.state = State::Idle;
            }
            PointerInput::Click { hit } => {
                // Navigation leaves hover state untouched.
                if let Some(slot) = hit {
                    effects.push(Effect::Navigate { slot });
                }
            }
            PointerInput::TouchStart { x, y, hit } => {
                self.cancel_pending(&mut effects);
                let token = self.issue_token();
                self.state = State::LongPressPending { x, y, hit, token };
                effects.push(Effect::ArmTimer {
                    token,
                    duration_ms: LONG_PRESS_MS,
                });
            }
            PointerInput::TouchMove { x, y, hit } => {
                self.cancel_pending(&mut effects);
                self.hover_to(hit, x, y, &mut effects);
            }
            PointerInput::TouchEnd | PointerInput::TouchCancel => {
                self.cancel_pending(&mut effects);
                effects.push(Effect::HideTooltip);
                self.state = State::Idle;
            }
            PointerInput::LongPressFired(fired) => {
                if let State::LongPressPending { x, y, hit, token } = self.state
                    && token == fired
                {
                    // Treated like hover-show, not click.
                    self.hover_to(hit, x, y, &mut effects);
                }
                // A replaced timer's expiry carries a stale token: ignored.
            }
        }
        effects
    }
}
