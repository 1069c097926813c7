use std::time::Duration;

use tracing::debug;

pub const PLAYER_NAME_TOKEN: &str = "[PLAYER_NAME]";
const PAUSE_TOKEN_PREFIX: &str = "[PAUSE:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogConfig {
    pub chars_per_second: u32,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            chars_per_second: 25,
        }
    }
}

impl DialogConfig {
    pub fn reveal_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.chars_per_second.max(1)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Typing { revealed: usize },
    Waiting,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogStep {
    Ignored,
    Skipped,
    NextMessage(usize),
    Completed,
}

/// Typewriter reveal over a list of messages.
///
/// Every transition is driven by the current `state` value alone, so a second
/// Advance in the same tick follows the `Waiting` branch, never `Typing` again.
/// `DialogStep::Completed` is reported once per session; the owner reacts to
/// it instead of registering a callback.
#[derive(Debug)]
pub struct DialogSession {
    messages: Vec<String>,
    index: usize,
    state: DialogState,
    reveal_interval: Duration,
    reveal_elapsed: Duration,
    completion_pending: bool,
}

impl DialogSession {
    pub fn new<I, S>(messages: I, config: &DialogConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let messages: Vec<String> = messages
            .into_iter()
            .map(|message| strip_pause_tokens(message.as_ref()))
            .collect();
        let mut session = Self {
            messages,
            index: 0,
            state: DialogState::Complete,
            reveal_interval: config.reveal_interval(),
            reveal_elapsed: Duration::ZERO,
            completion_pending: false,
        };
        if session.messages.is_empty() {
            session.completion_pending = true;
        } else {
            session.enter_message(0);
        }
        session
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == DialogState::Complete && !self.completion_pending
    }

    #[cfg(test)]
    pub(crate) fn message_index(&self) -> usize {
        self.index
    }

    pub fn current_message(&self) -> &str {
        self.messages
            .get(self.index)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Token-stripped text revealed so far.
    pub fn revealed_text(&self) -> &str {
        let message = self.current_message();
        match self.state {
            DialogState::Typing { revealed } => {
                let end = message
                    .char_indices()
                    .nth(revealed)
                    .map(|(offset, _)| offset)
                    .unwrap_or(message.len());
                &message[..end]
            }
            DialogState::Waiting => message,
            DialogState::Complete => "",
        }
    }

    pub fn display_text(&self, player_name: &str) -> String {
        self.revealed_text().replace(PLAYER_NAME_TOKEN, player_name)
    }

    /// Advances the reveal. An empty session reports its completion here, on
    /// the first tick after creation.
    pub fn tick(&mut self, dt: Duration) -> Option<DialogStep> {
        if self.completion_pending {
            self.completion_pending = false;
            debug!("dialog_completed");
            return Some(DialogStep::Completed);
        }
        let DialogState::Typing { mut revealed } = self.state else {
            return None;
        };
        let total = self.current_message().chars().count();
        self.reveal_elapsed = self.reveal_elapsed.saturating_add(dt);
        while self.reveal_elapsed >= self.reveal_interval && revealed < total {
            self.reveal_elapsed -= self.reveal_interval;
            revealed += 1;
        }
        if revealed >= total {
            self.state = DialogState::Waiting;
            self.reveal_elapsed = Duration::ZERO;
        } else {
            self.state = DialogState::Typing { revealed };
        }
        None
    }

    pub fn advance(&mut self) -> DialogStep {
        match self.state {
            DialogState::Typing { .. } => {
                self.state = DialogState::Waiting;
                self.reveal_elapsed = Duration::ZERO;
                DialogStep::Skipped
            }
            DialogState::Waiting => {
                let next = self.index + 1;
                if next < self.messages.len() {
                    self.enter_message(next);
                    DialogStep::NextMessage(next)
                } else {
                    self.state = DialogState::Complete;
                    debug!(messages = self.messages.len(), "dialog_completed");
                    DialogStep::Completed
                }
            }
            DialogState::Complete => DialogStep::Ignored,
        }
    }

    pub fn force_close(&mut self) -> DialogStep {
        if self.state == DialogState::Complete && !self.completion_pending {
            return DialogStep::Ignored;
        }
        debug!(message_index = self.index, "dialog_force_closed");
        self.state = DialogState::Complete;
        self.completion_pending = false;
        self.reveal_elapsed = Duration::ZERO;
        DialogStep::Completed
    }

    fn enter_message(&mut self, index: usize) {
        self.index = index;
        self.reveal_elapsed = Duration::ZERO;
        self.state = if self.messages[index].is_empty() {
            DialogState::Waiting
        } else {
            DialogState::Typing { revealed: 0 }
        };
    }
}

/// Removes `[PAUSE:<digits>]` markers. Malformed markers are kept as text.
pub fn strip_pause_tokens(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find(PAUSE_TOKEN_PREFIX) {
        out.push_str(&rest[..start]);
        let after_prefix = &rest[start + PAUSE_TOKEN_PREFIX.len()..];
        let digits = after_prefix
            .bytes()
            .take_while(|byte| byte.is_ascii_digit())
            .count();
        if digits > 0 && after_prefix[digits..].starts_with(']') {
            rest = &after_prefix[digits + 1..];
        } else {
            out.push_str(PAUSE_TOKEN_PREFIX);
            rest = after_prefix;
        }
    }
    out.push_str(rest);
    out
}
