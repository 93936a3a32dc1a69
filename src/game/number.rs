// Number transfer demo state

#[derive(Debug, Clone, Default)]
pub struct NumberState {
    pub local_value: i64,
    pub received_value: Option<i64>,
    /// Text being edited in the numeric input field
    pub input: String,
    pub channel_ready: bool,
}

impl NumberState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value and the text shown for it
    pub fn set_local_value(&mut self, value: i64) {
        self.local_value = value;
        self.input = value.to_string();
    }

    /// Accept digits anywhere and a minus sign only in front.
    /// A character that would push the value outside i64 is rejected.
    pub fn push_char(&mut self, c: char) -> bool {
        if !(c.is_ascii_digit() || (c == '-' && self.input.is_empty())) {
            return false;
        }
        let mut candidate = self.input.clone();
        candidate.push(c);
        match parse_input(&candidate) {
            Some(value) => {
                self.input = candidate;
                self.local_value = value;
                true
            }
            None => false,
        }
    }

    pub fn backspace(&mut self) {
        self.input.pop();
        self.local_value = parse_input(&self.input).unwrap_or(0);
    }

    pub fn receive(&mut self, value: i64) {
        self.received_value = Some(value);
    }
}

/// Value of the input field; empty and a lone minus sign both mean 0
fn parse_input(input: &str) -> Option<i64> {
    match input {
        "" | "-" => Some(0),
        text => text.parse().ok(),
    }
}
