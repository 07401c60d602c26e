/// Evaluation settings shared by every script a runner starts.
#[derive(Debug, Clone)]
pub struct Config {
    /// Evaluation steps between two checks of the cancel request
    pub interrupt_check_interval: u32,

    /// Deepest allowed nesting of script function calls
    pub max_call_depth: usize,

    /// Deepest allowed nesting of brackets, operators and statements within
    /// one piece of source or one function body
    pub max_nesting_depth: usize,

    /// Whether the value of the last expression is appended to the output
    pub echo_result: bool,

    /// Line appended to the output when a script is cancelled
    pub interrupted_marker: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interrupt_check_interval: 1000,
            max_call_depth: 200,
            max_nesting_depth: 128,
            echo_result: true,
            interrupted_marker: "Interrupted.".to_string(),
        }
    }
}

impl Config {
    /// Create a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many evaluation steps pass between cancellation checks.
    /// Zero is treated as one.
    pub fn interrupt_check_interval(mut self, steps: u32) -> Self {
        self.interrupt_check_interval = steps.max(1);
        self
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Zero is treated as one.
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth.max(1);
        self
    }

    pub fn echo_result(mut self, echo: bool) -> Self {
        self.echo_result = echo;
        self
    }

    pub fn interrupted_marker(mut self, marker: impl Into<String>) -> Self {
        self.interrupted_marker = marker.into();
        self
    }
}
