// "<name> is typing..." indicator with the cycling dots animation

#[derive(Debug, Clone)]
pub struct TypingIndicator {
    user_name: String,
    is_typing: bool,
    dots: usize,
}

impl TypingIndicator {
    pub fn new(user_name: &str) -> Self {
        TypingIndicator {
            user_name: user_name.to_string(),
            is_typing: false,
            dots: 1,
        }
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    /// Starting or stopping always restarts the animation at one dot
    pub fn set_typing(&mut self, typing: bool) {
        self.is_typing = typing;
        self.dots = 1;
    }

    /// Advance the animation one frame: "." -> ".." -> "..." -> "."
    pub fn tick(&mut self) {
        if !self.is_typing {
            return;
        }
        self.dots = if self.dots >= 3 { 1 } else { self.dots + 1 };
    }

    /// None while the contact is not typing
    pub fn label(&self) -> Option<String> {
        if !self.is_typing {
            return None;
        }
        Some(format!("{} is typing{}", self.user_name, ".".repeat(self.dots)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dots_cycle() {
        let mut indicator = TypingIndicator::new("Emily Davis");
        assert_eq!(indicator.label(), None);

        indicator.set_typing(true);
        let frames: Vec<String> = (0..4)
            .map(|_| {
                let label = indicator.label().unwrap_or_default();
                indicator.tick();
                label
            })
            .collect();

        assert_eq!(
            frames,
            vec![
                "Emily Davis is typing.",
                "Emily Davis is typing..",
                "Emily Davis is typing...",
                "Emily Davis is typing.",
            ]
        );
    }

    #[test]
    fn test_tick_while_idle_does_nothing() {
        let mut indicator = TypingIndicator::new("Mike Chen");
        indicator.tick();
        indicator.set_typing(true);
        assert_eq!(indicator.label().as_deref(), Some("Mike Chen is typing."));
    }
}
