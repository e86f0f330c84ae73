use super::{Prompt, UiError};

/// A numbered list of choices.
pub struct Menu<T> {
    items: Vec<(String, T)>,
}

impl<T> Menu<T> {
    pub fn new() -> Self {
        Self { items: vec![] }
    }

    pub fn item(mut self, label: impl Into<String>, value: T) -> Self {
        self.push(label, value);
        self
    }

    pub fn push(&mut self, label: impl Into<String>, value: T) {
        self.items.push((label.into(), value));
    }

    /// Show the menu and read a choice until one is valid.
    ///
    /// An empty answer or cancelling returns `None`.
    pub fn choose(self, prompt: &mut dyn Prompt) -> Result<Option<T>, UiError> {
        for (i, (label, _)) in self.items.iter().enumerate() {
            prompt.show(&format!("{:>3}. {label}", i + 1));
        }

        loop {
            let Some(answer) = prompt.line("Choice (empty to go back)")? else {
                return Ok(None);
            };
            let answer = answer.trim();
            if answer.is_empty() {
                return Ok(None);
            }

            match answer.parse::<usize>() {
                Ok(n) if (1..=self.items.len()).contains(&n) => {
                    return Ok(self.items.into_iter().nth(n - 1).map(|(_, value)| value));
                }
                _ => prompt.alert(
                    "Invalid choice",
                    &format!("Please enter a number between 1 and {}", self.items.len()),
                ),
            }
        }
    }
}

/// Read a field, trimmed. `None` if cancelled.
pub fn field(prompt: &mut dyn Prompt, label: &str) -> Result<Option<String>, UiError> {
    Ok(prompt.line(label)?.map(|value| value.trim().to_string()))
}

/// Read several fields in order. `None` if any of them is cancelled.
pub fn fields<const N: usize>(
    prompt: &mut dyn Prompt,
    labels: [&str; N],
) -> Result<Option<[String; N]>, UiError> {
    let mut values: [String; N] = std::array::from_fn(|_| String::new());
    for (value, label) in values.iter_mut().zip(labels) {
        let Some(answer) = field(prompt, label)? else {
            return Ok(None);
        };
        *value = answer;
    }
    Ok(Some(values))
}

/// Read a field, keeping `current` if the answer is empty.
pub fn field_or(
    prompt: &mut dyn Prompt,
    label: &str,
    current: &str,
) -> Result<Option<String>, UiError> {
    let label = if current.is_empty() {
        label.to_string()
    } else {
        format!("{label} [{current}]")
    };
    Ok(field(prompt, &label)?.map(|value| {
        if value.is_empty() {
            current.to_string()
        } else {
            value
        }
    }))
}

pub fn pause(prompt: &mut dyn Prompt) -> Result<(), UiError> {
    prompt.line("Press enter to go back")?;
    Ok(())
}
