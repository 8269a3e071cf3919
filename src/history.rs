/// Every line the operator has entered, in arrival order.
///
/// Lines are stored exactly as read, terminator included. The log only grows:
/// it is owned by the loop driver and lent to the `history` built-in.
#[derive(Debug, Default, Clone)]
pub struct HistoryLog {
    entries: Vec<String>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_arrival_order_and_terminators() {
        let mut history = HistoryLog::new();
        assert!(history.is_empty());

        history.push("ls -l\n");
        history.push("\n");
        history.push("exit");

        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().collect::<Vec<_>>(), ["ls -l\n", "\n", "exit"]);
    }
}
