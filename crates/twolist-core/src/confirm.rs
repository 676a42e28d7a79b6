//! Yes/no confirmation before destructive operations

/// Asks the user a yes/no question and blocks until answered
pub trait Confirm {
    fn confirm(&mut self, title: &str, message: &str) -> bool;
}

/// An answer obtained before the call, e.g. from a modal dialog or `--yes`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Confirm for Answer {
    fn confirm(&mut self, _title: &str, _message: &str) -> bool {
        matches!(self, Answer::Yes)
    }
}

impl<F> Confirm for F
where
    F: FnMut(&str, &str) -> bool,
{
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        self(title, message)
    }
}
