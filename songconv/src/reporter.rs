use log::Level;
use std::cell::RefCell;

/// Sink for everything the converter has to say about a song.
pub trait Reporter {
    fn emit(&self, level: Level, message: &str);

    /// Progress lines shown regardless of verbosity.
    fn progress(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }

    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }
}

/// Forwards to the `log` facade; progress goes to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn emit(&self, level: Level, message: &str) {
        log::log!(level, "{}", message);
    }

    fn progress(&self, message: &str) {
        println!("{}", message);
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: RefCell<Vec<(Level, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(Level, String)> {
        self.events.borrow().clone()
    }

    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn emit(&self, level: Level, message: &str) {
        self.events.borrow_mut().push((level, message.to_string()));
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn emit(&self, level: Level, message: &str) {
        (**self).emit(level, message);
    }

    fn progress(&self, message: &str) {
        (**self).progress(message);
    }
}
