//! Navigation seam used by redirecting gates

/// Performs a navigation. Implemented by the presentation layer's router.
pub trait Navigator: Send {
    /// Navigate to `path`
    fn navigate(&mut self, path: &str);
}

/// Navigator that only records the paths it was asked to visit
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator {
    visited: Vec<String>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths visited so far, oldest first
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// The most recent navigation target
    pub fn last(&self) -> Option<&str> {
        self.visited.last().map(String::as_str)
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, path: &str) {
        self.visited.push(path.to_string());
    }
}
