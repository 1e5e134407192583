use serde::Serialize;

/// Fixed counting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Minute,
    Hour,
}

impl Window {
    pub fn seconds(self) -> u64 {
        match self {
            Window::Minute => 60,
            Window::Hour => 3600,
        }
    }

    /// `floor(now / window)`.
    pub fn bucket(self, now: u64) -> u64 {
        now / self.seconds()
    }

    /// Seconds until the window containing `now` closes (always ≥ 1).
    pub fn remaining(self, now: u64) -> u64 {
        self.seconds() - now % self.seconds()
    }

    /// A bucket is stale once it ended more than one window ago.
    pub fn is_stale(self, bucket: u64, now: u64) -> bool {
        self.bucket(now).saturating_sub(bucket) >= 2
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Window::Minute => write!(f, "minute"),
            Window::Hour => write!(f, "hour"),
        }
    }
}

/// What a counter is counting for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Client(String),
    Operation {
        method: String,
        path: String,
        client: String,
    },
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Client(client) => write!(f, "client {}", client),
            Scope::Operation { method, path, client } => {
                write!(f, "{} {} for client {}", method, path, client)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CounterKey {
    pub scope: Scope,
    pub window: Window,
    pub bucket: u64,
}
