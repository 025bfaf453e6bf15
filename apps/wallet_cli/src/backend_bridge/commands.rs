//! Backend commands queued from the shell to the backend worker.

use session_core::SessionIntent;

#[derive(Debug)]
pub enum BackendCommand {
    Run(SessionIntent),
    Status,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Run(intent) => intent.name(),
            Self::Status => "status",
        }
    }
}
