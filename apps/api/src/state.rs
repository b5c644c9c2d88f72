use reposignal_application::{CommandService, NudgeService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub command_service: CommandService,
    pub nudge_service: NudgeService,
}
