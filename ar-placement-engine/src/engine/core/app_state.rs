use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    /// Waiting on the catalog manifest.
    #[default]
    Loading,
    Running,
}

pub fn log_running(mut transitions: EventReader<StateTransitionEvent<AppState>>) {
    for transition in transitions.read() {
        if transition.entered == Some(AppState::Running) {
            info!("→ Catalog ready, transitioning to Running state");
        }
    }
}
