use bevy::input::touch::{TouchInput, TouchPhase};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::state::TouchPoint;
use super::{PlacementCommand, PlacementSession, PlacementSignal};
use crate::engine::scene::SceneAccess;
use crate::engine::surface::HostSurface;

/// Touches currently down, in the order they went down.
#[derive(Resource, Debug, Default)]
pub struct ActiveTouches {
    touches: Vec<TouchPoint>,
}

impl ActiveTouches {
    pub fn press(&mut self, point: TouchPoint) {
        // A repeated start for a known id replaces it in place.
        match self.touches.iter_mut().find(|t| t.id == point.id) {
            Some(existing) => *existing = point,
            None => self.touches.push(point),
        }
    }

    /// Returns false for touches this list never saw go down.
    pub fn move_to(&mut self, point: TouchPoint) -> bool {
        match self.touches.iter_mut().find(|t| t.id == point.id) {
            Some(existing) => {
                existing.position = point.position;
                true
            }
            None => false,
        }
    }

    pub fn release(&mut self, id: u64) -> bool {
        let before = self.touches.len();
        self.touches.retain(|t| t.id != id);
        self.touches.len() != before
    }

    pub fn as_slice(&self) -> &[TouchPoint] {
        &self.touches
    }
}

fn pointer_over_ui(interactions: &Query<&Interaction>) -> bool {
    interactions.iter().any(|i| *i != Interaction::None)
}

pub fn sync_viewport(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut session: ResMut<PlacementSession>,
) {
    if let Ok(window) = windows.single() {
        session.bypass_change_detection().set_viewport(window.size());
    }
}

pub fn handle_touch_input(
    mut touch_events: EventReader<TouchInput>,
    interactions: Query<&Interaction>,
    mut touches: ResMut<ActiveTouches>,
    mut session: ResMut<PlacementSession>,
    mut scene: SceneAccess,
) {
    for event in touch_events.read() {
        let point = TouchPoint {
            id: event.id,
            position: event.position,
        };
        match event.phase {
            TouchPhase::Started => {
                // Taps on native buttons belong to the UI.
                if pointer_over_ui(&interactions) {
                    continue;
                }
                touches.press(point);
                session.on_touch_start(&mut scene, touches.as_slice());
            }
            TouchPhase::Moved => {
                if touches.move_to(point) {
                    session.on_touch_move(&mut scene, touches.as_slice());
                }
            }
            TouchPhase::Ended | TouchPhase::Canceled => {
                if touches.release(event.id) {
                    session.on_touch_end(&mut scene, touches.as_slice());
                }
            }
        }
    }
    scene.flush();
}

pub fn handle_placement_commands(
    mut commands: EventReader<PlacementCommand>,
    mut session: ResMut<PlacementSession>,
    mut scene: SceneAccess,
) {
    for command in commands.read() {
        debug!("Placement command: {:?}", command);
        match command {
            PlacementCommand::ThumbnailActivated(template_id) => {
                session.on_thumbnail_activated(&mut scene, template_id)
            }
            PlacementCommand::Place => session.on_place_button(&mut scene),
            PlacementCommand::Cancel => session.on_cancel_button(&mut scene),
            PlacementCommand::Delete => session.on_delete_button(&mut scene),
        }
    }
    scene.flush();
}

pub fn update_placement_frame(
    mut session: ResMut<PlacementSession>,
    surface: Res<HostSurface>,
    mut scene: SceneAccess,
) {
    session.update_frame(&mut scene, &*surface);
    scene.flush();
}

pub fn publish_session_signals(
    mut session: ResMut<PlacementSession>,
    mut signals: EventWriter<PlacementSignal>,
) {
    for signal in session.drain_signals() {
        trace!("Session signal: {:?}", signal);
        signals.write(PlacementSignal(signal));
    }
}

/// Desktop stand-in for a touchscreen.
///
/// Left button is one finger, right button is two fingers close together
/// (drag), middle button is two fingers spread around the press point
/// (pinch, horizontal travel widens it).
#[cfg(not(target_arch = "wasm32"))]
pub fn mouse_as_touch(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<(Entity, &Window), With<PrimaryWindow>>,
    interactions: Query<&Interaction>,
    mut emulated: Local<Option<MouseGesture>>,
    mut touch_events: EventWriter<TouchInput>,
) {
    let Ok((window_entity, window)) = windows.single() else {
        return;
    };
    let cursor = window.cursor_position();

    if let Some(gesture) = *emulated {
        let released = !buttons.pressed(gesture.button);
        let phase = if released {
            TouchPhase::Ended
        } else {
            TouchPhase::Moved
        };
        let at = cursor.unwrap_or(gesture.last);
        for (id, position) in gesture.fingers(at) {
            touch_events.write(synthetic_touch(window_entity, id, position, phase));
        }
        *emulated = if released {
            None
        } else {
            Some(MouseGesture { last: at, ..gesture })
        };
        return;
    }

    let Some(cursor) = cursor else {
        return;
    };
    let Some(button) = [MouseButton::Left, MouseButton::Right, MouseButton::Middle]
        .into_iter()
        .find(|b| buttons.just_pressed(*b))
    else {
        return;
    };
    if pointer_over_ui(&interactions) {
        return;
    }

    let gesture = MouseGesture {
        button,
        press: cursor,
        last: cursor,
    };
    for (id, position) in gesture.fingers(cursor) {
        touch_events.write(synthetic_touch(window_entity, id, position, TouchPhase::Started));
    }
    *emulated = Some(gesture);
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct MouseGesture {
    button: MouseButton,
    press: Vec2,
    last: Vec2,
}

#[cfg(not(target_arch = "wasm32"))]
impl MouseGesture {
    const DRAG_HALF_SPACING: f32 = 20.0;
    const PINCH_HALF_SPACING: f32 = 100.0;

    fn fingers(&self, cursor: Vec2) -> Vec<(u64, Vec2)> {
        match self.button {
            MouseButton::Right => vec![
                (0, cursor - Vec2::X * Self::DRAG_HALF_SPACING),
                (1, cursor + Vec2::X * Self::DRAG_HALF_SPACING),
            ],
            MouseButton::Middle => {
                let half = (Self::PINCH_HALF_SPACING + (cursor.x - self.press.x)).max(1.0);
                vec![
                    (0, self.press - Vec2::X * half),
                    (1, self.press + Vec2::X * half),
                ]
            }
            _ => vec![(0, cursor)],
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn synthetic_touch(window: Entity, id: u64, position: Vec2, phase: TouchPhase) -> TouchInput {
    TouchInput {
        phase,
        position,
        window,
        force: None,
        id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touches_keep_press_order() {
        let mut touches = ActiveTouches::default();
        touches.press(TouchPoint::new(7, 10.0, 10.0));
        touches.press(TouchPoint::new(3, 50.0, 10.0));
        assert!(touches.move_to(TouchPoint::new(7, 12.0, 10.0)));

        let ids: Vec<u64> = touches.as_slice().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![7, 3]);
        assert_eq!(touches.as_slice()[0].position, Vec2::new(12.0, 10.0));

        assert!(touches.release(7));
        assert_eq!(touches.as_slice().len(), 1);
        assert_eq!(touches.as_slice()[0].id, 3);
    }

    #[test]
    fn unknown_touches_are_ignored() {
        let mut touches = ActiveTouches::default();
        assert!(!touches.move_to(TouchPoint::new(1, 0.0, 0.0)));
        assert!(!touches.release(1));
        assert!(touches.as_slice().is_empty());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn emulated_pinch_widens_with_horizontal_travel() {
        let gesture = MouseGesture {
            button: MouseButton::Middle,
            press: Vec2::new(400.0, 300.0),
            last: Vec2::new(400.0, 300.0),
        };
        let start = gesture.fingers(Vec2::new(400.0, 300.0));
        let wider = gesture.fingers(Vec2::new(450.0, 300.0));
        let spacing = |f: &[(u64, Vec2)]| f[0].1.distance(f[1].1);

        assert_eq!(spacing(&start), 200.0);
        assert_eq!(spacing(&wider), 300.0);
    }
}
