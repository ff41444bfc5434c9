use bevy::prelude::*;

use super::state::SessionSignal;
use super::{PlacementCommand, PlacementSignal};
use crate::engine::catalog::Catalog;

#[derive(Component)]
pub struct PlacementPanel;

#[derive(Component)]
pub struct ThumbnailStrip;

#[derive(Component)]
pub struct ThumbnailButton(pub String);

#[derive(Component)]
pub struct PlacementControls;

#[derive(Component)]
pub struct StatusText;

#[derive(Component)]
pub struct DeleteButton;

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlButton {
    Place,
    Cancel,
    Delete,
}

impl ControlButton {
    fn command(self) -> PlacementCommand {
        match self {
            Self::Place => PlacementCommand::Place,
            Self::Cancel => PlacementCommand::Cancel,
            Self::Delete => PlacementCommand::Delete,
        }
    }

    fn idle_colour(self) -> Color {
        match self {
            Self::Place => Color::srgb(0.10, 0.40, 0.18),
            Self::Cancel => Color::srgb(0.22, 0.24, 0.28),
            Self::Delete => Color::srgb(0.28, 0.10, 0.10),
        }
    }
}

const BUTTON_IDLE: Color = Color::srgb(0.22, 0.24, 0.28);
const BUTTON_HOVER: Color = Color::srgb(0.26, 0.28, 0.32);
const BUTTON_PRESSED: Color = Color::srgb(0.18, 0.20, 0.24);

fn button_node(width: Val) -> Node {
    Node {
        width,
        height: Val::Px(36.0),
        padding: UiRect::horizontal(Val::Px(12.0)),
        display: Display::Flex,
        align_items: AlignItems::Center,
        justify_content: JustifyContent::Center,
        border: UiRect::all(Val::Px(1.0)),
        ..default()
    }
}

fn label(text: impl Into<String>) -> impl Bundle {
    (
        Text::new(text),
        TextFont { font_size: 16.0, ..default() },
        TextColor(Color::srgb(1.0, 1.0, 1.0)),
    )
}

// Bottom panel: status line, Place/Cancel row, catalog strip. The delete
// button floats and is positioned from the delete affordance anchor.
pub fn spawn_placement_ui(mut commands: Commands) {
    commands
        .spawn((
            PlacementPanel,
            Name::new("PlacementPanel"),
            BackgroundColor(Color::srgba(0.10, 0.11, 0.13, 0.85)),
            Node {
                width: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                left: Val::Px(0.0),
                bottom: Val::Px(0.0),
                padding: UiRect::all(Val::Px(12.0)),
                row_gap: Val::Px(8.0),
                display: Display::Flex,
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::Center,
                ..default()
            },
        ))
        .with_children(|panel| {
            panel.spawn((StatusText, Name::new("Status"), label("")));

            panel
                .spawn((
                    PlacementControls,
                    Name::new("PlacementControls"),
                    Node {
                        display: Display::None,
                        column_gap: Val::Px(8.0),
                        ..default()
                    },
                ))
                .with_children(|row| {
                    let controls = [
                        (ControlButton::Place, "Place"),
                        (ControlButton::Cancel, "Cancel"),
                    ];
                    for (button, text) in controls {
                        row.spawn((
                            button,
                            Button,
                            Name::new(text),
                            BackgroundColor(button.idle_colour()),
                            BorderColor(Color::srgba(0.0, 0.0, 0.0, 0.25)),
                            button_node(Val::Px(120.0)),
                        ))
                        .with_children(|btn| {
                            btn.spawn(label(text));
                        });
                    }
                });

            panel.spawn((
                ThumbnailStrip,
                Name::new("Catalog"),
                Node {
                    width: Val::Percent(100.0),
                    column_gap: Val::Px(8.0),
                    flex_wrap: FlexWrap::Wrap,
                    justify_content: JustifyContent::Center,
                    ..default()
                },
            ));
        });

    commands
        .spawn((
            DeleteButton,
            ControlButton::Delete,
            Button,
            Name::new("DeleteButton"),
            BackgroundColor(ControlButton::Delete.idle_colour()),
            BorderColor(Color::srgba(0.0, 0.0, 0.0, 0.25)),
            Node {
                position_type: PositionType::Absolute,
                display: Display::None,
                ..button_node(Val::Auto)
            },
        ))
        .with_children(|btn| {
            btn.spawn(label("Delete"));
        });
}

pub fn spawn_catalog_buttons(
    mut commands: Commands,
    catalog: Res<Catalog>,
    strips: Query<Entity, With<ThumbnailStrip>>,
) {
    let Ok(strip) = strips.single() else {
        return;
    };
    commands.entity(strip).with_children(|strip| {
        for item in &catalog.items {
            strip
                .spawn((
                    ThumbnailButton(item.id.clone()),
                    Button,
                    Name::new(format!("Thumbnail:{}", item.id)),
                    BackgroundColor(BUTTON_IDLE),
                    BorderColor(Color::srgba(0.0, 0.0, 0.0, 0.25)),
                    button_node(Val::Auto),
                ))
                .with_children(|btn| {
                    btn.spawn(label(item.id.clone()));
                });
        }
    });
}

pub fn thumbnail_button_interaction(
    mut q: Query<
        (&Interaction, &ThumbnailButton, &mut BackgroundColor),
        (Changed<Interaction>, With<Button>),
    >,
    mut commands: EventWriter<PlacementCommand>,
) {
    for (interaction, ThumbnailButton(template_id), mut bg) in &mut q {
        match *interaction {
            Interaction::Pressed => {
                commands.write(PlacementCommand::ThumbnailActivated(template_id.clone()));
                *bg = BackgroundColor(BUTTON_PRESSED);
            }
            Interaction::Hovered => *bg = BackgroundColor(BUTTON_HOVER),
            Interaction::None => *bg = BackgroundColor(BUTTON_IDLE),
        }
    }
}

pub fn control_button_interaction(
    mut q: Query<
        (&Interaction, &ControlButton, &mut BackgroundColor),
        (Changed<Interaction>, With<Button>),
    >,
    mut commands: EventWriter<PlacementCommand>,
) {
    for (interaction, button, mut bg) in &mut q {
        match *interaction {
            Interaction::Pressed => {
                commands.write(button.command());
                *bg = BackgroundColor(BUTTON_PRESSED);
            }
            Interaction::Hovered => *bg = BackgroundColor(BUTTON_HOVER),
            Interaction::None => *bg = BackgroundColor(button.idle_colour()),
        }
    }
}

pub fn reflect_placement_signals(
    mut signals: EventReader<PlacementSignal>,
    mut status: Query<&mut Text, With<StatusText>>,
    mut nodes: ParamSet<(
        Query<&mut Node, With<PlacementControls>>,
        Query<&mut Node, With<DeleteButton>>,
    )>,
) {
    for PlacementSignal(signal) in signals.read() {
        match signal {
            SessionSignal::Status(message) => {
                let line = message.as_ref().map(ToString::to_string).unwrap_or_default();
                for mut text in &mut status {
                    text.0 = line.clone();
                }
            }
            SessionSignal::PlacementControls { visible } => {
                if let Ok(mut n) = nodes.p0().single_mut() {
                    n.display = if *visible { Display::Flex } else { Display::None };
                }
            }
            SessionSignal::DeleteAffordance { anchor } => {
                if let Ok(mut n) = nodes.p1().single_mut() {
                    match anchor {
                        Some(at) => {
                            n.display = Display::Flex;
                            n.left = Val::Px(at.x.max(0.0));
                            n.top = Val::Px(at.y.max(0.0));
                        }
                        None => n.display = Display::None,
                    }
                }
            }
            SessionSignal::SelectionChanged(_)
            | SessionSignal::ItemPlaced(_)
            | SessionSignal::ItemDeleted(_) => {}
        }
    }
}
