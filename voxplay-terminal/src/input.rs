/// Terminal events mapped to camera actions
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use voxplay_core::Movement;

/// Degrees turned per arrow key press
pub const LOOK_STEP: f32 = 3.0;

/// Approximate pixel size of a terminal cell, so mouse sensitivity matches a window
pub const CELL_WIDTH: f32 = 8.0;
pub const CELL_HEIGHT: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Move(Movement),
    /// Turn by degrees
    Look { yaw: f32, pitch: f32 },
    /// Mouse position in pixels
    MouseAt { x: f32, y: f32 },
    Resize { width: u16, height: u16 },
    Quit,
}

pub fn map_event(event: &Event) -> Option<Action> {
    match event {
        Event::Key(key) => map_key(key),
        Event::Mouse(mouse) => map_mouse(mouse),
        Event::Resize(width, height) => Some(Action::Resize {
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

fn map_key(key: &KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let movement = |set: fn(&mut Movement), boost: bool| {
        let mut movement = Movement {
            boost: boost || shift,
            ..Movement::default()
        };
        set(&mut movement);
        Some(Action::Move(movement))
    };

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char(c @ ('w' | 'W')) => movement(|m| m.forward = true, c.is_uppercase()),
        KeyCode::Char(c @ ('s' | 'S')) => movement(|m| m.backward = true, c.is_uppercase()),
        KeyCode::Char(c @ ('a' | 'A')) => movement(|m| m.left = true, c.is_uppercase()),
        KeyCode::Char(c @ ('d' | 'D')) => movement(|m| m.right = true, c.is_uppercase()),
        KeyCode::Left => Some(Action::Look {
            yaw: -LOOK_STEP,
            pitch: 0.0,
        }),
        KeyCode::Right => Some(Action::Look {
            yaw: LOOK_STEP,
            pitch: 0.0,
        }),
        KeyCode::Up => Some(Action::Look {
            yaw: 0.0,
            pitch: LOOK_STEP,
        }),
        KeyCode::Down => Some(Action::Look {
            yaw: 0.0,
            pitch: -LOOK_STEP,
        }),
        _ => None,
    }
}

fn map_mouse(mouse: &MouseEvent) -> Option<Action> {
    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => Some(Action::MouseAt {
            x: f32::from(mouse.column) * CELL_WIDTH,
            y: f32::from(mouse.row) * CELL_HEIGHT,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyEventState, MouseButton};

    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_movement_keys() {
        let forward = map_event(&key(KeyCode::Char('w'), KeyModifiers::NONE));
        assert_eq!(
            forward,
            Some(Action::Move(Movement {
                forward: true,
                ..Movement::default()
            }))
        );

        // Shift arrives either as an uppercase char or as a modifier
        for event in [
            key(KeyCode::Char('D'), KeyModifiers::NONE),
            key(KeyCode::Char('d'), KeyModifiers::SHIFT),
        ] {
            assert_eq!(
                map_event(&event),
                Some(Action::Move(Movement {
                    right: true,
                    boost: true,
                    ..Movement::default()
                }))
            );
        }
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(
            map_event(&key(KeyCode::Esc, KeyModifiers::NONE)),
            Some(Action::Quit)
        );
        assert_eq!(
            map_event(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(map_event(&key(KeyCode::Char('c'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_key_release_is_ignored() {
        let release = Event::Key(KeyEvent {
            code: KeyCode::Char('w'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(map_event(&release), None);
    }

    #[test]
    fn test_arrows_look() {
        assert_eq!(
            map_event(&key(KeyCode::Up, KeyModifiers::NONE)),
            Some(Action::Look {
                yaw: 0.0,
                pitch: LOOK_STEP
            })
        );
    }

    #[test]
    fn test_mouse_and_resize() {
        let moved = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Drag(MouseButton::Left),
            column: 10,
            row: 3,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(
            map_event(&moved),
            Some(Action::MouseAt { x: 80.0, y: 48.0 })
        );
        assert_eq!(
            map_event(&Event::Resize(120, 40)),
            Some(Action::Resize {
                width: 120,
                height: 40
            })
        );
    }
}
