use cgmath::Vector2;
use iced::advanced::image::Renderer as _;
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Program};
use iced::widget::image::Handle;
use iced::{Point, Rectangle, Renderer, Size, Theme};

use crate::state::viewer::{captures_scroll, ScrollDirection};
use crate::Message;

/// Draws the current item fitted to the viewer, then zoomed around the
/// center and shifted by the pan offset.
pub struct ImageCanvas<'a> {
    pub handle: &'a Handle,
    /// Known pixel dimensions, if the backend could read them
    pub dimensions: Option<(u32, u32)>,
    pub zoom: f32,
    pub pan: Vector2<f32>,
}

impl ImageCanvas<'_> {
    /// Where the image lands inside `bounds` (frame coordinates)
    fn placement(&self, bounds: Size, natural: Size) -> Rectangle {
        let fitted = if natural.width > 0.0 && natural.height > 0.0 {
            let scale = (bounds.width / natural.width).min(bounds.height / natural.height);
            Size::new(natural.width * scale, natural.height * scale)
        } else {
            bounds
        };

        let zoomed = Size::new(fitted.width * self.zoom, fitted.height * self.zoom);
        Rectangle::new(
            Point::new(
                (bounds.width - zoomed.width) / 2.0 + self.pan.x,
                (bounds.height - zoomed.height) / 2.0 + self.pan.y,
            ),
            zoomed,
        )
    }
}

impl Program<Message> for ImageCanvas<'_> {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let natural = match self.dimensions {
            Some((width, height)) => Size::new(width as f32, height as f32),
            None => {
                let measured = renderer.measure_image(self.handle);
                Size::new(measured.width as f32, measured.height as f32)
            }
        };

        frame.draw_image(self.placement(bounds.size(), natural), self.handle);
        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Zoom around the pointer, only when it is over the image
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if !captures_scroll(cursor.is_over(bounds), true) {
                    return (canvas::event::Status::Ignored, None);
                }
                let Some(position) = cursor.position_in(bounds) else {
                    return (canvas::event::Status::Ignored, None);
                };
                let y = match delta {
                    mouse::ScrollDelta::Lines { y, .. } | mouse::ScrollDelta::Pixels { y, .. } => y,
                };
                if y == 0.0 {
                    return (canvas::event::Status::Ignored, None);
                }
                let direction = if y > 0.0 {
                    ScrollDirection::In
                } else {
                    ScrollDirection::Out
                };
                return (
                    canvas::event::Status::Captured,
                    Some(Message::ViewerWheel {
                        direction,
                        pointer: Vector2::new(position.x, position.y),
                        area: Vector2::new(bounds.width, bounds.height),
                    }),
                );
            }

            // Drag only starts when zoomed in
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if self.zoom > 1.0 && cursor.is_over(bounds) {
                    if let Some(pos) = cursor.position() {
                        state.is_dragging = true;
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::ViewerPress(Vector2::new(pos.x, pos.y))),
                        );
                    }
                }
            }

            // Released anywhere, even outside the viewer
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging {
                    state.is_dragging = false;
                    return (canvas::event::Status::Captured, Some(Message::ViewerRelease));
                }
            }

            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.is_dragging {
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::ViewerDrag(Vector2::new(position.x, position.y))),
                    );
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(&self, state: &Self::State, bounds: Rectangle, cursor: Cursor) -> mouse::Interaction {
        if state.is_dragging {
            mouse::Interaction::Grabbing
        } else if self.zoom > 1.0 && cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
}
