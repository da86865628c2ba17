//! Snake application on top of the quad renderer.

use tracing::info;

use quadrant_app::{
    AppContext, ElementState, KeyCode, KeyEvent, PhysicalKey, QuadApp, RectShape, Rgb,
    WindowEvent,
};

use crate::board::{Board, Direction, Move, BOARD_HEIGHT, BOARD_WIDTH};

/// Game state driven by the runner.
pub struct Snake {
    board: Board,
    food_color: Rgb,
    game_over: bool,
    quit: bool,
}

impl Snake {
    /// Pixel size of one board cell for a `width` x `height` output.
    ///
    /// Integer division, so a sliver on the right and bottom may stay black.
    pub fn cell_size(width: u32, height: u32) -> (f32, f32) {
        (
            (width / BOARD_WIDTH as u32) as f32,
            (height / BOARD_HEIGHT as u32) as f32,
        )
    }

    fn steer(&mut self, key: KeyCode) -> bool {
        let direction = match key {
            KeyCode::ArrowUp => Direction::Up,
            KeyCode::ArrowDown => Direction::Down,
            KeyCode::ArrowLeft => Direction::Left,
            KeyCode::ArrowRight => Direction::Right,
            KeyCode::Escape => {
                self.quit = true;
                return true;
            }
            _ => return false,
        };
        self.board.set_direction(direction);
        true
    }
}

impl QuadApp for Snake {
    fn init(ctx: &AppContext) -> anyhow::Result<Self> {
        let (width, height) = ctx.size();
        let (cell_w, cell_h) = Self::cell_size(width, height);
        info!("Board {BOARD_WIDTH}x{BOARD_HEIGHT}, cells {cell_w}x{cell_h} px");

        Ok(Self {
            board: Board::new(),
            food_color: Rgb::RED,
            game_over: false,
            quit: false,
        })
    }

    fn tick(&mut self, _ctx: &AppContext) {
        if self.game_over {
            return;
        }

        if self.board.step() == Move::Collided {
            info!("Game over, final length {}", self.board.len());
            self.game_over = true;
            return;
        }

        self.food_color = self.board.random_color();

        if self.board.got_food() {
            self.board.grow();
            self.board.place_food();
        }
    }

    fn draw(&self, ctx: &mut AppContext) {
        let (width, height) = ctx.size();
        let (cell_w, cell_h) = Self::cell_size(width, height);

        let cell_shape = |x: i32, y: i32, color: Rgb| {
            RectShape::new(x as f32 * cell_w, y as f32 * cell_h, cell_w, cell_h, color)
        };

        for segment in self.board.segments() {
            ctx.draw(cell_shape(segment.cell.x, segment.cell.y, segment.color));
        }

        let food = self.board.food();
        ctx.draw(cell_shape(food.x, food.y, self.food_color));
    }

    fn on_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.steer(*key),
            _ => false,
        }
    }

    fn should_exit(&self) -> bool {
        self.quit || self.game_over
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_forty_pixels_at_1080p() {
        assert_eq!(Snake::cell_size(1920, 1080), (40.0, 40.0));
        assert_eq!(Snake::cell_size(960, 540), (20.0, 20.0));
    }

    #[test]
    fn cell_size_rounds_down() {
        assert_eq!(Snake::cell_size(1000, 600), (20.0, 22.0));
    }
}
