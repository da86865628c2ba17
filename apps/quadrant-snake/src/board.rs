//! Board module - snake movement and food placement
//!
//! The board is a fixed 48x27 grid that wraps on all four edges.
//! Coordinates: (x, y) with x in 0..48 (left to right), y in 0..27 (top to bottom).
//! The snake is stored tail first, head last.

use std::collections::VecDeque;

use quadrant_app::Rgb;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Board width in cells
pub const BOARD_WIDTH: i32 = 48;
/// Board height in cells
pub const BOARD_HEIGHT: i32 = 27;

/// Darkest channel value of a random color, keeping segments visible on black
const MIN_CHANNEL: u8 = 32;

/// A board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Neighbor one step in `direction`, wrapping around the edges
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: (self.x + dx).rem_euclid(BOARD_WIDTH),
            y: (self.y + dy).rem_euclid(BOARD_HEIGHT),
        }
    }
}

/// Movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

/// One snake segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub cell: Cell,
    pub color: Rgb,
}

/// Result of moving the snake one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Moved,
    /// The head ran into the body; the game is over
    Collided,
}

/// The game board
#[derive(Debug, Clone)]
pub struct Board<R = SmallRng> {
    /// Tail at the front, head at the back
    snake: VecDeque<Segment>,
    direction: Direction,
    food: Cell,
    rng: R,
}

impl Board<SmallRng> {
    /// Create a board seeded from the OS
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }
}

impl Default for Board<SmallRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Board<R> {
    /// Two segments in the middle of the board heading up, with food placed
    pub fn with_rng(rng: R) -> Self {
        let mut board = Self {
            snake: VecDeque::new(),
            direction: Direction::Up,
            food: Cell::new(0, 0),
            rng,
        };

        for cell in [Cell::new(23, 13), Cell::new(23, 12)] {
            let color = board.random_color();
            board.snake.push_back(Segment { cell, color });
        }
        board.place_food();
        board
    }

    pub fn head(&self) -> Cell {
        self.snake.back().map_or(Cell::new(0, 0), |s| s.cell)
    }

    pub fn food(&self) -> Cell {
        self.food
    }

    pub fn len(&self) -> usize {
        self.snake.len()
    }

    /// Segments from tail to head
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.snake.iter()
    }

    /// Change direction; turning straight back is ignored
    pub fn set_direction(&mut self, direction: Direction) {
        if direction != self.direction.opposite() {
            self.direction = direction;
        }
    }

    /// Move the tail segment in front of the head
    ///
    /// The segment keeps its color. Landing on any segment other than the one
    /// that is now the tail ends the game.
    pub fn step(&mut self) -> Move {
        let next = self.head().step(self.direction);

        let Some(mut tail) = self.snake.pop_front() else {
            return Move::Collided;
        };
        tail.cell = next;

        // The segment now at the tail is exempt, as it moves next
        let collided = self.snake.iter().skip(1).any(|s| s.cell == next);
        self.snake.push_back(tail);

        if collided {
            Move::Collided
        } else {
            Move::Moved
        }
    }

    /// Whether the head sits on the food
    pub fn got_food(&self) -> bool {
        self.head() == self.food
    }

    /// Add a segment on top of the current tail
    pub fn grow(&mut self) {
        let Some(tail) = self.snake.front().map(|s| s.cell) else {
            return;
        };
        let color = self.random_color();
        self.snake.push_front(Segment { cell: tail, color });
    }

    /// Put food on a random cell outside the body
    ///
    /// The head is not checked; food under the head is eaten on the next tick.
    pub fn place_food(&mut self) {
        loop {
            let cell = Cell::new(
                self.rng.gen_range(0..BOARD_WIDTH),
                self.rng.gen_range(0..BOARD_HEIGHT),
            );
            let body = self.snake.len().saturating_sub(1);
            if !self.snake.iter().take(body).any(|s| s.cell == cell) {
                self.food = cell;
                return;
            }
        }
    }

    /// Random color with every channel in [32, 255]
    pub fn random_color(&mut self) -> Rgb {
        Rgb::new(
            self.rng.gen_range(MIN_CHANNEL..=u8::MAX),
            self.rng.gen_range(MIN_CHANNEL..=u8::MAX),
            self.rng.gen_range(MIN_CHANNEL..=u8::MAX),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::with_rng(SmallRng::seed_from_u64(7))
    }

    fn cells(board: &Board) -> Vec<Cell> {
        board.segments().map(|s| s.cell).collect()
    }

    #[test]
    fn starts_heading_up() {
        let board = board();
        assert_eq!(board.len(), 2);
        assert_eq!(board.head(), Cell::new(23, 12));
        assert_eq!(cells(&board)[0], Cell::new(23, 13));
        assert_eq!(board.direction, Direction::Up);
    }

    #[test]
    fn reversing_is_ignored() {
        let mut board = board();
        board.set_direction(Direction::Down);
        assert_eq!(board.direction, Direction::Up);

        board.set_direction(Direction::Left);
        assert_eq!(board.direction, Direction::Left);
        board.set_direction(Direction::Right);
        assert_eq!(board.direction, Direction::Left);
    }

    #[test]
    fn tail_moves_to_front() {
        let mut board = board();
        assert_eq!(board.step(), Move::Moved);
        assert_eq!(cells(&board), vec![Cell::new(23, 12), Cell::new(23, 11)]);
    }

    #[test]
    fn segment_keeps_color_when_moving() {
        let mut board = board();
        let tail_color = board.segments().next().unwrap().color;
        board.step();
        assert_eq!(board.segments().last().unwrap().color, tail_color);
    }

    #[test]
    fn wraps_on_every_edge() {
        assert_eq!(Cell::new(5, 0).step(Direction::Up), Cell::new(5, 26));
        assert_eq!(Cell::new(5, 26).step(Direction::Down), Cell::new(5, 0));
        assert_eq!(Cell::new(0, 5).step(Direction::Left), Cell::new(47, 5));
        assert_eq!(Cell::new(47, 5).step(Direction::Right), Cell::new(0, 5));
    }

    #[test]
    fn snake_crosses_top_edge() {
        let mut board = board();
        for _ in 0..13 {
            assert_eq!(board.step(), Move::Moved);
        }
        assert_eq!(board.head(), Cell::new(23, 26));
    }

    #[test]
    fn growing_duplicates_tail() {
        let mut board = board();
        let tail = cells(&board)[0];
        board.grow();
        assert_eq!(board.len(), 3);
        assert_eq!(cells(&board)[0], tail);
        assert_eq!(cells(&board)[1], tail);

        // The duplicate separates on the next step
        board.step();
        let after = cells(&board);
        assert_eq!(after.len(), 3);
        assert_eq!(after[0], tail);
        assert_eq!(after[2], Cell::new(23, 11));
    }

    #[test]
    fn running_into_body_collides() {
        let mut board = board();
        for _ in 0..4 {
            board.grow();
        }
        // Six segments in a straight line going up, then turn back into it
        for _ in 0..5 {
            board.step();
        }
        board.set_direction(Direction::Left);
        assert_eq!(board.step(), Move::Moved);
        board.set_direction(Direction::Down);
        assert_eq!(board.step(), Move::Moved);
        board.set_direction(Direction::Right);
        assert_eq!(board.step(), Move::Collided);
    }

    #[test]
    fn chasing_the_tail_is_allowed() {
        let mut board = board();
        for _ in 0..3 {
            board.grow();
        }
        for _ in 0..4 {
            board.step();
        }
        board.set_direction(Direction::Left);
        board.step();
        board.set_direction(Direction::Down);
        board.step();
        board.set_direction(Direction::Right);
        // Lands on the segment that is now the tail
        assert_eq!(board.step(), Move::Moved);
        assert_eq!(board.head(), cells(&board)[0]);
    }

    #[test]
    fn food_never_lands_on_body() {
        let mut board = board();
        for _ in 0..20 {
            board.grow();
        }
        for _ in 0..200 {
            board.place_food();
            let food = board.food();
            assert!((0..BOARD_WIDTH).contains(&food.x));
            assert!((0..BOARD_HEIGHT).contains(&food.y));
            let body = board.len() - 1;
            assert!(!board.segments().take(body).any(|s| s.cell == food));
        }
    }

    #[test]
    fn eating_is_detected() {
        let mut board = board();
        board.food = Cell::new(23, 11);
        assert!(!board.got_food());
        board.step();
        assert!(board.got_food());
    }

    #[test]
    fn random_colors_stay_bright() {
        let mut board = board();
        for _ in 0..500 {
            let color = board.random_color();
            assert!(color.r >= 32 && color.g >= 32 && color.b >= 32);
        }
    }
}
