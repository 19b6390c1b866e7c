//! Static grid geometry: cell kinds, bounds and wall lookup.
//! This module exists so every simulation system shares one immutable view of the board.
//! It does not own entity placement or validation policy.

use crate::config::{BoardConfig, WALL_GLYPH};
use crate::types::Pos;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TileKind {
    Empty,
    Wall,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    tiles: Vec<TileKind>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, tiles: vec![TileKind::Empty; width * height] }
    }

    /// Builds the board from its row strings. Missing cells are treated as walls; the
    /// structural pre-validator reports ragged grids before a board is ever built.
    pub fn from_config(config: &BoardConfig) -> Self {
        let mut board = Self::new(config.width, config.height);
        for y in 0..config.height {
            let row: Vec<char> =
                config.grid.get(y).map(|row| row.chars().collect()).unwrap_or_default();
            for x in 0..config.width {
                let tile = match row.get(x) {
                    Some(&c) if c != WALL_GLYPH => TileKind::Empty,
                    _ => TileKind::Wall,
                };
                board.tiles[y * config.width + x] = tile;
            }
        }
        board
    }

    pub fn tile_at(&self, pos: Pos) -> TileKind {
        if !self.in_bounds(pos) {
            return TileKind::Wall;
        }
        self.tiles[self.index(pos)]
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && (pos.x as usize) < self.width
            && (pos.y as usize) < self.height
    }

    pub fn set_tile(&mut self, pos: Pos, tile: TileKind) {
        if !self.in_bounds(pos) {
            return;
        }
        let idx = self.index(pos);
        self.tiles[idx] = tile;
    }

    pub fn is_wall(&self, pos: Pos) -> bool {
        self.tile_at(pos) == TileKind::Wall
    }

    /// In bounds and not a wall.
    pub fn is_walkable(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && !self.is_wall(pos)
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn wall_count(&self) -> usize {
        self.tiles.iter().filter(|tile| **tile == TileKind::Wall).count()
    }

    pub fn walkable_cells(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width)
                .map(move |x| Pos::new(x as i32, y as i32))
                .filter(|pos| !self.is_wall(*pos))
        })
    }

    fn index(&self, pos: Pos) -> usize {
        (pos.y as usize) * self.width + (pos.x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_reads_walls_row_major() {
        let config = BoardConfig {
            width: 3,
            height: 2,
            grid: vec!["..#".to_string(), "#..".to_string()],
        };
        let board = Board::from_config(&config);
        assert!(board.is_wall(Pos::new(2, 0)));
        assert!(board.is_wall(Pos::new(0, 1)));
        assert!(board.is_walkable(Pos::new(1, 1)));
        assert_eq!(board.wall_count(), 2);
    }

    #[test]
    fn out_of_bounds_reads_as_wall() {
        let board = Board::new(4, 4);
        assert!(!board.in_bounds(Pos::new(-1, 0)));
        assert!(!board.in_bounds(Pos::new(4, 0)));
        assert_eq!(board.tile_at(Pos::new(0, 9)), TileKind::Wall);
        assert!(!board.is_walkable(Pos::new(0, -1)));
    }

    #[test]
    fn ragged_rows_fill_with_walls() {
        let config = BoardConfig { width: 3, height: 2, grid: vec!["..".to_string()] };
        let board = Board::from_config(&config);
        assert!(board.is_wall(Pos::new(2, 0)));
        assert!(board.is_wall(Pos::new(0, 1)));
        assert_eq!(board.walkable_cells().count(), 2);
    }
}
