//! Character grid mutated by the data stream
//!
//! Positions are linear indexes (`row * cols + col`, 0-based). Every write
//! grows the dirty region so listeners can repaint only what changed.

use super::codes::{
    is_attribute_byte, ATTR_5250_NORMAL, ATTR_NON_DISPLAY_BITS, ATTR_REVERSE, ATTR_UNDERLINE,
};

/// Null cell content
pub const NULL_CHAR: char = '\0';

/// Foreground colors selectable through extended attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Green,
    White,
    Red,
    Turquoise,
    Yellow,
    Pink,
    Blue,
}

impl Color {
    /// Color implied by a basic attribute byte
    pub fn from_attribute(attribute: u8) -> Color {
        let alternate = attribute & 0x02 != 0;
        match attribute & 0x38 {
            0x20 if alternate => Color::White,
            0x28 => Color::Red,
            0x30 if alternate => Color::Yellow,
            0x30 => Color::Turquoise,
            0x38 if alternate => Color::Blue,
            0x38 => Color::Pink,
            _ => Color::Green,
        }
    }

    /// Color from a write-extended-attribute foreground value
    pub fn from_foreground(value: u8) -> Option<Color> {
        match value & 0x07 {
            0x01 => Some(Color::Blue),
            0x02 => Some(Color::Red),
            0x03 => Some(Color::Pink),
            0x04 => Some(Color::Green),
            0x05 => Some(Color::Turquoise),
            0x06 => Some(Color::Yellow),
            0x07 => Some(Color::White),
            _ => None,
        }
    }
}

/// Highlighting applied on top of the basic attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExtendedAttribute {
    pub color: Option<Color>,
    pub reverse: bool,
    pub high_intensity: bool,
    pub underline: bool,
    pub blink: bool,
    pub column_separator: bool,
    pub non_display: bool,
    pub ideographic: bool,
}

impl ExtendedAttribute {
    /// Decode the display bits of an attribute byte
    ///
    /// Within 0x20..=0x3F the low three bits select reverse, underline and
    /// non-display, while the upper bits select the color group. Blink and
    /// column separators only exist in particular groups.
    pub fn from_attribute_byte(attribute: u8) -> Self {
        let non_display = attribute & ATTR_NON_DISPLAY_BITS == ATTR_NON_DISPLAY_BITS;
        let group = attribute & 0x38;
        Self {
            color: Some(Color::from_attribute(attribute)),
            reverse: !non_display && attribute & ATTR_REVERSE != 0,
            high_intensity: !non_display && group == 0x20 && attribute & 0x02 != 0,
            underline: !non_display && attribute & ATTR_UNDERLINE != 0,
            blink: !non_display && group == 0x28 && attribute & 0x02 != 0,
            column_separator: !non_display && group == 0x30,
            non_display,
            ideographic: false,
        }
    }
}

/// One screen position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    /// Basic attribute in effect at this position
    pub attribute: u8,
    pub extended: Option<ExtendedAttribute>,
    /// Position holds an attribute byte rather than data
    pub is_attribute_position: bool,
    /// Second half of a double-width character
    pub wide_tail: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: NULL_CHAR,
            attribute: ATTR_5250_NORMAL,
            extended: None,
            is_attribute_position: false,
            wide_tail: false,
        }
    }
}

impl Cell {
    /// Character as it should be shown
    pub fn display_char(&self) -> char {
        if self.is_attribute_position || self.ch == NULL_CHAR || self.ch.is_control() {
            return ' ';
        }
        let hidden = self.extended.map(|ext| ext.non_display).unwrap_or(false);
        if hidden || self.attribute & ATTR_NON_DISPLAY_BITS == ATTR_NON_DISPLAY_BITS {
            return ' ';
        }
        self.ch
    }
}

/// Tightest rectangle covering every mutated cell, inclusive bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirtyRegion {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

impl DirtyRegion {
    pub fn cell(row: usize, col: usize) -> Self {
        Self {
            top: row,
            left: col,
            bottom: row,
            right: col,
        }
    }

    pub fn include(&mut self, row: usize, col: usize) {
        self.top = self.top.min(row);
        self.left = self.left.min(col);
        self.bottom = self.bottom.max(row);
        self.right = self.right.max(col);
    }

    pub fn union(&self, other: &DirtyRegion) -> DirtyRegion {
        DirtyRegion {
            top: self.top.min(other.top),
            left: self.left.min(other.left),
            bottom: self.bottom.max(other.bottom),
            right: self.right.max(other.right),
        }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.top..=self.bottom).contains(&row) && (self.left..=self.right).contains(&col)
    }
}

/// Fixed-size grid of cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenBuffer {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    cursor: usize,
    dirty: Option<DirtyRegion>,
}

impl ScreenBuffer {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::default(); rows * cols],
            cursor: 0,
            dirty: None,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Linear position for 0-based coordinates
    pub fn position(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    /// 0-based coordinates of a linear position
    pub fn coords(&self, pos: usize) -> (usize, usize) {
        (pos / self.cols, pos % self.cols)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.position(row, col).and_then(|pos| self.cells.get(pos))
    }

    pub fn cell_at(&self, pos: usize) -> Option<&Cell> {
        self.cells.get(pos)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_coords(&self) -> (usize, usize) {
        self.coords(self.cursor)
    }

    /// Move the cursor; positions past the end wrap to the top
    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos % self.capacity().max(1);
    }

    /// Replace a cell and mark it dirty
    pub fn set_cell(&mut self, pos: usize, cell: Cell) {
        if let Some(slot) = self.cells.get_mut(pos) {
            *slot = cell;
            self.mark_dirty(pos);
        }
    }

    /// Store a data character, clearing any attribute marker
    pub fn write_char(&mut self, pos: usize, ch: char, attribute: u8, extended: Option<ExtendedAttribute>) {
        self.set_cell(
            pos,
            Cell {
                ch,
                attribute,
                extended,
                is_attribute_position: false,
                wide_tail: false,
            },
        );
    }

    /// Replace only the character, keeping the cell's attributes
    pub fn put_char(&mut self, pos: usize, ch: char) {
        if let Some(cell) = self.cells.get(pos).copied() {
            self.set_cell(
                pos,
                Cell {
                    ch,
                    is_attribute_position: false,
                    wide_tail: false,
                    ..cell
                },
            );
        }
    }

    /// Store the tail half of a double-width character
    pub fn write_wide_tail(&mut self, pos: usize, attribute: u8, extended: Option<ExtendedAttribute>) {
        self.set_cell(
            pos,
            Cell {
                ch: NULL_CHAR,
                attribute,
                extended,
                is_attribute_position: false,
                wide_tail: true,
            },
        );
    }

    /// Store an attribute byte; the position displays as blank
    pub fn write_attribute(&mut self, pos: usize, attribute: u8) {
        debug_assert!(is_attribute_byte(attribute));
        self.set_cell(
            pos,
            Cell {
                ch: NULL_CHAR,
                attribute,
                extended: None,
                is_attribute_position: true,
                wide_tail: false,
            },
        );
    }

    /// Null the characters from `from` through `to` inclusive
    pub fn erase(&mut self, from: usize, to: usize, keep_attributes: bool) {
        let end = to.min(self.capacity().saturating_sub(1));
        for pos in from..=end {
            let Some(cell) = self.cells.get(pos).copied() else {
                break;
            };
            let erased = if keep_attributes && cell.is_attribute_position {
                cell
            } else {
                Cell {
                    attribute: if keep_attributes { cell.attribute } else { ATTR_5250_NORMAL },
                    ..Cell::default()
                }
            };
            self.set_cell(pos, erased);
        }
    }

    /// Reset every cell and the cursor; the whole screen becomes dirty
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
        self.cursor = 0;
        self.mark_all_dirty();
    }

    /// Change geometry, discarding content
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
        self.cells = vec![Cell::default(); rows * cols];
        self.cursor = 0;
        self.dirty = None;
        self.mark_all_dirty();
    }

    /// Scroll rows `top..=bottom` by `lines` (positive moves content down)
    pub fn roll(&mut self, top: usize, bottom: usize, lines: isize) {
        if top > bottom || bottom >= self.rows || lines == 0 {
            return;
        }
        let height = bottom - top + 1;
        let shift = lines.unsigned_abs().min(height);
        let cols = self.cols;
        let start = top * cols;
        let region = &mut self.cells[start..(bottom + 1) * cols];
        if lines > 0 {
            region.rotate_right(shift * cols);
            region[..shift * cols].fill(Cell::default());
        } else {
            region.rotate_left(shift * cols);
            let len = region.len();
            region[len - shift * cols..].fill(Cell::default());
        }
        self.include_region(DirtyRegion {
            top,
            left: 0,
            bottom,
            right: cols - 1,
        });
    }

    /// Text of one row with attribute and null positions blanked
    pub fn row_text(&self, row: usize) -> String {
        if row >= self.rows {
            return String::new();
        }
        self.cells[row * self.cols..(row + 1) * self.cols]
            .iter()
            .filter(|cell| !cell.wide_tail)
            .map(Cell::display_char)
            .collect()
    }

    /// Whole screen as newline-separated rows
    pub fn screen_text(&self) -> String {
        (0..self.rows).map(|row| self.row_text(row)).collect::<Vec<_>>().join("\n")
    }

    /// Raw characters of a range, nulls preserved
    pub fn text_range(&self, from: usize, len: usize) -> String {
        self.cells
            .iter()
            .skip(from)
            .take(len)
            .filter(|cell| !cell.wide_tail)
            .map(|cell| cell.ch)
            .collect()
    }

    pub fn dirty_region(&self) -> Option<DirtyRegion> {
        self.dirty
    }

    /// Return and reset the accumulated dirty region
    pub fn take_dirty(&mut self) -> Option<DirtyRegion> {
        self.dirty.take()
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = None;
    }

    fn mark_dirty(&mut self, pos: usize) {
        let (row, col) = self.coords(pos);
        match &mut self.dirty {
            Some(region) => region.include(row, col),
            None => self.dirty = Some(DirtyRegion::cell(row, col)),
        }
    }

    /// Merge a rectangle into the dirty region
    pub fn include_region(&mut self, rect: DirtyRegion) {
        self.dirty = Some(match self.dirty {
            Some(region) => region.union(&rect),
            None => rect,
        });
    }

    fn mark_all_dirty(&mut self) {
        if self.rows == 0 || self.cols == 0 {
            return;
        }
        self.include_region(DirtyRegion {
            top: 0,
            left: 0,
            bottom: self.rows - 1,
            right: self.cols - 1,
        });
    }
}

impl Default for ScreenBuffer {
    fn default() -> Self {
        Self::new(24, 80)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib5250::codes::ATTR_5250_NONDISP;

    #[test]
    fn test_position_round_trip() {
        let screen = ScreenBuffer::new(24, 80);
        assert_eq!(screen.position(1, 2), Some(82));
        assert_eq!(screen.coords(82), (1, 2));
        assert_eq!(screen.position(24, 0), None);
        assert_eq!(screen.position(0, 80), None);
    }

    #[test]
    fn test_dirty_region_is_bounding_rectangle() {
        let mut screen = ScreenBuffer::new(24, 80);
        assert_eq!(screen.dirty_region(), None);
        screen.write_char(screen.position(3, 10).unwrap(), 'A', ATTR_5250_NORMAL, None);
        screen.write_char(screen.position(7, 2).unwrap(), 'B', ATTR_5250_NORMAL, None);
        assert_eq!(
            screen.dirty_region(),
            Some(DirtyRegion {
                top: 3,
                left: 2,
                bottom: 7,
                right: 10
            })
        );
        screen.clear_dirty();
        assert_eq!(screen.dirty_region(), None);
    }

    #[test]
    fn test_attribute_position_displays_blank() {
        let mut screen = ScreenBuffer::new(24, 80);
        screen.write_attribute(0, 0x24);
        screen.write_char(1, 'X', 0x24, None);
        assert!(screen.cell(0, 0).unwrap().is_attribute_position);
        assert!(screen.row_text(0).starts_with(" X"));
    }

    #[test]
    fn test_attribute_byte_decoding() {
        let red_blink = ExtendedAttribute::from_attribute_byte(0x2A);
        assert_eq!(red_blink.color, Some(Color::Red));
        assert!(red_blink.blink);
        assert!(!red_blink.reverse);

        let white_underline = ExtendedAttribute::from_attribute_byte(0x26);
        assert_eq!(white_underline.color, Some(Color::White));
        assert!(white_underline.underline && white_underline.high_intensity);

        assert!(ExtendedAttribute::from_attribute_byte(ATTR_5250_NONDISP).non_display);
        assert!(ExtendedAttribute::from_attribute_byte(0x3F).non_display);
        assert_eq!(Color::from_attribute(0x3A), Color::Blue);
        assert!(ExtendedAttribute::from_attribute_byte(0x31).column_separator);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut screen = ScreenBuffer::new(24, 80);
        screen.write_char(100, 'Q', ATTR_5250_NORMAL, None);
        screen.set_cursor(100);
        screen.clear();
        let once = screen.clone();
        screen.clear();
        assert_eq!(screen, once);
        assert_eq!(screen.cursor(), 0);
    }

    #[test]
    fn test_roll_up_and_down() {
        let mut screen = ScreenBuffer::new(4, 3);
        for row in 0..4 {
            let pos = screen.position(row, 0).unwrap();
            screen.write_char(pos, char::from(b'a' + row as u8), ATTR_5250_NORMAL, None);
        }
        screen.roll(1, 3, -1);
        assert_eq!(screen.row_text(0), "a  ");
        assert_eq!(screen.row_text(1), "c  ");
        assert_eq!(screen.row_text(2), "d  ");
        assert_eq!(screen.row_text(3), "   ");

        screen.roll(0, 3, 2);
        assert_eq!(screen.row_text(0), "   ");
        assert_eq!(screen.row_text(2), "a  ");
    }

    #[test]
    fn test_erase_keeps_attribute_positions() {
        let mut screen = ScreenBuffer::new(2, 10);
        screen.write_attribute(0, 0x22);
        screen.write_char(1, 'A', 0x22, None);
        screen.erase(0, 5, true);
        assert!(screen.cell_at(0).unwrap().is_attribute_position);
        assert_eq!(screen.cell_at(1).unwrap().ch, NULL_CHAR);
        assert_eq!(screen.cell_at(1).unwrap().attribute, 0x22);
    }

    #[test]
    fn test_resize_to_wide() {
        let mut screen = ScreenBuffer::default();
        screen.resize(27, 132);
        assert_eq!(screen.capacity(), 27 * 132);
        assert_eq!(screen.row_text(26).len(), 132);
    }
}
