//! Selected positions of a vector
//!
//! A selection is either STATIC, the contiguous range `[start, start + size)`,
//! or DYNAMIC, the first `size` entries of an owned position buffer. Callers
//! traverse it through `for_each` and friends so both states behave alike.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Static,
    Dynamic,
}

#[derive(Clone, Copy)]
enum Positions<'a> {
    Incremental { start: usize },
    Buffer(&'a [usize]),
}

/// Borrowed window over a selection
///
/// Valid only while the vector it was taken from is left untouched.
#[derive(Clone, Copy)]
pub struct SelectionView<'a> {
    positions: Positions<'a>,
    size: usize,
}

impl<'a> SelectionView<'a> {
    /// Identity selection `[0, size)`
    pub fn unfiltered(size: usize) -> Self {
        Self {
            positions: Positions::Incremental { start: 0 },
            size,
        }
    }

    /// Selection over explicit positions
    pub fn from_positions(positions: &'a [usize]) -> Self {
        Self {
            positions: Positions::Buffer(positions),
            size: positions.len(),
        }
    }

    #[inline]
    pub fn get_selected_size(&self) -> usize {
        self.size
    }

    pub fn is_unfiltered(&self) -> bool {
        matches!(self.positions, Positions::Incremental { start: 0 })
    }

    pub fn is_static(&self) -> bool {
        matches!(self.positions, Positions::Incremental { .. })
    }

    /// `i`-th selected position
    #[inline]
    pub fn get(&self, i: usize) -> usize {
        crate::ku_assert!(i < self.size);
        match self.positions {
            Positions::Incremental { start } => start + i,
            Positions::Buffer(buffer) => buffer[i],
        }
    }

    #[inline]
    pub fn for_each<F: FnMut(usize)>(&self, mut f: F) {
        match self.positions {
            Positions::Incremental { start } => (start..start + self.size).for_each(f),
            Positions::Buffer(buffer) => buffer[..self.size].iter().for_each(|&pos| f(pos)),
        }
    }

    /// Visit positions until `f` returns false; returns whether every call returned true
    #[inline]
    pub fn for_each_break_when_false<F: FnMut(usize) -> bool>(&self, mut f: F) -> bool {
        match self.positions {
            Positions::Incremental { start } => (start..start + self.size).all(f),
            Positions::Buffer(buffer) => buffer[..self.size].iter().all(|&pos| f(pos)),
        }
    }

    /// Visit positions, stopping at the first error
    pub fn try_for_each<E, F: FnMut(usize) -> Result<(), E>>(&self, mut f: F) -> Result<(), E> {
        let mut error = None;
        self.for_each_break_when_false(|pos| match f(pos) {
            Ok(()) => true,
            Err(e) => {
                error = Some(e);
                false
            }
        });
        error.map_or(Ok(()), Err)
    }

    /// Sub-window of `len` positions starting at the `offset`-th selected one
    pub fn slice(&self, offset: usize, len: usize) -> SelectionView<'a> {
        crate::ku_assert!(offset + len <= self.size);
        let positions = match self.positions {
            Positions::Incremental { start } => Positions::Incremental {
                start: start + offset,
            },
            Positions::Buffer(buffer) => Positions::Buffer(&buffer[offset..offset + len]),
        };
        SelectionView {
            positions,
            size: len,
        }
    }

    pub fn to_vec(&self) -> Vec<usize> {
        let mut positions = Vec::with_capacity(self.size);
        self.for_each(|pos| positions.push(pos));
        positions
    }
}

impl fmt::Debug for SelectionView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

/// Owned selection with a position buffer of fixed capacity
#[derive(Clone, PartialEq, Eq)]
pub struct SelectionVector {
    state: SelectionState,
    start: usize,
    selected_size: usize,
    buffer: Vec<usize>,
}

impl SelectionVector {
    /// Unfiltered selection of all `capacity` positions
    pub fn new(capacity: usize) -> Self {
        Self {
            state: SelectionState::Static,
            start: 0,
            selected_size: capacity,
            buffer: vec![0; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    #[inline]
    pub fn get_selected_size(&self) -> usize {
        self.selected_size
    }

    pub fn set_selected_size(&mut self, size: usize) {
        crate::ku_assert!(size <= self.capacity());
        self.selected_size = size;
    }

    pub fn inc_selected_size(&mut self, n: usize) {
        self.set_selected_size(self.selected_size + n);
    }

    pub fn is_unfiltered(&self) -> bool {
        self.state == SelectionState::Static && self.start == 0
    }

    /// Back to the identity selection, keeping the selected size
    pub fn set_to_unfiltered(&mut self) {
        self.state = SelectionState::Static;
        self.start = 0;
    }

    pub fn set_to_unfiltered_with(&mut self, size: usize) {
        self.set_to_unfiltered();
        self.set_selected_size(size);
    }

    /// Select the contiguous range `[start, start + size)`
    pub fn set_range(&mut self, start: usize, size: usize) {
        crate::ku_assert!(start + size <= self.capacity());
        self.state = SelectionState::Static;
        self.start = start;
        self.selected_size = size;
    }

    /// Switch to the position buffer without touching its contents
    pub fn set_to_filtered(&mut self) {
        self.state = SelectionState::Dynamic;
    }

    pub fn set_to_filtered_with(&mut self, size: usize) {
        self.set_to_filtered();
        self.set_selected_size(size);
    }

    /// Switch to the position buffer, materialising the current range into it
    pub fn make_dynamic(&mut self) {
        if self.state == SelectionState::Static {
            for i in 0..self.selected_size {
                self.buffer[i] = self.start + i;
            }
        }
        self.set_to_filtered();
    }

    /// Whole position buffer, for writing filtered positions
    pub fn get_mutable_buffer(&mut self) -> &mut [usize] {
        &mut self.buffer
    }

    /// Mutable `i`-th position; the selection must be dynamic
    pub fn get_mut(&mut self, i: usize) -> &mut usize {
        crate::ku_assert!(self.state == SelectionState::Dynamic);
        &mut self.buffer[i]
    }

    #[inline]
    pub fn get(&self, i: usize) -> usize {
        self.view().get(i)
    }

    #[inline]
    pub fn view(&self) -> SelectionView<'_> {
        let positions = match self.state {
            SelectionState::Static => Positions::Incremental { start: self.start },
            SelectionState::Dynamic => Positions::Buffer(&self.buffer[..self.selected_size]),
        };
        SelectionView {
            positions,
            size: self.selected_size,
        }
    }

    pub fn slice(&self, offset: usize, len: usize) -> SelectionView<'_> {
        self.view().slice(offset, len)
    }

    #[inline]
    pub fn for_each<F: FnMut(usize)>(&self, f: F) {
        self.view().for_each(f)
    }

    #[inline]
    pub fn for_each_break_when_false<F: FnMut(usize) -> bool>(&self, f: F) -> bool {
        self.view().for_each_break_when_false(f)
    }

    pub fn try_for_each<E, F: FnMut(usize) -> Result<(), E>>(&self, f: F) -> Result<(), E> {
        self.view().try_for_each(f)
    }

    /// Copy another selection's positions and state
    pub fn set_from(&mut self, other: &SelectionView<'_>) {
        crate::ku_assert!(other.get_selected_size() <= self.capacity());
        match other.positions {
            Positions::Incremental { start } => self.set_range(start, other.size),
            Positions::Buffer(buffer) => {
                self.buffer[..other.size].copy_from_slice(&buffer[..other.size]);
                self.set_to_filtered_with(other.size);
            }
        }
    }
}

impl fmt::Debug for SelectionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionVector")
            .field("state", &self.state)
            .field("positions", &self.view())
            .finish()
    }
}
