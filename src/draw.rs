//! Two-bit cell packing for tic-tac-toe style boards.
//!
//! Every cell is one of three symbols and fits in a 2-bit field. A byte holds
//! four cells at bit offsets 0, 2, 4 and 6 (index 0 is the least significant
//! pair). [`PackedCells`] extends the same layout to any unsigned integer, so
//! a `u32` holds a full 4×4 board.

use core::{fmt, mem};
use num_traits::{PrimInt, Unsigned, Zero};

/// Number of cells packed into one byte.
pub const CELLS_PER_BYTE: usize = 4;

const FIELD_MASK: u8 = 0b11;

/// Errors returned by the packed cell codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawError {
    /// A field held the reserved code `0b11`.
    InvalidCode { code: u8, index: usize },
    /// Cell index is outside the container.
    IndexOutOfBounds { index: usize, capacity: usize },
}

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawError::InvalidCode { code, index } => {
                write!(f, "InvalidCode: field {} holds reserved code {:#04b}", index, code)
            }
            DrawError::IndexOutOfBounds { index, capacity } => {
                write!(f, "IndexOutOfBounds: index={}, capacity={}", index, capacity)
            }
        }
    }
}

/// Content of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Symbol {
    #[default]
    Empty,
    X,
    O,
}

impl Symbol {
    /// All valid symbols in code order.
    pub const ALL: [Symbol; 3] = [Symbol::Empty, Symbol::X, Symbol::O];

    /// The 2-bit packed code.
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            Symbol::Empty => 0b00,
            Symbol::X => 0b01,
            Symbol::O => 0b10,
        }
    }

    /// Maps a raw 2-bit field back to a symbol. `index` is only used to
    /// annotate the error.
    pub const fn from_code(code: u8, index: usize) -> Result<Self, DrawError> {
        match code {
            0b00 => Ok(Symbol::Empty),
            0b01 => Ok(Symbol::X),
            0b10 => Ok(Symbol::O),
            _ => Err(DrawError::InvalidCode { code, index }),
        }
    }

    /// Text form used by rendered boards.
    #[inline]
    pub const fn as_char(self) -> char {
        match self {
            Symbol::Empty => ' ',
            Symbol::X => 'X',
            Symbol::O => 'O',
        }
    }

    pub const fn from_char(ch: char) -> Option<Self> {
        match ch {
            ' ' => Some(Symbol::Empty),
            'X' => Some(Symbol::X),
            'O' => Some(Symbol::O),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[inline]
const fn shift(index: usize) -> usize {
    (index & (CELLS_PER_BYTE - 1)) << 1
}

/// Writes `symbol` into field `index` (0..4) of `byte`, leaving the other
/// three fields untouched.
///
/// `index` must be below [`CELLS_PER_BYTE`]; this is checked in debug builds
/// only.
#[inline]
pub fn encode(byte: &mut u8, symbol: Symbol, index: usize) {
    debug_assert!(index < CELLS_PER_BYTE, "cell index {} out of range", index);
    let shift = shift(index);
    *byte = (*byte & !(FIELD_MASK << shift)) | (symbol.code() << shift);
}

/// Extracts the raw 2-bit field at `index`.
#[inline]
pub fn decode_bits(byte: u8, index: usize) -> u8 {
    debug_assert!(index < CELLS_PER_BYTE, "cell index {} out of range", index);
    (byte >> shift(index)) & FIELD_MASK
}

/// Decodes field `index` of `byte` into a symbol.
pub fn decode_symbol(byte: u8, index: usize) -> Result<Symbol, DrawError> {
    Symbol::from_code(decode_bits(byte, index), index)
}

/// A row of 2-bit cells packed into the unsigned integer `T`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PackedCells<T>
where
    T: PrimInt + Unsigned + Zero,
{
    bits: T,
}

impl<T> PackedCells<T>
where
    T: PrimInt + Unsigned + Zero,
{
    /// Number of cells the container holds.
    pub const CAPACITY: usize = mem::size_of::<T>() * 8 / 2;

    /// All cells empty.
    #[inline]
    pub fn new() -> Self {
        PackedCells { bits: T::zero() }
    }

    /// Wraps a raw value after checking that no field carries the reserved
    /// code.
    pub fn from_raw(raw: T) -> Result<Self, DrawError> {
        let cells = PackedCells { bits: raw };
        for index in 0..Self::CAPACITY {
            Symbol::from_code(cells.field(index), index)?;
        }
        Ok(cells)
    }

    #[inline]
    pub fn into_raw(self) -> T {
        self.bits
    }

    /// Builds a container from symbols in cell order.
    pub fn from_symbols<I>(symbols: I) -> Result<Self, DrawError>
    where
        I: IntoIterator<Item = Symbol>,
    {
        let mut cells = Self::new();
        for (index, symbol) in symbols.into_iter().enumerate() {
            cells.set(index, symbol)?;
        }
        Ok(cells)
    }

    pub fn get(&self, index: usize) -> Result<Symbol, DrawError> {
        self.check_bounds(index)?;
        Symbol::from_code(self.field(index), index)
    }

    pub fn set(&mut self, index: usize, symbol: Symbol) -> Result<(), DrawError> {
        self.check_bounds(index)?;
        let shift = index << 1;
        let mask = T::from(FIELD_MASK).unwrap_or_else(T::zero) << shift;
        let code = T::from(symbol.code()).unwrap_or_else(T::zero) << shift;
        self.bits = (self.bits & !mask) | code;
        Ok(())
    }

    /// Number of non-empty cells.
    pub fn count_occupied(&self) -> usize {
        self.iter().filter(|s| *s != Symbol::Empty).count()
    }

    /// Iterator over all cells in index order.
    pub fn iter(&self) -> Cells<'_, T> {
        Cells { cells: self, idx: 0 }
    }

    #[inline]
    fn field(&self, index: usize) -> u8 {
        let raw = (self.bits >> (index << 1)) & T::from(FIELD_MASK).unwrap_or_else(T::zero);
        raw.to_u8().unwrap_or(FIELD_MASK)
    }

    #[inline]
    fn check_bounds(&self, index: usize) -> Result<(), DrawError> {
        if index >= Self::CAPACITY {
            Err(DrawError::IndexOutOfBounds {
                index,
                capacity: Self::CAPACITY,
            })
        } else {
            Ok(())
        }
    }
}

impl<T> Default for PackedCells<T>
where
    T: PrimInt + Unsigned + Zero,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PackedCells<T>
where
    T: PrimInt + Unsigned + Zero + fmt::Binary,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackedCells({:#b})", self.bits)
    }
}

/// Renders each cell as its text form, `?` for a reserved code.
impl<T> fmt::Display for PackedCells<T>
where
    T: PrimInt + Unsigned + Zero,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in 0..Self::CAPACITY {
            let ch = Symbol::from_code(self.field(index), index)
                .map(Symbol::as_char)
                .unwrap_or('?');
            write!(f, "{}", ch)?;
        }
        Ok(())
    }
}

/// Iterator over the cells of a [`PackedCells`]. Reserved codes are yielded
/// as [`Symbol::Empty`]; use [`PackedCells::get`] to detect them.
pub struct Cells<'a, T>
where
    T: PrimInt + Unsigned + Zero,
{
    cells: &'a PackedCells<T>,
    idx: usize,
}

impl<'a, T> Iterator for Cells<'a, T>
where
    T: PrimInt + Unsigned + Zero,
{
    type Item = Symbol;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= PackedCells::<T>::CAPACITY {
            return None;
        }
        let index = self.idx;
        self.idx += 1;
        Some(self.cells.get(index).unwrap_or(Symbol::Empty))
    }
}

pub mod aliases {
    use super::PackedCells;

    /// Four cells in one byte.
    pub type PackedByte = PackedCells<u8>;
    /// A 4×4 board in `u32`.
    pub type Packed4x4 = PackedCells<u32>;
}
