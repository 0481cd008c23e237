//! Neighborhood masks
//!
//! A mask describes the required solidity of the 3×3 block around a tile,
//! row-major with the tile itself at index 4. Two named masks select fully
//! solid blocks by whether the tile is also surrounded at distance 2.

use std::fmt;
use std::str::FromStr;

use crate::MaskError;

/// Requirement for one cell of the 3×3 block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskCell {
    /// `x`: anything
    Any,
    /// `0`: not solid, or solid but ignored
    Empty,
    /// `1`: solid and not ignored
    Solid,
}

impl MaskCell {
    pub fn as_char(self) -> char {
        match self {
            MaskCell::Any => 'x',
            MaskCell::Empty => '0',
            MaskCell::Solid => '1',
        }
    }

    pub fn accepts(self, counts_as_solid: bool) -> bool {
        match self {
            MaskCell::Any => true,
            MaskCell::Empty => !counts_as_solid,
            MaskCell::Solid => counts_as_solid,
        }
    }
}

impl TryFrom<char> for MaskCell {
    type Error = MaskError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'x' | 'X' => Ok(MaskCell::Any),
            '0' => Ok(MaskCell::Empty),
            '1' => Ok(MaskCell::Solid),
            other => Err(MaskError::Cell(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mask {
    Pattern([MaskCell; 9]),
    /// Fully solid and surrounded
    Center,
    /// Fully solid but not surrounded
    Padding,
}

impl Mask {
    pub const FULL: [MaskCell; 9] = [MaskCell::Solid; 9];

    /// The 3×3 requirement, which is all-solid for the named masks
    pub fn cells(&self) -> &[MaskCell; 9] {
        match self {
            Mask::Pattern(cells) => cells,
            Mask::Center | Mask::Padding => &Self::FULL,
        }
    }
}

impl FromStr for Mask {
    type Err = MaskError;

    /// Accepts `center`, `padding`, or nine cells with optional `-` row
    /// separators (`x0x-111-x1x`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "center" => return Ok(Mask::Center),
            "padding" => return Ok(Mask::Padding),
            _ => {}
        }

        let cells: Vec<MaskCell> = s
            .chars()
            .filter(|&c| c != '-')
            .map(MaskCell::try_from)
            .collect::<Result<_, _>>()?;
        let count = cells.len();
        cells
            .try_into()
            .map(Mask::Pattern)
            .map_err(|_| MaskError::Length(count))
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mask::Center => f.write_str("center"),
            Mask::Padding => f.write_str("padding"),
            Mask::Pattern(cells) => {
                for (i, cell) in cells.iter().enumerate() {
                    if i > 0 && i % 3 == 0 {
                        f.write_str("-")?;
                    }
                    write!(f, "{}", cell.as_char())?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_masks() {
        assert_eq!("center".parse::<Mask>(), Ok(Mask::Center));
        assert_eq!("padding".parse::<Mask>(), Ok(Mask::Padding));
        assert_eq!(Mask::Center.cells(), &Mask::FULL);
    }

    #[test]
    fn test_parse_with_and_without_separators() {
        let plain: Mask = "x0x111x1x".parse().unwrap();
        let separated: Mask = "x0x-111-x1x".parse().unwrap();
        assert_eq!(plain, separated);

        let cells = plain.cells();
        assert_eq!(cells[0], MaskCell::Any);
        assert_eq!(cells[1], MaskCell::Empty);
        assert_eq!(cells[4], MaskCell::Solid);
        assert_eq!(separated.to_string(), "x0x-111-x1x");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("x0x-111".parse::<Mask>(), Err(MaskError::Length(6)));
        assert_eq!("x0x-121-x1x".parse::<Mask>(), Err(MaskError::Cell('2')));
        assert_eq!("".parse::<Mask>(), Err(MaskError::Length(0)));
    }

    #[test]
    fn test_cell_acceptance() {
        assert!(MaskCell::Any.accepts(true));
        assert!(MaskCell::Any.accepts(false));
        assert!(MaskCell::Empty.accepts(false));
        assert!(!MaskCell::Empty.accepts(true));
        assert!(MaskCell::Solid.accepts(true));
        assert!(!MaskCell::Solid.accepts(false));
    }
}
