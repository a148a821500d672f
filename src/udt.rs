//! User defined lookup tables

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::deck::{DeckKeyword, DeckRecord};
use crate::error::{DeckError, HandlerError, TableError};

/// Boundary policy of a user defined table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationType {
    /// Step to the closest tabulated point, "NV"
    NearestNeighbour,
    /// Linear inside, held at the end values outside, "LC"
    LinearClamp,
    /// Linear inside and outside, "LL"
    LinearExtrapolate,
}

crate::persist_enum!(InterpolationType {
    NearestNeighbour = 1,
    LinearClamp = 2,
    LinearExtrapolate = 3,
});

impl FromStr for InterpolationType {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NV" => Ok(Self::NearestNeighbour),
            "LC" => Ok(Self::LinearClamp),
            "LL" => Ok(Self::LinearExtrapolate),
            other => Err(TableError::UnknownInterpolation(other.to_string())),
        }
    }
}

impl fmt::Display for InterpolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::NearestNeighbour => "NV",
            Self::LinearClamp => "LC",
            Self::LinearExtrapolate => "LL",
        };
        f.write_str(code)
    }
}

/// One dimensional lookup table over strictly ascending points
///
/// Tables are validated once at construction and are immutable afterwards,
/// so evaluation never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Udt {
    xs: Vec<f64>,
    ys: Vec<f64>,
    interpolation: InterpolationType,
}

crate::persist_fields!(Udt {
    xs,
    ys,
    interpolation,
});

impl Udt {
    /// Create a validated table
    pub fn new(xs: Vec<f64>, ys: Vec<f64>, interpolation: InterpolationType) -> Result<Self, TableError> {
        if xs.len() != ys.len() {
            return Err(TableError::LengthMismatch {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        if xs.len() < 2 {
            return Err(TableError::TooFewPoints { count: xs.len() });
        }
        if let Some(index) = xs.windows(2).position(|pair| !(pair[0] < pair[1])) {
            return Err(TableError::NotAscending { index: index + 1 });
        }

        Ok(Self {
            xs,
            ys,
            interpolation,
        })
    }

    pub fn interpolation(&self) -> InterpolationType {
        self.interpolation
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Evaluate the table at `x`
    pub fn eval(&self, x: f64) -> f64 {
        let last = self.xs.len() - 1;

        // Index of the first point strictly above x, clamped into [1, last].
        let upper = self.xs.partition_point(|xi| *xi <= x).clamp(1, last);
        let lower = upper - 1;

        match self.interpolation {
            InterpolationType::NearestNeighbour => {
                if x <= self.xs[0] {
                    self.ys[0]
                } else if x >= self.xs[last] {
                    self.ys[last]
                } else if x - self.xs[lower] < self.xs[upper] - x {
                    self.ys[lower]
                } else {
                    self.ys[upper]
                }
            }
            InterpolationType::LinearClamp => {
                if x <= self.xs[0] {
                    self.ys[0]
                } else if x >= self.xs[last] {
                    self.ys[last]
                } else {
                    self.linear(lower, upper, x)
                }
            }
            InterpolationType::LinearExtrapolate => self.linear(lower, upper, x),
        }
    }

    fn linear(&self, lower: usize, upper: usize, x: f64) -> f64 {
        let (x0, x1) = (self.xs[lower], self.xs[upper]);
        let (y0, y1) = (self.ys[lower], self.ys[upper]);
        if x == x0 {
            return y0;
        }
        if x == x1 {
            return y1;
        }
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

/// Sizing parameters for user defined tables from UDTDIMS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdtParams {
    max_dimensions: i32,
}

impl Default for UdtParams {
    fn default() -> Self {
        Self { max_dimensions: 1 }
    }
}

impl UdtParams {
    /// Read the parameters from a UDTDIMS keyword
    ///
    /// The remaining items are capacity hints that the engine does not need.
    pub fn from_keyword(keyword: &DeckKeyword) -> Result<Self, TableError> {
        let max_dimensions = keyword
            .record(0)
            .and_then(|record| record.item("MAX_DIMENSIONS").and_then(|item| item.get_int(0)))
            .unwrap_or(1);
        Self::new(max_dimensions)
    }

    pub fn new(max_dimensions: i32) -> Result<Self, TableError> {
        if max_dimensions != 1 {
            return Err(TableError::UnsupportedDimensions(max_dimensions));
        }
        Ok(Self { max_dimensions })
    }

    pub fn max_dimensions(&self) -> i32 {
        self.max_dimensions
    }
}

/// Named table definition read from a UDT keyword
#[derive(Debug, Clone, PartialEq)]
pub struct UdtDefinition {
    pub name: String,
    pub table: Udt,
}

impl UdtDefinition {
    /// Read `name dims / type xs... / ys... /`
    pub fn from_keyword(keyword: &DeckKeyword) -> Result<Self, HandlerError> {
        let header = keyword.record(0)?;
        let name = header.item("TABLE_NAME")?.get_string(0)?;
        let dimensions = dimensions(header)?;
        if dimensions != 1 {
            return Err(TableError::UnsupportedDimensions(dimensions).into());
        }

        let points = keyword.record(1)?;
        let interpolation = points
            .item("INTERPOLATION_TYPE")?
            .get_string(0)?
            .parse::<InterpolationType>()?;
        let xs = points.item("INTERPOLATION_POINTS")?.get_si_double_data()?;
        let ys = keyword.record(2)?.item("TABLE_VALUES")?.get_si_double_data()?;

        Ok(Self {
            name,
            table: Udt::new(xs, ys, interpolation)?,
        })
    }
}

fn dimensions(header: &DeckRecord) -> Result<i32, DeckError> {
    let item = header.item("DIMENSIONS")?;
    if item.has_value(0) {
        item.get_int(0)
    } else {
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::DeckItem;

    fn table(kind: InterpolationType) -> Udt {
        Udt::new(vec![1.0, 4.0, 5.0], vec![5.0, 10.0, 11.0], kind).unwrap()
    }

    #[test]
    fn test_nearest_neighbour() {
        let udt = table(InterpolationType::NearestNeighbour);
        assert_eq!(udt.eval(0.0), 5.0);
        assert_eq!(udt.eval(1.5), 5.0);
        assert_eq!(udt.eval(4.0), 10.0);
        assert_eq!(udt.eval(4.7), 11.0);
        assert_eq!(udt.eval(5.2), 11.0);
    }

    #[test]
    fn test_linear_clamp() {
        let udt = table(InterpolationType::LinearClamp);
        assert_eq!(udt.eval(0.0), 5.0);
        assert_eq!(udt.eval(1.5), 5.0 + (10.0 - 5.0) * (1.5 - 1.0) / (4.0 - 1.0));
        assert_eq!(udt.eval(4.0), 10.0);
        assert_eq!(udt.eval(4.7), 10.0 + (11.0 - 10.0) * (4.7 - 4.0) / (5.0 - 4.0));
        assert_eq!(udt.eval(5.2), 11.0);
    }

    #[test]
    fn test_linear_extrapolate() {
        let udt = table(InterpolationType::LinearExtrapolate);
        assert_eq!(udt.eval(0.0), 5.0 + (10.0 - 5.0) * (0.0 - 1.0) / (4.0 - 1.0));
        assert_eq!(udt.eval(1.5), 5.0 + (10.0 - 5.0) * (1.5 - 1.0) / (4.0 - 1.0));
        assert_eq!(udt.eval(4.0), 10.0);
        assert_eq!(udt.eval(5.2), 10.0 + (11.0 - 10.0) * (5.2 - 4.0) / (5.0 - 4.0));
    }

    #[test]
    fn test_construction_errors() {
        let nv = InterpolationType::NearestNeighbour;
        assert!(matches!(
            Udt::new(vec![1.0], vec![1.0], nv),
            Err(TableError::TooFewPoints { count: 1 })
        ));
        assert!(matches!(
            Udt::new(vec![1.0, 2.0], vec![1.0], nv),
            Err(TableError::LengthMismatch { .. })
        ));
        assert!(matches!(
            Udt::new(vec![1.0, 1.0], vec![1.0, 2.0], nv),
            Err(TableError::NotAscending { index: 1 })
        ));
    }

    #[test]
    fn test_interpolation_codes() {
        assert_eq!("LL".parse::<InterpolationType>().unwrap(), InterpolationType::LinearExtrapolate);
        assert_eq!(InterpolationType::NearestNeighbour.to_string(), "NV");
        assert!("XX".parse::<InterpolationType>().is_err());
    }

    #[test]
    fn test_udt_params() {
        assert_eq!(UdtParams::new(1).unwrap().max_dimensions(), 1);
        assert!(matches!(UdtParams::new(2), Err(TableError::UnsupportedDimensions(2))));
    }

    #[test]
    fn test_definition_from_keyword() {
        let keyword = DeckKeyword::new(
            "UDT",
            vec![
                DeckRecord::default()
                    .with(DeckItem::string("TABLE_NAME", "TEST1"))
                    .with(DeckItem::int("DIMENSIONS", 1)),
                DeckRecord::default()
                    .with(DeckItem::string("INTERPOLATION_TYPE", "LC"))
                    .with(DeckItem::doubles("INTERPOLATION_POINTS", &[100.0, 500.0])),
                DeckRecord::default().with(DeckItem::doubles("TABLE_VALUES", &[100.0, 180.0])),
            ],
        );
        let definition = UdtDefinition::from_keyword(&keyword).unwrap();
        assert_eq!(definition.name, "TEST1");
        assert_eq!(definition.table.eval(300.0), 140.0);
    }
}
