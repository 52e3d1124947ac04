//! Airfoil surface coordinates.

use crate::error::{FoilError, FoilResult};
use std::path::Path;

/// Read-only access to an airfoil's surface nodes.
///
/// Nodes run from the trailing edge over the upper surface, around the
/// leading edge and back along the lower surface.
pub trait FoilGeometry {
    fn n_nodes(&self) -> usize;

    fn x(&self, i: usize) -> f64;

    fn y(&self, i: usize) -> f64;

    /// Copy all nodes into owned x/y arrays.
    fn coordinates(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.n_nodes();
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            x.push(self.x(i));
            y.push(self.y(i));
        }
        (x, y)
    }
}

/// An owned airfoil coordinate set.
#[derive(Debug, Clone, PartialEq)]
pub struct Foil {
    name: String,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Foil {
    /// Create a foil from parallel coordinate arrays.
    pub fn new(name: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> FoilResult<Self> {
        if x.len() != y.len() {
            return Err(FoilError::InvalidGeometry {
                what: "x and y coordinate arrays differ in length",
            });
        }
        if x.iter().chain(&y).any(|v| !v.is_finite()) {
            return Err(FoilError::InvalidGeometry {
                what: "coordinates must be finite",
            });
        }
        Ok(Self {
            name: name.into(),
            x,
            y,
        })
    }

    pub fn from_points(name: impl Into<String>, points: &[(f64, f64)]) -> FoilResult<Self> {
        let (x, y): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
        Self::new(name, x, y)
    }

    /// Parse a Selig-format coordinate file.
    ///
    /// The first line is taken as the foil name when it does not parse as a
    /// coordinate pair. Blank lines are skipped.
    pub fn from_dat_str(text: &str) -> FoilResult<Self> {
        let mut name = String::new();
        let mut points = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            match parse_pair(line) {
                Some(p) => points.push(p),
                None if points.is_empty() && name.is_empty() => name = line.to_string(),
                None => {
                    return Err(FoilError::Parse {
                        line: idx + 1,
                        message: format!("expected two numbers, found '{}'", line),
                    });
                }
            }
        }

        if points.len() < 3 {
            return Err(FoilError::InvalidGeometry {
                what: "coordinate file holds fewer than 3 nodes",
            });
        }

        Self::from_points(name, &points)
    }

    pub fn load_dat(path: impl AsRef<Path>) -> FoilResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_dat_str(&text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn x_coords(&self) -> &[f64] {
        &self.x
    }

    pub fn y_coords(&self) -> &[f64] {
        &self.y
    }

    /// Move one node.
    pub fn set_node(&mut self, i: usize, x: f64, y: f64) -> FoilResult<()> {
        let len = self.x.len();
        if i >= len {
            return Err(FoilError::IndexOob { index: i, len });
        }
        self.x[i] = x;
        self.y[i] = y;
        Ok(())
    }
}

impl FoilGeometry for Foil {
    fn n_nodes(&self) -> usize {
        self.x.len()
    }

    fn x(&self, i: usize) -> f64 {
        self.x[i]
    }

    fn y(&self, i: usize) -> f64 {
        self.y[i]
    }

    fn coordinates(&self) -> (Vec<f64>, Vec<f64>) {
        (self.x.clone(), self.y.clone())
    }
}

fn parse_pair(line: &str) -> Option<(f64, f64)> {
    let mut it = line.split_whitespace();
    let x = it.next()?.parse().ok()?;
    let y = it.next()?.parse().ok()?;
    if it.next().is_some() {
        return None;
    }
    Some((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIAMOND: &str = "diamond\n 1.0 0.0\n 0.5 0.05\n 0.0 0.0\n 0.5 -0.05\n 1.0 0.0\n";

    #[test]
    fn parse_selig_with_name() {
        let foil = Foil::from_dat_str(DIAMOND).unwrap();
        assert_eq!(foil.name(), "diamond");
        assert_eq!(foil.n_nodes(), 5);
        assert_eq!(foil.x(1), 0.5);
        assert_eq!(foil.y(3), -0.05);
    }

    #[test]
    fn parse_without_name_line() {
        let foil = Foil::from_dat_str("1 0\n0 0.1\n0 -0.1\n").unwrap();
        assert_eq!(foil.name(), "");
        assert_eq!(foil.n_nodes(), 3);
    }

    #[test]
    fn parse_rejects_garbage_after_coordinates() {
        let err = Foil::from_dat_str("foil\n1 0\n0 0\nnot a pair\n").unwrap_err();
        assert!(matches!(err, FoilError::Parse { line: 4, .. }));
    }

    #[test]
    fn parse_rejects_too_few_nodes() {
        let err = Foil::from_dat_str("foil\n1 0\n0 0\n").unwrap_err();
        assert!(matches!(err, FoilError::InvalidGeometry { .. }));
    }

    #[test]
    fn mismatched_arrays_rejected() {
        assert!(Foil::new("bad", vec![0.0, 1.0], vec![0.0]).is_err());
    }

    #[test]
    fn non_finite_rejected() {
        assert!(Foil::new("bad", vec![0.0, f64::NAN], vec![0.0, 0.0]).is_err());
    }

    #[test]
    fn set_node_bounds_checked() {
        let mut foil = Foil::from_dat_str(DIAMOND).unwrap();
        foil.set_node(2, -0.01, 0.0).unwrap();
        assert_eq!(foil.x(2), -0.01);
        assert!(matches!(
            foil.set_node(9, 0.0, 0.0),
            Err(FoilError::IndexOob { index: 9, len: 5 })
        ));
    }

    #[test]
    fn coordinates_default_matches_override() {
        struct Wrapped<'a>(&'a Foil);
        impl FoilGeometry for Wrapped<'_> {
            fn n_nodes(&self) -> usize {
                self.0.n_nodes()
            }
            fn x(&self, i: usize) -> f64 {
                self.0.x(i)
            }
            fn y(&self, i: usize) -> f64 {
                self.0.y(i)
            }
        }

        let foil = Foil::from_dat_str(DIAMOND).unwrap();
        assert_eq!(Wrapped(&foil).coordinates(), foil.coordinates());
    }
}
