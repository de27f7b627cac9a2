//! Measurement bases.
//!
//! A [`Basis`] names one measurement configuration of the two-qubit source
//! circuit. Its label is the stable identifier used in logs and results; the
//! [`BasisSpec`] carries the parameters an adapter needs to build the
//! circuit. Labels follow the formats below and round-trip through
//! [`Basis::parse`]:
//!
//! | Label | Spec |
//! |-------|------|
//! | `XY`, `ZI`, ... | [`BasisSpec::Pauli`] |
//! | `XR3_th0.52`, `ZR5_ph0.87` | [`BasisSpec::Rotated`] |
//! | `Bell_A_ph0.42`, `Bell_B_ph5.86` | [`BasisSpec::BellDiagonal`] |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};

/// Rotation angles (radians) of the rotated-basis families.
const ROTATION_ANGLES: [f64; 10] = [0.00, 0.17, 0.35, 0.52, 0.70, 0.87, 1.05, 1.22, 1.40, 1.57];

/// Phases (radians) of the Bell-diagonal families.
const BELL_PHASES: [f64; 15] = [
    0.00, 0.42, 0.84, 1.26, 1.68, 2.09, 2.51, 2.93, 3.35, 3.77, 4.19, 4.60, 5.02, 5.44, 5.86,
];

/// Single-qubit Pauli measurement axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauliAxis {
    I,
    X,
    Y,
    Z,
}

impl PauliAxis {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PauliAxis::I),
            'X' => Some(PauliAxis::X),
            'Y' => Some(PauliAxis::Y),
            'Z' => Some(PauliAxis::Z),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            PauliAxis::I => 'I',
            PauliAxis::X => 'X',
            PauliAxis::Y => 'Y',
            PauliAxis::Z => 'Z',
        }
    }
}

/// Bell-diagonal rotation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BellFamily {
    /// Equal Y rotations on both qubits.
    A,
    /// Equal X rotations on both qubits.
    B,
}

/// Parameters of a measurement configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BasisSpec {
    /// Independent Pauli measurement of each qubit.
    Pauli { first: PauliAxis, second: PauliAxis },
    /// Pauli measurement of the first qubit followed by a Z rotation.
    Rotated { axis: PauliAxis, index: u8, angle: f64 },
    /// Identical rotations on both qubits.
    BellDiagonal { family: BellFamily, phase: f64 },
}

/// A named measurement configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basis {
    label: String,
    spec: BasisSpec,
}

impl Basis {
    /// Two-qubit Pauli basis, e.g. `XY`.
    pub fn pauli(first: PauliAxis, second: PauliAxis) -> Self {
        Self {
            label: format!("{}{}", first.as_char(), second.as_char()),
            spec: BasisSpec::Pauli { first, second },
        }
    }

    /// Rotated basis, e.g. `XR3_th0.52`.
    ///
    /// Z rotations are labelled as phases (`ph`), X/Y rotations as angles (`th`).
    pub fn rotated(axis: PauliAxis, index: u8, angle: f64) -> Self {
        let tag = if axis == PauliAxis::Z { "ph" } else { "th" };
        Self {
            label: format!("{}R{index}_{tag}{angle:.2}", axis.as_char()),
            spec: BasisSpec::Rotated { axis, index, angle },
        }
    }

    /// Bell-diagonal basis, e.g. `Bell_A_ph0.42`.
    pub fn bell(family: BellFamily, phase: f64) -> Self {
        let name = match family {
            BellFamily::A => 'A',
            BellFamily::B => 'B',
        };
        Self {
            label: format!("Bell_{name}_ph{phase:.2}"),
            spec: BasisSpec::BellDiagonal { family, phase },
        }
    }

    /// Parse a basis from its label.
    pub fn parse(label: &str) -> HalResult<Self> {
        let invalid = || HalError::InvalidBasis(label.to_string());

        if let Some(rest) = label.strip_prefix("Bell_") {
            let (family, phase) = rest.split_once('_').ok_or_else(invalid)?;
            let family = match family {
                "A" => BellFamily::A,
                "B" => BellFamily::B,
                _ => return Err(invalid()),
            };
            let phase = phase
                .strip_prefix("ph")
                .and_then(|p| p.parse::<f64>().ok())
                .ok_or_else(invalid)?;
            return Ok(Self {
                label: label.to_string(),
                spec: BasisSpec::BellDiagonal { family, phase },
            });
        }

        let mut chars = label.chars();
        let first = chars.next().and_then(PauliAxis::from_char).ok_or_else(invalid)?;
        let rest = chars.as_str();

        if let Some(rotation) = rest.strip_prefix('R') {
            if first == PauliAxis::I {
                return Err(invalid());
            }
            let (index, angle) = rotation.split_once('_').ok_or_else(invalid)?;
            let index = index.parse::<u8>().map_err(|_| invalid())?;
            let angle = angle
                .strip_prefix("th")
                .or_else(|| angle.strip_prefix("ph"))
                .and_then(|a| a.parse::<f64>().ok())
                .ok_or_else(invalid)?;
            return Ok(Self {
                label: label.to_string(),
                spec: BasisSpec::Rotated {
                    axis: first,
                    index,
                    angle,
                },
            });
        }

        let mut rest_chars = rest.chars();
        match (rest_chars.next().and_then(PauliAxis::from_char), rest_chars.next()) {
            (Some(second), None) => Ok(Self::pauli(first, second)),
            _ => Err(invalid()),
        }
    }

    /// Stable identifier of this basis.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Circuit parameters of this basis.
    pub fn spec(&self) -> &BasisSpec {
        &self.spec
    }
}

impl FromStr for Basis {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Fixed, ordered collection of bases sampled by one generation run.
///
/// Order does not affect the extracted bits; it only fixes the iteration
/// order used for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisSet {
    bases: Vec<Basis>,
}

impl BasisSet {
    /// Create a basis set from an explicit list.
    pub fn new(bases: Vec<Basis>) -> Self {
        Self { bases }
    }

    /// Parse a basis set from labels.
    pub fn from_labels<I, S>(labels: I) -> HalResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .map(|label| Basis::parse(label.as_ref()))
            .collect::<HalResult<Vec<_>>>()
            .map(Self::new)
    }

    /// The nine two-qubit Pauli bases.
    pub fn standard() -> Self {
        use PauliAxis::{X, Y, Z};
        Self::new(
            [(Z, Z), (X, X), (Y, Y), (Z, X), (X, Z), (Z, Y), (Y, Z), (X, Y), (Y, X)]
                .into_iter()
                .map(|(a, b)| Basis::pauli(a, b))
                .collect(),
        )
    }

    /// The 75-basis set: Pauli pairs, single-qubit Paulis, rotated families
    /// and Bell-diagonal phase scans.
    pub fn extended() -> Self {
        use PauliAxis::{I, X, Y, Z};
        let mut bases: Vec<Basis> = [
            (X, X),
            (Y, Y),
            (Z, Z),
            (X, Y),
            (Y, X),
            (X, Z),
            (Z, X),
            (Y, Z),
            (Z, Y),
            (X, I),
            (I, X),
            (Y, I),
            (I, Y),
            (Z, I),
            (I, Z),
        ]
        .into_iter()
        .map(|(a, b)| Basis::pauli(a, b))
        .collect();

        for axis in [X, Y, Z] {
            for (index, angle) in ROTATION_ANGLES.iter().enumerate() {
                bases.push(Basis::rotated(axis, index as u8, *angle));
            }
        }
        for family in [BellFamily::A, BellFamily::B] {
            for phase in BELL_PHASES {
                bases.push(Basis::bell(family, phase));
            }
        }
        Self::new(bases)
    }

    /// Number of bases.
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Iterate over the bases in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Basis> {
        self.bases.iter()
    }

    /// Labels in order.
    pub fn labels(&self) -> Vec<&str> {
        self.bases.iter().map(Basis::label).collect()
    }
}

impl<'a> IntoIterator for &'a BasisSet {
    type Item = &'a Basis;
    type IntoIter = std::slice::Iter<'a, Basis>;

    fn into_iter(self) -> Self::IntoIter {
        self.bases.iter()
    }
}
