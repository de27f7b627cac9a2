//! Source circuit construction.
//!
//! Every basis shares the same entangling prefix, `Ry(theta)` on qubit 0
//! followed by `CX(0, 1)`, and differs only in the rotations applied before
//! measurement.

use std::f64::consts::FRAC_PI_2;

use foam_hal::{BasisSpec, BellFamily, PauliAxis};

use crate::statevector::Statevector;

/// Gates used by the source circuit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gate {
    Rx(usize, f64),
    Ry(usize, f64),
    Rz(usize, f64),
    Cx(usize, usize),
}

/// Gate sequence for measuring `spec` on a pair prepared with angle `theta`
/// (radians).
pub fn source_circuit(theta: f64, spec: &BasisSpec) -> Vec<Gate> {
    let mut gates = vec![Gate::Ry(0, theta), Gate::Cx(0, 1)];

    match *spec {
        BasisSpec::Pauli { first, second } => {
            gates.extend(pauli_rotation(0, first));
            gates.extend(pauli_rotation(1, second));
        }
        BasisSpec::Rotated { axis, angle, .. } => {
            gates.extend(pauli_rotation(0, axis));
            gates.push(Gate::Rz(0, angle));
        }
        BasisSpec::BellDiagonal { family, phase } => match family {
            BellFamily::A => gates.extend([Gate::Ry(0, phase), Gate::Ry(1, phase)]),
            BellFamily::B => gates.extend([Gate::Rx(0, phase), Gate::Rx(1, phase)]),
        },
    }

    gates
}

/// Rotation that maps the eigenbasis of `axis` onto the computational basis.
fn pauli_rotation(qubit: usize, axis: PauliAxis) -> Option<Gate> {
    match axis {
        PauliAxis::X => Some(Gate::Ry(qubit, -FRAC_PI_2)),
        PauliAxis::Y => Some(Gate::Rx(qubit, FRAC_PI_2)),
        PauliAxis::Z | PauliAxis::I => None,
    }
}

/// Run a gate sequence from |00⟩.
pub fn simulate(gates: &[Gate]) -> Statevector {
    let mut sv = Statevector::new();
    for gate in gates {
        match *gate {
            Gate::Rx(q, t) => sv.apply_rx(q, t),
            Gate::Ry(q, t) => sv.apply_ry(q, t),
            Gate::Rz(q, t) => sv.apply_rz(q, t),
            Gate::Cx(c, t) => sv.apply_cx(c, t),
        }
    }
    sv
}
