//! Bases command implementation.

use console::style;

use foam_core::Edition;
use foam_hal::BasisSpec;

/// Execute the bases command.
pub fn execute(edition: Edition) {
    let bases = edition.basis_set();
    println!(
        "{} {} bases ({} edition):\n",
        style("Foam").cyan().bold(),
        bases.len(),
        edition
    );

    for (index, basis) in bases.iter().enumerate() {
        let family = match basis.spec() {
            BasisSpec::Pauli { .. } => "pauli",
            BasisSpec::Rotated { .. } => "rotated",
            BasisSpec::BellDiagonal { .. } => "bell",
        };
        println!(
            "  {:>3}  {:<16} {}",
            index + 1,
            style(basis.label()).bold(),
            style(family).dim()
        );
    }
}
