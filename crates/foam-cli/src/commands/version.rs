//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - quantum randomness from many-basis sampling",
        style("Foam").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  foam-hal          Backend abstraction and basis sets");
    println!("  foam-extract      Debiasing, whitening and certificates");
    println!("  foam-core         Execution engine and job lifecycle");
    println!("  foam-adapter-sim  Statevector simulator backend");
    println!("  foam-cli          Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style("https://github.com/quantum-foam/foam").underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
