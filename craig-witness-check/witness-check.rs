//! Replay counterexample witnesses produced by modelchecker

use clap::Arg;
use std::io::Read;

use craig_common::{
    comment, die,
    output::{install_signal_handler, print_verdict},
    parser::{open_file, parse_circuit_file},
    witness::{check_witness, Witness},
};

fn main() -> Result<(), ()> {
    install_signal_handler();
    let app = clap::App::new("witness-check")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Verify that a witness drives a circuit into a bad state")
        .arg(
            Arg::with_name("CIRCUIT")
                .required(true)
                .help("input circuit in aag format"),
        )
        .arg(
            Arg::with_name("WITNESS")
                .required(true)
                .help("counterexample file in TOML format"),
        );
    let matches = app.get_matches();
    let circuit_filename = matches.value_of("CIRCUIT").unwrap_or_default();
    let witness_filename = matches.value_of("WITNESS").unwrap_or_default();

    let circuit = parse_circuit_file(circuit_filename, false)
        .unwrap_or_else(|err| die!("failed to parse circuit: {}", err));
    let mut toml_str = String::new();
    open_file(witness_filename)
        .read_to_string(&mut toml_str)
        .unwrap_or_else(|err| die!("Failed to read witness file: {}", err));
    let witness: Witness =
        toml::from_str(&toml_str).unwrap_or_else(|err| die!("Failed to parse witness file: {}", err));
    match check_witness(&circuit, &witness) {
        Ok(()) => {
            print_verdict("VERIFIED");
            Ok(())
        }
        Err(message) => {
            comment!("{}", message);
            print_verdict("NOT VERIFIED");
            Err(())
        }
    }
}
