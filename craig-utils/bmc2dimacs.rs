//! Write the BMC unrolling of a circuit as DIMACS CNF

use clap::Arg;
use std::io::{self, BufWriter, Write};

use craig_common::{
    bmc::bmc_formula,
    die,
    formula::write_dimacs,
    output::install_signal_handler,
    parser::{open_file_for_writing, parse_circuit_file},
};

fn main() {
    install_signal_handler();
    let matches = clap::App::new("bmc2dimacs")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Unroll a circuit for k steps and write the bounded model checking CNF.")
        .arg(
            Arg::with_name("K")
                .required(true)
                .help("number of transitions to unroll"),
        )
        .arg(
            Arg::with_name("CIRCUIT")
                .required(true)
                .help("input circuit in aag format"),
        )
        .arg(
            Arg::with_name("OUTPUT")
                .help("output file (default: stdout)"),
        )
        .get_matches();
    let k: usize = matches
        .value_of("K")
        .unwrap_or_default()
        .parse()
        .unwrap_or_else(|err| die!("invalid bound: {}", err));
    let circuit = parse_circuit_file(matches.value_of("CIRCUIT").unwrap_or_default(), false)
        .unwrap_or_else(|err| die!("failed to parse circuit: {}", err));
    let formula = bmc_formula(&circuit, k);
    let variables = circuit.variable_count(k + 1);
    let result = match matches.value_of("OUTPUT") {
        Some(filename) => {
            let mut file = open_file_for_writing(filename);
            write_dimacs(&mut file, &formula, variables).and_then(|()| file.flush())
        }
        None => {
            let stdout = io::stdout();
            let mut output = BufWriter::new(stdout.lock());
            write_dimacs(&mut output, &formula, variables).and_then(|()| output.flush())
        }
    };
    result.unwrap_or_else(|err| die!("failed to write DIMACS: {}", err));
}
