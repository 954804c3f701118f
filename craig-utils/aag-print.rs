//! Parse a circuit and print it back in aag format

use clap::Arg;
use std::io::{self, BufWriter, Write};

use craig_common::{
    die,
    output::install_signal_handler,
    parser::parse_circuit_file,
};

fn main() {
    install_signal_handler();
    let matches = clap::App::new("aag-print")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Print a circuit in normalized aag format.")
        .arg(
            Arg::with_name("CIRCUIT")
                .required(true)
                .help("input circuit in aag format, possibly compressed"),
        )
        .get_matches();
    let circuit = parse_circuit_file(matches.value_of("CIRCUIT").unwrap_or_default(), false)
        .unwrap_or_else(|err| die!("failed to parse circuit: {}", err));
    let stdout = io::stdout();
    let mut output = BufWriter::new(stdout.lock());
    circuit
        .write_aag(&mut output)
        .and_then(|()| output.flush())
        .unwrap_or_else(|err| die!("failed to write circuit: {}", err));
}
