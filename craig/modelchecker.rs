//! Check a safety property of an AIGER circuit with BMC or interpolation

use clap::{App, Arg, ArgMatches};
use craig_common::{
    bmc::bmc,
    checker::{Checker, Flags, Verdict},
    die,
    imc::imc,
    output::{install_signal_handler, print_verdict, Timer},
    parser::parse_circuit_file,
};

fn main() {
    install_signal_handler();
    let flags = parse_flags(app().get_matches());
    let verbose = flags.verbosity >= 1;
    let timer = Timer::name_if("total time", verbose);
    let circuit = parse_circuit_file(&flags.circuit_filename, verbose)
        .unwrap_or_else(|err| die!("failed to parse circuit: {}", err));
    let mut checker = Checker::new(&circuit, flags);
    let verdict = match checker.flags.bound {
        Some(k) => {
            if bmc(&mut checker, k) {
                Verdict::Safe
            } else {
                Verdict::Violated
            }
        }
        None => imc(&mut checker),
    };
    if verbose {
        checker.print_statistics();
    }
    drop(timer);
    if verdict == Verdict::Violated {
        if let (Some(filename), Some(witness)) = (&checker.flags.witness_filename, &checker.witness) {
            witness.write(filename);
        }
    }
    print_verdict(verdict.answer());
}

/// The command line interface.
fn app() -> App<'static, 'static> {
    App::new("modelchecker")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::with_name("FIRST")
                .required(true)
                .value_name("k | file")
                .help("the BMC bound followed by the circuit, or just the circuit to run interpolation"),
        )
        .arg(
            Arg::with_name("SECOND")
                .value_name("file")
                .help("input circuit in aag format when a bound is given"),
        )
        .arg(
            Arg::with_name("INNER_BOUND")
                .short("a")
                .takes_value(true)
                .validator(is_number)
                .help("Maximum number of refinements per depth."),
        )
        .arg(
            Arg::with_name("OUTER_BOUND")
                .short("b")
                .takes_value(true)
                .validator(is_number)
                .help("Maximum unrolling depth for interpolation."),
        )
        .arg(
            Arg::with_name("WITNESS_FILE")
                .short("w")
                .long("witness")
                .takes_value(true)
                .help("Write the counterexample to this file."),
        )
        .arg(Arg::with_name("v").short("v").help("Log progress."))
        .arg(
            Arg::with_name("V")
                .short("V")
                .help("Log progress and dump formulas, interpolants and models; wins over -v."),
        )
}

fn is_number(value: String) -> Result<(), String> {
    value
        .parse::<usize>()
        .map(|_| ())
        .map_err(|_| format!("expected a non-negative number, found {:?}", value))
}

/// Create a flags instance from commandline arguments.
fn parse_flags(matches: ArgMatches) -> Flags {
    let number = |name: &str| matches.value_of(name).and_then(|value| value.parse().ok());
    let first = matches.value_of("FIRST").unwrap_or_default().to_string();
    let (bound, circuit_filename) = match matches.value_of("SECOND") {
        None => (None, first),
        Some(second) => match first.parse::<usize>() {
            Ok(k) => (Some(k), second.to_string()),
            Err(_) => clap::Error::with_description(
                &format!("the bound must be a non-negative number, found {:?}", first),
                clap::ErrorKind::InvalidValue,
            )
            .exit(),
        },
    };
    Flags {
        verbosity: if matches.is_present("V") {
            2
        } else if matches.is_present("v") {
            1
        } else {
            0
        },
        bound,
        inner_bound: number("INNER_BOUND"),
        outer_bound: number("OUTER_BOUND"),
        circuit_filename,
        witness_filename: matches.value_of("WITNESS_FILE").map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(arguments: &[&str]) -> Flags {
        let arguments = std::iter::once("modelchecker").chain(arguments.iter().cloned());
        parse_flags(app().get_matches_from(arguments))
    }

    #[test]
    fn positional_forms() {
        let bmc = flags(&["7", "circuit.aag"]);
        assert_eq!(bmc.bound, Some(7));
        assert_eq!(bmc.circuit_filename, "circuit.aag");
        let imc = flags(&["-a", "3", "-b", "9", "circuit.aag"]);
        assert_eq!(imc.bound, None);
        assert_eq!(imc.inner_bound, Some(3));
        assert_eq!(imc.outer_bound, Some(9));
        assert_eq!(imc.circuit_filename, "circuit.aag");
    }

    #[test]
    fn dump_level_wins_over_progress_level() {
        assert_eq!(flags(&["circuit.aag"]).verbosity, 0);
        assert_eq!(flags(&["-v", "circuit.aag"]).verbosity, 1);
        assert_eq!(flags(&["-V", "circuit.aag"]).verbosity, 2);
        assert_eq!(flags(&["-v", "-V", "circuit.aag"]).verbosity, 2);
        assert_eq!(flags(&["-V", "-v", "circuit.aag"]).verbosity, 2);
    }

    #[test]
    fn malformed_bounds_are_rejected() {
        assert!(app()
            .get_matches_from_safe(vec!["modelchecker", "-a", "x", "circuit.aag"])
            .is_err());
    }
}
