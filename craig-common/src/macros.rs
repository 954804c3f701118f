//! Macros and other utility code.

/// This should be used for every write to stdout.
#[macro_export]
macro_rules! write_to_stdout {
    ($($arg:tt)*) => ({
        use std::io::Write;
        match write!(std::io::stdout(), $($arg)*) {
            Ok(()) => (),
            // Don't panic on SIGPIPE.
            Err(ref err) if err.kind() == std::io::ErrorKind::BrokenPipe =>  std::process::exit(141),
            Err(ref err) =>  panic!("{}", err),
        };
    })
}

/// Print to stdout.
#[macro_export]
macro_rules! puts {
    ($($arg:tt)*) => ({
        $crate::write_to_stdout!($($arg)*);
    })
}

/// Implementation of log.
#[macro_export]
macro_rules! _log {
    ($verbosity:expr, $level:expr, $($arg:tt)*) => {
        if $crate::config::ENABLE_LOGGING && $level <= $verbosity
        {
            $crate::write_to_stdout!("c ");
            $crate::write_to_stdout!($($arg)*);
            $crate::write_to_stdout!("\n");
        }
    }
}

/// Print a formatted message based on verbosity level
#[macro_export]
macro_rules! log {
    ($checker:expr, $level:expr, $($arg:tt)*) => {
        $crate::_log!($checker.flags.verbosity, $level, $($arg)*)
    };
}

/// Print to stdout with yellow font color.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => ({
        let style = if $crate::output::is_a_tty() {
            $crate::ansi_term::Colour::Yellow.normal()
        } else {
            $crate::ansi_term::Style::default()
        };
        $crate::write_to_stdout!("{}", style.paint("Warning: "));
        $crate::write_to_stdout!("{}\n", style.paint(&format!($($arg)*)));
    })
}

/// Report a fatal error and exit.
#[macro_export]
macro_rules! die {
    ($($arg:tt)*) => ({
        let style = if $crate::output::is_a_tty() {
            $crate::ansi_term::Colour::Red.normal()
        } else {
            $crate::ansi_term::Style::default()
        };
        $crate::write_to_stdout!("{}", style.paint("Error: "));
        $crate::write_to_stdout!("{}\n", style.paint(&format!($($arg)*)));
        std::process::exit(2);
    })
}

/// Native assertions cannot be disabled, that's why why prefer to use this
/// macro.
#[macro_export]
macro_rules! invariant {
    ($($arg:tt)*) => ({
        if $crate::config::CHECK_INVARIANTS {
            assert!($($arg)*);
        }
    })
}

/// Like invariant, but for preconditions.
#[macro_export]
macro_rules! requires {
    ($($arg:tt)*) => ({
        if $crate::config::CHECK_PRECONDITIONS {
            assert!($($arg)*);
        }
    })
}

/// Print to stdout, prefixed by "c ".
#[macro_export]
macro_rules! comment {
    ($($arg:tt)*) => ({
        $crate::write_to_stdout!("c ");
        $crate::write_to_stdout!($($arg)*);
        $crate::write_to_stdout!("\n");
    })
}
