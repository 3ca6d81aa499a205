/***************************************/
/*               Macros                */
/***************************************/

/// Unwraps a `Result` or logs the error and exits the process. For use at
/// the binary's top level where there is nothing sensible to recover to.
/// The second form prefixes the log line with a label for errors that do
/// not name their source themselves.
#[macro_export]
macro_rules! unwrap_or_exit {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => {
                log::error!("fatal: {}", e);
                std::process::exit(1);
            }
        }
    };
    ($expr:expr, $label:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => {
                log::error!("fatal: {}: {}", $label, e);
                std::process::exit(1);
            }
        }
    };
}
