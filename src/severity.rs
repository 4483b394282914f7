use crate::level::Level;

/// Map a numeric level to the Cloud Logging `severity` string.
///
/// Only the nine canonical levels are mapped. Anything in between (a
/// custom level between INFO and WARNING, say) yields an empty string,
/// which callers must read as "unmapped".
pub fn severity(level: Level) -> &'static str {
    match level {
        Level::DEFAULT => "DEFAULT",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::NOTICE => "NOTICE",
        Level::WARNING => "WARNING",
        Level::ERROR => "ERROR",
        Level::CRITICAL => "CRITICAL",
        Level::ALERT => "ALERT",
        Level::EMERGENCY => "EMERGENCY",
        _ => "",
    }
}
