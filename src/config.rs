// ABOUTME: Version metadata and REPL constants

pub const NAME: &str = "Kuzur";
pub const VERSION: &str = "1.0.0";

/// Extension required of script files passed on the command line.
pub const SOURCE_EXTENSION: &str = "kz";

pub const REPL_PROMPT: &str = "kuzur> ";
pub const WELCOME_FOOTER: &str = "Type a statement to run it, or 'exit' to leave.";
