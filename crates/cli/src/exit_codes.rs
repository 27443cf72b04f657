//! CLI Exit Code Registry
//!
//! Single source of truth for `mailtrace` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args)                           |
//! | 3    | I/O error (cannot read input, cannot write output)   |
//! | 4    | Malformed CSV                                        |
//! | 5    | Invalid matcher config                               |
//! | 6    | Required column missing from an input file           |
//! | 7    | Run succeeded but nothing matched (`--fail-on-no-match`) |

use mailtrace_matcher::MatchError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments or a conflicting flag combination. clap
/// exits with this code on its own parse errors.
pub const EXIT_USAGE: u8 = 2;

/// Input file unreadable or output file unwritable.
pub const EXIT_IO: u8 = 3;

/// CSV could not be parsed.
pub const EXIT_PARSE: u8 = 4;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

/// A required semantic field (address, city, state, zip) has no column.
pub const EXIT_SCHEMA_MISSING: u8 = 6;

/// Zero matches, reported only when `--fail-on-no-match` is set.
pub const EXIT_NO_MATCH: u8 = 7;

/// Map an engine error to its exit code.
pub fn match_exit_code(err: &MatchError) -> u8 {
    match err {
        MatchError::SchemaFieldMissing { .. } => EXIT_SCHEMA_MISSING,
        MatchError::ConfigParse(_) | MatchError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        MatchError::Csv(_) => EXIT_PARSE,
    }
}
