//! CSV layout shared by the export and import paths.

/// Reserved column holding the sample epoch (milliseconds).
///
/// Always present and always the first column of an exported file. The
/// leading `#` keeps it from colliding with exposition metric names, which
/// never start with a comment marker.
pub const EPOCH_HEADER: &str = "#epoch";

/// Column delimiter for exported and imported CSV files.
pub const COL_DELIMITER: &str = ",";

/// Row delimiter for exported and imported CSV files.
pub const ROW_DELIMITER: &str = "\n";

/// Value used to right-pad rows that predate the widest header set.
pub const PAD_VALUE: &str = "0";

/// Prefix of exposition comment lines (`# HELP`, `# TYPE`).
pub const COMMENT_PREFIX: &str = "#";

/// Prefix of the registry's manifest line, which carries no sample.
pub const MANIFEST_PREFIX: &str = "manifest";

/// Extension of files produced by export and picked up by import.
pub const CSV_EXTENSION: &str = "csv";

/// Width of the zero-padded block folder name.
pub const FOLDER_NAME_WIDTH: usize = 10;

/// Name of the file holding the rows of the file partition starting at
/// `file_id`.
pub fn file_name(file_id: u64) -> String {
    format!("metrics-{}.{}", file_id, CSV_EXTENSION)
}

/// Name of the directory holding the folder partition starting at
/// `block_folder`.
pub fn folder_name(block_folder: u64) -> String {
    format!("{:0width$}", block_folder, width = FOLDER_NAME_WIDTH)
}
