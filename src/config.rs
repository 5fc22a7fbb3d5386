// ⚙️ Configuration - column names and file conventions
// Every transformation takes its column names as parameters; these are the defaults.

// ============================================================================
// COLUMN NAMES
// ============================================================================

/// Meter identifier column of reading files
pub const METER_COLUMN: &str = "N° compteur";

/// Reading date column
pub const DATE_COLUMN: &str = "Date";

/// Reading value column
pub const INDEX_COLUMN: &str = "Index";

/// Meter identifier column of the diameter lookup file
pub const LOOKUP_METER_COLUMN: &str = "Numéro de compteur";

/// Diameter attribute carried by the lookup file
pub const DIAMETER_COLUMN: &str = "Diametre";

/// Subscriber reference, always read as text (leading zeros matter)
pub const SUBSCRIBER_REF_COLUMN: &str = "Réf. abonné";

// ============================================================================
// FILE CONVENTIONS
// ============================================================================

/// Field delimiter used for both input and output files
pub const DEFAULT_DELIMITER: u8 = b';';

/// Columns forced to text when loading, unless overridden
pub const DEFAULT_TEXT_COLUMNS: &[&str] = &[SUBSCRIBER_REF_COLUMN];

/// Default output of `dedupe`
pub const CLEANED_FILE_NAME: &str = "donnees_compteurs_nettoyees.csv";

/// Default output of `compare`
pub const MISSING_FILE_NAME: &str = "compteurs_manquants.csv";

/// Default output of `enrich`
pub const ENRICHED_FILE_NAME: &str = "compteurs_avec_diametre.csv";

/// Parse a delimiter given on the command line.
///
/// Accepts a single ASCII character or the words `tab`, `comma`, `semicolon`.
pub fn parse_delimiter(raw: &str) -> Result<u8, String> {
    match raw {
        "tab" | "\\t" => Ok(b'\t'),
        "comma" => Ok(b','),
        "semicolon" => Ok(b';'),
        _ => {
            let bytes = raw.as_bytes();
            if bytes.len() == 1 && bytes[0].is_ascii() {
                Ok(bytes[0])
            } else {
                Err(format!("delimiter must be a single ASCII character, got '{}'", raw))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiter_single_char() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter(","), Ok(b','));
        assert_eq!(parse_delimiter("|"), Ok(b'|'));
    }

    #[test]
    fn test_parse_delimiter_named() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
    }

    #[test]
    fn test_parse_delimiter_rejects_multi_char() {
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("é").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
