// Build-time regex pattern validation for the transaction log parser
use regex::Regex;
use std::fs::File;
use std::io::Write;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // All regex patterns used by the parser
    let patterns = &[
        (
            r#"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}) (\S+) (\S+) (\S+?)(?:ms)? (\S+) (\S+)(?: (.+))?$"#,
            "legacy_transaction",
        ),
        (
            r#"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2})?$"#,
            "iso_timestamp",
        ),
        (r#"^[+-]?\d+(?:\.\d+)?(?:ms)?$"#, "latency_millis"),
    ];

    let mut invalid_patterns = Vec::new();

    for &(pattern, name) in patterns {
        if let Err(e) = Regex::new(pattern) {
            println!("cargo:warning=Invalid regex pattern '{name}': {e}");
            invalid_patterns.push((pattern, name, e));
        }
    }

    if !invalid_patterns.is_empty() {
        let mut error_msg = String::from("Build failed due to invalid regex patterns:\n");
        for (pattern, name, error) in &invalid_patterns {
            error_msg.push_str(&format!("  - '{name}': {error} (pattern: {pattern})\n"));
        }
        panic!("{}", error_msg);
    }

    if let Err(e) = generate_validated_regexes(patterns) {
        panic!("Failed to generate regex patterns: {e}");
    }
}

fn generate_validated_regexes(patterns: &[(&str, &str)]) -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::env::var("OUT_DIR")?;
    let dest_path = std::path::Path::new(&out_dir).join("validated_regexes.rs");
    let mut file = File::create(dest_path)?;

    writeln!(file, "// Auto-generated regex patterns (validated by build.rs)")?;
    writeln!(file, "use crate::parser::regex_patterns::StaticRegexSet;")?;
    writeln!(file)?;
    writeln!(file, "/// All validated regex patterns used by the parser")?;
    writeln!(file, "pub static VALIDATED_PATTERNS: StaticRegexSet = StaticRegexSet::new(&[")?;
    for (pattern, name) in patterns {
        writeln!(file, "    (r#\"{pattern}\"#, \"{name}\"),")?;
    }
    writeln!(file, "]);")?;
    writeln!(file)?;

    writeln!(file, "/// Pattern indices for type-safe access")?;
    writeln!(file, "pub mod pattern_index {{")?;
    for (i, (_, name)) in patterns.iter().enumerate() {
        writeln!(file, "    pub const {}: usize = {i};", name.to_uppercase())?;
    }
    writeln!(file, "}}")?;
    writeln!(file)?;

    writeln!(file, "/// Pattern name lookup")?;
    writeln!(file, "pub fn get_pattern_name(index: usize) -> Option<&'static str> {{")?;
    writeln!(file, "    match index {{")?;
    for (i, (_, name)) in patterns.iter().enumerate() {
        writeln!(file, "        {i} => Some(\"{name}\"),")?;
    }
    writeln!(file, "        _ => None,")?;
    writeln!(file, "    }}")?;
    writeln!(file, "}}")?;

    Ok(())
}
