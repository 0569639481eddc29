//! Source template for newly generated migration files

use chrono::{DateTime, Utc};

/// Convert a snake_case migration name to a CamelCase struct name
pub fn struct_name_for(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Check that a name can be used in a migration file name and struct name
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Render the body of a new migration file
pub fn render_migration(name: &str, version: i64, generated: DateTime<Utc>) -> String {
    let struct_name = struct_name_for(name);
    format!(
        r#"//! Migration: {name}
//! Version: {version}
//! Generated: {generated}

use harbormaster::migration::Migration;

pub struct {struct_name};

impl Migration for {struct_name} {{
    fn name(&self) -> &str {{
        "{name}"
    }}

    fn version(&self) -> i64 {{
        {version}
    }}
}}
"#,
        generated = generated.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
