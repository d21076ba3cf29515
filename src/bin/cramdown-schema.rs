use std::io::prelude::*;

fn main() {
    let schema = schemars::schema_for!(cramdown::config::DocumentConfig);
    let schema = serde_json::to_string_pretty(&schema).unwrap();
    writeln!(std::io::stdout(), "{schema}").unwrap();
}
