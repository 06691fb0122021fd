use bundlehost_core::stub::StubPool;
use std::path::Path;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct StubRow {
    #[tabled(rename = "Stub")]
    name: String,
    #[tabled(rename = "Launch mode")]
    mode: String,
}

pub fn run(config_path: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = bundlehost_runtime::load_config(config_path)?;
    let pool = StubPool::new(config.stub_prefix.clone(), config.slots_per_mode);
    let stubs = pool.declared_stubs();

    if json {
        let entries: Vec<_> = stubs
            .iter()
            .map(|(name, mode)| serde_json::json!({ "name": name, "launch_mode": mode }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let rows: Vec<StubRow> = stubs
        .into_iter()
        .map(|(name, mode)| StubRow {
            name: name.to_string(),
            mode: mode.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));
    Ok(())
}
